//! HexArena - hex-grid autobattler combat simulator
//!
//! Loads a JSON match setup, runs the match headless, and prints the
//! outcome. A match report is written when an output path is configured.

use hexarena::cli;
use hexarena::headless::{run_headless_match, MatchSetup};

fn main() {
    let args = cli::parse_args();

    let mut setup = match MatchSetup::load_from_file(&args.setup) {
        Ok(setup) => setup,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(output) = args.output {
        setup.output_path = Some(output.to_string_lossy().into_owned());
    }
    if let Some(seed) = args.seed {
        setup.random_seed = Some(seed);
    }
    if let Some(max_duration) = args.max_duration {
        setup.max_duration_secs = max_duration;
    }

    println!("Running match: {}", args.setup.display());
    match run_headless_match(setup) {
        Ok(result) => {
            match result.winner {
                Some(team) => println!(
                    "Team {} wins after {:.1}s",
                    team,
                    result.match_time_ms / 1000.0
                ),
                None => println!("Draw after {:.1}s", result.match_time_ms / 1000.0),
            }
            if let Some(seed) = result.random_seed {
                println!("Seed: {seed}");
            }
            for (index, team) in result.teams.iter().enumerate() {
                println!("Team {index}:");
                for unit in team {
                    println!(
                        "  {}* {} - {:.0}/{:.0} hp, {:.0} dealt, {:.0} taken",
                        unit.star_level,
                        unit.name,
                        unit.final_health,
                        unit.max_health,
                        unit.damage_dealt,
                        unit.damage_taken,
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
