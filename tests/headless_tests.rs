//! Integration tests for headless match execution
//!
//! These tests verify that:
//! - Headless matches run to completion with a sensible outcome
//! - Seeded RNG produces deterministic results
//! - The duration cap produces a draw
//! - Match reports are written and parse back

use hexarena::headless::config::{MatchSetup, TeamSetup, UnitSetup};
use hexarena::headless::run_headless_match;

fn unit(champion: &str, star_level: u8, col: i32, row: i32) -> UnitSetup {
    UnitSetup {
        champion: champion.to_string(),
        star_level,
        hex: (col, row),
        items: Vec::new(),
    }
}

fn setup(team0: Vec<UnitSetup>, team1: Vec<UnitSetup>, seed: u64) -> MatchSetup {
    MatchSetup {
        teams: [
            TeamSetup {
                units: team0,
                augments: Vec::new(),
            },
            TeamSetup {
                units: team1,
                augments: Vec::new(),
            },
        ],
        max_duration_secs: 120.0,
        random_seed: Some(seed),
        output_path: None,
    }
}

#[test]
fn test_outnumbered_team_loses() {
    let result = run_headless_match(setup(
        vec![unit("Duelist", 1, 2, 3), unit("Duelist", 1, 4, 3)],
        vec![unit("Duelist", 1, 3, 3)],
        99,
    ))
    .unwrap();

    assert_eq!(result.winner, Some(0));
    let loser = &result.teams[1][0];
    assert_eq!(loser.final_health, 0.0);
    assert!(loser.damage_taken >= loser.max_health);
}

#[test]
fn test_higher_star_level_wins_the_mirror() {
    let result = run_headless_match(setup(
        vec![unit("Duelist", 2, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
        7,
    ))
    .unwrap();
    assert_eq!(result.winner, Some(0));
}

#[test]
fn test_duration_cap_produces_a_draw() {
    let mut short = setup(
        vec![unit("Stoneguard", 1, 3, 0)],
        vec![unit("Stoneguard", 1, 3, 0)],
        5,
    );
    short.max_duration_secs = 2.0;

    let result = run_headless_match(short).unwrap();
    assert_eq!(result.winner, None);
    assert!(result.match_time_ms >= 2000.0);
    // Both units are still standing at the cap.
    assert!(result.teams[0][0].final_health > 0.0);
    assert!(result.teams[1][0].final_health > 0.0);
}

#[test]
fn test_seeded_matches_replay_identically() {
    let build = || {
        setup(
            vec![unit("Pyromancer", 1, 3, 0), unit("Duelist", 1, 3, 3)],
            vec![unit("Windcaller", 1, 3, 0), unit("Stoneguard", 1, 3, 3)],
            31337,
        )
    };
    let a = run_headless_match(build()).unwrap();
    let b = run_headless_match(build()).unwrap();

    assert_eq!(a.winner, b.winner);
    assert_eq!(a.match_time_ms, b.match_time_ms);
    for team in 0..2 {
        for (left, right) in a.teams[team].iter().zip(&b.teams[team]) {
            assert_eq!(left.final_health, right.final_health);
            assert_eq!(left.damage_dealt, right.damage_dealt);
            assert_eq!(left.final_hex, right.final_hex);
        }
    }
}

#[test]
fn test_items_and_augments_shape_the_result() {
    let mut boosted = setup(
        vec![unit("Duelist", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
        11,
    );
    boosted.teams[0].units[0].items.push("Giants Plate".to_string());
    boosted.teams[0].augments.push("Phalanx".to_string());

    let result = run_headless_match(boosted).unwrap();
    // Giants Plate adds 300 max health on top of the Duelist's base 700.
    assert_eq!(result.teams[0][0].max_health, 1000.0);
    assert_eq!(result.winner, Some(0));
}

#[test]
fn test_match_report_is_written_and_parses() {
    let path = std::env::temp_dir().join("hexarena_headless_report_test.json");
    let mut reported = setup(
        vec![unit("Duelist", 2, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
        21,
    );
    reported.output_path = Some(path.to_string_lossy().into_owned());

    let result = run_headless_match(reported).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let report: serde_json::Value = serde_json::from_str(&contents).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
        report["metadata"]["winner"],
        serde_json::json!(result.winner)
    );
    assert_eq!(report["metadata"]["random_seed"], serde_json::json!(21));
    let entries = report["entries"].as_array().unwrap();
    assert!(!entries.is_empty());
    assert_eq!(entries[0]["message"], "combat begins");
}

#[test]
fn test_unknown_augments_and_items_are_inert() {
    let mut odd = setup(
        vec![unit("Duelist", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
        3,
    );
    odd.teams[0].units[0].items.push("Cardboard Sword".to_string());
    odd.teams[1].augments.push("Mystery Box".to_string());

    // Names without registered hooks simply do nothing.
    let result = run_headless_match(odd).unwrap();
    assert!(result.winner.is_some());
}
