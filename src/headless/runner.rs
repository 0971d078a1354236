//! Headless match runner.
//!
//! Drives a full match on the schedule runner with no rendering: spawn the
//! configured teams, tick the simulation until one side is eliminated or
//! the duration cap hits, then report the outcome.

use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use crate::combat::log::{CombatLog, CombatLogEventType, MatchMetadata, UnitMetadata};
use crate::combat::CombatPlugin;
use crate::data::{ChampionCatalog, DataPlugin};
use crate::sim::clock::SimClock;
use crate::sim::unit::Unit;
use crate::sim::{GameRng, SimPhase, SimulationPlugin, TeamAugments};

use super::config::MatchSetup;

/// Outcome of a completed headless match.
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Winning team (0 or 1), or None for a draw.
    pub winner: Option<u8>,
    pub match_time_ms: f64,
    pub random_seed: Option<u64>,
    /// Final state of every unit, per team.
    pub teams: [Vec<UnitMetadata>; 2],
}

/// Tracks match progress and holds the result once the match ends.
#[derive(Resource)]
pub struct HeadlessMatchState {
    pub max_duration_ms: f64,
    pub output_path: Option<String>,
    pub match_complete: bool,
    pub result: Option<MatchResult>,
}

/// Wires a configured match into an otherwise bare app. The caller is
/// expected to have added `DataPlugin`, `SimulationPlugin` and
/// `CombatPlugin` alongside.
pub struct HeadlessPlugin {
    pub setup: MatchSetup,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.setup.random_seed {
            Some(seed) => GameRng::from_seed(seed),
            None => GameRng::from_entropy(),
        };
        let mut augments = TeamAugments::default();
        for (index, team) in self.setup.teams.iter().enumerate() {
            augments.teams[index] = team.augments.clone();
        }
        app.insert_resource(self.setup.clone())
            .insert_resource(rng)
            .insert_resource(augments)
            .insert_resource(HeadlessMatchState {
                max_duration_ms: self.setup.max_duration_ms(),
                output_path: self.setup.output_path.clone(),
                match_complete: false,
                result: None,
            })
            .add_systems(Startup, headless_spawn_teams)
            .add_systems(
                Update,
                (
                    headless_check_match_end.after(SimPhase::Effects),
                    headless_exit_on_complete,
                )
                    .chain(),
            );
    }
}

/// Spawns both teams from the match setup. Sequence ids are globally
/// unique so that every sequence-ordered pass has a total order.
fn headless_spawn_teams(
    mut commands: Commands,
    setup: Res<MatchSetup>,
    catalog: Res<ChampionCatalog>,
    mut combat_log: ResMut<CombatLog>,
) {
    combat_log.clear();

    let mut sequence = 0u32;
    for (index, team) in setup.teams.iter().enumerate() {
        let team_id = index as u8;
        for entry in &team.units {
            let Some(def) = catalog.get(&entry.champion) else {
                error!("unknown champion '{}' in match setup", entry.champion);
                continue;
            };
            sequence += 1;
            let mut unit = Unit::new(
                def.name.clone(),
                team_id,
                sequence,
                entry.star_level,
                def.stats.clone(),
                entry.spawn_hex(team_id),
            );
            unit.traits = def.traits.clone();
            unit.items = entry.items.clone();
            info!("spawning {} at {:?}", unit.log_id(), unit.hex);
            commands.spawn(unit);
        }
    }
}

/// Ends the match when a team is wiped out or the duration cap is reached.
fn headless_check_match_end(
    clock: Res<SimClock>,
    rng: Res<GameRng>,
    units: Query<&Unit>,
    mut state: ResMut<HeadlessMatchState>,
    mut combat_log: ResMut<CombatLog>,
) {
    if state.match_complete || !clock.fight_started {
        return;
    }

    let alive = |team: u8| units.iter().filter(|u| u.team == team && u.alive).count();
    let (alive0, alive1) = (alive(0), alive(1));

    let winner = if clock.elapsed_ms >= state.max_duration_ms {
        info!("match timed out after {:.1}s", clock.elapsed_ms / 1000.0);
        None
    } else if alive0 == 0 && alive1 == 0 {
        None
    } else if alive1 == 0 {
        Some(0)
    } else if alive0 == 0 {
        Some(1)
    } else {
        return;
    };

    let message = match winner {
        Some(team) => format!("team {team} wins"),
        None => "match ends in a draw".to_string(),
    };
    info!("{message}");
    combat_log.log(CombatLogEventType::MatchEvent, message);

    let mut teams: [Vec<UnitMetadata>; 2] = [Vec::new(), Vec::new()];
    let mut members: Vec<&Unit> = units.iter().collect();
    members.sort_unstable_by_key(|unit| unit.sequence);
    for unit in members {
        teams[unit.team as usize].push(UnitMetadata {
            name: unit.name.clone(),
            star_level: unit.star_level,
            max_health: unit.max_health(clock.elapsed_ms),
            final_health: unit.health,
            damage_dealt: unit.damage_dealt,
            damage_taken: unit.damage_taken,
            final_hex: (unit.hex.col, unit.hex.row),
        });
    }

    let result = MatchResult {
        winner,
        match_time_ms: clock.elapsed_ms,
        random_seed: rng.seed,
        teams,
    };

    if let Some(path) = state.output_path.as_deref() {
        let metadata = MatchMetadata {
            winner: result.winner,
            match_time_ms: result.match_time_ms,
            random_seed: result.random_seed,
            teams: result.teams.clone(),
        };
        match combat_log.save_to_file(&metadata, Some(path)) {
            Ok(written) => info!("match report written to {written}"),
            Err(e) => error!("failed to write match report: {e}"),
        }
    }

    state.result = Some(result);
    state.match_complete = true;
}

fn headless_exit_on_complete(state: Res<HeadlessMatchState>, mut exit: EventWriter<AppExit>) {
    if state.match_complete {
        exit.send(AppExit::Success);
    }
}

/// Builds the app, runs the match to completion, and returns the result.
pub fn run_headless_match(setup: MatchSetup) -> Result<MatchResult, String> {
    let catalog = ChampionCatalog::load_embedded()?;
    setup.validate(&catalog)?;

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)))
        .add_plugins((DataPlugin, SimulationPlugin, CombatPlugin))
        .add_plugins(HeadlessPlugin { setup });
    app.run();

    let state = app
        .world_mut()
        .remove_resource::<HeadlessMatchState>()
        .ok_or_else(|| "headless match state missing after run".to_string())?;
    state
        .result
        .ok_or_else(|| "match ended without producing a result".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::config::{TeamSetup, UnitSetup};

    fn unit(champion: &str, col: i32, row: i32) -> UnitSetup {
        UnitSetup {
            champion: champion.to_string(),
            star_level: 1,
            hex: (col, row),
            items: Vec::new(),
        }
    }

    fn setup_1v1(a: &str, b: &str) -> MatchSetup {
        MatchSetup {
            teams: [
                TeamSetup {
                    units: vec![unit(a, 3, 3)],
                    augments: Vec::new(),
                },
                TeamSetup {
                    units: vec![unit(b, 3, 3)],
                    augments: Vec::new(),
                },
            ],
            max_duration_secs: 120.0,
            random_seed: Some(7),
            output_path: None,
        }
    }

    #[test]
    fn one_v_one_produces_a_winner() {
        let result = run_headless_match(setup_1v1("Duelist", "Stoneguard")).unwrap();
        assert!(result.winner.is_some());
        assert!(result.match_time_ms > 0.0);
        assert_eq!(result.teams[0].len(), 1);
        assert_eq!(result.teams[1].len(), 1);
    }

    #[test]
    fn invalid_setup_is_rejected_before_the_app_starts() {
        let mut setup = setup_1v1("Duelist", "Duelist");
        setup.teams[0].units[0].champion = "Nope".to_string();
        assert!(run_headless_match(setup).is_err());
    }

    #[test]
    fn seeded_matches_are_identical() {
        let a = run_headless_match(setup_1v1("Duelist", "Valkyrie")).unwrap();
        let b = run_headless_match(setup_1v1("Duelist", "Valkyrie")).unwrap();
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.match_time_ms, b.match_time_ms);
        for team in 0..2 {
            for (left, right) in a.teams[team].iter().zip(&b.teams[team]) {
                assert_eq!(left.final_health, right.final_health);
                assert_eq!(left.damage_dealt, right.damage_dealt);
            }
        }
    }
}
