//! Simulation Core
//!
//! The tick runs in three chained phases: Upkeep (delays, trait updates,
//! per-unit timed state), Actions (one decision per unit), Effects (spatial
//! effect movement and activation, then death processing). All of it gates
//! on the clock having ticked this frame; the very first frame instead runs
//! the start-of-fight pass.

use std::collections::{HashMap, HashSet};

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{nearest_free_hex, HexCoord};
use crate::combat::log::{CombatLog, CombatLogEventType};

pub mod actions;
pub mod bonus;
pub mod clock;
pub mod constants;
pub mod damage;
pub mod hooks;
pub mod spatial;
pub mod status;
pub mod targeting;
pub mod unit;
pub mod upkeep;

use clock::{advance_clock, process_delayed_callbacks, sim_ticked, DelayedCallbacks, SimClock};
use constants::{MOVE_LOCKOUT_JUMPERS_MS, MOVE_LOCKOUT_MELEE_MS};
use hooks::{HookRegistry, TeamContext};
use unit::Unit;

/// Seedable random source for everything chance-based in the simulation.
/// Two runs with the same seed and the same teams replay identically.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    pub seed: Option<u64>,
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform roll in `[0, 100)`, for percentage checks.
    pub fn percent_roll(&mut self) -> f32 {
        self.random_f32() * 100.0
    }
}

/// Traits that reached their activation count, per team. Computed once at
/// fight start; units do not leave the board mid-fight, so counts never
/// change.
#[derive(Resource, Default)]
pub struct ActiveTraits {
    pub teams: [Vec<String>; 2],
}

impl ActiveTraits {
    pub fn for_team(&self, team: u8) -> &[String] {
        &self.teams[team as usize]
    }

    pub fn is_active(&self, team: u8, name: &str) -> bool {
        self.teams[team as usize].iter().any(|active| active == name)
    }
}

/// Augments each team brought into the match.
#[derive(Resource, Default, Clone)]
pub struct TeamAugments {
    pub teams: [Vec<String>; 2],
}

impl TeamAugments {
    pub fn for_team(&self, team: u8) -> &[String] {
        &self.teams[team as usize]
    }
}

/// Tick phases, chained in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimPhase {
    Upkeep,
    Actions,
    Effects,
}

/// Registers the simulation resources and the phased tick systems.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimClock>()
            .init_resource::<GameRng>()
            .init_resource::<DelayedCallbacks>()
            .init_resource::<HookRegistry>()
            .init_resource::<ActiveTraits>()
            .init_resource::<TeamAugments>()
            .add_event::<upkeep::TeamManaSurge>()
            .configure_sets(
                Update,
                (SimPhase::Upkeep, SimPhase::Actions, SimPhase::Effects).chain(),
            )
            .add_systems(
                Update,
                (
                    advance_clock,
                    start_of_fight.run_if(fight_not_started),
                )
                    .chain()
                    .before(SimPhase::Upkeep),
            )
            .add_systems(
                Update,
                (
                    process_delayed_callbacks,
                    upkeep::apply_team_mana,
                    upkeep::trait_updates,
                    upkeep::unit_upkeep,
                )
                    .chain()
                    .in_set(SimPhase::Upkeep)
                    .run_if(sim_ticked),
            )
            .add_systems(
                Update,
                actions::unit_actions
                    .in_set(SimPhase::Actions)
                    .run_if(sim_ticked),
            )
            .add_systems(
                Update,
                (spatial::update_spatial_effects, upkeep::process_deaths)
                    .chain()
                    .in_set(SimPhase::Effects)
                    .run_if(sim_ticked),
            );
    }
}

fn fight_not_started(clock: Res<SimClock>) -> bool {
    !clock.fight_started
}

/// One-time setup on the first frame: jumpers leap to the far side, start
/// lockouts are applied, active traits are computed, and every
/// start-of-fight hook runs. Only then does the clock begin advancing.
pub fn start_of_fight(
    mut clock: ResMut<SimClock>,
    registry: Res<HookRegistry>,
    augments: Res<TeamAugments>,
    mut active_traits: ResMut<ActiveTraits>,
    mut delays: ResMut<DelayedCallbacks>,
    mut combat_log: ResMut<CombatLog>,
    mut units: Query<(Entity, &mut Unit)>,
) {
    let elapsed_ms = 0.0;

    // Jumpers reposition toward the opposite corner of the board before
    // anyone acts, landing on the nearest free hex.
    let mut occupied: HashSet<HexCoord> = units.iter().map(|(_, unit)| unit.hex).collect();
    let jumpers: Vec<(Entity, HexCoord, HexCoord)> = units
        .iter()
        .filter(|(_, unit)| unit.base.jumper)
        .map(|(entity, unit)| (entity, unit.hex, unit.start_hex))
        .collect();
    for (entity, from, start_hex) in jumpers {
        if let Some(destination) = nearest_free_hex(start_hex.invert(), &occupied) {
            occupied.remove(&from);
            occupied.insert(destination);
            if let Ok((_, mut unit)) = units.get_mut(entity) {
                unit.hex = destination;
            }
        }
    }

    for (_, unit) in units.iter_mut() {
        let unit = unit.into_inner();
        unit.action_locked_until_ms = if unit.base.jumper {
            MOVE_LOCKOUT_JUMPERS_MS
        } else {
            MOVE_LOCKOUT_MELEE_MS
        };
        let items = unit.items.clone();
        for item in &items {
            if let Some(hook) = registry
                .item_hooks(item)
                .and_then(|hooks| hooks.start_of_fight)
            {
                hook(unit, elapsed_ms);
            }
        }
    }

    for team in 0..2u8 {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for (_, unit) in units.iter().filter(|(_, unit)| unit.team == team) {
            for name in &unit.traits {
                *counts.entry(name.clone()).or_default() += 1;
            }
        }
        let mut names: Vec<String> = counts
            .into_iter()
            .filter(|(name, count)| {
                registry
                    .trait_hooks(name)
                    .is_some_and(|hooks| *count >= hooks.min_units)
            })
            .map(|(name, _)| name)
            .collect();
        names.sort();
        active_traits.teams[team as usize] = names;
    }

    let mut members: Vec<&mut Unit> = units
        .iter_mut()
        .map(|(_, unit)| unit.into_inner())
        .collect();
    members.sort_unstable_by_key(|unit| unit.sequence);
    let (mut team0, mut team1): (Vec<&mut Unit>, Vec<&mut Unit>) =
        members.into_iter().partition(|unit| unit.team == 0);
    for (team, members) in [(0u8, &mut team0), (1u8, &mut team1)] {
        let team_size = members.len();
        for trait_name in active_traits.for_team(team) {
            let Some(hook) = registry
                .trait_hooks(trait_name)
                .and_then(|hooks| hooks.start_of_fight)
            else {
                continue;
            };
            let holder_count = members
                .iter()
                .filter(|unit| unit.traits.iter().any(|name| name == trait_name))
                .count();
            hook(&mut TeamContext {
                elapsed_ms,
                team,
                holder_count,
                members: &mut members[..],
                delays: &mut delays,
            });
        }
        for augment in augments.for_team(team) {
            let Some(hook) = registry
                .augment_hooks(augment)
                .and_then(|hooks| hooks.start_of_fight)
            else {
                continue;
            };
            hook(&mut TeamContext {
                elapsed_ms,
                team,
                holder_count: team_size,
                members: &mut members[..],
                delays: &mut delays,
            });
        }
    }

    clock.fight_started = true;
    combat_log.log(CombatLogEventType::MatchEvent, "combat begins".to_string());
}
