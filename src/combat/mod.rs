//! Combat event and logging infrastructure
//!
//! The simulation systems communicate through the events defined here; the
//! log records them with simulated timestamps for post-match analysis.

use bevy::prelude::*;

pub mod events;
pub mod log;

use events::*;
use log::{CombatLog, CombatLogEventType};

use crate::sim::clock::SimClock;
use crate::sim::unit::Unit;

/// Registers combat events and the combat log.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DamageDealtEvent>()
            .add_event::<HealingEvent>()
            .add_event::<UnitDeathEvent>()
            .add_event::<AbilityCastEvent>()
            .add_event::<StatusAppliedEvent>()
            .init_resource::<CombatLog>()
            .add_systems(PostUpdate, record_combat_log);
    }
}

/// Drains combat events into the log, resolving entity ids to log ids.
///
/// Runs in `PostUpdate` so every event from the tick is visible.
fn record_combat_log(
    clock: Res<SimClock>,
    mut combat_log: ResMut<CombatLog>,
    units: Query<&Unit>,
    mut damage_events: EventReader<DamageDealtEvent>,
    mut healing_events: EventReader<HealingEvent>,
    mut death_events: EventReader<UnitDeathEvent>,
    mut cast_events: EventReader<AbilityCastEvent>,
    mut status_events: EventReader<StatusAppliedEvent>,
) {
    combat_log.match_time_ms = clock.elapsed_ms;

    let log_id = |entity: Entity| -> Option<String> {
        units.get(entity).ok().map(|unit| unit.log_id())
    };

    for event in damage_events.read() {
        let Some(target_id) = log_id(event.target) else {
            continue;
        };
        let source_id = event.source.and_then(log_id);
        let message = match &source_id {
            Some(source) => format!(
                "{}'s {} hits {} for {:.0} damage",
                source, event.source_id, target_id, event.amount
            ),
            None => format!(
                "{} takes {:.0} damage from {}",
                target_id, event.amount, event.source_id
            ),
        };
        combat_log.log_damage(
            source_id,
            target_id,
            event.source_id.clone(),
            event.amount,
            event.is_killing_blow,
            message,
        );
    }

    for event in healing_events.read() {
        let (Some(source_id), Some(target_id)) = (log_id(event.source), log_id(event.target))
        else {
            continue;
        };
        combat_log.log(
            CombatLogEventType::Healing,
            format!("{} heals {} for {:.0}", source_id, target_id, event.amount),
        );
    }

    for event in cast_events.read() {
        if let Some(caster_id) = log_id(event.caster) {
            combat_log.log(
                CombatLogEventType::AbilityCast,
                format!("{} casts {}", caster_id, event.ability_name),
            );
        }
    }

    for event in status_events.read() {
        if let Some(target_id) = log_id(event.target) {
            combat_log.log(
                CombatLogEventType::StatusApplied,
                format!(
                    "{} is afflicted by {} for {:.0}ms",
                    target_id, event.effect_name, event.duration_ms
                ),
            );
        }
    }

    for event in death_events.read() {
        if let Some(unit_id) = log_id(event.unit) {
            let killer_id = event.killer.and_then(log_id);
            let message = format!("{} has been eliminated", unit_id);
            combat_log.log_death(unit_id, killer_id, message);
        }
    }
}
