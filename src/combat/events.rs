//! Combat events
//!
//! Bevy events emitted by the simulation systems. The combat log records
//! them; death processing fans ally/enemy-death hooks out from
//! `UnitDeathEvent` at the end of each tick.

use bevy::prelude::*;

use crate::sim::damage::{DamageSourceType, DamageType};

/// Damage was applied to a unit.
#[derive(Event, Debug, Clone)]
pub struct DamageDealtEvent {
    pub source: Option<Entity>,
    pub target: Entity,
    /// Label of the calculation that produced the damage (spell, item, bleed).
    pub source_id: String,
    pub source_type: DamageSourceType,
    pub damage_type: DamageType,
    /// Damage actually subtracted from health, after shields and mitigation.
    pub amount: f32,
    pub is_killing_blow: bool,
}

/// A unit was healed.
#[derive(Event, Debug, Clone)]
pub struct HealingEvent {
    pub source: Entity,
    pub target: Entity,
    /// Healing actually applied, after grievous wounds and the max-health cap.
    pub amount: f32,
}

/// A unit died this tick. Death hooks are dispatched once per event at the
/// end of the tick, after all damage sources have run.
#[derive(Event, Debug, Clone)]
pub struct UnitDeathEvent {
    pub unit: Entity,
    pub killer: Option<Entity>,
}

/// A unit cast its ability.
#[derive(Event, Debug, Clone)]
pub struct AbilityCastEvent {
    pub caster: Entity,
    pub ability_name: String,
}

/// A timed status effect was applied to a unit.
#[derive(Event, Debug, Clone)]
pub struct StatusAppliedEvent {
    pub target: Entity,
    pub effect_name: &'static str,
    pub duration_ms: f64,
}
