//! Hook Registry
//!
//! Traits, items, augments and champion abilities plug into the engine as
//! tables of optional function pointers keyed by name. The engine calls
//! whichever hooks a table defines at fixed points in the tick; a table
//! defining nothing costs nothing. All stat changes made from hooks go
//! through bonus buckets or the damage pipeline, never raw field writes.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::board::HexCoord;

use super::clock::DelayedCallbacks;
use super::constants::CRIT_DAMAGE_MULTIPLIER;
use super::damage::{
    finalize, mitigate, DamageModifiers, DamagePayload, DamageSourceType, SourceStats,
};
use super::spatial::SpatialEffect;
use super::status::{StatusApplication, StatusEffectType};
use super::unit::Unit;
use super::{ActiveTraits, GameRng, TeamAugments};

/// Named scalar variables an ability reads, resolved per star level from
/// the champion catalog. A missing variable logs an error and reads as 0
/// so a catalog typo degrades the ability instead of crashing the match.
#[derive(Debug, Clone, Default)]
pub struct EffectVariables {
    owner: String,
    values: HashMap<String, f32>,
}

impl EffectVariables {
    pub fn new(owner: impl Into<String>, values: HashMap<String, f32>) -> Self {
        Self {
            owner: owner.into(),
            values,
        }
    }

    pub fn get(&self, key: &str) -> f32 {
        match self.values.get(key) {
            Some(value) => *value,
            None => {
                error!(
                    "{}: missing effect variable '{}', substituting 0",
                    self.owner, key
                );
                0.0
            }
        }
    }
}

/// Lightweight snapshot of a unit handed to cast functions for target
/// selection, so casting never needs a second mutable unit borrow.
#[derive(Debug, Clone, Copy)]
pub struct UnitRef {
    pub entity: Entity,
    pub hex: HexCoord,
    pub health_fraction: f32,
    pub distance: u32,
}

/// Context for team-scoped hooks (trait activation, augment setup).
pub struct TeamContext<'a, 'w> {
    pub elapsed_ms: f64,
    pub team: u8,
    /// Holders of the trait on this team; equals team size for augments.
    pub holder_count: usize,
    /// Living members of the team, in sequence order.
    pub members: &'a mut [&'w mut Unit],
    pub delays: &'a mut DelayedCallbacks,
}

pub type TeamHookFn = fn(&mut TeamContext);

/// Context for death-reaction hooks, run once per death against the
/// reacting team's living members.
pub struct DeathContext<'a, 'w> {
    pub elapsed_ms: f64,
    pub dead_name: &'a str,
    pub dead_team: u8,
    pub members: &'a mut [&'w mut Unit],
}

pub type DeathHookFn = fn(&mut DeathContext);

/// Context for basic-attack hooks, run after the attack's damage resolves.
pub struct AttackContext<'a> {
    pub elapsed_ms: f64,
    pub attacker_entity: Entity,
    pub attacker: &'a mut Unit,
    pub target: &'a mut Unit,
    pub crit: bool,
}

pub type AttackHookFn = fn(&mut AttackContext);

/// Context for damage modifier hooks. `modifiers` accumulates across every
/// hook on the hit before the final amount is computed.
pub struct DamageHookContext<'a> {
    pub elapsed_ms: f64,
    pub payload: &'a DamagePayload,
    pub source: Option<&'a mut Unit>,
    pub target: &'a mut Unit,
    pub modifiers: &'a mut DamageModifiers,
}

pub type DamageHookFn = fn(&mut DamageHookContext);

/// Context for champion cast functions. The cast mutates only the caster;
/// everything it does to the world comes back as spatial effects.
pub struct CastContext<'a> {
    pub elapsed_ms: f64,
    pub caster_entity: Entity,
    pub caster: &'a mut Unit,
    /// Current attack target, if still attackable.
    pub target: Option<UnitRef>,
    /// Attackable enemies, nearest first.
    pub enemies: &'a [UnitRef],
    /// Living allies other than the caster.
    pub allies: &'a [UnitRef],
    pub variables: &'a EffectVariables,
    /// Cast time of the ability being cast; spatial effects the cast
    /// spawns should delay their start by this much.
    pub cast_seconds: f32,
    pub rng: &'a mut GameRng,
}

pub type CastFn = fn(&mut CastContext) -> Vec<SpatialEffect>;

/// Triggered once when a unit first drops below `fraction` of max health.
#[derive(Clone, Copy)]
pub struct HealthThresholdHook {
    pub fraction: f32,
    pub hook: fn(&mut Unit, f64),
}

/// Hook table for a trait.
#[derive(Default, Clone, Copy)]
pub struct TraitHooks {
    /// Minimum holders for the trait to activate.
    pub min_units: usize,
    pub start_of_fight: Option<TeamHookFn>,
    /// Called every tick while the trait is active.
    pub update: Option<TeamHookFn>,
    pub on_ally_death: Option<DeathHookFn>,
    pub on_enemy_death: Option<DeathHookFn>,
    pub on_basic_attack: Option<AttackHookFn>,
    pub damage_dealt: Option<DamageHookFn>,
    pub damage_taken: Option<DamageHookFn>,
}

/// Hook table for an item.
#[derive(Default, Clone, Copy)]
pub struct ItemHooks {
    pub start_of_fight: Option<fn(&mut Unit, f64)>,
    /// Called once per tick during the holder's upkeep.
    pub update: Option<fn(&mut Unit, f64)>,
    pub on_basic_attack: Option<AttackHookFn>,
    pub damage_dealt: Option<DamageHookFn>,
    pub damage_taken: Option<DamageHookFn>,
}

/// Hook table for an augment (team-wide rule modifier).
#[derive(Default, Clone, Copy)]
pub struct AugmentHooks {
    pub start_of_fight: Option<TeamHookFn>,
    pub on_ally_death: Option<DeathHookFn>,
    pub on_enemy_death: Option<DeathHookFn>,
    pub health_threshold: Option<HealthThresholdHook>,
    pub damage_dealt: Option<DamageHookFn>,
    pub damage_taken: Option<DamageHookFn>,
}

/// Hook table for a champion.
#[derive(Default, Clone, Copy)]
pub struct ChampionHooks {
    pub cast: Option<CastFn>,
}

/// All registered hook tables, keyed by catalog name.
#[derive(Resource, Default)]
pub struct HookRegistry {
    traits: HashMap<String, TraitHooks>,
    items: HashMap<String, ItemHooks>,
    augments: HashMap<String, AugmentHooks>,
    champions: HashMap<String, ChampionHooks>,
}

impl HookRegistry {
    pub fn register_trait(&mut self, name: &str, hooks: TraitHooks) {
        self.traits.insert(name.to_string(), hooks);
    }

    pub fn register_item(&mut self, name: &str, hooks: ItemHooks) {
        self.items.insert(name.to_string(), hooks);
    }

    pub fn register_augment(&mut self, name: &str, hooks: AugmentHooks) {
        self.augments.insert(name.to_string(), hooks);
    }

    pub fn register_champion(&mut self, name: &str, hooks: ChampionHooks) {
        self.champions.insert(name.to_string(), hooks);
    }

    pub fn trait_hooks(&self, name: &str) -> Option<&TraitHooks> {
        self.traits.get(name)
    }

    pub fn item_hooks(&self, name: &str) -> Option<&ItemHooks> {
        self.items.get(name)
    }

    pub fn augment_hooks(&self, name: &str) -> Option<&AugmentHooks> {
        self.augments.get(name)
    }

    pub fn champion_hooks(&self, name: &str) -> Option<&ChampionHooks> {
        self.champions.get(name)
    }
}

/// Result of one resolved hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitOutcome {
    /// Damage that reached health after shields.
    pub dealt: f32,
    /// Post-modifier amount before shield absorption.
    pub final_amount: f32,
    pub killing_blow: bool,
    pub spell_shield_blocked: bool,
    /// Whether carried statuses landed on the target.
    pub statuses_applied: bool,
}

/// The single damage resolution path.
///
/// Order: evaluate formula, mitigate by resists, consume the target's spell
/// shield (spell damage only; a consumed shield also blocks the hit's
/// carried statuses), fold in crit and hook modifiers, clamp, apply through
/// shields, then land statuses on survivors. Damage hooks dispatch in a
/// fixed pass order on each side of the hit: traits, then items, then
/// augments.
#[allow(clippy::too_many_arguments)]
pub fn resolve_hit(
    registry: &HookRegistry,
    active_traits: &ActiveTraits,
    augments: &TeamAugments,
    payload: &DamagePayload,
    source_stats: SourceStats,
    mut source: Option<&mut Unit>,
    target: &mut Unit,
    statuses: &[StatusApplication],
    crit: bool,
    elapsed_ms: f64,
) -> HitOutcome {
    let raw = payload.evaluate(source_stats, target.max_health(elapsed_ms));
    let mitigated = mitigate(
        raw,
        payload.damage_type,
        target.armor(elapsed_ms),
        target.magic_resist(elapsed_ms),
    );

    let mut modifiers = DamageModifiers::default();
    if crit {
        modifiers.multiply(CRIT_DAMAGE_MULTIPLIER);
    }

    let mut spell_shield_blocked = false;
    if payload.source_type == DamageSourceType::Spell {
        if let Some(blocked) = target.consume_spell_shield() {
            modifiers.add(-blocked);
            spell_shield_blocked = true;
        }
        let aoe_reduction = target
            .statuses
            .amount_of(StatusEffectType::AoeDamageReduction);
        if aoe_reduction > 0.0 {
            modifiers.multiply(1.0 - aoe_reduction);
        }
    }

    if let Some(src) = source.as_deref_mut() {
        for hook in damage_hooks_for(registry, active_traits, augments, src, DamageSide::Dealt) {
            hook(&mut DamageHookContext {
                elapsed_ms,
                payload,
                source: Some(&mut *src),
                target,
                modifiers: &mut modifiers,
            });
        }
    }
    for hook in damage_hooks_for(registry, active_traits, augments, target, DamageSide::Taken) {
        hook(&mut DamageHookContext {
            elapsed_ms,
            payload,
            source: source.as_deref_mut(),
            target,
            modifiers: &mut modifiers,
        });
    }

    let final_amount = finalize(mitigated, modifiers);
    let (dealt, killing_blow) = target.take_damage(final_amount);
    if let Some(src) = source.as_deref_mut() {
        src.damage_dealt += dealt;
    }

    let statuses_applied = !spell_shield_blocked && target.alive && !statuses.is_empty();
    if statuses_applied {
        for status in statuses {
            status.apply_to(&mut target.statuses, elapsed_ms);
        }
    }

    HitOutcome {
        dealt,
        final_amount,
        killing_blow,
        spell_shield_blocked,
        statuses_applied,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DamageSide {
    Dealt,
    Taken,
}

/// Damage-modifier hooks interested in one side of a hit, gathered in the
/// fixed pass order: active traits, then items, then augments.
fn damage_hooks_for(
    registry: &HookRegistry,
    active_traits: &ActiveTraits,
    augments: &TeamAugments,
    unit: &Unit,
    side: DamageSide,
) -> Vec<DamageHookFn> {
    let dealt = side == DamageSide::Dealt;
    let mut hooks: Vec<DamageHookFn> = Vec::new();
    for name in &unit.traits {
        if !active_traits.is_active(unit.team, name) {
            continue;
        }
        if let Some(table) = registry.trait_hooks(name) {
            hooks.extend(if dealt {
                table.damage_dealt
            } else {
                table.damage_taken
            });
        }
    }
    for name in &unit.items {
        if let Some(table) = registry.item_hooks(name) {
            hooks.extend(if dealt {
                table.damage_dealt
            } else {
                table.damage_taken
            });
        }
    }
    for name in augments.for_team(unit.team) {
        if let Some(table) = registry.augment_hooks(name) {
            hooks.extend(if dealt {
                table.damage_dealt
            } else {
                table.damage_taken
            });
        }
    }
    hooks
}
