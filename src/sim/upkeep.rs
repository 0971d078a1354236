//! Per-tick Upkeep
//!
//! Housekeeping that runs before unit actions each tick: status and bonus
//! expiry, shield expiry, regeneration, bleed ticks, item periodic updates,
//! pending bonus application and health-threshold augments, plus the trait
//! update pass and end-of-tick death processing.

use bevy::prelude::*;

use crate::combat::events::{DamageDealtEvent, HealingEvent, StatusAppliedEvent, UnitDeathEvent};

use super::bonus::BonusKey;
use super::clock::{DelayedCallbacks, SimClock};
use super::damage::{DamagePayload, SourceStats};
use super::hooks::{DeathContext, HookRegistry, TeamContext};
use super::spatial::{strike, HitEvents};
use super::unit::Unit;
use super::{ActiveTraits, TeamAugments};

/// Advances every living unit's timed state by one tick.
pub fn unit_upkeep(
    clock: Res<SimClock>,
    registry: Res<HookRegistry>,
    active_traits: Res<ActiveTraits>,
    augments: Res<TeamAugments>,
    mut units: Query<(Entity, &mut Unit)>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut healing_events: EventWriter<HealingEvent>,
    mut status_events: EventWriter<StatusAppliedEvent>,
) {
    let elapsed_ms = clock.elapsed_ms;
    let delta_s = (clock.delta_ms / 1000.0) as f32;

    let mut order: Vec<(u32, Entity)> = units
        .iter()
        .filter(|(_, unit)| unit.alive)
        .map(|(entity, unit)| (unit.sequence, entity))
        .collect();
    order.sort_unstable();

    for (_, entity) in order {
        let mut bleed_hits: Vec<(DamagePayload, SourceStats, Option<Entity>)> = Vec::new();
        {
            let Ok((_, unit)) = units.get_mut(entity) else {
                continue;
            };
            let unit = unit.into_inner();

            unit.statuses.update(elapsed_ms);
            unit.bonuses.prune_expired(elapsed_ms);
            unit.shields
                .retain(|shield| shield.amount > 0.0 && elapsed_ms <= shield.expires_at_ms);

            let health_regen = unit.health_regen(elapsed_ms);
            if health_regen > 0.0 {
                unit.heal(health_regen * delta_s, elapsed_ms);
            }
            let mana_regen = unit.mana_regen(elapsed_ms);
            let max_mana = unit.max_mana(elapsed_ms);
            if mana_regen > 0.0 && max_mana > 0.0 {
                unit.mana = (unit.mana + mana_regen * delta_s).min(max_mana);
            }

            let items = unit.items.clone();
            for item in &items {
                if let Some(update) = registry.item_hooks(item).and_then(|hooks| hooks.update) {
                    update(unit, elapsed_ms);
                }
            }

            apply_pending_bonuses(entity, unit, elapsed_ms, &mut healing_events);

            for bleed in &mut unit.bleeds {
                while elapsed_ms >= bleed.next_tick_at_ms
                    && bleed.next_tick_at_ms <= bleed.expires_at_ms
                {
                    bleed_hits.push((bleed.payload.clone(), bleed.source_stats, bleed.source));
                    bleed.next_tick_at_ms += bleed.interval_ms;
                }
            }
            unit.bleeds.retain(|bleed| elapsed_ms <= bleed.expires_at_ms);
        }

        for (payload, source_stats, source) in bleed_hits {
            strike(
                &registry,
                &active_traits,
                &augments,
                &payload,
                source_stats,
                &[],
                source,
                entity,
                false,
                elapsed_ms,
                &mut units,
                &mut HitEvents {
                    damage: &mut damage_events,
                    status: &mut status_events,
                },
            );
        }

        check_health_thresholds(entity, &registry, &augments, &mut units, elapsed_ms);
    }
}

/// Move due pending bonuses into live buckets. `MissingHealth` variables
/// convert into an instant heal of that fraction of missing health instead
/// of a stat contribution. The bucket is created even when empty so it
/// doubles as a fired marker for one-shot triggers.
fn apply_pending_bonuses(
    entity: Entity,
    unit: &mut Unit,
    elapsed_ms: f64,
    healing_events: &mut EventWriter<HealingEvent>,
) {
    if unit.pending_bonuses.is_empty() {
        return;
    }
    let pending = std::mem::take(&mut unit.pending_bonuses);
    let (due, rest): (Vec<_>, Vec<_>) = pending
        .into_iter()
        .partition(|pending| elapsed_ms >= pending.applies_at_ms);
    unit.pending_bonuses = rest;

    for pending in due {
        let (heals, stats): (Vec<_>, Vec<_>) = pending
            .variables
            .into_iter()
            .partition(|variable| variable.key == BonusKey::MissingHealth);
        for heal in heals {
            let missing = unit.max_health(elapsed_ms) - unit.health;
            let applied = unit.heal(missing * heal.amount, elapsed_ms);
            if applied > 0.0 {
                healing_events.send(HealingEvent {
                    source: entity,
                    target: entity,
                    amount: applied,
                });
            }
        }
        // Append, so repeated grants under one label keep earlier stacks.
        // Adding an empty list still creates the bucket, preserving the
        // fired-once marker.
        unit.bonuses.add(&pending.label, stats, elapsed_ms);
    }
}

/// Fires health-threshold augment hooks the first time a unit crosses
/// below the configured fraction. The augment's bonus bucket (live or
/// pending) marks it as already fired.
fn check_health_thresholds(
    entity: Entity,
    registry: &HookRegistry,
    augments: &TeamAugments,
    units: &mut Query<(Entity, &mut Unit)>,
    elapsed_ms: f64,
) {
    let Ok((_, unit)) = units.get_mut(entity) else {
        return;
    };
    let unit = unit.into_inner();
    if !unit.alive {
        return;
    }
    for augment in augments.for_team(unit.team) {
        let Some(threshold) = registry
            .augment_hooks(augment)
            .and_then(|hooks| hooks.health_threshold)
        else {
            continue;
        };
        let fraction = unit.health / unit.max_health(elapsed_ms).max(1.0);
        let already_fired = unit.bonuses.has(augment)
            || unit
                .pending_bonuses
                .iter()
                .any(|pending| pending.label == *augment);
        if fraction <= threshold.fraction && !already_fired {
            (threshold.hook)(unit, elapsed_ms);
        }
    }
}

/// Runs every active trait's per-tick update hook against its team.
pub fn trait_updates(
    clock: Res<SimClock>,
    registry: Res<HookRegistry>,
    active_traits: Res<ActiveTraits>,
    mut delays: ResMut<DelayedCallbacks>,
    mut units: Query<&mut Unit>,
) {
    let elapsed_ms = clock.elapsed_ms;
    let mut members: Vec<&mut Unit> = units
        .iter_mut()
        .map(Mut::into_inner)
        .filter(|unit| unit.alive)
        .collect();
    members.sort_unstable_by_key(|unit| unit.sequence);
    let (mut team0, mut team1): (Vec<_>, Vec<_>) =
        members.into_iter().partition(|unit| unit.team == 0);

    for (team, members) in [(0u8, &mut team0), (1u8, &mut team1)] {
        for trait_name in active_traits.for_team(team) {
            let Some(update) = registry
                .trait_hooks(trait_name)
                .and_then(|hooks| hooks.update)
            else {
                continue;
            };
            let holder_count = members
                .iter()
                .filter(|unit| unit.traits.iter().any(|name| name == trait_name))
                .count();
            update(&mut TeamContext {
                elapsed_ms,
                team,
                holder_count,
                members: &mut members[..],
                delays: &mut delays,
            });
        }
    }
}

/// Mana granted to a whole team after a delay, carried from a delayed
/// callback into the ECS through an event.
#[derive(Event, Debug, Clone, Copy)]
pub struct TeamManaSurge {
    pub team: u8,
    pub amount: f32,
}

pub fn apply_team_mana(
    clock: Res<SimClock>,
    mut events: EventReader<TeamManaSurge>,
    mut units: Query<&mut Unit>,
) {
    let elapsed_ms = clock.elapsed_ms;
    for event in events.read() {
        for mut unit in units.iter_mut() {
            if !unit.alive || unit.team != event.team {
                continue;
            }
            let max_mana = unit.max_mana(elapsed_ms);
            if max_mana > 0.0 {
                unit.mana = (unit.mana + event.amount).min(max_mana);
            }
        }
    }
}

/// End-of-tick death sweep: any unit that died this tick, by whatever path,
/// has its death announced exactly once, stale target references cleared,
/// and ally/enemy death hooks run. Dead units stay in the world so the
/// final report can read their state.
pub fn process_deaths(
    clock: Res<SimClock>,
    registry: Res<HookRegistry>,
    active_traits: Res<ActiveTraits>,
    augments: Res<TeamAugments>,
    mut death_events: EventWriter<UnitDeathEvent>,
    mut units: Query<(Entity, &mut Unit)>,
) {
    let elapsed_ms = clock.elapsed_ms;
    let mut deaths: Vec<(u32, Entity, String, u8, Option<Entity>)> = units
        .iter()
        .filter(|(_, unit)| !unit.alive && !unit.death_processed)
        .map(|(entity, unit)| {
            (
                unit.sequence,
                entity,
                unit.name.clone(),
                unit.team,
                unit.killer,
            )
        })
        .collect();
    deaths.sort_unstable_by_key(|(sequence, ..)| *sequence);

    for (_, dead_entity, dead_name, dead_team, killer) in deaths {
        if let Ok((_, mut unit)) = units.get_mut(dead_entity) {
            unit.death_processed = true;
        }
        death_events.send(UnitDeathEvent {
            unit: dead_entity,
            killer,
        });
        for (_, mut unit) in units.iter_mut() {
            if unit.target == Some(dead_entity) {
                unit.target = None;
            }
        }

        let mut members: Vec<&mut Unit> = units
            .iter_mut()
            .map(|(_, unit)| unit.into_inner())
            .filter(|unit| unit.alive)
            .collect();
        members.sort_unstable_by_key(|unit| unit.sequence);
        let (mut team0, mut team1): (Vec<_>, Vec<_>) =
            members.into_iter().partition(|unit| unit.team == 0);

        for (team, members) in [(0u8, &mut team0), (1u8, &mut team1)] {
            let ally_side = team == dead_team;
            let mut context = DeathContext {
                elapsed_ms,
                dead_name: &dead_name,
                dead_team,
                members: &mut members[..],
            };
            for trait_name in active_traits.for_team(team) {
                let Some(hooks) = registry.trait_hooks(trait_name) else {
                    continue;
                };
                let hook = if ally_side {
                    hooks.on_ally_death
                } else {
                    hooks.on_enemy_death
                };
                if let Some(hook) = hook {
                    hook(&mut context);
                }
            }
            for augment in augments.for_team(team) {
                let Some(hooks) = registry.augment_hooks(augment) else {
                    continue;
                };
                let hook = if ally_side {
                    hooks.on_ally_death
                } else {
                    hooks.on_enemy_death
                };
                if let Some(hook) = hook {
                    hook(&mut context);
                }
            }
        }
    }
}
