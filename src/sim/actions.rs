//! Unit Actions
//!
//! One decision per unit per tick, in fixed sequence order: cast if mana is
//! full, otherwise attack if the target is in range and the attack timer is
//! up, otherwise take one step along the path to the target. Action
//! lockouts (fight-start positioning, cast time, movement) gate everything.

use std::collections::HashSet;

use bevy::prelude::*;

use crate::board::HexCoord;
use crate::combat::events::{AbilityCastEvent, DamageDealtEvent, StatusAppliedEvent};
use crate::data::ChampionCatalog;

use super::clock::SimClock;
use super::constants::{BASE_MOVE_HEX_MS, MANA_GAIN_PER_ATTACK};
use super::damage::{DamageCalculation, DamagePayload, DamageSourceType, DamageType};
use super::hooks::{AttackContext, CastContext, HookRegistry, UnitRef};
use super::spatial::{strike, HitEvents};
use super::targeting::{nearest_enemy, TargetSnapshot};
use super::unit::Unit;
use super::{ActiveTraits, GameRng, TeamAugments};

/// Drives every living unit's action for the tick.
pub fn unit_actions(
    mut commands: Commands,
    clock: Res<SimClock>,
    registry: Res<HookRegistry>,
    catalog: Res<ChampionCatalog>,
    active_traits: Res<ActiveTraits>,
    augments: Res<TeamAugments>,
    mut rng: ResMut<GameRng>,
    mut units: Query<(Entity, &mut Unit)>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut status_events: EventWriter<StatusAppliedEvent>,
    mut cast_events: EventWriter<AbilityCastEvent>,
) {
    let elapsed_ms = clock.elapsed_ms;

    let mut snapshot: Vec<TargetSnapshot> = units
        .iter()
        .filter(|(_, unit)| unit.alive)
        .map(|(entity, unit)| TargetSnapshot {
            entity,
            team: unit.team,
            hex: unit.hex,
            sequence: unit.sequence,
            attackable: unit.attackable(),
            health_fraction: unit.health / unit.max_health(elapsed_ms).max(1.0),
        })
        .collect();
    snapshot.sort_unstable_by_key(|unit| unit.sequence);

    let mut occupied: HashSet<HexCoord> = snapshot.iter().map(|unit| unit.hex).collect();
    let order: Vec<Entity> = snapshot.iter().map(|unit| unit.entity).collect();

    for entity in order {
        let Ok((_, unit)) = units.get(entity) else {
            continue;
        };
        // Banished or stealthed units sit the tick out, as do units with no
        // attack range at all.
        if !unit.interactable() || unit.base.range == 0 || unit.action_locked(elapsed_ms) {
            continue;
        }

        // Validate or reacquire the target.
        let my_hex = unit.hex;
        let my_team = unit.team;
        let range = unit.base.range;
        let current_target = unit.target.filter(|target| {
            snapshot
                .iter()
                .any(|candidate| candidate.entity == *target && candidate.attackable)
        });
        let target = match current_target {
            Some(target) => Some(target),
            None => nearest_enemy(my_hex, my_team, &snapshot).map(|(enemy, _)| enemy),
        };
        if unit.target != target {
            if let Ok((_, mut unit)) = units.get_mut(entity) {
                unit.target = target;
            }
        }
        let Some(target_entity) = target else {
            continue;
        };
        let target_hex = snapshot
            .iter()
            .find(|candidate| candidate.entity == target_entity)
            .map(|candidate| candidate.hex);
        let Some(target_hex) = target_hex else {
            continue;
        };

        let Ok((_, unit)) = units.get(entity) else {
            continue;
        };
        let in_range = my_hex.distance_to(target_hex) as u32 <= range;

        if unit.can_cast(elapsed_ms) {
            if try_cast(
                entity,
                target_entity,
                elapsed_ms,
                &registry,
                &catalog,
                &mut rng,
                &mut units,
                &snapshot,
                &mut commands,
                &mut cast_events,
            ) {
                continue;
            }
        }

        let Ok((_, unit)) = units.get(entity) else {
            continue;
        };
        if in_range && unit.can_attack(elapsed_ms) {
            basic_attack(
                entity,
                target_entity,
                elapsed_ms,
                &registry,
                &active_traits,
                &augments,
                &mut rng,
                &mut units,
                &mut HitEvents {
                    damage: &mut damage_events,
                    status: &mut status_events,
                },
            );
            continue;
        }

        if !in_range {
            // One step along the path; the moved-from hex frees up for
            // units later in the order.
            occupied.remove(&my_hex);
            let step = super::targeting::path_step(my_hex, target_hex, range, &occupied);
            match step {
                Some(next_hex) => {
                    occupied.insert(next_hex);
                    if let Some(entry) = snapshot
                        .iter_mut()
                        .find(|candidate| candidate.entity == entity)
                    {
                        entry.hex = next_hex;
                    }
                    if let Ok((_, mut unit)) = units.get_mut(entity) {
                        let move_ms = BASE_MOVE_HEX_MS / unit.move_speed(elapsed_ms) as f64;
                        unit.hex = next_hex;
                        unit.action_locked_until_ms = elapsed_ms + move_ms;
                    }
                }
                None => {
                    occupied.insert(my_hex);
                }
            }
        }
    }
}

/// Attempt a cast. Returns false when the champion has no cast hook so the
/// unit falls through to attacking with its mana still full.
#[allow(clippy::too_many_arguments)]
fn try_cast(
    entity: Entity,
    target_entity: Entity,
    elapsed_ms: f64,
    registry: &HookRegistry,
    catalog: &ChampionCatalog,
    rng: &mut GameRng,
    units: &mut Query<(Entity, &mut Unit)>,
    snapshot: &[TargetSnapshot],
    commands: &mut Commands,
    cast_events: &mut EventWriter<AbilityCastEvent>,
) -> bool {
    let Ok((_, unit)) = units.get(entity) else {
        return false;
    };
    let Some(cast) = registry
        .champion_hooks(&unit.name)
        .and_then(|hooks| hooks.cast)
    else {
        return false;
    };
    let Some(ability) = catalog.ability_of(&unit.name) else {
        return false;
    };
    let variables = ability.variables_for_star(unit.star_level);
    let ability_name = ability.name.clone();
    let cast_seconds = ability.cast_seconds;
    let my_hex = unit.hex;
    let my_team = unit.team;

    let unit_ref = |candidate: &TargetSnapshot| UnitRef {
        entity: candidate.entity,
        hex: candidate.hex,
        health_fraction: candidate.health_fraction,
        distance: my_hex.distance_to(candidate.hex) as u32,
    };
    let mut enemies: Vec<UnitRef> = snapshot
        .iter()
        .filter(|candidate| candidate.team != my_team && candidate.attackable)
        .map(unit_ref)
        .collect();
    enemies.sort_unstable_by_key(|candidate| candidate.distance);
    let allies: Vec<UnitRef> = snapshot
        .iter()
        .filter(|candidate| candidate.team == my_team && candidate.entity != entity)
        .map(unit_ref)
        .collect();
    let target = snapshot
        .iter()
        .find(|candidate| candidate.entity == target_entity && candidate.attackable)
        .map(unit_ref);

    let Ok((_, caster)) = units.get_mut(entity) else {
        return false;
    };
    let caster = caster.into_inner();
    caster.mana = 0.0;
    caster.action_locked_until_ms = elapsed_ms + cast_seconds as f64 * 1000.0;

    let effects = cast(&mut CastContext {
        elapsed_ms,
        caster_entity: entity,
        caster,
        target,
        enemies: &enemies,
        allies: &allies,
        variables: &variables,
        cast_seconds,
        rng,
    });
    for effect in effects {
        commands.spawn(effect);
    }
    cast_events.send(AbilityCastEvent {
        caster: entity,
        ability_name,
    });
    true
}

/// Land one basic attack on the target, then run attack hooks.
#[allow(clippy::too_many_arguments)]
fn basic_attack(
    entity: Entity,
    target_entity: Entity,
    elapsed_ms: f64,
    registry: &HookRegistry,
    active_traits: &ActiveTraits,
    augments: &TeamAugments,
    rng: &mut GameRng,
    units: &mut Query<(Entity, &mut Unit)>,
    events: &mut HitEvents,
) {
    let Ok((_, unit)) = units.get(entity) else {
        return;
    };
    let crit = rng.percent_roll() < unit.crit_chance(elapsed_ms) * 100.0;
    let source_stats = unit.source_stats(elapsed_ms);
    let attack_interval_ms = 1000.0 / unit.attack_speed(elapsed_ms) as f64;
    let payload = DamagePayload::new(
        "Attack",
        DamageSourceType::Attack,
        DamageType::Physical,
        vec![DamageCalculation::attack_damage(1.0)],
    );

    strike(
        registry,
        active_traits,
        augments,
        &payload,
        source_stats,
        &[],
        Some(entity),
        target_entity,
        crit,
        elapsed_ms,
        units,
        events,
    );

    // Attack hooks see both combatants after the hit lands.
    if let Ok([(_, attacker), (_, target)]) = units.get_many_mut([entity, target_entity]) {
        let attacker = attacker.into_inner();
        let target = target.into_inner();
        if target.alive {
            let items = attacker.items.clone();
            let traits: Vec<String> = attacker
                .traits
                .iter()
                .filter(|name| active_traits.is_active(attacker.team, name))
                .cloned()
                .collect();
            let mut context = AttackContext {
                elapsed_ms,
                attacker_entity: entity,
                attacker,
                target,
                crit,
            };
            for item in &items {
                if let Some(hook) = registry
                    .item_hooks(item)
                    .and_then(|hooks| hooks.on_basic_attack)
                {
                    hook(&mut context);
                }
            }
            for trait_name in &traits {
                if let Some(hook) = registry
                    .trait_hooks(trait_name)
                    .and_then(|hooks| hooks.on_basic_attack)
                {
                    hook(&mut context);
                }
            }
        }
    }

    if let Ok((_, mut unit)) = units.get_mut(entity) {
        unit.attack_ready_at_ms = elapsed_ms + attack_interval_ms;
        let max_mana = unit.max_mana(elapsed_ms);
        if max_mana > 0.0 {
            unit.mana = (unit.mana + MANA_GAIN_PER_ATTACK).min(max_mana);
        }
    }
}
