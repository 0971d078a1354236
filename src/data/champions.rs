//! Champion cast functions.
//!
//! Each cast reads its numbers from the star-resolved variable table and
//! returns the spatial effects the spell puts into the world. Ability power
//! ratios treat 100 AP as 1.0x, so a Damage variable of 250 means 250 at
//! baseline power.

use crate::board::HexCoord;
use crate::sim::damage::{DamageCalculation, DamagePayload, DamageSourceType, DamageType};
use crate::sim::hooks::{CastContext, ChampionHooks, HookRegistry};
use crate::sim::spatial::{ProjectileState, RetargetPolicy, SpatialEffect};
use crate::sim::status::{StatusApplication, StatusEffectType};
use crate::sim::unit::Unit;

pub fn register(registry: &mut HookRegistry) {
    registry.register_champion("Stoneguard", ChampionHooks { cast: Some(seismic_slam) });
    registry.register_champion("Pyromancer", ChampionHooks { cast: Some(molten_bolt) });
    registry.register_champion("Windcaller", ChampionHooks { cast: Some(gale_lance) });
    registry.register_champion("Valkyrie", ChampionHooks { cast: Some(spear_of_dawn) });
}

/// Damage and stun everything adjacent to the caster.
fn seismic_slam(ctx: &mut CastContext) -> Vec<SpatialEffect> {
    let damage = ctx.variables.get("Damage");
    let stun_seconds = ctx.variables.get("StunSeconds");
    let hexes: Vec<HexCoord> = ctx.caster.hex.neighbors().into_iter().collect();
    vec![SpatialEffect::hex_burst(
        ctx.caster_entity,
        ctx.caster.team,
        "Seismic Slam",
        ctx.caster.source_stats(ctx.elapsed_ms),
        hexes,
        ctx.cast_seconds,
        0.0,
        0.5,
        ctx.elapsed_ms,
    )
    .with_payload(DamagePayload::new(
        "Seismic Slam",
        DamageSourceType::Spell,
        DamageType::Magic,
        vec![DamageCalculation::ability_power(damage / 100.0)],
    ))
    .with_statuses(vec![StatusApplication::new(
        StatusEffectType::Stunned,
        stun_seconds as f64 * 1000.0,
        0.0,
    )])]
}

/// Accelerating fireball at the current target; sets the victim ablaze and
/// leaves grievous wounds behind.
fn molten_bolt(ctx: &mut CastContext) -> Vec<SpatialEffect> {
    let Some(target) = ctx.target.or_else(|| ctx.enemies.first().copied()) else {
        return Vec::new();
    };
    let damage = ctx.variables.get("Damage");
    let burn_ms = ctx.variables.get("BurnSeconds") as f64 * 1000.0;
    let origin = ctx.caster.hex.world_coord();
    let state = ProjectileState::homing(origin, target.entity, target.hex.world_coord(), 6.0)
        .with_acceleration(8.0, 6.0, 14.0)
        .on_target_death(RetargetPolicy::Closest);
    vec![SpatialEffect::projectile(
        ctx.caster_entity,
        ctx.caster.team,
        "Molten Bolt",
        ctx.caster.source_stats(ctx.elapsed_ms),
        state,
        ctx.cast_seconds,
        ctx.elapsed_ms,
    )
    .with_payload(DamagePayload::new(
        "Molten Bolt",
        DamageSourceType::Spell,
        DamageType::Magic,
        vec![DamageCalculation::ability_power(damage / 100.0)],
    ))
    .with_statuses(vec![
        StatusApplication::new(StatusEffectType::Ablaze, burn_ms, 1.0),
        StatusApplication::new(StatusEffectType::GrievousWounds, burn_ms, 0.33),
    ])]
}

/// The gale tears mana from everything it passes through.
fn gale_lance_mana_rip(unit: &mut Unit, _elapsed_ms: f64) {
    unit.mana = (unit.mana - 10.0).max(0.0);
}

/// Straight-line piercing bolt through the target, slowing attack speed
/// along its path and ripping away some of each victim's mana.
fn gale_lance(ctx: &mut CastContext) -> Vec<SpatialEffect> {
    let Some(target) = ctx.target.or_else(|| ctx.enemies.first().copied()) else {
        return Vec::new();
    };
    let ad_ratio = ctx.variables.get("AdRatio");
    let range = ctx.variables.get("RangeHexes");
    let slow = ctx.variables.get("SlowPercent") / 100.0;
    let slow_ms = ctx.variables.get("SlowSeconds") as f64 * 1000.0;
    let origin = ctx.caster.hex.world_coord();
    let direction = target.hex.world_coord() - origin;
    let state = ProjectileState::fixed_range(origin, direction, range, 10.0);
    vec![SpatialEffect::projectile(
        ctx.caster_entity,
        ctx.caster.team,
        "Gale Lance",
        ctx.caster.source_stats(ctx.elapsed_ms),
        state,
        ctx.cast_seconds,
        ctx.elapsed_ms,
    )
    .with_payload(DamagePayload::new(
        "Gale Lance",
        DamageSourceType::Spell,
        DamageType::Physical,
        vec![DamageCalculation::attack_damage(ad_ratio / 100.0)],
    ))
    .with_statuses(vec![StatusApplication::new(
        StatusEffectType::AttackSpeedSlow,
        slow_ms,
        slow,
    )])
    .with_collision_callback(gale_lance_mana_rip)]
}

/// Thrown spear that returns to the caster, striking again on the way
/// back. If the target dies mid-flight it seeks the farthest enemy.
fn spear_of_dawn(ctx: &mut CastContext) -> Vec<SpatialEffect> {
    let Some(target) = ctx.target.or_else(|| ctx.enemies.first().copied()) else {
        return Vec::new();
    };
    let ad_ratio = ctx.variables.get("AdRatio");
    let origin = ctx.caster.hex.world_coord();
    let state = ProjectileState::homing(origin, target.entity, target.hex.world_coord(), 9.0)
        .returning_missile()
        .on_target_death(RetargetPolicy::Farthest);
    vec![SpatialEffect::projectile(
        ctx.caster_entity,
        ctx.caster.team,
        "Spear of Dawn",
        ctx.caster.source_stats(ctx.elapsed_ms),
        state,
        ctx.cast_seconds,
        ctx.elapsed_ms,
    )
    .with_payload(DamagePayload::new(
        "Spear of Dawn",
        DamageSourceType::Spell,
        DamageType::Physical,
        vec![DamageCalculation::attack_damage(ad_ratio / 100.0)],
    ))]
}
