//! Item hook tables.

use crate::sim::bonus::{BonusKey, BonusVariable};
use crate::sim::damage::{
    mitigate, DamageCalculation, DamagePayload, DamageSourceType, DamageType,
};
use crate::sim::hooks::{AttackContext, DamageHookContext, HookRegistry, ItemHooks};
use crate::sim::status::{StatusApplication, StatusEffectType};
use crate::sim::unit::{Bleed, Unit};

pub fn register(registry: &mut HookRegistry) {
    registry.register_item(
        "Aegis Charm",
        ItemHooks {
            start_of_fight: Some(aegis_charm_start),
            ..Default::default()
        },
    );
    registry.register_item(
        "Giants Plate",
        ItemHooks {
            start_of_fight: Some(giants_plate_start),
            ..Default::default()
        },
    );
    registry.register_item(
        "Ember Brand",
        ItemHooks {
            on_basic_attack: Some(ember_brand_on_attack),
            ..Default::default()
        },
    );
    registry.register_item(
        "Thorn Mail",
        ItemHooks {
            damage_taken: Some(thorn_mail_on_taken),
            ..Default::default()
        },
    );
    registry.register_item(
        "Frost Edge",
        ItemHooks {
            damage_dealt: Some(frost_edge_on_dealt),
            ..Default::default()
        },
    );
    registry.register_item(
        "Adaptive Plating",
        ItemHooks {
            update: Some(adaptive_plating_update),
            ..Default::default()
        },
    );
}

/// One spell shield that blocks the next enemy spell outright, plus a
/// little magic resist.
fn aegis_charm_start(unit: &mut Unit, elapsed_ms: f64) {
    unit.spell_shield = Some(250.0);
    unit.bonuses.set(
        "Aegis Charm",
        vec![BonusVariable::new(BonusKey::MagicResist, 15.0)],
        elapsed_ms,
    );
}

/// Raw max health. Applied before the fight, so the holder starts full.
fn giants_plate_start(unit: &mut Unit, elapsed_ms: f64) {
    unit.bonuses.set(
        "Giants Plate",
        vec![BonusVariable::new(BonusKey::Health, 300.0)],
        elapsed_ms,
    );
    unit.health = unit.max_health(elapsed_ms);
}

/// Attacks brand the target with a two-second burn.
fn ember_brand_on_attack(ctx: &mut AttackContext) {
    let payload = DamagePayload::new(
        "Ember Brand",
        DamageSourceType::Bleed,
        DamageType::Magic,
        vec![DamageCalculation::ability_power(0.2)],
    );
    ctx.target.apply_bleed(Bleed {
        source_key: "Ember Brand".to_string(),
        source: Some(ctx.attacker_entity),
        payload,
        source_stats: ctx.attacker.source_stats(ctx.elapsed_ms),
        interval_ms: 1000.0,
        next_tick_at_ms: ctx.elapsed_ms + 1000.0,
        expires_at_ms: ctx.elapsed_ms + 2000.0,
    });
    StatusApplication::new(StatusEffectType::Ablaze, 2000.0, 1.0)
        .apply_to(&mut ctx.target.statuses, ctx.elapsed_ms);
}

/// Reflects a sliver of magic damage at physical attackers. The reflect
/// bypasses the pipeline, so the death sweep is what reports any kill it
/// scores.
fn thorn_mail_on_taken(ctx: &mut DamageHookContext) {
    if ctx.payload.damage_type != DamageType::Physical {
        return;
    }
    if let Some(source) = ctx.source.as_deref_mut() {
        let reflected = mitigate(
            30.0,
            DamageType::Magic,
            0.0,
            source.magic_resist(ctx.elapsed_ms),
        );
        source.take_damage(reflected);
    }
}

/// Attacks chill the target, slowing its attack speed.
fn frost_edge_on_dealt(ctx: &mut DamageHookContext) {
    if ctx.payload.source_type != DamageSourceType::Attack {
        return;
    }
    StatusApplication::new(StatusEffectType::AttackSpeedSlow, 2000.0, 0.3)
        .apply_to(&mut ctx.target.statuses, ctx.elapsed_ms);
}

/// Hardens while the holder is below half health. Re-evaluated every tick;
/// `set` keeps the bucket from stacking with itself.
fn adaptive_plating_update(unit: &mut Unit, elapsed_ms: f64) {
    let fraction = unit.health / unit.max_health(elapsed_ms).max(1.0);
    let amount = if fraction < 0.5 { 40.0 } else { 0.0 };
    unit.bonuses.set(
        "Adaptive Plating",
        vec![BonusVariable::new(BonusKey::Armor, amount)],
        elapsed_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::HexCoord;
    use crate::sim::unit::BaseStats;

    fn unit() -> Unit {
        let base = BaseStats {
            max_health: 1000.0,
            attack_damage: 50.0,
            ability_power: 100.0,
            attack_speed: 0.7,
            armor: 30.0,
            magic_resist: 0.0,
            range: 1,
            crit_chance: 0.0,
            move_speed: 1.0,
            starting_mana: 0.0,
            max_mana: 0.0,
            health_regen: 0.0,
            mana_regen: 0.0,
            jumper: false,
        };
        Unit::new("Dummy", 0, 1, 1, base, HexCoord::new(0, 0))
    }

    #[test]
    fn adaptive_plating_hardens_only_below_half_health() {
        let mut unit = unit();
        adaptive_plating_update(&mut unit, 0.0);
        assert_eq!(unit.armor(0.0), 30.0);

        unit.take_damage(600.0);
        adaptive_plating_update(&mut unit, 33.0);
        assert_eq!(unit.armor(33.0), 70.0);

        unit.heal(600.0, 66.0);
        adaptive_plating_update(&mut unit, 66.0);
        assert_eq!(unit.armor(66.0), 30.0);
    }
}
