//! Trait hook tables.

use crate::sim::bonus::{BonusKey, BonusVariable};
use crate::sim::damage::{DamageCalculation, DamagePayload, DamageSourceType, DamageType};
use crate::sim::hooks::{AttackContext, DeathContext, HookRegistry, TeamContext, TraitHooks};
use crate::sim::status::{StatusApplication, StatusEffectType};
use crate::sim::unit::{Bleed, Unit};

pub fn register(registry: &mut HookRegistry) {
    registry.register_trait(
        "Bulwark",
        TraitHooks {
            min_units: 1,
            start_of_fight: Some(bulwark_start),
            ..Default::default()
        },
    );
    registry.register_trait(
        "Swiftblade",
        TraitHooks {
            min_units: 1,
            start_of_fight: Some(swiftblade_start),
            ..Default::default()
        },
    );
    registry.register_trait(
        "Avenger",
        TraitHooks {
            min_units: 1,
            on_ally_death: Some(avenger_on_ally_death),
            ..Default::default()
        },
    );
    registry.register_trait(
        "Venomous",
        TraitHooks {
            min_units: 1,
            on_basic_attack: Some(venomous_on_attack),
            ..Default::default()
        },
    );
}

fn holds(trait_name: &str) -> impl Fn(&&mut &mut Unit) -> bool + '_ {
    move |unit| unit.traits.iter().any(|name| name == trait_name)
}

/// Holders gain armor and magic resist; doubled with two or more holders.
fn bulwark_start(ctx: &mut TeamContext) {
    let amount = if ctx.holder_count >= 2 { 40.0 } else { 20.0 };
    for unit in ctx.members.iter_mut().filter(holds("Bulwark")) {
        unit.bonuses.set(
            "Bulwark",
            vec![
                BonusVariable::new(BonusKey::Armor, amount),
                BonusVariable::new(BonusKey::MagicResist, amount),
            ],
            ctx.elapsed_ms,
        );
    }
}

/// Holders ramp attack speed over the course of the fight.
fn swiftblade_start(ctx: &mut TeamContext) {
    for unit in ctx.members.iter_mut().filter(holds("Swiftblade")) {
        unit.bonuses.set(
            "Swiftblade",
            vec![BonusVariable::scaling(BonusKey::AttackSpeed, 0.05, 3.0, 0.05)],
            ctx.elapsed_ms,
        );
    }
}

/// Each fallen ally hardens the survivors' resolve.
fn avenger_on_ally_death(ctx: &mut DeathContext) {
    for unit in ctx.members.iter_mut().filter(holds("Avenger")) {
        unit.bonuses.add(
            "Avenger",
            vec![BonusVariable::new(BonusKey::AttackDamage, 10.0)],
            ctx.elapsed_ms,
        );
    }
}

/// Basic attacks envenom the target: a max-health bleed plus grievous
/// wounds. Re-application refreshes the bleed rather than stacking it.
fn venomous_on_attack(ctx: &mut AttackContext) {
    let payload = DamagePayload::new(
        "Venom",
        DamageSourceType::Bleed,
        DamageType::Magic,
        vec![DamageCalculation::target_max_health(0.01)],
    );
    ctx.target.apply_bleed(Bleed {
        source_key: "Venomous".to_string(),
        source: Some(ctx.attacker_entity),
        payload,
        source_stats: ctx.attacker.source_stats(ctx.elapsed_ms),
        interval_ms: 1000.0,
        next_tick_at_ms: ctx.elapsed_ms + 1000.0,
        expires_at_ms: ctx.elapsed_ms + 3000.0,
    });
    StatusApplication::new(StatusEffectType::GrievousWounds, 3000.0, 0.33)
        .apply_to(&mut ctx.target.statuses, ctx.elapsed_ms);
}
