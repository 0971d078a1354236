//! Augment hook tables. Augments are team-wide rule modifiers chosen in
//! the match config.

use crate::sim::bonus::{BonusKey, BonusVariable, PendingBonus};
use crate::sim::hooks::{
    AugmentHooks, DeathContext, HealthThresholdHook, HookRegistry, TeamContext,
};
use crate::sim::unit::Unit;
use crate::sim::upkeep::TeamManaSurge;

pub fn register(registry: &mut HookRegistry) {
    registry.register_augment(
        "Phalanx",
        AugmentHooks {
            start_of_fight: Some(phalanx_start),
            ..Default::default()
        },
    );
    registry.register_augment(
        "Windfall",
        AugmentHooks {
            start_of_fight: Some(windfall_start),
            ..Default::default()
        },
    );
    registry.register_augment(
        "Victors Feast",
        AugmentHooks {
            on_enemy_death: Some(victors_feast_on_enemy_death),
            ..Default::default()
        },
    );
    registry.register_augment(
        "Adrenaline",
        AugmentHooks {
            health_threshold: Some(HealthThresholdHook {
                fraction: 0.5,
                hook: adrenaline_trigger,
            }),
            ..Default::default()
        },
    );
}

/// The whole team opens the fight behind barriers.
fn phalanx_start(ctx: &mut TeamContext) {
    for unit in ctx.members.iter_mut() {
        unit.add_shield("Phalanx", 200.0, 15_000.0, ctx.elapsed_ms);
    }
}

/// A surge of mana for the team, eight seconds in.
fn windfall_start(ctx: &mut TeamContext) {
    let team = ctx.team;
    ctx.delays.schedule(
        8_000.0,
        Box::new(move |_, commands| {
            commands.send_event(TeamManaSurge { team, amount: 20.0 });
        }),
    );
}

/// Every enemy kill feeds the team a little health.
fn victors_feast_on_enemy_death(ctx: &mut DeathContext) {
    for unit in ctx.members.iter_mut() {
        let amount = unit.max_health(ctx.elapsed_ms) * 0.03;
        unit.heal(amount, ctx.elapsed_ms);
    }
}

/// First time a unit drops below half health it surges: a burst heal for a
/// chunk of missing health plus five seconds of attack speed, landing half
/// a second later. The pending bucket's label doubles as the fired-once
/// marker.
fn adrenaline_trigger(unit: &mut Unit, elapsed_ms: f64) {
    let applies_at_ms = elapsed_ms + 500.0;
    unit.pending_bonuses.push(PendingBonus {
        label: "Adrenaline".to_string(),
        variables: vec![
            BonusVariable::new(BonusKey::MissingHealth, 0.35),
            BonusVariable::new(BonusKey::AttackSpeed, 0.25).until(applies_at_ms + 5000.0),
        ],
        applies_at_ms,
    });
}
