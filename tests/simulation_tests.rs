//! Integration tests for the simulation tick
//!
//! These tests step a match app update by update and verify:
//! - The first frame runs fight setup without advancing the clock
//! - The locked clock advances exactly one tick per update
//! - Start-of-fight behavior: lockouts, jumpers, trait bonuses
//! - Units close distance, attack, cast, and die

use bevy::prelude::*;
use hexarena::combat::log::{CombatLog, CombatLogEventType};
use hexarena::combat::CombatPlugin;
use hexarena::data::DataPlugin;
use hexarena::headless::config::{MatchSetup, TeamSetup, UnitSetup};
use hexarena::headless::{HeadlessMatchState, HeadlessPlugin};
use hexarena::sim::bonus::{BonusKey, BonusVariable, PendingBonus};
use hexarena::sim::clock::{DelayedCallbacks, SimClock};
use hexarena::sim::constants::GAME_TICK_MS;
use hexarena::sim::damage::{
    DamageCalculation, DamagePayload, DamageSourceType, DamageType, SourceStats,
};
use hexarena::sim::spatial::SpatialEffect;
use hexarena::sim::status::StatusEffectType;
use hexarena::sim::unit::Unit;
use hexarena::sim::SimulationPlugin;

fn unit(champion: &str, star_level: u8, col: i32, row: i32) -> UnitSetup {
    UnitSetup {
        champion: champion.to_string(),
        star_level,
        hex: (col, row),
        items: Vec::new(),
    }
}

fn setup(team0: Vec<UnitSetup>, team1: Vec<UnitSetup>) -> MatchSetup {
    MatchSetup {
        teams: [
            TeamSetup {
                units: team0,
                augments: Vec::new(),
            },
            TeamSetup {
                units: team1,
                augments: Vec::new(),
            },
        ],
        max_duration_secs: 120.0,
        random_seed: Some(1234),
        output_path: None,
    }
}

/// A match app that is stepped manually instead of run to completion.
fn build_app(setup: MatchSetup) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins((DataPlugin, SimulationPlugin, CombatPlugin))
        .add_plugins(HeadlessPlugin { setup });
    app
}

fn step_until_ms(app: &mut App, ms: f64) {
    for _ in 0..10_000 {
        if app.world().resource::<SimClock>().elapsed_ms >= ms {
            return;
        }
        app.update();
    }
    panic!("simulation did not reach {ms}ms");
}

fn units_snapshot(app: &mut App) -> Vec<Unit> {
    let mut units: Vec<Unit> = app
        .world_mut()
        .query::<&Unit>()
        .iter(app.world())
        .cloned()
        .collect();
    units.sort_unstable_by_key(|unit| unit.sequence);
    units
}

#[test]
fn test_first_update_runs_setup_without_advancing_time() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    app.update();
    let clock = app.world().resource::<SimClock>();
    assert!(clock.fight_started);
    assert_eq!(clock.elapsed_ms, 0.0);

    app.update();
    let clock = app.world().resource::<SimClock>();
    assert_eq!(clock.elapsed_ms, GAME_TICK_MS);
}

#[test]
fn test_locked_clock_ticks_once_per_update() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    app.update();
    for _ in 0..10 {
        app.update();
    }
    let clock = app.world().resource::<SimClock>();
    assert_eq!(clock.elapsed_ms, 10.0 * GAME_TICK_MS);
}

#[test]
fn test_start_lockouts_depend_on_unit_kind() {
    let mut app = build_app(setup(
        vec![unit("Valkyrie", 1, 0, 0), unit("Duelist", 1, 6, 0)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    app.update();
    for unit in units_snapshot(&mut app) {
        let expected = if unit.name == "Valkyrie" { 500.0 } else { 1000.0 };
        assert_eq!(
            unit.action_locked_until_ms, expected,
            "{} lockout",
            unit.name
        );
    }
}

#[test]
fn test_jumper_leaps_to_the_far_half_at_fight_start() {
    let mut app = build_app(setup(
        vec![unit("Valkyrie", 1, 3, 0)],
        vec![unit("Duelist", 1, 0, 0)],
    ));

    app.update();
    let units = units_snapshot(&mut app);
    let valkyrie = units.iter().find(|u| u.name == "Valkyrie").unwrap();
    // (3, 0) inverts to (3, 7), which is unoccupied here.
    assert_eq!((valkyrie.hex.col, valkyrie.hex.row), (3, 7));
}

#[test]
fn test_trait_bonuses_apply_at_fight_start() {
    let mut app = build_app(setup(
        vec![unit("Stoneguard", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    app.update();
    let units = units_snapshot(&mut app);
    let stoneguard = units.iter().find(|u| u.name == "Stoneguard").unwrap();
    // Base 50 armor plus the single-holder Bulwark bonus of 20.
    assert_eq!(stoneguard.armor(0.0), 70.0);
}

#[test]
fn test_melee_units_converge_and_trade_damage() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 0, 0)],
        vec![unit("Duelist", 1, 0, 0)],
    ));

    step_until_ms(&mut app, 15_000.0);
    let log = app.world().resource::<CombatLog>();
    assert!(!log.filter_by_type(CombatLogEventType::Damage).is_empty());

    let units = units_snapshot(&mut app);
    assert!(units.iter().all(|u| u.damage_taken > 0.0));
    // Converged units end up adjacent.
    assert_eq!(units[0].hex.distance_to(units[1].hex), 1);
}

#[test]
fn test_full_mana_triggers_a_cast_and_its_stun() {
    let mut app = build_app(setup(
        vec![unit("Stoneguard", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    // Stoneguard starts at 40/90 mana and gains 10 per attack; it reaches
    // full well before the twelve second mark.
    step_until_ms(&mut app, 12_000.0);
    let log = app.world().resource::<CombatLog>();
    let casts = log
        .filter_by_type(CombatLogEventType::AbilityCast)
        .iter()
        .filter(|e| e.message.contains("Seismic Slam"))
        .count();
    assert!(casts >= 1);
    let statuses = log.filter_by_type(CombatLogEventType::StatusApplied);
    assert!(statuses.iter().any(|e| e.message.contains("Stunned")));

    // One adjacent enemy, struck exactly once per activation pass.
    let slam_hits = log
        .filter_by_type(CombatLogEventType::Damage)
        .iter()
        .filter(|e| {
            e.detail
                .as_ref()
                .is_some_and(|d| d.ability.as_deref() == Some("Seismic Slam"))
        })
        .count();
    assert_eq!(slam_hits, casts);
}

#[test]
fn test_destroy_on_collision_projectile_strikes_at_most_once_per_cast() {
    let mut app = build_app(setup(
        vec![unit("Pyromancer", 3, 3, 0)],
        vec![unit("Stoneguard", 1, 2, 3), unit("Stoneguard", 1, 4, 3)],
    ));

    step_until_ms(&mut app, 30_000.0);
    let log = app.world().resource::<CombatLog>();
    let casts = log
        .filter_by_type(CombatLogEventType::AbilityCast)
        .iter()
        .filter(|e| e.message.contains("Molten Bolt"))
        .count();
    let bolt_hits = log
        .filter_by_type(CombatLogEventType::Damage)
        .iter()
        .filter(|e| {
            e.detail
                .as_ref()
                .is_some_and(|d| d.ability.as_deref() == Some("Molten Bolt"))
        })
        .count();
    assert!(casts >= 1);
    // The bolt is consumed on its first collision; a cast whose every
    // candidate died mid-flight fizzles, so hits can trail casts by one.
    assert!(bolt_hits <= casts);
    assert!(bolt_hits + 1 >= casts);
}

#[test]
fn test_casting_spends_all_mana() {
    let mut app = build_app(setup(
        vec![unit("Stoneguard", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    app.update();
    let mut saw_full = false;
    for _ in 0..400 {
        app.update();
        let units = units_snapshot(&mut app);
        let stoneguard = units.iter().find(|u| u.name == "Stoneguard").unwrap();
        if stoneguard.mana >= stoneguard.max_mana(0.0) {
            saw_full = true;
        }
        if saw_full && stoneguard.mana == 0.0 {
            return;
        }
    }
    panic!("Stoneguard never cast after reaching full mana");
}

#[test]
fn test_delayed_team_callbacks_fire_once() {
    let mut base = setup(
        vec![unit("Stoneguard", 1, 0, 0)],
        vec![unit("Stoneguard", 1, 0, 0)],
    );
    base.teams[0].augments.push("Windfall".to_string());
    let mut app = build_app(base);

    app.update();
    assert_eq!(app.world().resource::<DelayedCallbacks>().len(), 1);

    step_until_ms(&mut app, 8_500.0);
    assert!(app.world().resource::<DelayedCallbacks>().is_empty());
}

#[test]
fn test_banished_unit_takes_no_actions() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 0, 0)],
        vec![unit("Duelist", 1, 0, 0)],
    ));

    app.update();
    {
        let mut query = app.world_mut().query::<&mut Unit>();
        for mut unit in query.iter_mut(app.world_mut()) {
            if unit.team == 0 {
                unit.statuses
                    .apply(StatusEffectType::Banished, 0.0, 60_000.0, 0.0);
            }
        }
    }

    step_until_ms(&mut app, 10_000.0);
    let units = units_snapshot(&mut app);
    let banished = units.iter().find(|u| u.team == 0).unwrap();
    assert_eq!(banished.damage_dealt, 0.0, "banished unit dealt damage");
    assert_eq!((banished.hex.col, banished.hex.row), (0, 0), "banished unit moved");
    // The opponent cannot reach it either, so the fight is a standstill.
    let log = app.world().resource::<CombatLog>();
    assert!(log.filter_by_type(CombatLogEventType::Damage).is_empty());
}

#[test]
fn test_area_effects_skip_stealthed_units() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 0, 0)],
        vec![unit("Duelist", 1, 0, 0)],
    ));

    app.update();
    let mut team0 = None;
    let mut team1 = None;
    {
        let mut query = app.world_mut().query::<(Entity, &mut Unit)>();
        for (entity, mut unit) in query.iter_mut(app.world_mut()) {
            if unit.team == 1 {
                unit.statuses
                    .apply(StatusEffectType::Stealth, 0.0, 60_000.0, 0.0);
                team1 = Some((entity, unit.hex));
            } else {
                team0 = Some((entity, unit.hex));
            }
        }
    }
    let (team0_entity, team0_hex) = team0.unwrap();
    let (team1_entity, team1_hex) = team1.unwrap();

    let payload = |id: &str| {
        DamagePayload::new(
            id,
            DamageSourceType::Spell,
            DamageType::Magic,
            vec![DamageCalculation::flat(50.0)],
        )
    };
    // One burst on the stealthed unit, one control burst on the visible one.
    app.world_mut().spawn(
        SpatialEffect::hex_burst(
            team0_entity,
            0,
            "Shockwave",
            SourceStats::default(),
            vec![team1_hex],
            0.0,
            0.0,
            0.5,
            0.0,
        )
        .with_payload(payload("Shockwave")),
    );
    app.world_mut().spawn(
        SpatialEffect::hex_burst(
            team1_entity,
            1,
            "Shockwave",
            SourceStats::default(),
            vec![team0_hex],
            0.0,
            0.0,
            0.5,
            0.0,
        )
        .with_payload(payload("Shockwave")),
    );

    app.update();
    app.update();
    let units = units_snapshot(&mut app);
    let stealthed = units.iter().find(|u| u.team == 1).unwrap();
    let visible = units.iter().find(|u| u.team == 0).unwrap();
    assert_eq!(stealthed.damage_taken, 0.0, "area effect hit a stealthed unit");
    assert!(visible.damage_taken > 0.0);
}

fn shockwave_brand(unit: &mut Unit, elapsed_ms: f64) {
    unit.bonuses.add(
        "Shockwave",
        vec![BonusVariable::new(BonusKey::Armor, 1.0)],
        elapsed_ms,
    );
}

#[test]
fn test_collision_callbacks_skip_spell_shielded_targets() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 0, 0)],
        vec![unit("Stoneguard", 1, 2, 3), unit("Stoneguard", 1, 4, 3)],
    ));

    app.update();
    let mut source = None;
    let mut hexes = Vec::new();
    {
        let mut query = app.world_mut().query::<(Entity, &mut Unit)>();
        for (entity, mut unit) in query.iter_mut(app.world_mut()) {
            if unit.team == 0 {
                source = Some(entity);
            } else {
                // Shield the first Stoneguard only.
                if unit.sequence == 2 {
                    unit.spell_shield = Some(250.0);
                }
                hexes.push(unit.hex);
            }
        }
    }

    app.world_mut().spawn(
        SpatialEffect::hex_burst(
            source.unwrap(),
            0,
            "Shockwave",
            SourceStats::default(),
            hexes,
            0.0,
            0.0,
            0.5,
            0.0,
        )
        .with_payload(DamagePayload::new(
            "Shockwave",
            DamageSourceType::Spell,
            DamageType::Magic,
            vec![DamageCalculation::flat(100.0)],
        ))
        .with_collision_callback(shockwave_brand),
    );

    app.update();
    app.update();
    let units = units_snapshot(&mut app);
    let shielded = units.iter().find(|u| u.sequence == 2).unwrap();
    let struck = units.iter().find(|u| u.sequence == 3).unwrap();
    assert!(shielded.spell_shield.is_none(), "spell shield not consumed");
    assert_eq!(shielded.damage_taken, 0.0);
    assert!(!shielded.bonuses.has("Shockwave"), "callback ran on a blocked hit");
    assert!(struck.damage_taken > 0.0);
    assert!(struck.bonuses.has("Shockwave"));
}

#[test]
fn test_attack_at_zero_armor_deals_exactly_attack_damage() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    app.update();
    {
        let mut query = app.world_mut().query::<&mut Unit>();
        for mut unit in query.iter_mut(app.world_mut()) {
            unit.base.crit_chance = 0.0;
            if unit.team == 1 {
                unit.base.armor = 0.0;
            }
        }
    }

    step_until_ms(&mut app, 3_000.0);
    let units = units_snapshot(&mut app);
    let attacker = units.iter().find(|u| u.team == 0).unwrap();
    let expected = attacker.attack_damage(0.0);

    let log = app.world().resource::<CombatLog>();
    let first_hit = log
        .filter_by_type(CombatLogEventType::Damage)
        .iter()
        .find_map(|entry| {
            let detail = entry.detail.as_ref()?;
            let from_attacker = detail
                .source
                .as_deref()
                .is_some_and(|source| source.starts_with("Team 0"));
            if from_attacker && detail.ability.as_deref() == Some("Attack") {
                detail.amount
            } else {
                None
            }
        })
        .expect("no attack landed");
    assert!((first_hit - expected).abs() < 1e-3);
}

#[test]
fn test_repeated_pending_bonuses_accumulate() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 1, 0, 0)],
        vec![unit("Duelist", 1, 0, 0)],
    ));

    app.update();
    {
        let mut query = app.world_mut().query::<&mut Unit>();
        for mut unit in query.iter_mut(app.world_mut()) {
            if unit.team != 0 {
                continue;
            }
            for amount in [10.0, 5.0] {
                unit.pending_bonuses.push(PendingBonus {
                    label: "Warcry".to_string(),
                    variables: vec![BonusVariable::new(BonusKey::AttackDamage, amount)],
                    applies_at_ms: 0.0,
                });
            }
        }
    }

    app.update();
    let units = units_snapshot(&mut app);
    let unit = units.iter().find(|u| u.team == 0).unwrap();
    let total = unit.bonuses.total(BonusKey::AttackDamage, GAME_TICK_MS);
    assert_eq!(total, 15.0, "later pending grant wiped the earlier stack");
}

#[test]
fn test_outmatched_unit_dies_and_the_match_completes() {
    let mut app = build_app(setup(
        vec![unit("Duelist", 3, 3, 3)],
        vec![unit("Duelist", 1, 3, 3)],
    ));

    for _ in 0..2000 {
        app.update();
        if app.world().resource::<HeadlessMatchState>().match_complete {
            break;
        }
    }

    let state = app.world().resource::<HeadlessMatchState>();
    assert!(state.match_complete, "match never completed");
    let result = state.result.as_ref().unwrap();
    assert_eq!(result.winner, Some(0));

    let log = app.world().resource::<CombatLog>();
    let deaths = log.filter_by_type(CombatLogEventType::Death);
    assert_eq!(deaths.len(), 1);
    assert!(deaths[0].message.contains("Team 1 Duelist"));
}
