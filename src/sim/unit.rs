//! Units
//!
//! The [`Unit`] component holds everything the simulation knows about one
//! combatant: base stats, live health/mana, the status table, bonus buckets,
//! shields and bleeds, and action timers. Derived stats are never stored;
//! every read recomputes base plus star scaling plus live bonuses plus
//! status modifiers, so an expired bonus stops contributing the moment it
//! is gone.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::board::HexCoord;

use super::bonus::{BonusKey, BonusTable, PendingBonus};
use super::constants::{STAR_ATTACK_MULTIPLIER, STAR_HEALTH_MULTIPLIER};
use super::damage::{DamagePayload, SourceStats};
use super::status::{StatusEffectType, StatusEffects};

/// Base combat stats as authored in the champion catalog, before star
/// scaling and bonuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_health: f32,
    pub attack_damage: f32,
    /// Ability power baseline; spells scale from 100 = 1.0x.
    #[serde(default = "default_ability_power")]
    pub ability_power: f32,
    /// Attacks per second.
    pub attack_speed: f32,
    pub armor: f32,
    pub magic_resist: f32,
    /// Attack range in hexes.
    pub range: u32,
    #[serde(default)]
    pub crit_chance: f32,
    /// Hexes per second multiplier over the base move rate.
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    #[serde(default)]
    pub starting_mana: f32,
    #[serde(default)]
    pub max_mana: f32,
    #[serde(default)]
    pub health_regen: f32,
    #[serde(default)]
    pub mana_regen: f32,
    /// Jumpers leap to the enemy backline and use the shorter start lockout.
    #[serde(default)]
    pub jumper: bool,
}

fn default_ability_power() -> f32 {
    100.0
}

fn default_move_speed() -> f32 {
    1.0
}

/// A damage-absorbing shield bucket.
#[derive(Debug, Clone)]
pub struct Shield {
    pub label: String,
    pub amount: f32,
    /// `f64::INFINITY` for shields without expiry.
    pub expires_at_ms: f64,
}

/// A damage-over-time instance, keyed by its source so re-application
/// refreshes rather than stacks.
#[derive(Debug, Clone)]
pub struct Bleed {
    /// Identifies the applying source; one bleed per key.
    pub source_key: String,
    pub source: Option<Entity>,
    pub payload: DamagePayload,
    /// Source stats captured at application time.
    pub source_stats: SourceStats,
    pub interval_ms: f64,
    pub next_tick_at_ms: f64,
    pub expires_at_ms: f64,
}

/// One combatant on the board.
#[derive(Component, Debug, Clone)]
pub struct Unit {
    // Identity
    pub name: String,
    pub team: u8,
    /// Stable per-match ordinal for deterministic processing order and logs.
    pub sequence: u32,
    pub star_level: u8,
    pub traits: Vec<String>,
    pub items: Vec<String>,

    // Position
    pub hex: HexCoord,
    /// Placement before the fight began; jump destinations derive from it.
    pub start_hex: HexCoord,

    // Stats
    pub base: BaseStats,
    pub health: f32,
    pub mana: f32,
    pub alive: bool,
    /// Set by the hit that killed this unit; read by death processing.
    pub killer: Option<Entity>,
    /// Death hooks for this unit have already run.
    pub death_processed: bool,

    // Effects
    pub statuses: StatusEffects,
    pub bonuses: BonusTable,
    pub pending_bonuses: Vec<PendingBonus>,
    pub shields: Vec<Shield>,
    pub spell_shield: Option<f32>,
    pub bleeds: Vec<Bleed>,

    // Action timers (absolute simulated timestamps)
    pub action_locked_until_ms: f64,
    pub attack_ready_at_ms: f64,
    pub target: Option<Entity>,

    // Accounting
    pub damage_dealt: f32,
    pub damage_taken: f32,
}

impl Unit {
    pub fn new(name: impl Into<String>, team: u8, sequence: u32, star_level: u8, base: BaseStats, hex: HexCoord) -> Self {
        let mut unit = Self {
            name: name.into(),
            team,
            sequence,
            star_level,
            traits: Vec::new(),
            items: Vec::new(),
            hex,
            start_hex: hex,
            health: 0.0,
            mana: base.starting_mana,
            alive: true,
            killer: None,
            death_processed: false,
            base,
            statuses: StatusEffects::default(),
            bonuses: BonusTable::default(),
            pending_bonuses: Vec::new(),
            shields: Vec::new(),
            spell_shield: None,
            bleeds: Vec::new(),
            action_locked_until_ms: 0.0,
            attack_ready_at_ms: 0.0,
            target: None,
            damage_dealt: 0.0,
            damage_taken: 0.0,
        };
        unit.health = unit.max_health(0.0);
        unit
    }

    /// Identifier used in log entries, e.g. `"Team 0 Pyromancer #3"`.
    pub fn log_id(&self) -> String {
        format!("Team {} {} #{}", self.team, self.name, self.sequence)
    }

    fn star_factor(&self, per_level: f32) -> f32 {
        per_level.powi(self.star_level.saturating_sub(1) as i32)
    }

    // ------------------------------------------------------------------
    // Derived stats
    // ------------------------------------------------------------------

    pub fn max_health(&self, elapsed_ms: f64) -> f32 {
        self.base.max_health * self.star_factor(STAR_HEALTH_MULTIPLIER)
            + self.bonuses.total(BonusKey::Health, elapsed_ms)
    }

    pub fn attack_damage(&self, elapsed_ms: f64) -> f32 {
        self.base.attack_damage * self.star_factor(STAR_ATTACK_MULTIPLIER)
            + self.bonuses.total(BonusKey::AttackDamage, elapsed_ms)
    }

    pub fn ability_power(&self, elapsed_ms: f64) -> f32 {
        self.base.ability_power + self.bonuses.total(BonusKey::AbilityPower, elapsed_ms)
    }

    /// Attacks per second, after bonuses and attack speed slows. Clamped
    /// to a small positive floor so attack intervals stay finite.
    pub fn attack_speed(&self, elapsed_ms: f64) -> f32 {
        let bonus = self.bonuses.total(BonusKey::AttackSpeed, elapsed_ms);
        let slow = self.statuses.amount_of(StatusEffectType::AttackSpeedSlow);
        (self.base.attack_speed * (1.0 + bonus) * (1.0 - slow)).max(0.05)
    }

    pub fn armor(&self, elapsed_ms: f64) -> f32 {
        self.base.armor + self.bonuses.total(BonusKey::Armor, elapsed_ms)
            - self.statuses.amount_of(StatusEffectType::ArmorReduction)
    }

    pub fn magic_resist(&self, elapsed_ms: f64) -> f32 {
        self.base.magic_resist + self.bonuses.total(BonusKey::MagicResist, elapsed_ms)
            - self.statuses.amount_of(StatusEffectType::MagicResistReduction)
    }

    pub fn crit_chance(&self, elapsed_ms: f64) -> f32 {
        (self.base.crit_chance + self.bonuses.total(BonusKey::CritChance, elapsed_ms)).clamp(0.0, 1.0)
    }

    pub fn move_speed(&self, elapsed_ms: f64) -> f32 {
        (self.base.move_speed + self.bonuses.total(BonusKey::MoveSpeed, elapsed_ms)).max(0.1)
    }

    pub fn max_mana(&self, elapsed_ms: f64) -> f32 {
        self.base.max_mana + self.bonuses.total(BonusKey::Mana, elapsed_ms)
    }

    pub fn health_regen(&self, elapsed_ms: f64) -> f32 {
        self.base.health_regen + self.bonuses.total(BonusKey::HealthRegen, elapsed_ms)
    }

    pub fn mana_regen(&self, elapsed_ms: f64) -> f32 {
        self.base.mana_regen + self.bonuses.total(BonusKey::ManaRegen, elapsed_ms)
    }

    pub fn heal_shield_boost(&self, elapsed_ms: f64) -> f32 {
        self.bonuses.total(BonusKey::HealShieldBoost, elapsed_ms)
    }

    /// Snapshot of the stats damage formulas read from the source side.
    pub fn source_stats(&self, elapsed_ms: f64) -> SourceStats {
        SourceStats {
            attack_damage: self.attack_damage(elapsed_ms),
            ability_power: self.ability_power(elapsed_ms),
        }
    }

    // ------------------------------------------------------------------
    // Interaction predicates
    // ------------------------------------------------------------------

    /// Targetable by attacks and single-target spells.
    pub fn attackable(&self) -> bool {
        self.interactable()
    }

    /// Present on the board for combat purposes: area effects, projectile
    /// collisions, and acting on its own. Banished and stealthed units are
    /// out of reach until the status expires.
    pub fn interactable(&self) -> bool {
        self.alive
            && !self.statuses.has(StatusEffectType::Banished)
            && !self.statuses.has(StatusEffectType::Stealth)
    }

    /// Unable to take any action this tick.
    pub fn action_locked(&self, elapsed_ms: f64) -> bool {
        elapsed_ms < self.action_locked_until_ms || self.statuses.has(StatusEffectType::Stunned)
    }

    pub fn can_attack(&self, elapsed_ms: f64) -> bool {
        !self.action_locked(elapsed_ms)
            && !self.statuses.has(StatusEffectType::Disarm)
            && elapsed_ms >= self.attack_ready_at_ms
    }

    pub fn can_cast(&self, elapsed_ms: f64) -> bool {
        let max_mana = self.max_mana(elapsed_ms);
        max_mana > 0.0
            && self.mana >= max_mana
            && !self.action_locked(elapsed_ms)
            && !self.statuses.has(StatusEffectType::Silenced)
    }

    // ------------------------------------------------------------------
    // Health, shields, healing
    // ------------------------------------------------------------------

    /// Apply post-mitigation damage: shields absorb in application order,
    /// the remainder comes off health. Returns the amount that reached
    /// health and whether it was the killing blow. Invulnerable targets
    /// take nothing.
    pub fn take_damage(&mut self, mut amount: f32) -> (f32, bool) {
        debug_assert!(amount.is_finite(), "damage must be finite");
        if !self.alive || amount <= 0.0 || self.statuses.has(StatusEffectType::Invulnerable) {
            return (0.0, false);
        }
        for shield in &mut self.shields {
            if amount <= 0.0 {
                break;
            }
            let absorbed = shield.amount.min(amount);
            shield.amount -= absorbed;
            amount -= absorbed;
        }
        self.shields.retain(|shield| shield.amount > 0.0);
        if amount <= 0.0 {
            return (0.0, false);
        }
        self.health -= amount;
        self.damage_taken += amount;
        let killing_blow = self.health <= 0.0;
        if killing_blow {
            self.health = 0.0;
            self.alive = false;
        }
        (amount, killing_blow)
    }

    /// Heal, reduced by grievous wounds and boosted by heal/shield power.
    /// Returns the effective amount applied.
    pub fn heal(&mut self, amount: f32, elapsed_ms: f64) -> f32 {
        debug_assert!(amount.is_finite(), "heal must be finite");
        if !self.alive || amount <= 0.0 {
            return 0.0;
        }
        let grievous = self.statuses.amount_of(StatusEffectType::GrievousWounds);
        let effective = amount * (1.0 - grievous) * (1.0 + self.heal_shield_boost(elapsed_ms));
        let max_health = self.max_health(elapsed_ms);
        self.health = (self.health + effective).min(max_health);
        effective
    }

    /// Grant a shield. Shields from the same label replace, matching the
    /// set-over-stack rule bonuses follow.
    pub fn add_shield(&mut self, label: &str, amount: f32, expires_at_ms: f64, elapsed_ms: f64) {
        let boosted = amount * (1.0 + self.heal_shield_boost(elapsed_ms));
        match self.shields.iter_mut().find(|shield| shield.label == label) {
            Some(shield) => {
                shield.amount = boosted;
                shield.expires_at_ms = expires_at_ms;
            }
            None => self.shields.push(Shield {
                label: label.to_string(),
                amount: boosted,
                expires_at_ms,
            }),
        }
    }

    pub fn shield_total(&self) -> f32 {
        self.shields.iter().map(|shield| shield.amount).sum()
    }

    /// Consume the spell shield if present. Returns the blocked amount.
    pub fn consume_spell_shield(&mut self) -> Option<f32> {
        self.spell_shield.take()
    }

    // ------------------------------------------------------------------
    // Bleeds
    // ------------------------------------------------------------------

    /// Attach or refresh a bleed. An existing bleed with the same key has
    /// its expiry and payload replaced but keeps its tick phase.
    pub fn apply_bleed(&mut self, bleed: Bleed) {
        match self
            .bleeds
            .iter_mut()
            .find(|existing| existing.source_key == bleed.source_key)
        {
            Some(existing) => {
                existing.payload = bleed.payload;
                existing.source_stats = bleed.source_stats;
                existing.expires_at_ms = bleed.expires_at_ms;
                existing.source = bleed.source;
            }
            None => self.bleeds.push(bleed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::damage::{DamageCalculation, DamageSourceType, DamageType};

    fn test_stats() -> BaseStats {
        BaseStats {
            max_health: 1000.0,
            attack_damage: 50.0,
            ability_power: 100.0,
            attack_speed: 0.7,
            armor: 30.0,
            magic_resist: 30.0,
            range: 1,
            crit_chance: 0.25,
            move_speed: 1.0,
            starting_mana: 20.0,
            max_mana: 60.0,
            health_regen: 0.0,
            mana_regen: 0.0,
            jumper: false,
        }
    }

    fn test_unit() -> Unit {
        Unit::new("Duelist", 0, 1, 1, test_stats(), HexCoord::new(3, 1))
    }

    #[test]
    fn star_level_scales_health_and_attack() {
        let one_star = test_unit();
        let mut three_star = test_unit();
        three_star.star_level = 3;
        assert_eq!(one_star.max_health(0.0), 1000.0);
        let expected = 1000.0 * STAR_HEALTH_MULTIPLIER * STAR_HEALTH_MULTIPLIER;
        assert!((three_star.max_health(0.0) - expected).abs() < 0.01);
        assert!(three_star.attack_damage(0.0) > one_star.attack_damage(0.0));
    }

    #[test]
    fn shields_absorb_before_health() {
        let mut unit = test_unit();
        unit.add_shield("Phalanx", 100.0, f64::INFINITY, 0.0);
        let (dealt, killed) = unit.take_damage(150.0);
        assert_eq!(dealt, 50.0);
        assert!(!killed);
        assert_eq!(unit.health, 950.0);
        assert!(unit.shields.is_empty());
    }

    #[test]
    fn lethal_damage_marks_death() {
        let mut unit = test_unit();
        let (dealt, killed) = unit.take_damage(5000.0);
        assert!(killed);
        assert!(!unit.alive);
        assert_eq!(unit.health, 0.0);
        assert_eq!(dealt, 5000.0);
    }

    #[test]
    fn grievous_wounds_reduces_healing() {
        let mut unit = test_unit();
        unit.take_damage(500.0);
        unit.statuses
            .apply(StatusEffectType::GrievousWounds, 0.0, 1000.0, 0.5);
        let applied = unit.heal(200.0, 0.0);
        assert_eq!(applied, 100.0);
        assert_eq!(unit.health, 600.0);
    }

    #[test]
    fn heal_never_exceeds_max_health() {
        let mut unit = test_unit();
        unit.take_damage(10.0);
        unit.heal(500.0, 0.0);
        assert_eq!(unit.health, unit.max_health(0.0));
    }

    #[test]
    fn stunned_unit_is_action_locked() {
        let mut unit = test_unit();
        assert!(!unit.action_locked(0.0));
        unit.statuses.apply(StatusEffectType::Stunned, 0.0, 500.0, 0.0);
        assert!(unit.action_locked(0.0));
    }

    #[test]
    fn cast_requires_full_mana_and_no_silence() {
        let mut unit = test_unit();
        assert!(!unit.can_cast(0.0));
        unit.mana = 60.0;
        assert!(unit.can_cast(0.0));
        unit.statuses.apply(StatusEffectType::Silenced, 0.0, 500.0, 0.0);
        assert!(!unit.can_cast(0.0));
    }

    #[test]
    fn attack_speed_slow_applies_multiplicatively() {
        let mut unit = test_unit();
        unit.statuses
            .apply(StatusEffectType::AttackSpeedSlow, 0.0, 1000.0, 0.5);
        assert!((unit.attack_speed(0.0) - 0.35).abs() < 1e-6);
    }

    #[test]
    fn bleed_refresh_replaces_by_key() {
        let mut unit = test_unit();
        let payload = DamagePayload::new(
            "Ember Brand",
            DamageSourceType::Item,
            DamageType::Magic,
            vec![DamageCalculation::flat(10.0)],
        );
        let bleed = Bleed {
            source_key: "Ember Brand".to_string(),
            source: None,
            payload: payload.clone(),
            source_stats: SourceStats::default(),
            interval_ms: 1000.0,
            next_tick_at_ms: 1000.0,
            expires_at_ms: 3000.0,
        };
        unit.apply_bleed(bleed.clone());
        unit.apply_bleed(Bleed {
            expires_at_ms: 6000.0,
            ..bleed
        });
        assert_eq!(unit.bleeds.len(), 1);
        assert_eq!(unit.bleeds[0].expires_at_ms, 6000.0);
    }

    #[test]
    fn stealth_blocks_targeting_and_area_eligibility() {
        let mut unit = test_unit();
        assert!(unit.interactable());
        unit.statuses.apply(StatusEffectType::Stealth, 0.0, 1000.0, 0.0);
        assert!(!unit.attackable());
        assert!(!unit.interactable());
    }
}
