//! Status Effect Table
//!
//! Per-unit timed status effects (stun, disarm, grievous wounds, ...). Each
//! effect type owns a fixed slot carrying an active flag, an absolute expiry
//! timestamp, and an optional magnitude. Expiry deactivates the slot but
//! keeps it allocated for reuse; re-applying from any source overwrites the
//! slot, except crowd control payloads which extend the expiry to the later
//! of the two (see `extend`).

use serde::{Deserialize, Serialize};

/// Every status effect type the simulation understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffectType {
    Ablaze,
    AoeDamageReduction,
    ArmorReduction,
    AttackSpeedSlow,
    Banished,
    Disarm,
    GrievousWounds,
    Invulnerable,
    MagicResistReduction,
    Silenced,
    Stealth,
    Stunned,
}

impl StatusEffectType {
    pub const COUNT: usize = 12;

    pub fn name(&self) -> &'static str {
        match self {
            StatusEffectType::Ablaze => "ablaze",
            StatusEffectType::AoeDamageReduction => "aoe damage reduction",
            StatusEffectType::ArmorReduction => "armor reduction",
            StatusEffectType::AttackSpeedSlow => "attack speed slow",
            StatusEffectType::Banished => "banished",
            StatusEffectType::Disarm => "disarm",
            StatusEffectType::GrievousWounds => "grievous wounds",
            StatusEffectType::Invulnerable => "invulnerable",
            StatusEffectType::MagicResistReduction => "magic resist reduction",
            StatusEffectType::Silenced => "silenced",
            StatusEffectType::Stealth => "stealth",
            StatusEffectType::Stunned => "stunned",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// A status application carried by a spell, projectile, or hook before it
/// lands on a unit. Stun applications use `extend` semantics; everything
/// else overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusApplication {
    pub effect: StatusEffectType,
    pub duration_ms: f64,
    #[serde(default)]
    pub amount: f32,
}

impl StatusApplication {
    pub fn new(effect: StatusEffectType, duration_ms: f64, amount: f32) -> Self {
        Self {
            effect,
            duration_ms,
            amount,
        }
    }

    /// Land this application on a status table.
    pub fn apply_to(&self, statuses: &mut StatusEffects, elapsed_ms: f64) {
        if self.effect == StatusEffectType::Stunned {
            statuses.extend(self.effect, elapsed_ms, self.duration_ms);
        } else {
            statuses.apply(self.effect, elapsed_ms, self.duration_ms, self.amount);
        }
    }
}

/// One reusable status slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusEffect {
    pub active: bool,
    pub expires_at_ms: f64,
    pub amount: f32,
}

/// The per-unit status table: one slot per effect type.
#[derive(Debug, Clone)]
pub struct StatusEffects {
    slots: [StatusEffect; StatusEffectType::COUNT],
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            slots: [StatusEffect::default(); StatusEffectType::COUNT],
        }
    }
}

impl StatusEffects {
    /// Apply (or overwrite) an effect lasting `duration_ms` from now.
    pub fn apply(&mut self, effect: StatusEffectType, elapsed_ms: f64, duration_ms: f64, amount: f32) {
        let slot = &mut self.slots[effect.index()];
        slot.active = true;
        slot.expires_at_ms = elapsed_ms + duration_ms;
        slot.amount = amount;
    }

    /// Extend an effect's expiry to `max(current, elapsed + duration)`.
    /// Used by crowd-control payloads so overlapping stuns never shorten
    /// each other.
    pub fn extend(&mut self, effect: StatusEffectType, elapsed_ms: f64, duration_ms: f64) {
        let slot = &mut self.slots[effect.index()];
        let candidate = elapsed_ms + duration_ms;
        if !slot.active || candidate > slot.expires_at_ms {
            slot.expires_at_ms = slot.expires_at_ms.max(candidate);
            slot.active = true;
        }
    }

    /// Deactivate an effect immediately (cleanse).
    pub fn remove(&mut self, effect: StatusEffectType) {
        self.slots[effect.index()].active = false;
    }

    /// Whether the effect is currently active.
    pub fn has(&self, effect: StatusEffectType) -> bool {
        self.slots[effect.index()].active
    }

    /// Magnitude of the effect, or 0 when inactive.
    pub fn amount_of(&self, effect: StatusEffectType) -> f32 {
        let slot = &self.slots[effect.index()];
        if slot.active {
            slot.amount
        } else {
            0.0
        }
    }

    /// Expiry timestamp of an active effect.
    pub fn expires_at(&self, effect: StatusEffectType) -> Option<f64> {
        let slot = &self.slots[effect.index()];
        slot.active.then_some(slot.expires_at_ms)
    }

    /// Deactivate every effect whose expiry has passed. The slot itself
    /// persists for reuse.
    pub fn update(&mut self, elapsed_ms: f64) {
        for slot in &mut self.slots {
            if slot.active && elapsed_ms > slot.expires_at_ms {
                slot.active = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applied_effect_expires_on_schedule() {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffectType::Stunned, 0.0, 1000.0, 0.0);

        statuses.update(500.0);
        assert!(statuses.has(StatusEffectType::Stunned));

        statuses.update(1001.0);
        assert!(!statuses.has(StatusEffectType::Stunned));
    }

    #[test]
    fn extend_never_shortens() {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffectType::Stunned, 0.0, 2000.0, 0.0);
        statuses.extend(StatusEffectType::Stunned, 500.0, 500.0);
        assert_eq!(statuses.expires_at(StatusEffectType::Stunned), Some(2000.0));

        statuses.extend(StatusEffectType::Stunned, 1500.0, 1000.0);
        assert_eq!(statuses.expires_at(StatusEffectType::Stunned), Some(2500.0));
    }

    #[test]
    fn expired_slot_is_reusable() {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffectType::Disarm, 0.0, 100.0, 0.0);
        statuses.update(200.0);
        assert!(!statuses.has(StatusEffectType::Disarm));

        statuses.apply(StatusEffectType::Disarm, 300.0, 100.0, 0.0);
        assert!(statuses.has(StatusEffectType::Disarm));
    }

    #[test]
    fn amount_reads_zero_when_inactive() {
        let mut statuses = StatusEffects::default();
        statuses.apply(StatusEffectType::GrievousWounds, 0.0, 100.0, 0.33);
        assert_eq!(statuses.amount_of(StatusEffectType::GrievousWounds), 0.33);
        statuses.update(101.0);
        assert_eq!(statuses.amount_of(StatusEffectType::GrievousWounds), 0.0);
    }
}
