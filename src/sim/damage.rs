//! Damage Pipeline
//!
//! Pure damage math, kept free of ECS access so both unit actions and
//! spatial effects share one resolution path. A [`DamagePayload`] describes
//! damage declaratively as stat-scaled parts; resolution evaluates the parts
//! against live stats, applies resist mitigation, then folds in the
//! multiplier/increase modifiers contributed by damage hooks. Negative
//! results clamp to zero rather than healing.

use serde::{Deserialize, Serialize};

/// Mitigation class of a damage instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageType {
    /// Mitigated by armor.
    Physical,
    /// Mitigated by magic resist.
    Magic,
    /// Bypasses both resists.
    True,
}

/// What produced a damage instance. Spell damage is the class a spell
/// shield can block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSourceType {
    Attack,
    Spell,
    Bleed,
    Item,
    Trait,
    Augment,
}

/// The stat a damage part scales from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CalcStat {
    /// Fixed amount; the ratio is the amount itself.
    Flat,
    SourceAttackDamage,
    SourceAbilityPower,
    TargetMaxHealth,
}

/// One scaled part of a damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageCalculation {
    pub stat: CalcStat,
    pub ratio: f32,
}

impl DamageCalculation {
    pub fn flat(amount: f32) -> Self {
        Self {
            stat: CalcStat::Flat,
            ratio: amount,
        }
    }

    pub fn attack_damage(ratio: f32) -> Self {
        Self {
            stat: CalcStat::SourceAttackDamage,
            ratio,
        }
    }

    pub fn ability_power(ratio: f32) -> Self {
        Self {
            stat: CalcStat::SourceAbilityPower,
            ratio,
        }
    }

    pub fn target_max_health(ratio: f32) -> Self {
        Self {
            stat: CalcStat::TargetMaxHealth,
            ratio,
        }
    }
}

/// The source-side stats a damage formula may reference. Captured as a
/// snapshot so resolution never needs the source unit borrowed alongside
/// the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStats {
    pub attack_damage: f32,
    pub ability_power: f32,
}

/// A complete declarative damage instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamagePayload {
    /// Name of the ability/item/effect for logging.
    pub source_id: String,
    pub source_type: DamageSourceType,
    pub damage_type: DamageType,
    pub calculations: Vec<DamageCalculation>,
}

impl DamagePayload {
    pub fn new(
        source_id: impl Into<String>,
        source_type: DamageSourceType,
        damage_type: DamageType,
        calculations: Vec<DamageCalculation>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_type,
            damage_type,
            calculations,
        }
    }

    /// Sum the formula parts against live stats.
    pub fn evaluate(&self, source: SourceStats, target_max_health: f32) -> f32 {
        self.calculations
            .iter()
            .map(|calc| match calc.stat {
                CalcStat::Flat => calc.ratio,
                CalcStat::SourceAttackDamage => source.attack_damage * calc.ratio,
                CalcStat::SourceAbilityPower => source.ability_power * calc.ratio,
                CalcStat::TargetMaxHealth => target_max_health * calc.ratio,
            })
            .sum()
    }
}

/// Multiplier/increase modifiers merged from damage hooks. The multiplier
/// composes multiplicatively across hooks; increases add. A consumed spell
/// shield subtracts its amount through `increase`.
#[derive(Debug, Clone, Copy)]
pub struct DamageModifiers {
    pub multiplier: f32,
    pub increase: f32,
}

impl Default for DamageModifiers {
    fn default() -> Self {
        Self {
            multiplier: 1.0,
            increase: 0.0,
        }
    }
}

impl DamageModifiers {
    pub fn multiply(&mut self, factor: f32) {
        self.multiplier *= factor;
    }

    pub fn add(&mut self, amount: f32) {
        self.increase += amount;
    }
}

/// Resist mitigation: each point of the matching resist reduces damage by
/// the standard `100 / (100 + resist)` factor. Negative resists (from
/// shred effects) amplify instead.
pub fn mitigate(raw: f32, damage_type: DamageType, armor: f32, magic_resist: f32) -> f32 {
    let resist = match damage_type {
        DamageType::Physical => armor,
        DamageType::Magic => magic_resist,
        DamageType::True => return raw,
    };
    if resist >= 0.0 {
        raw * 100.0 / (100.0 + resist)
    } else {
        raw * (2.0 - 100.0 / (100.0 - resist))
    }
}

/// Final damage after hooks: `max(0, mitigated * multiplier + increase)`.
pub fn finalize(mitigated: f32, modifiers: DamageModifiers) -> f32 {
    (mitigated * modifiers.multiplier + modifiers.increase).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_evaluates_scaled_parts() {
        let payload = DamagePayload::new(
            "Molten Bolt",
            DamageSourceType::Spell,
            DamageType::Magic,
            vec![
                DamageCalculation::flat(50.0),
                DamageCalculation::ability_power(0.8),
            ],
        );
        let source = SourceStats {
            attack_damage: 60.0,
            ability_power: 100.0,
        };
        assert_eq!(payload.evaluate(source, 1000.0), 130.0);
    }

    #[test]
    fn true_damage_ignores_resists() {
        assert_eq!(mitigate(100.0, DamageType::True, 200.0, 200.0), 100.0);
    }

    #[test]
    fn hundred_resist_halves_damage() {
        assert_eq!(mitigate(100.0, DamageType::Physical, 100.0, 0.0), 50.0);
        assert_eq!(mitigate(100.0, DamageType::Magic, 0.0, 100.0), 50.0);
    }

    #[test]
    fn negative_resist_amplifies() {
        let amplified = mitigate(100.0, DamageType::Physical, -50.0, 0.0);
        assert!(amplified > 100.0);
    }

    #[test]
    fn finalize_clamps_to_zero() {
        let mut modifiers = DamageModifiers::default();
        modifiers.add(-500.0);
        assert_eq!(finalize(100.0, modifiers), 0.0);
    }

    #[test]
    fn modifiers_compose() {
        let mut modifiers = DamageModifiers::default();
        modifiers.multiply(1.5);
        modifiers.multiply(2.0);
        modifiers.add(10.0);
        assert_eq!(finalize(100.0, modifiers), 310.0);
    }
}
