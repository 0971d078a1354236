//! Stat Bonuses
//!
//! Bonuses are the one sanctioned channel through which traits, items,
//! augments and spells modify unit stats. Each bonus source owns a labelled
//! bucket of [`BonusVariable`]s on the unit; setting a label replaces the
//! bucket wholesale while adding appends to it, so a trait re-evaluating its
//! contribution each tick never stacks with itself. Derived stats are never
//! written directly; they are recomputed from base stats plus live bonuses
//! on every read.

use serde::{Deserialize, Serialize};

/// The stat a bonus contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusKey {
    AttackDamage,
    AbilityPower,
    AttackSpeed,
    Armor,
    MagicResist,
    Health,
    Mana,
    ManaRegen,
    HealthRegen,
    CritChance,
    MoveSpeed,
    HealShieldBoost,
    /// Special: consumed as an instant heal rather than a stat.
    MissingHealth,
}

/// Time-ramped growth on a bonus: the contribution grows by `amount` for
/// every full `interval_s` the bonus has been active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusScaling {
    /// Seconds between growth steps.
    pub interval_s: f32,
    /// Amount added per completed interval.
    pub amount: f32,
}

/// A single stat contribution from a bonus source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonusVariable {
    pub key: BonusKey,
    pub amount: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling: Option<BonusScaling>,
    /// Absolute expiry. Expired variables are pruned by the per-tick bonus
    /// update, never at read time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<f64>,
    /// Set when the bonus is attached to a unit; scaling measures from here.
    #[serde(skip)]
    pub applied_at_ms: f64,
}

impl BonusVariable {
    pub fn new(key: BonusKey, amount: f32) -> Self {
        Self {
            key,
            amount,
            scaling: None,
            expires_at_ms: None,
            applied_at_ms: 0.0,
        }
    }

    pub fn scaling(key: BonusKey, amount: f32, interval_s: f32, per_interval: f32) -> Self {
        Self {
            key,
            amount,
            scaling: Some(BonusScaling {
                interval_s,
                amount: per_interval,
            }),
            expires_at_ms: None,
            applied_at_ms: 0.0,
        }
    }

    /// Expire this variable at an absolute simulated timestamp.
    pub fn until(mut self, expires_at_ms: f64) -> Self {
        self.expires_at_ms = Some(expires_at_ms);
        self
    }

    pub fn expired(&self, elapsed_ms: f64) -> bool {
        self.expires_at_ms
            .is_some_and(|expires_at| elapsed_ms > expires_at)
    }

    /// Current contribution including any elapsed scaling intervals.
    pub fn value_at(&self, elapsed_ms: f64) -> f32 {
        let mut value = self.amount;
        if let Some(scaling) = &self.scaling {
            let active_ms = (elapsed_ms - self.applied_at_ms).max(0.0);
            let intervals = (active_ms / (scaling.interval_s as f64 * 1000.0)).floor() as f32;
            value += scaling.amount * intervals;
        }
        value
    }
}

/// A bonus scheduled to attach at a future simulated timestamp.
#[derive(Debug, Clone)]
pub struct PendingBonus {
    pub label: String,
    pub variables: Vec<BonusVariable>,
    pub applies_at_ms: f64,
}

/// All bonuses on one unit, bucketed by source label.
#[derive(Debug, Clone, Default)]
pub struct BonusTable {
    buckets: Vec<(String, Vec<BonusVariable>)>,
}

impl BonusTable {
    /// Replace the bucket for `label`, stamping each variable with the
    /// current time for scaling.
    pub fn set(&mut self, label: &str, mut variables: Vec<BonusVariable>, elapsed_ms: f64) {
        for variable in &mut variables {
            variable.applied_at_ms = elapsed_ms;
        }
        match self.buckets.iter_mut().find(|(name, _)| name == label) {
            Some((_, bucket)) => *bucket = variables,
            None => self.buckets.push((label.to_string(), variables)),
        }
    }

    /// Append to the bucket for `label`, creating it if absent.
    pub fn add(&mut self, label: &str, mut variables: Vec<BonusVariable>, elapsed_ms: f64) {
        for variable in &mut variables {
            variable.applied_at_ms = elapsed_ms;
        }
        match self.buckets.iter_mut().find(|(name, _)| name == label) {
            Some((_, bucket)) => bucket.extend(variables),
            None => self.buckets.push((label.to_string(), variables)),
        }
    }

    /// Remove the bucket for `label` entirely.
    pub fn remove(&mut self, label: &str) {
        self.buckets.retain(|(name, _)| name != label);
    }

    /// Drop expired variables. Emptied buckets are kept; an empty bucket
    /// still marks its source as having applied.
    pub fn prune_expired(&mut self, elapsed_ms: f64) {
        for (_, bucket) in &mut self.buckets {
            bucket.retain(|variable| !variable.expired(elapsed_ms));
        }
    }

    pub fn has(&self, label: &str) -> bool {
        self.buckets.iter().any(|(name, _)| name == label)
    }

    /// Summed contribution for a stat across every bucket.
    pub fn total(&self, key: BonusKey, elapsed_ms: f64) -> f32 {
        self.buckets
            .iter()
            .flat_map(|(_, bucket)| bucket.iter())
            .filter(|variable| variable.key == key)
            .map(|variable| variable.value_at(elapsed_ms))
            .sum()
    }

    /// Iterate over every variable of the given key, with its bucket label.
    pub fn iter_key(&self, key: BonusKey) -> impl Iterator<Item = (&str, &BonusVariable)> {
        self.buckets.iter().flat_map(move |(label, bucket)| {
            bucket
                .iter()
                .filter(move |variable| variable.key == key)
                .map(move |variable| (label.as_str(), variable))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_rather_than_stacks() {
        let mut bonuses = BonusTable::default();
        bonuses.set("Bulwark", vec![BonusVariable::new(BonusKey::Armor, 20.0)], 0.0);
        bonuses.set("Bulwark", vec![BonusVariable::new(BonusKey::Armor, 20.0)], 100.0);
        assert_eq!(bonuses.total(BonusKey::Armor, 100.0), 20.0);
    }

    #[test]
    fn add_stacks_within_a_label() {
        let mut bonuses = BonusTable::default();
        bonuses.add("Avenger", vec![BonusVariable::new(BonusKey::AttackDamage, 5.0)], 0.0);
        bonuses.add("Avenger", vec![BonusVariable::new(BonusKey::AttackDamage, 5.0)], 0.0);
        assert_eq!(bonuses.total(BonusKey::AttackDamage, 0.0), 10.0);
    }

    #[test]
    fn scaling_accrues_per_completed_interval() {
        let variable = BonusVariable::scaling(BonusKey::AttackSpeed, 0.1, 2.0, 0.05);
        assert_eq!(variable.value_at(0.0), 0.1);
        assert_eq!(variable.value_at(1999.0), 0.1);
        assert!((variable.value_at(2000.0) - 0.15).abs() < f32::EPSILON);
        assert!((variable.value_at(6500.0) - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn scaling_measures_from_application_time() {
        let mut bonuses = BonusTable::default();
        bonuses.set(
            "Swiftblade",
            vec![BonusVariable::scaling(BonusKey::AttackSpeed, 0.0, 1.0, 0.1)],
            5000.0,
        );
        assert_eq!(bonuses.total(BonusKey::AttackSpeed, 5000.0), 0.0);
        assert!((bonuses.total(BonusKey::AttackSpeed, 8000.0) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn expired_variables_are_pruned_not_read_around() {
        let mut bonuses = BonusTable::default();
        bonuses.set(
            "Adrenaline",
            vec![BonusVariable::new(BonusKey::AttackSpeed, 0.25).until(5000.0)],
            0.0,
        );
        // Read time does not filter; the upkeep prune does.
        assert_eq!(bonuses.total(BonusKey::AttackSpeed, 6000.0), 0.25);
        bonuses.prune_expired(6000.0);
        assert_eq!(bonuses.total(BonusKey::AttackSpeed, 6000.0), 0.0);
        // The emptied bucket still marks the source as applied.
        assert!(bonuses.has("Adrenaline"));
    }

    #[test]
    fn prune_keeps_unexpired_variables() {
        let mut bonuses = BonusTable::default();
        bonuses.set(
            "Mixed",
            vec![
                BonusVariable::new(BonusKey::Armor, 10.0).until(1000.0),
                BonusVariable::new(BonusKey::Armor, 5.0),
            ],
            0.0,
        );
        bonuses.prune_expired(2000.0);
        assert_eq!(bonuses.total(BonusKey::Armor, 2000.0), 5.0);
    }

    #[test]
    fn remove_drops_the_bucket() {
        let mut bonuses = BonusTable::default();
        bonuses.set("Aegis Charm", vec![BonusVariable::new(BonusKey::MagicResist, 15.0)], 0.0);
        assert!(bonuses.has("Aegis Charm"));
        bonuses.remove("Aegis Charm");
        assert!(!bonuses.has("Aegis Charm"));
        assert_eq!(bonuses.total(BonusKey::MagicResist, 0.0), 0.0);
    }
}
