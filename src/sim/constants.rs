//! Simulation Constants
//!
//! Centralized location for tick timing and tuning values used throughout
//! the simulation. Several of these are experimentally-determined tuning
//! inputs rather than fixed rules; adjust here to rebalance.

/// Fixed simulation tick duration in milliseconds (30 ticks per second).
pub const GAME_TICK_MS: f64 = 1000.0 / 30.0;

// ============================================================================
// Combat start lockouts
// ============================================================================

/// Units that jump to the enemy backline may begin acting after this delay.
pub const MOVE_LOCKOUT_JUMPERS_MS: f64 = 500.0;

/// All remaining units are locked out of acting until this delay elapses,
/// modeling the pre-combat positioning phase.
pub const MOVE_LOCKOUT_MELEE_MS: f64 = 1000.0;

// ============================================================================
// Casting and projectiles
// ============================================================================

/// Cast time applied when a spell does not specify one, in seconds.
pub const DEFAULT_CAST_SECONDS: f32 = 0.25;

/// Travel delay applied when a spell does not specify one, in seconds.
pub const DEFAULT_TRAVEL_SECONDS: f32 = 0.0;

/// Projectiles expire after this long regardless of travel, in milliseconds.
pub const MAX_PROJECTILE_LIFETIME_MS: f64 = 10_000.0;

/// Default projectile collision radius, in hex-width units.
/// Half a projectile width plus half a unit's footprint.
pub const DEFAULT_COLLISION_RADIUS: f32 = 0.55;

// ============================================================================
// Unit actions
// ============================================================================

/// Time to traverse one hex at base move speed, in milliseconds. Tuning value.
pub const BASE_MOVE_HEX_MS: f64 = 550.0;

/// Mana granted per landed basic attack.
pub const MANA_GAIN_PER_ATTACK: f32 = 10.0;

/// Damage multiplier applied on a critical strike.
pub const CRIT_DAMAGE_MULTIPLIER: f32 = 1.4;

// ============================================================================
// Star scaling
// ============================================================================

/// Health multiplier per star level above one.
pub const STAR_HEALTH_MULTIPLIER: f32 = 1.8;

/// Attack damage multiplier per star level above one.
pub const STAR_ATTACK_MULTIPLIER: f32 = 1.25;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_is_one_thirtieth_of_a_second() {
        assert!((GAME_TICK_MS - 33.333).abs() < 0.01);
    }

    #[test]
    fn lockouts_are_ordered() {
        assert!(MOVE_LOCKOUT_JUMPERS_MS < MOVE_LOCKOUT_MELEE_MS);
    }
}
