//! Spatial Effects
//!
//! Spells act on the world through spawned spatial effect entities rather
//! than by touching units directly. A hex effect claims a set of hexes and
//! applies its payload once when it activates; a projectile travels through
//! world space and applies its payload on collision. Both carry a damage
//! payload and status applications resolved through the one shared hit
//! path, with source stats snapshotted at cast time.

use bevy::prelude::*;

use crate::board::HexCoord;
use crate::combat::events::{DamageDealtEvent, StatusAppliedEvent};

use super::clock::SimClock;
use super::constants::{DEFAULT_COLLISION_RADIUS, MAX_PROJECTILE_LIFETIME_MS};
use super::damage::{DamagePayload, SourceStats};
use super::hooks::{resolve_hit, HitOutcome, HookRegistry};
use super::status::StatusApplication;
use super::unit::Unit;
use super::{ActiveTraits, TeamAugments};

/// Which side of the board an effect applies to, relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectTarget {
    #[default]
    Enemies,
    Allies,
}

/// What a projectile does when its target dies mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetargetPolicy {
    /// Fly on to the target's last known position.
    #[default]
    Continue,
    /// Re-aim at the attackable enemy closest to the projectile.
    Closest,
    /// Re-aim at the attackable enemy farthest from the projectile.
    Farthest,
}

/// Mutable flight state of a projectile effect.
#[derive(Debug, Clone)]
pub struct ProjectileState {
    /// World-space position in hex-width units.
    pub position: Vec2,
    pub target: Option<Entity>,
    pub direction: Vec2,
    pub last_target_position: Vec2,
    /// Hex-widths per second.
    pub speed: f32,
    pub acceleration: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// When set, the projectile flies a straight line for this many hexes
    /// and strikes everything it passes through.
    pub fixed_hex_range: Option<f32>,
    pub destroys_on_collision: bool,
    pub on_target_death: RetargetPolicy,
    /// Fly back to the launch position after the outbound hit, striking
    /// again on the way home.
    pub return_missile: bool,
    pub returning: bool,
    pub return_to: Vec2,
    pub traveled: f32,
    /// Units already struck by this pass.
    pub struck: Vec<Entity>,
}

impl ProjectileState {
    /// A projectile that homes on `target`.
    pub fn homing(origin: Vec2, target: Entity, target_position: Vec2, speed: f32) -> Self {
        Self {
            position: origin,
            target: Some(target),
            direction: (target_position - origin).normalize_or_zero(),
            last_target_position: target_position,
            speed,
            acceleration: 0.0,
            min_speed: speed,
            max_speed: speed,
            fixed_hex_range: None,
            destroys_on_collision: true,
            on_target_death: RetargetPolicy::Continue,
            return_missile: false,
            returning: false,
            return_to: origin,
            traveled: 0.0,
            struck: Vec::new(),
        }
    }

    /// A straight-line projectile covering `range` hexes.
    pub fn fixed_range(origin: Vec2, direction: Vec2, range: f32, speed: f32) -> Self {
        Self {
            position: origin,
            target: None,
            direction: direction.normalize_or_zero(),
            last_target_position: origin + direction.normalize_or_zero() * range,
            speed,
            acceleration: 0.0,
            min_speed: speed,
            max_speed: speed,
            fixed_hex_range: Some(range),
            destroys_on_collision: false,
            on_target_death: RetargetPolicy::Continue,
            return_missile: false,
            returning: false,
            return_to: origin,
            traveled: 0.0,
            struck: Vec::new(),
        }
    }

    pub fn with_acceleration(mut self, acceleration: f32, min_speed: f32, max_speed: f32) -> Self {
        self.acceleration = acceleration;
        self.min_speed = min_speed;
        self.max_speed = max_speed;
        self
    }

    pub fn piercing(mut self) -> Self {
        self.destroys_on_collision = false;
        self
    }

    pub fn returning_missile(mut self) -> Self {
        self.return_missile = true;
        self
    }

    pub fn on_target_death(mut self, policy: RetargetPolicy) -> Self {
        self.on_target_death = policy;
        self
    }
}

/// Bespoke per-hit behavior a spell attaches to its effect, run against
/// each struck unit after the payload lands. Skipped when a spell shield
/// blocked the hit.
pub type CollisionFn = fn(&mut Unit, f64);

/// The geometry of a spatial effect.
#[derive(Debug, Clone)]
pub enum SpatialKind {
    /// Applies once, at activation, to units standing in these hexes.
    Hexes(Vec<HexCoord>),
    Projectile(ProjectileState),
}

/// A spell's presence in the world.
///
/// Lifecycle: dormant until `starts_at_ms` (cast time), hex effects
/// activate at `activates_at_ms` (travel time) and persist until
/// `expires_at_ms`; projectiles begin flying at `starts_at_ms` and live
/// until collision, range, or the lifetime cap.
#[derive(Component, Debug, Clone)]
pub struct SpatialEffect {
    pub source: Option<Entity>,
    pub source_team: u8,
    pub source_id: String,
    pub source_stats: SourceStats,
    pub payload: Option<DamagePayload>,
    pub statuses: Vec<StatusApplication>,
    pub on_collision: Option<CollisionFn>,
    pub affects: EffectTarget,
    pub starts_at_ms: f64,
    pub activates_at_ms: f64,
    pub expires_at_ms: f64,
    pub activated: bool,
    pub kind: SpatialKind,
}

impl SpatialEffect {
    pub fn hex_burst(
        source: Entity,
        source_team: u8,
        source_id: impl Into<String>,
        source_stats: SourceStats,
        hexes: Vec<HexCoord>,
        cast_seconds: f32,
        travel_seconds: f32,
        duration_seconds: f32,
        elapsed_ms: f64,
    ) -> Self {
        let starts_at_ms = elapsed_ms + cast_seconds as f64 * 1000.0;
        let activates_at_ms = starts_at_ms + travel_seconds as f64 * 1000.0;
        let expires_at_ms = activates_at_ms + duration_seconds as f64 * 1000.0;
        Self {
            source: Some(source),
            source_team,
            source_id: source_id.into(),
            source_stats,
            payload: None,
            statuses: Vec::new(),
            on_collision: None,
            affects: EffectTarget::Enemies,
            starts_at_ms,
            activates_at_ms,
            expires_at_ms,
            activated: false,
            kind: SpatialKind::Hexes(hexes),
        }
    }

    pub fn projectile(
        source: Entity,
        source_team: u8,
        source_id: impl Into<String>,
        source_stats: SourceStats,
        state: ProjectileState,
        cast_seconds: f32,
        elapsed_ms: f64,
    ) -> Self {
        let starts_at_ms = elapsed_ms + cast_seconds as f64 * 1000.0;
        Self {
            source: Some(source),
            source_team,
            source_id: source_id.into(),
            source_stats,
            payload: None,
            statuses: Vec::new(),
            on_collision: None,
            affects: EffectTarget::Enemies,
            starts_at_ms,
            activates_at_ms: starts_at_ms,
            expires_at_ms: starts_at_ms + MAX_PROJECTILE_LIFETIME_MS,
            activated: false,
            kind: SpatialKind::Projectile(state),
        }
    }

    pub fn with_payload(mut self, payload: DamagePayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_statuses(mut self, statuses: Vec<StatusApplication>) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn with_collision_callback(mut self, callback: CollisionFn) -> Self {
        self.on_collision = Some(callback);
        self
    }

    pub fn affecting(mut self, affects: EffectTarget) -> Self {
        self.affects = affects;
        self
    }
}

/// Event writers a strike feeds. Deaths are not reported here; the
/// end-of-tick death sweep picks up any unit the hit killed.
pub(crate) struct HitEvents<'a, 'w1, 'w2> {
    pub damage: &'a mut EventWriter<'w1, DamageDealtEvent>,
    pub status: &'a mut EventWriter<'w2, StatusAppliedEvent>,
}

/// Resolve one payload against one target through the hit path, handling
/// the source/target aliasing cases and emitting events. The source borrow
/// is skipped when the source entity is gone or is the target itself.
#[allow(clippy::too_many_arguments)]
pub(crate) fn strike(
    registry: &HookRegistry,
    active_traits: &ActiveTraits,
    augments: &TeamAugments,
    payload: &DamagePayload,
    source_stats: SourceStats,
    statuses: &[StatusApplication],
    source: Option<Entity>,
    target: Entity,
    crit: bool,
    elapsed_ms: f64,
    units: &mut Query<(Entity, &mut Unit)>,
    events: &mut HitEvents,
) -> HitOutcome {
    let pair = match source {
        Some(source_entity) if source_entity != target => {
            units.get_many_mut([source_entity, target]).ok()
        }
        _ => None,
    };
    let outcome = match pair {
        Some([(_, source_unit), (_, target_unit)]) => {
            let target_unit = target_unit.into_inner();
            if !target_unit.interactable() {
                return HitOutcome::default();
            }
            resolve_hit(
                registry,
                active_traits,
                augments,
                payload,
                source_stats,
                Some(source_unit.into_inner()),
                target_unit,
                statuses,
                crit,
                elapsed_ms,
            )
        }
        None => {
            let Ok((_, target_unit)) = units.get_mut(target) else {
                return HitOutcome::default();
            };
            let target_unit = target_unit.into_inner();
            if !target_unit.interactable() {
                return HitOutcome::default();
            }
            resolve_hit(
                registry,
                active_traits,
                augments,
                payload,
                source_stats,
                None,
                target_unit,
                statuses,
                crit,
                elapsed_ms,
            )
        }
    };

    events.damage.send(DamageDealtEvent {
        source,
        target,
        source_id: payload.source_id.clone(),
        source_type: payload.source_type,
        damage_type: payload.damage_type,
        amount: outcome.dealt,
        is_killing_blow: outcome.killing_blow,
    });
    if outcome.statuses_applied {
        for status in statuses {
            events.status.send(StatusAppliedEvent {
                target,
                effect_name: status.effect.name(),
                duration_ms: status.duration_ms,
            });
        }
    }
    if outcome.killing_blow {
        if let Ok((_, mut target_unit)) = units.get_mut(target) {
            target_unit.killer = source;
        }
    }
    outcome
}

/// Advances every live spatial effect by one tick and despawns the done.
pub fn update_spatial_effects(
    mut commands: Commands,
    clock: Res<SimClock>,
    registry: Res<HookRegistry>,
    active_traits: Res<ActiveTraits>,
    augments: Res<TeamAugments>,
    mut effects: Query<(Entity, &mut SpatialEffect)>,
    mut units: Query<(Entity, &mut Unit)>,
    mut damage_events: EventWriter<DamageDealtEvent>,
    mut status_events: EventWriter<StatusAppliedEvent>,
) {
    let elapsed_ms = clock.elapsed_ms;
    let dt = (clock.delta_ms / 1000.0) as f32;

    for (effect_entity, effect) in &mut effects {
        let effect = effect.into_inner();
        if elapsed_ms < effect.starts_at_ms {
            continue;
        }
        let mut events = HitEvents {
            damage: &mut damage_events,
            status: &mut status_events,
        };
        let keep = match &mut effect.kind {
            SpatialKind::Hexes(hexes) => {
                if !effect.activated && elapsed_ms >= effect.activates_at_ms {
                    effect.activated = true;
                    let mut eligible: Vec<(u32, Entity)> = units
                        .iter()
                        .filter(|(_, unit)| {
                            unit.interactable()
                                && hexes.contains(&unit.hex)
                                && match effect.affects {
                                    EffectTarget::Enemies => unit.team != effect.source_team,
                                    EffectTarget::Allies => unit.team == effect.source_team,
                                }
                        })
                        .map(|(entity, unit)| (unit.sequence, entity))
                        .collect();
                    eligible.sort_unstable_by_key(|(sequence, _)| *sequence);
                    if let Some(payload) = &effect.payload {
                        for (_, target) in eligible {
                            let outcome = strike(
                                &registry,
                                &active_traits,
                                &augments,
                                payload,
                                effect.source_stats,
                                &effect.statuses,
                                effect.source,
                                target,
                                false,
                                elapsed_ms,
                                &mut units,
                                &mut events,
                            );
                            if let Some(callback) = effect.on_collision {
                                if !outcome.spell_shield_blocked {
                                    if let Ok((_, unit)) = units.get_mut(target) {
                                        callback(unit.into_inner(), elapsed_ms);
                                    }
                                }
                            }
                        }
                    }
                }
                elapsed_ms <= effect.expires_at_ms
            }
            SpatialKind::Projectile(state) => update_projectile(
                state,
                effect.source,
                effect.source_team,
                &mut effect.source_id,
                effect.source_stats,
                effect.payload.as_ref(),
                &effect.statuses,
                effect.on_collision,
                effect.starts_at_ms,
                elapsed_ms,
                dt,
                &registry,
                &active_traits,
                &augments,
                &mut units,
                &mut events,
            ),
        };
        if !keep {
            commands.entity(effect_entity).despawn();
        }
    }
}

/// One tick of projectile flight. Returns false when the projectile is
/// finished.
#[allow(clippy::too_many_arguments)]
fn update_projectile(
    state: &mut ProjectileState,
    source: Option<Entity>,
    source_team: u8,
    source_id: &mut String,
    source_stats: SourceStats,
    payload: Option<&DamagePayload>,
    statuses: &[StatusApplication],
    on_collision: Option<CollisionFn>,
    starts_at_ms: f64,
    elapsed_ms: f64,
    dt: f32,
    registry: &HookRegistry,
    active_traits: &ActiveTraits,
    augments: &TeamAugments,
    units: &mut Query<(Entity, &mut Unit)>,
    events: &mut HitEvents,
) -> bool {
    if elapsed_ms - starts_at_ms > MAX_PROJECTILE_LIFETIME_MS {
        return false;
    }

    // Snapshot potential collision targets in deterministic order.
    let mut candidates: Vec<(u32, Entity, Vec2)> = units
        .iter()
        .filter(|(_, unit)| unit.interactable() && unit.team != source_team)
        .map(|(entity, unit)| (unit.sequence, entity, unit.hex.world_coord()))
        .collect();
    candidates.sort_unstable_by_key(|(sequence, _, _)| *sequence);

    // Homing projectiles re-aim every tick; a dead target triggers the
    // retarget policy.
    if state.fixed_hex_range.is_none() && !state.returning {
        let target_alive = state.target.and_then(|target| {
            units
                .get(target)
                .ok()
                .filter(|(_, unit)| unit.attackable())
                .map(|(_, unit)| unit.hex.world_coord())
        });
        match target_alive {
            Some(position) => state.last_target_position = position,
            None if state.target.is_some() => {
                state.target = retarget(state.on_target_death, state.position, &candidates, units);
                if let Some(new_target) = state.target {
                    if let Ok((_, unit)) = units.get(new_target) {
                        state.last_target_position = unit.hex.world_coord();
                    }
                }
            }
            None => {}
        }
        state.direction = (state.last_target_position - state.position).normalize_or_zero();
    }

    state.speed = (state.speed + state.acceleration * dt).clamp(state.min_speed, state.max_speed);
    let step = state.speed * dt;
    state.position += state.direction * step;
    state.traveled += step;

    // Collisions against anything in reach this tick.
    for (_, entity, position) in &candidates {
        if state.struck.contains(entity) {
            continue;
        }
        if state.position.distance(*position) > DEFAULT_COLLISION_RADIUS {
            continue;
        }
        if let Some(payload) = payload {
            let outcome = strike(
                registry,
                active_traits,
                augments,
                payload,
                source_stats,
                statuses,
                source,
                *entity,
                false,
                elapsed_ms,
                units,
                events,
            );
            if let Some(callback) = on_collision {
                if !outcome.spell_shield_blocked {
                    if let Ok((_, unit)) = units.get_mut(*entity) {
                        callback(unit.into_inner(), elapsed_ms);
                    }
                }
            }
        }
        state.struck.push(*entity);

        let reached_target = state.target == Some(*entity);
        if reached_target || state.destroys_on_collision {
            if state.return_missile && !state.returning {
                begin_return(state, source_id);
                break;
            }
            return false;
        }
    }

    if state.returning && state.position.distance(state.return_to) <= DEFAULT_COLLISION_RADIUS {
        return false;
    }
    if let Some(range) = state.fixed_hex_range {
        if state.traveled >= range {
            return false;
        }
    }
    // A target-less flight ends on arrival at the last known position.
    if state.fixed_hex_range.is_none()
        && !state.returning
        && state.target.is_none()
        && state.position.distance(state.last_target_position) <= DEFAULT_COLLISION_RADIUS
    {
        return false;
    }
    true
}

/// Flip a projectile into its return flight. The return pass strikes
/// afresh under a distinct effect id.
fn begin_return(state: &mut ProjectileState, source_id: &mut String) {
    state.returning = true;
    state.target = None;
    state.struck.clear();
    state.direction = (state.return_to - state.position).normalize_or_zero();
    source_id.push_str(" Return");
}

fn retarget(
    policy: RetargetPolicy,
    from: Vec2,
    candidates: &[(u32, Entity, Vec2)],
    units: &Query<(Entity, &mut Unit)>,
) -> Option<Entity> {
    if policy == RetargetPolicy::Continue {
        return None;
    }
    let mut best: Option<(f32, Entity)> = None;
    for (_, entity, position) in candidates {
        // Retargeting requires an attackable unit, not merely interactable.
        let Ok((_, unit)) = units.get(*entity) else {
            continue;
        };
        if !unit.attackable() {
            continue;
        }
        let distance = from.distance(*position);
        let better = match (&best, policy) {
            (None, _) => true,
            (Some((best_distance, _)), RetargetPolicy::Closest) => distance < *best_distance,
            (Some((best_distance, _)), RetargetPolicy::Farthest) => distance > *best_distance,
            (_, RetargetPolicy::Continue) => false,
        };
        if better {
            best = Some((distance, *entity));
        }
    }
    best.map(|(_, entity)| entity)
}
