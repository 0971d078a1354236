//! Targeting & Pathing
//!
//! Target acquisition scans outward from a unit's hex in breadth-first
//! rings, so "nearest enemy" respects hex distance and resolves ties by
//! discovery order, which is stable for a given board state. Pathing is a
//! BFS through free hexes to the closest hex that puts the target in
//! attack range; only the first step is taken per move action.

use std::collections::{HashMap, HashSet, VecDeque};

use bevy::prelude::*;

use crate::board::HexCoord;

/// Immutable per-unit facts captured once per tick for target scans.
#[derive(Debug, Clone, Copy)]
pub struct TargetSnapshot {
    pub entity: Entity,
    pub team: u8,
    pub hex: HexCoord,
    pub sequence: u32,
    pub attackable: bool,
    pub health_fraction: f32,
}

/// The nearest attackable enemy of `team`, with its hex distance.
///
/// Breadth-first over the board from `from`; the first enemy discovered
/// wins, so equidistant enemies tie-break by scan order.
pub fn nearest_enemy(
    from: HexCoord,
    team: u8,
    snapshot: &[TargetSnapshot],
) -> Option<(Entity, u32)> {
    let occupants: HashMap<HexCoord, &TargetSnapshot> = snapshot
        .iter()
        .filter(|unit| unit.attackable)
        .map(|unit| (unit.hex, unit))
        .collect();

    let mut visited: HashSet<HexCoord> = HashSet::new();
    let mut queue: VecDeque<(HexCoord, u32)> = VecDeque::new();
    visited.insert(from);
    queue.push_back((from, 0));

    while let Some((hex, depth)) = queue.pop_front() {
        if let Some(unit) = occupants.get(&hex) {
            if unit.team != team && hex != from {
                return Some((unit.entity, depth));
            }
        }
        for neighbor in hex.neighbors() {
            if visited.insert(neighbor) {
                queue.push_back((neighbor, depth + 1));
            }
        }
    }
    None
}

/// All attackable enemies of `team` within `range` hexes, nearest first.
/// Ties break by unit sequence.
pub fn enemies_in_range(
    from: HexCoord,
    team: u8,
    range: u32,
    snapshot: &[TargetSnapshot],
) -> Vec<(Entity, u32)> {
    let mut found: Vec<(u32, u32, Entity)> = snapshot
        .iter()
        .filter(|unit| unit.attackable && unit.team != team)
        .filter_map(|unit| {
            let distance = from.distance_to(unit.hex) as u32;
            (distance <= range).then_some((distance, unit.sequence, unit.entity))
        })
        .collect();
    found.sort_unstable();
    found
        .into_iter()
        .map(|(distance, _, entity)| (entity, distance))
        .collect()
}

/// First step of a shortest free-hex path from `from` to any hex within
/// `range` of `target`. Returns `None` when already in range or fully
/// boxed in.
pub fn path_step(
    from: HexCoord,
    target: HexCoord,
    range: u32,
    occupied: &HashSet<HexCoord>,
) -> Option<HexCoord> {
    if from.distance_to(target) as u32 <= range {
        return None;
    }

    let mut parents: HashMap<HexCoord, HexCoord> = HashMap::new();
    let mut visited: HashSet<HexCoord> = HashSet::new();
    let mut queue: VecDeque<HexCoord> = VecDeque::new();
    visited.insert(from);
    queue.push_back(from);

    while let Some(hex) = queue.pop_front() {
        if hex != from && hex.distance_to(target) as u32 <= range {
            // Walk the parent chain back to the step adjacent to `from`.
            let mut step = hex;
            while parents[&step] != from {
                step = parents[&step];
            }
            return Some(step);
        }
        for neighbor in hex.neighbors() {
            if occupied.contains(&neighbor) || !visited.insert(neighbor) {
                continue;
            }
            parents.insert(neighbor, hex);
            queue.push_back(neighbor);
        }
    }
    None
}
