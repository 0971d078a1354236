//! Hex Board Geometry
//!
//! Coordinate math for the fixed-size hexagonal battle board. The board uses
//! an offset-row layout: odd rows are shifted half a hex to the right, so the
//! diagonal neighbor columns differ between even and odd rows.
//!
//! The board is split into two halves (one per team). `invert` reflects a hex
//! across the board center; `mirror` does so only for hexes on the second
//! half, which maps a defender-side placement onto attacker-side coordinates.

use std::collections::HashSet;

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of columns on the board.
pub const BOARD_COL_COUNT: i32 = 7;
/// Number of rows on the board (both halves).
pub const BOARD_ROW_COUNT: i32 = 8;
/// Rows belonging to each team's half.
pub const BOARD_ROW_PER_SIDE: i32 = 4;

/// Vertical spacing between hex rows, in hex-width units (sqrt(3)/2).
const ROW_HEIGHT: f32 = 0.866_025_4;

/// A column/row coordinate on the hex board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub col: i32,
    pub row: i32,
}

impl HexCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Whether this coordinate lies within the board bounds.
    pub fn is_on_board(&self) -> bool {
        self.col >= 0 && self.col < BOARD_COL_COUNT && self.row >= 0 && self.row < BOARD_ROW_COUNT
    }

    /// The up-to-6 adjacent hexes, respecting board edges.
    ///
    /// Odd rows are offset to the right, so their diagonal neighbors sit at
    /// `col` and `col + 1`, while even rows use `col - 1` and `col`.
    pub fn neighbors(&self) -> SmallVec<[HexCoord; 6]> {
        let mut hexes = SmallVec::new();
        let last_col = BOARD_COL_COUNT - 1;
        let last_row = BOARD_ROW_COUNT - 1;
        let (col, row) = (self.col, self.row);
        if col < last_col {
            hexes.push(HexCoord::new(col + 1, row));
        }
        if col > 0 {
            hexes.push(HexCoord::new(col - 1, row));
        }
        let is_offset_row = row % 2 == 1;
        let look_left = if is_offset_row { 0 } else { -1 };
        let look_right = if is_offset_row { 1 } else { 0 };
        if col + look_left >= 0 {
            if row > 0 {
                hexes.push(HexCoord::new(col + look_left, row - 1));
            }
            if row < last_row {
                hexes.push(HexCoord::new(col + look_left, row + 1));
            }
        }
        if col + look_right <= last_col {
            if row > 0 {
                hexes.push(HexCoord::new(col + look_right, row - 1));
            }
            if row < last_row {
                hexes.push(HexCoord::new(col + look_right, row + 1));
            }
        }
        hexes
    }

    /// Reflects across the board center (both axes).
    pub fn invert(&self) -> HexCoord {
        HexCoord::new(BOARD_COL_COUNT - self.col - 1, BOARD_ROW_COUNT - self.row - 1)
    }

    /// Reflects second-half hexes onto the first half; identity otherwise.
    pub fn mirror(&self) -> HexCoord {
        if self.row >= BOARD_ROW_PER_SIDE {
            self.invert()
        } else {
            *self
        }
    }

    /// Hex-grid distance (number of steps), not Euclidean.
    ///
    /// Computed by converting the offset coordinates to cube coordinates.
    pub fn distance_to(&self, other: HexCoord) -> i32 {
        let (aq, ar) = self.axial();
        let (bq, br) = other.axial();
        let dq = aq - bq;
        let dr = ar - br;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
    }

    fn axial(&self) -> (i32, i32) {
        // Odd-row offset to axial: shift alternating rows back into line.
        (self.col - (self.row - (self.row & 1)) / 2, self.row)
    }

    /// World-space center of this hex, in hex-width units.
    ///
    /// Used for projectile travel and collision tests, which operate on
    /// continuous coordinates rather than hex steps.
    pub fn world_coord(&self) -> Vec2 {
        let offset = if self.row % 2 == 1 { 0.5 } else { 0.0 };
        Vec2::new(self.col as f32 + offset, self.row as f32 * ROW_HEIGHT)
    }
}

/// Finds the unoccupied hex nearest to `start`, expanding outward
/// breadth-first. Direct neighbors are checked before neighbors-of-neighbors,
/// so the first free hex found is at minimal ring distance; ties go to
/// neighbor-iteration discovery order. Returns `None` only when every
/// reachable hex is occupied.
pub fn nearest_free_hex(start: HexCoord, occupied: &HashSet<HexCoord>) -> Option<HexCoord> {
    if !occupied.contains(&start) {
        return Some(start);
    }
    let mut visited: HashSet<HexCoord> = HashSet::new();
    visited.insert(start);
    let mut frontier = vec![start];
    while !frontier.is_empty() {
        let mut next_frontier = Vec::new();
        for hex in &frontier {
            for neighbor in hex.neighbors() {
                if visited.insert(neighbor) {
                    if !occupied.contains(&neighbor) {
                        return Some(neighbor);
                    }
                    next_frontier.push(neighbor);
                }
            }
        }
        frontier = next_frontier;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_are_in_bounds_at_distance_one() {
        for col in 0..BOARD_COL_COUNT {
            for row in 0..BOARD_ROW_COUNT {
                let hex = HexCoord::new(col, row);
                for neighbor in hex.neighbors() {
                    assert!(neighbor.is_on_board(), "{:?} -> {:?}", hex, neighbor);
                    assert_eq!(hex.distance_to(neighbor), 1, "{:?} -> {:?}", hex, neighbor);
                }
            }
        }
    }

    #[test]
    fn interior_hex_has_six_neighbors() {
        assert_eq!(HexCoord::new(3, 3).neighbors().len(), 6);
    }

    #[test]
    fn corner_hexes_have_fewer_neighbors() {
        // (0, 0) is on an even row, so both diagonals look left out of bounds.
        assert_eq!(HexCoord::new(0, 0).neighbors().len(), 2);
        assert_eq!(HexCoord::new(BOARD_COL_COUNT - 1, 0).neighbors().len(), 3);
    }

    #[test]
    fn distance_is_symmetric_and_zero_iff_equal() {
        for (a, b) in [
            (HexCoord::new(0, 0), HexCoord::new(6, 7)),
            (HexCoord::new(2, 3), HexCoord::new(4, 1)),
            (HexCoord::new(1, 5), HexCoord::new(1, 5)),
        ] {
            assert_eq!(a.distance_to(b), b.distance_to(a));
            assert_eq!(a.distance_to(b) == 0, a == b);
        }
    }

    #[test]
    fn invert_reflects_both_axes() {
        assert_eq!(HexCoord::new(0, 0).invert(), HexCoord::new(6, 7));
        assert_eq!(HexCoord::new(3, 4).invert(), HexCoord::new(3, 3));
    }

    #[test]
    fn mirror_only_reflects_second_half() {
        assert_eq!(HexCoord::new(2, 1).mirror(), HexCoord::new(2, 1));
        assert_eq!(HexCoord::new(2, 6).mirror(), HexCoord::new(4, 1));
    }

    #[test]
    fn nearest_free_hex_prefers_start() {
        let occupied = HashSet::new();
        let start = HexCoord::new(3, 3);
        assert_eq!(nearest_free_hex(start, &occupied), Some(start));
    }

    #[test]
    fn nearest_free_hex_escapes_occupied_cluster() {
        // Fully occupy (3,3) and all of its neighbors; the nearest free hex
        // must be found two steps out.
        let start = HexCoord::new(3, 3);
        let mut occupied: HashSet<HexCoord> = start.neighbors().into_iter().collect();
        occupied.insert(start);
        let found = nearest_free_hex(start, &occupied).expect("board is not full");
        assert_eq!(start.distance_to(found), 2);
        assert!(!occupied.contains(&found));
    }

    #[test]
    fn nearest_free_hex_none_when_board_full() {
        let mut occupied = HashSet::new();
        for col in 0..BOARD_COL_COUNT {
            for row in 0..BOARD_ROW_COUNT {
                occupied.insert(HexCoord::new(col, row));
            }
        }
        assert_eq!(nearest_free_hex(HexCoord::new(0, 0), &occupied), None);
    }
}
