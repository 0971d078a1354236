//! JSON match configuration for headless runs.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::board::{HexCoord, BOARD_COL_COUNT, BOARD_ROW_PER_SIDE};
use crate::data::ChampionCatalog;

/// Full description of one match: two teams, optional seed, run limits.
///
/// Team placements are given in each team's own half-board coordinates
/// (rows `0..4`, row 0 at the back); team 1 placements are flipped onto
/// the far half when units spawn.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct MatchSetup {
    pub teams: [TeamSetup; 2],

    /// Maximum match duration in seconds before the match is called a draw.
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,

    /// Seed for the match RNG. Omit for a random seed.
    #[serde(default)]
    pub random_seed: Option<u64>,

    /// Where to write the match report. No report is written when omitted.
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSetup {
    pub units: Vec<UnitSetup>,

    /// Team-wide augments, by name.
    #[serde(default)]
    pub augments: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitSetup {
    /// Champion name, resolved against the catalog.
    pub champion: String,

    #[serde(default = "default_star_level")]
    pub star_level: u8,

    /// Half-board placement: `(col, row)` with `row` in `0..4`.
    pub hex: (i32, i32),

    /// Items held, by name.
    #[serde(default)]
    pub items: Vec<String>,
}

fn default_max_duration() -> f32 {
    300.0
}

fn default_star_level() -> u8 {
    1
}

impl MatchSetup {
    /// Load a match setup from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file {}: {}", path.display(), e))?;
        serde_json::from_str(&contents)
            .map_err(|e| format!("failed to parse config file {}: {}", path.display(), e))
    }

    /// Check the setup against the catalog before a match is built.
    pub fn validate(&self, catalog: &ChampionCatalog) -> Result<(), String> {
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        let half_capacity = (BOARD_COL_COUNT * BOARD_ROW_PER_SIDE) as usize;
        for (index, team) in self.teams.iter().enumerate() {
            if team.units.is_empty() {
                return Err(format!("team {index} has no units"));
            }
            if team.units.len() > half_capacity {
                return Err(format!(
                    "team {index} has {} units but its half holds only {half_capacity}",
                    team.units.len()
                ));
            }

            let mut taken: Vec<(i32, i32)> = Vec::new();
            for unit in &team.units {
                if catalog.get(&unit.champion).is_none() {
                    let known: Vec<&str> = catalog.names().collect();
                    return Err(format!(
                        "team {index} references unknown champion '{}'; known champions: {}",
                        unit.champion,
                        known.join(", ")
                    ));
                }
                if !(1..=4).contains(&unit.star_level) {
                    return Err(format!(
                        "team {index} '{}': star_level must be 1-4, got {}",
                        unit.champion, unit.star_level
                    ));
                }
                let (col, row) = unit.hex;
                if !(0..BOARD_COL_COUNT).contains(&col) || !(0..BOARD_ROW_PER_SIDE).contains(&row) {
                    return Err(format!(
                        "team {index} '{}': hex ({col}, {row}) is outside the team half \
                         (cols 0-{}, rows 0-{})",
                        unit.champion,
                        BOARD_COL_COUNT - 1,
                        BOARD_ROW_PER_SIDE - 1
                    ));
                }
                if taken.contains(&unit.hex) {
                    return Err(format!(
                        "team {index}: hex ({col}, {row}) is assigned to more than one unit"
                    ));
                }
                taken.push(unit.hex);
            }
        }
        Ok(())
    }

    pub fn max_duration_ms(&self) -> f64 {
        self.max_duration_secs as f64 * 1000.0
    }
}

impl UnitSetup {
    /// The board hex this unit spawns on. Team 1 placements flip to the
    /// far half so both configs read the same way.
    pub fn spawn_hex(&self, team: u8) -> HexCoord {
        let hex = HexCoord::new(self.hex.0, self.hex.1);
        if team == 1 {
            hex.invert()
        } else {
            hex
        }
    }
}
