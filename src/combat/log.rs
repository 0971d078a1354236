//! Combat logging
//!
//! Records all combat events for post-match analysis. Entries carry the
//! simulated timestamp at which they occurred, so a saved log replays the
//! match deterministically alongside the seed.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Stable identifier for a unit in log entries, e.g. `"Team 0 Pyromancer #2"`.
pub type UnitLogId = String;

/// A single entry in the combat log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogEntry {
    /// Simulated time in milliseconds since combat began.
    pub timestamp_ms: f64,
    /// The type of event.
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event.
    pub message: String,
    /// Structured data for damage/death entries, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<CombatLogDetail>,
}

/// Types of combat log events for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Ability cast
    AbilityCast,
    /// Status effect applied
    StatusApplied,
    /// Unit died
    Death,
    /// Match event (start, end, etc.)
    MatchEvent,
}

/// Structured payload attached to damage and death entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatLogDetail {
    pub source: Option<UnitLogId>,
    pub target: UnitLogId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f32>,
    #[serde(default)]
    pub is_killing_blow: bool,
}

/// The combat log resource storing all events.
#[derive(Resource, Default)]
pub struct CombatLog {
    /// All log entries in chronological order.
    pub entries: Vec<CombatLogEntry>,
    /// Current simulated match time in milliseconds.
    pub match_time_ms: f64,
}

impl CombatLog {
    /// Clear the log for a new match.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time_ms = 0.0;
    }

    /// Add a new entry to the log.
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp_ms: self.match_time_ms,
            event_type,
            message,
            detail: None,
        });
    }

    /// Add a damage entry with structured data.
    pub fn log_damage(
        &mut self,
        source: Option<UnitLogId>,
        target: UnitLogId,
        ability: String,
        amount: f32,
        is_killing_blow: bool,
        message: String,
    ) {
        self.entries.push(CombatLogEntry {
            timestamp_ms: self.match_time_ms,
            event_type: CombatLogEventType::Damage,
            message,
            detail: Some(CombatLogDetail {
                source,
                target,
                ability: Some(ability),
                amount: Some(amount),
                is_killing_blow,
            }),
        });
    }

    /// Add a death entry with killer tracking.
    pub fn log_death(&mut self, unit: UnitLogId, killer: Option<UnitLogId>, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp_ms: self.match_time_ms,
            event_type: CombatLogEventType::Death,
            message,
            detail: Some(CombatLogDetail {
                source: killer,
                target: unit,
                ability: None,
                amount: None,
                is_killing_blow: true,
            }),
        });
    }

    /// Get entries filtered by event type.
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Save the log plus match metadata as a JSON report.
    ///
    /// Returns the path written to. Defaults to `match_log.json` in the
    /// working directory when no path is given.
    pub fn save_to_file(
        &self,
        metadata: &MatchMetadata,
        output_path: Option<&str>,
    ) -> std::io::Result<String> {
        let report = MatchReport {
            metadata,
            entries: &self.entries,
        };
        let path = output_path.unwrap_or("match_log.json").to_string();
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Final per-unit state recorded in the match report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub name: String,
    pub star_level: u8,
    pub max_health: f32,
    pub final_health: f32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub final_hex: (i32, i32),
}

/// Match-level metadata attached to a saved log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Winning team (0 or 1), or None for a draw.
    pub winner: Option<u8>,
    pub match_time_ms: f64,
    pub random_seed: Option<u64>,
    pub teams: [Vec<UnitMetadata>; 2],
}

#[derive(Serialize)]
struct MatchReport<'a> {
    metadata: &'a MatchMetadata,
    entries: &'a [CombatLogEntry],
}
