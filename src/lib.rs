//! HexArena - hex-grid autobattler combat simulator
//!
//! A deterministic, tick-based combat engine for a two-team autobattler on
//! an offset hex grid. The simulation runs headless on the Bevy schedule
//! runner; matches are described in JSON and replayed exactly from a seed.
//!
//! This library exposes the core modules for testing and embedding.

pub mod board;
pub mod cli;
pub mod combat;
pub mod data;
pub mod headless;
pub mod sim;

// Re-export commonly used types
pub use board::HexCoord;
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::CombatPlugin;
pub use data::{ChampionCatalog, DataPlugin};
pub use headless::{run_headless_match, MatchResult, MatchSetup};
pub use sim::{GameRng, SimulationPlugin};
