//! Headless match execution
//!
//! Runs full matches without any graphical output, suitable for batch
//! simulation and automated testing.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- match_setup.json --seed 42
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "teams": [
//!     { "units": [ { "champion": "Duelist", "hex": [3, 3] } ] },
//!     { "units": [ { "champion": "Pyromancer", "hex": [2, 2] } ],
//!       "augments": ["Phalanx"] }
//!   ],
//!   "random_seed": 42,
//!   "max_duration_secs": 120
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::MatchSetup;
pub use runner::{run_headless_match, HeadlessMatchState, HeadlessPlugin, MatchResult};
