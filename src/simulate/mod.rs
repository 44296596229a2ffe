//! Behavioral simulation module.
//!
//! Wraps primitive browser actions with human-plausible timing so automated
//! interaction never exhibits uniform, machine-like cadence.
//!
//! # Submodules
//!
//! - [`timing`] - Delay math (WPM conversion, uniform delay primitive)
//! - [`actions`] - The [`HumanBehavior`] simulator and scroll patterns

pub mod actions;
pub mod timing;

pub use actions::{ActionError, BehaviorConfig, HumanBehavior, ScrollPattern};
pub use timing::random_delay;
