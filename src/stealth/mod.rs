//! Stealth and anti-detection module.
//!
//! Produces randomized, fingerprint-resistant launch configuration for new
//! browser sessions and the ordered property-override scripts that run
//! against a session immediately after creation.
//!
//! # Submodules
//!
//! - [`profile`] - Stealth profile generation from candidate pools
//! - [`scripts`] - Ordered JavaScript property overrides
//!
//! The overrides must execute before the first page navigation; see
//! [`scripts::injection_scripts`] for the ordering contract.

pub mod profile;
pub mod scripts;

pub use profile::{StealthProfile, StealthProfileBuilder};
pub use scripts::injection_scripts;
