//! # Seekbot
//!
//! Job-search browser automation with a single stealth session and
//! human-like interaction patterns.
//!
//! Seekbot keeps exactly one remote-controlled browser session alive for
//! the lifetime of the process and shares it between uncoordinated
//! consumers: the authenticator, the scraper, and the status dashboard.
//! Every interaction with the page passes through a behavioral simulator
//! so automated traffic resembles a human user, and anti-automation
//! challenges suspend progress until a human operator resolves them.
//!
//! ## Module Overview
//!
//! - [`session`]: Session lifecycle: driver abstraction, singleton
//!   manager with the create-once/lock-in policy, health probing, recovery
//! - [`stealth`]: Randomized launch profiles and property-override scripts
//! - [`simulate`]: Human-like typing, clicking, scrolling, and reading
//! - [`captcha`]: Challenge detection and the human-intervention loop
//! - [`bot`]: Orchestration: authentication and scraping flows
//! - [`api`]: Dashboard REST server
//! - [`config`]: Layered settings (file, environment, CLI)
//! - [`storage`]: JSON persistence of searches, applications, and logs
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Seekbot                           │
//! ├──────────────────────────────────────────────────────────┤
//! │   ┌───────┐   ┌─────────┐           ┌─────────────────┐  │
//! │   │  Bot  │──▶│ Session │◀─────────│  Dashboard API   │  │
//! │   │ auth/ │   │ Manager │   status  └─────────────────┘  │
//! │   │scraper│   └────┬────┘                                │
//! │   └───┬───┘        │ create (once)                       │
//! │       │       ┌────┴────┐   ┌─────────┐   ┌─────────┐    │
//! │       └──────▶│ Driver  │◀──│ Stealth │   │ Captcha │    │
//! │  via Simulate └─────────┘   └─────────┘   └─────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Session policy
//!
//! The session manager creates the browser at most once per process. Once
//! that decision is locked in, a dead session is a terminal condition
//! reported as unavailable until an operator explicitly recovers it;
//! uncontrolled session churn is itself a detection signal.

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Full version string with name
pub const FULL_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Module Exports
// ============================================================================

/// Session lifecycle: driver abstraction, singleton manager, health probe.
pub mod session;

/// Anti-detection launch profiles and override scripts.
pub mod stealth;

/// Human-like interaction simulation.
pub mod simulate;

/// Captcha detection and human-intervention loop.
pub mod captcha;

/// Bot orchestration: authentication and scraping flows.
pub mod bot;

/// Dashboard REST API server.
pub mod api;

/// Configuration management.
pub mod config;

/// JSON persistence for searches, applications, and logs.
pub mod storage;

// ============================================================================
// Re-exports for Convenience
// ============================================================================

pub use session::{
    BrowserDriver, DriverError, DriverFactory, HealthProbe, HealthReport, MockDriver,
    MockDriverFactory, Session, SessionError, SessionHandle, SessionManager, StatusSnapshot,
};

#[cfg(feature = "chrome-driver")]
pub use session::{find_chrome_executable, ChromeDriver, ChromeDriverFactory};

pub use stealth::{injection_scripts, StealthProfile, StealthProfileBuilder};

pub use simulate::{ActionError, BehaviorConfig, HumanBehavior, ScrollPattern};

pub use captcha::{
    detect_challenge, DesktopNotifier, InterventionConfig, InterventionError, InterventionGauge,
    InterventionLoop, InterventionPhase, InterventionState, Notifier, NullNotifier,
};

pub use bot::{AuthError, Authenticator, Bot, BotError, BotStatus, ScrapeError, Scraper};

pub use api::{ApiServer, AppState};

pub use config::{BotSettings, CliArgs, ConfigError};

pub use storage::{
    ApplicationRecord, DataKind, JsonStorage, LogRecord, SearchRecord, StorageError,
};

// ============================================================================
// Prelude Module
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```rust
/// use seekbot::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{ApiServer, AppState};
    pub use crate::bot::Bot;
    pub use crate::captcha::{InterventionConfig, InterventionLoop};
    pub use crate::config::{BotSettings, CliArgs};
    pub use crate::session::{SessionHandle, SessionManager};
    pub use crate::simulate::{HumanBehavior, ScrollPattern};
    pub use crate::stealth::StealthProfileBuilder;
    pub use crate::{FULL_VERSION, NAME, VERSION};
}
