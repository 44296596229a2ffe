//! Session lifecycle module.
//!
//! Owns the one browser session a process is allowed to have.
//!
//! # Submodules
//!
//! - [`driver`] - Remote browser abstraction, mock implementation, factory seam
//! - [`session`] - Session value and status snapshot types
//! - [`manager`] - Singleton slot with the create-once/lock-in policy
//! - [`probe`] - Bounded, non-mutating liveness checks
//! - [`chrome`] - CDP implementation (requires the `chrome-driver` feature)

pub mod driver;
pub mod manager;
pub mod probe;
pub mod session;

#[cfg(feature = "chrome-driver")]
pub mod chrome;

pub use driver::{BrowserDriver, DriverError, DriverFactory, MockDriver, MockDriverFactory};
pub use manager::{SessionError, SessionManager};
pub use probe::{HealthProbe, HealthReport};
pub use session::{Session, SessionHandle, StatusSnapshot};

#[cfg(feature = "chrome-driver")]
pub use chrome::{find_chrome_executable, ChromeDriver, ChromeDriverFactory};
