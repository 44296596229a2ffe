//! Session value and status snapshot types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::driver::BrowserDriver;

/// Shared, non-owning reference to the process-wide session.
///
/// Holders may navigate and query through [`Session::driver`] but must not
/// call destructive operations; teardown belongs to the session manager.
pub type SessionHandle = Arc<Session>;

/// One live remote-controlled browser instance.
///
/// At most one `Session` exists per process. The identifier is assigned by
/// the underlying driver and remains opaque to everything above it.
pub struct Session {
    driver: Arc<dyn BrowserDriver>,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Wraps a freshly created driver.
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self {
            driver,
            created_at: Utc::now(),
        }
    }

    /// The underlying driver, for navigation and queries.
    pub fn driver(&self) -> &Arc<dyn BrowserDriver> {
        &self.driver
    }

    /// Driver-assigned session identifier, if the driver still reports one.
    pub fn id(&self) -> Option<String> {
        self.driver.session_id()
    }

    /// When this session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Read-only projection of session health, recomputed on every request.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Whether the session answered all liveness checks.
    pub alive: bool,

    /// Driver-assigned identifier, when known.
    pub session_id: Option<String>,

    /// URL of the active tab, when reachable.
    pub url: Option<String>,

    /// Number of open tabs.
    pub tab_count: usize,

    /// Human-readable summary for the dashboard.
    pub message: String,

    /// Session creation time, when a session exists.
    pub created_at: Option<DateTime<Utc>>,
}

impl StatusSnapshot {
    /// Snapshot describing the absence of a usable session.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            alive: false,
            session_id: None,
            url: None,
            tab_count: 0,
            message: message.into(),
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::driver::MockDriver;

    #[tokio::test]
    async fn test_session_exposes_driver_identity() {
        let driver = Arc::new(MockDriver::new("https://example.test"));
        let session = Session::new(driver.clone());

        assert_eq!(session.id(), driver.session_id());
        assert!(session.created_at() <= Utc::now());
    }

    #[test]
    fn test_unavailable_snapshot() {
        let snapshot = StatusSnapshot::unavailable("no session");
        assert!(!snapshot.alive);
        assert_eq!(snapshot.tab_count, 0);
        assert_eq!(snapshot.message, "no session");
    }
}
