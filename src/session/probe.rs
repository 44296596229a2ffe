//! Session liveness probing.
//!
//! The probe answers "is this session still usable" with three cheap,
//! non-mutating queries: the driver still reports an identifier, the active
//! tab has a reachable URL, and the tab set is non-empty. All three must
//! pass for `alive = true`. The whole probe runs under a short timeout and
//! never propagates an error past its boundary.

use std::time::Duration;
use tracing::debug;

use super::session::{Session, StatusSnapshot};

/// Upper bound for one full probe run.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of a liveness probe.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// True only when every check passed.
    pub alive: bool,

    /// Which check failed, for logs and the dashboard.
    pub diagnostic: Option<String>,
}

impl HealthReport {
    fn healthy() -> Self {
        Self {
            alive: true,
            diagnostic: None,
        }
    }

    fn dead(diagnostic: impl Into<String>) -> Self {
        Self {
            alive: false,
            diagnostic: Some(diagnostic.into()),
        }
    }
}

/// Non-mutating health check for a [`Session`].
#[derive(Debug, Clone)]
pub struct HealthProbe {
    timeout: Duration,
}

impl Default for HealthProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthProbe {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Overrides the probe timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Runs the three liveness checks under the probe timeout.
    pub async fn probe(&self, session: &Session) -> HealthReport {
        match tokio::time::timeout(self.timeout, self.run_checks(session)).await {
            Ok(report) => report,
            Err(_) => HealthReport::dead(format!("probe timed out after {:?}", self.timeout)),
        }
    }

    async fn run_checks(&self, session: &Session) -> HealthReport {
        if session.id().is_none() {
            return HealthReport::dead("driver reports no session identifier");
        }

        let url = match session.driver().current_url().await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => return HealthReport::dead("active tab has no URL"),
            Err(e) => return HealthReport::dead(format!("URL query failed: {}", e)),
        };

        match session.driver().window_handles().await {
            Ok(handles) if !handles.is_empty() => {
                debug!(url = %url, tabs = handles.len(), "session probe passed");
                HealthReport::healthy()
            }
            Ok(_) => HealthReport::dead("no open tabs"),
            Err(e) => HealthReport::dead(format!("tab query failed: {}", e)),
        }
    }

    /// Computes a full status snapshot from the live session.
    ///
    /// Always recomputed; failures degrade into an unavailable-style
    /// snapshot rather than an error.
    pub async fn snapshot(&self, session: &Session) -> StatusSnapshot {
        let report = self.probe(session).await;

        let url = session.driver().current_url().await.ok();
        let tab_count = session
            .driver()
            .window_handles()
            .await
            .map(|h| h.len())
            .unwrap_or(0);

        let message = if report.alive {
            "session healthy".to_string()
        } else {
            report
                .diagnostic
                .clone()
                .unwrap_or_else(|| "session unresponsive".to_string())
        };

        StatusSnapshot {
            alive: report.alive,
            session_id: session.id(),
            url,
            tab_count,
            message,
            created_at: Some(session.created_at()),
        }
    }
}
