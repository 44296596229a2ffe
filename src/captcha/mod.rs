//! Captcha detection and human-intervention loop.
//!
//! When a challenge is detected, automated progress suspends and a human
//! operator is asked to solve it in the browser window. The loop then polls
//! the page until the challenge disappears or the timeout elapses:
//!
//! ```text
//! Idle ──challenge detected──▶ AwaitingHuman ──challenge gone──▶ Resolved
//!                                   │
//!                                   └──timeout elapsed──▶ TimedOut
//! ```
//!
//! Terminal states are not persisted; a fresh [`InterventionLoop`] is
//! created per detection event, so independent interventions on the same
//! session never share state. A transient scan failure counts as "not
//! detected" for that cycle only; it must not cancel an otherwise
//! resolvable intervention.

pub mod notify;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::session::driver::BrowserDriver;

pub use notify::{DesktopNotifier, Notifier, NotifyError, NullNotifier};

/// DOM markers that indicate an anti-automation challenge.
pub const CHALLENGE_MARKERS: &[&str] = &[
    // reCAPTCHA
    "iframe[src*='recaptcha']",
    ".g-recaptcha",
    "#g-recaptcha-response",
    "[data-sitekey]",
    // hCaptcha
    "iframe[src*='hcaptcha']",
    ".h-captcha",
    "#h-captcha-response",
    // Generic containers
    "#captcha-container",
    ".captcha-wrapper",
    ".challenge-container",
    "[data-automation*='captcha']",
    ".verification-challenge",
];

/// Page-content phrases that indicate a challenge even without a marker.
pub const CHALLENGE_KEYWORDS: &[&str] = &[
    "recaptcha",
    "hcaptcha",
    "i'm not a robot",
    "verify you are human",
    "prove you're not a robot",
];

/// Scans the current page for a challenge.
///
/// DOM markers are checked first, then the lowercased page source is
/// searched for challenge phrases. Any query error is treated as "not
/// detected" for this scan.
pub async fn detect_challenge(driver: &dyn BrowserDriver) -> bool {
    for marker in CHALLENGE_MARKERS {
        match driver.find_element(marker).await {
            Ok(true) => {
                info!(marker, "challenge marker detected");
                return true;
            }
            Ok(false) => {}
            Err(e) => {
                debug!(marker, error = %e, "marker scan failed; skipping");
            }
        }
    }

    match driver.page_source().await {
        Ok(source) => {
            let lower = source.to_lowercase();
            for keyword in CHALLENGE_KEYWORDS {
                if lower.contains(keyword) {
                    info!(keyword, "challenge keyword detected");
                    return true;
                }
            }
            false
        }
        Err(e) => {
            debug!(error = %e, "page source scan failed; treating as not detected");
            false
        }
    }
}

/// Where an intervention currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionPhase {
    Idle,
    AwaitingHuman,
    Resolved,
    TimedOut,
}

/// Dashboard-visible intervention state.
#[derive(Debug, Clone, Serialize)]
pub struct InterventionState {
    pub phase: InterventionPhase,
    pub active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_secs: u64,
}

impl InterventionState {
    fn idle() -> Self {
        Self {
            phase: InterventionPhase::Idle,
            active: false,
            started_at: None,
            elapsed_secs: 0,
        }
    }
}

/// Failure modes of a human intervention wait.
#[derive(Debug, thiserror::Error)]
pub enum InterventionError {
    #[error("human intervention timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Tuning for the intervention loop.
#[derive(Debug, Clone)]
pub struct InterventionConfig {
    /// How often detection re-runs while awaiting the human.
    pub poll_interval: Duration,

    /// Upper bound on the whole wait.
    pub timeout: Duration,
}

impl Default for InterventionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(300),
        }
    }
}

/// Shared, read-only view of the most recent intervention.
///
/// The dashboard holds a clone of this and reads it while a wait is in
/// progress in another task.
#[derive(Clone, Default)]
pub struct InterventionGauge {
    inner: Arc<RwLock<Option<InterventionState>>>,
}

impl InterventionGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; idle when no intervention has run yet.
    pub fn state(&self) -> InterventionState {
        self.inner
            .read()
            .clone()
            .unwrap_or_else(InterventionState::idle)
    }

    fn store(&self, state: InterventionState) {
        *self.inner.write() = Some(state);
    }
}

/// One human-intervention wait.
///
/// Created fresh per detection event; dropping it carries nothing over to
/// the next intervention.
pub struct InterventionLoop {
    config: InterventionConfig,
    notifier: Arc<dyn Notifier>,
    gauge: InterventionGauge,
}

impl InterventionLoop {
    pub fn new(config: InterventionConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            config,
            notifier,
            gauge: InterventionGauge::new(),
        }
    }

    /// Attaches a shared gauge so another task can observe progress.
    pub fn with_gauge(mut self, gauge: InterventionGauge) -> Self {
        self.gauge = gauge;
        self
    }

    /// Suspends until the challenge clears or the timeout elapses.
    ///
    /// Returns the elapsed wait on success. Polls at the configured
    /// interval, holding no locks between polls, so status queries stay
    /// responsive during a long wait.
    pub async fn wait_for_resolution(
        &self,
        driver: &dyn BrowserDriver,
    ) -> Result<Duration, InterventionError> {
        let started = Instant::now();
        let started_at = Utc::now();

        info!(
            timeout_secs = self.config.timeout.as_secs(),
            "captcha detected; bot paused awaiting human intervention"
        );
        self.gauge.store(InterventionState {
            phase: InterventionPhase::AwaitingHuman,
            active: true,
            started_at: Some(started_at),
            elapsed_secs: 0,
        });

        // Notified exactly once, on entry.
        if let Err(e) = self
            .notifier
            .notify("Seekbot: captcha required", "Please solve the captcha in the browser window")
        {
            warn!(error = %e, "operator notification failed");
        }

        loop {
            tokio::time::sleep(self.config.poll_interval).await;
            let elapsed = started.elapsed();

            self.gauge.store(InterventionState {
                phase: InterventionPhase::AwaitingHuman,
                active: true,
                started_at: Some(started_at),
                elapsed_secs: elapsed.as_secs(),
            });

            if !detect_challenge(driver).await {
                info!(elapsed_secs = elapsed.as_secs(), "captcha resolved; resuming");
                self.gauge.store(InterventionState {
                    phase: InterventionPhase::Resolved,
                    active: false,
                    started_at: Some(started_at),
                    elapsed_secs: elapsed.as_secs(),
                });
                return Ok(elapsed);
            }

            if elapsed >= self.config.timeout {
                warn!(elapsed_secs = elapsed.as_secs(), "captcha intervention timed out");
                self.gauge.store(InterventionState {
                    phase: InterventionPhase::TimedOut,
                    active: false,
                    started_at: Some(started_at),
                    elapsed_secs: elapsed.as_secs(),
                });
                return Err(InterventionError::Timeout {
                    timeout: self.config.timeout,
                });
            }
        }
    }
}
