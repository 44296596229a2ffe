//! Process-wide session lifecycle management.
//!
//! [`SessionManager`] is the sole authority over session existence. All
//! creation, acquisition, teardown and recovery serialize on a single
//! `tokio::sync::Mutex` around the session slot, so no two creations can
//! ever race and concurrent first-time acquires block until one creation
//! completes and then observe the same session.
//!
//! The lock-in policy is deliberate: after the first acquisition attempt
//! the manager commits to its creation decision for the rest of the
//! process. A locked-in session found dead is a terminal condition: the
//! manager reports [`SessionError::Unavailable`] and will not silently
//! replace the session. [`SessionManager::recover`] is the only sanctioned
//! replacement path. A transient probe failure therefore strands the
//! process until an operator invokes recovery; this is preferred over
//! uncontrolled session churn, which multiplies detection signals.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use seekbot::session::{SessionManager, driver::MockDriverFactory};
//!
//! #[tokio::main]
//! async fn main() {
//!     let factory = Arc::new(MockDriverFactory::new("https://example.test"));
//!     let manager = SessionManager::new(factory);
//!
//!     let session = manager.acquire().await.unwrap();
//!     let again = manager.acquire().await.unwrap();
//!     assert_eq!(session.id(), again.id());
//! }
//! ```

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::driver::{DriverError, DriverFactory};
use super::probe::HealthProbe;
use super::session::{Session, SessionHandle, StatusSnapshot};
use crate::stealth::StealthProfileBuilder;

/// Errors surfaced by session lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The driver could not be created. Subsequent acquires return
    /// [`SessionError::Unavailable`] until recovery runs.
    #[error("session creation failed: {0}")]
    CreationFailed(#[source] DriverError),

    /// The manager is locked in and holds no usable session. Only an
    /// explicit `recover()` clears this condition.
    #[error("session unavailable: locked in without a usable session, recovery required")]
    Unavailable,
}

/// The guarded session slot. `locked_in` survives the session itself:
/// once true, a missing or dead session means "unavailable", never
/// "create another one".
#[derive(Default)]
struct Slot {
    session: Option<SessionHandle>,
    locked_in: bool,
}

/// Singleton owner of the process-wide browser session.
///
/// Constructed once at startup and shared by reference with every
/// consumer (authenticator, scraper, dashboard).
pub struct SessionManager {
    factory: Arc<dyn DriverFactory>,
    builder: StealthProfileBuilder,
    probe: HealthProbe,
    slot: Mutex<Slot>,
}

impl SessionManager {
    /// Creates a manager with the default health probe.
    pub fn new(factory: Arc<dyn DriverFactory>) -> Self {
        Self::with_probe(factory, HealthProbe::new())
    }

    /// Creates a manager with a custom probe (shorter timeouts in tests).
    pub fn with_probe(factory: Arc<dyn DriverFactory>, probe: HealthProbe) -> Self {
        Self {
            factory,
            builder: StealthProfileBuilder::new(),
            probe,
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Returns a handle to the shared session, creating it on first use.
    ///
    /// Once locked in, a dead session yields [`SessionError::Unavailable`]
    /// on every call until [`recover`](Self::recover) runs; no implicit
    /// replacement ever happens here.
    pub async fn acquire(&self) -> Result<SessionHandle, SessionError> {
        let mut slot = self.slot.lock().await;

        if slot.locked_in {
            return match &slot.session {
                Some(session) => {
                    let report = self.probe.probe(session).await;
                    if report.alive {
                        Ok(session.clone())
                    } else {
                        warn!(
                            diagnostic = report.diagnostic.as_deref().unwrap_or("unknown"),
                            "locked-in session is dead; recovery required"
                        );
                        Err(SessionError::Unavailable)
                    }
                }
                None => Err(SessionError::Unavailable),
            };
        }

        // A pre-existing healthy session (installed externally) is adopted
        // rather than replaced.
        if let Some(session) = slot.session.clone() {
            if self.probe.probe(&session).await.alive {
                info!("adopting existing session");
                slot.locked_in = true;
                return Ok(session);
            }
            warn!("existing session failed its probe; replacing before lock-in");
            if let Err(e) = session.driver().quit().await {
                warn!(error = %e, "failed to quit stale session");
            }
            slot.session = None;
        }

        // The creation decision is final whether or not the launch works.
        slot.locked_in = true;

        let session = self.create_session().await?;
        let handle: SessionHandle = Arc::new(session);
        slot.session = Some(handle.clone());
        Ok(handle)
    }

    /// Computes a status snapshot without blocking lifecycle operations.
    ///
    /// The slot lock is held only long enough to clone the handle; the
    /// probe itself runs outside it. Never returns an error.
    pub async fn status(&self) -> StatusSnapshot {
        let (session, locked_in) = {
            let slot = self.slot.lock().await;
            (slot.session.clone(), slot.locked_in)
        };

        match session {
            Some(session) => self.probe.snapshot(&session).await,
            None if locked_in => {
                StatusSnapshot::unavailable("session destroyed or failed; recovery required")
            }
            None => StatusSnapshot::unavailable("no session created yet"),
        }
    }

    /// Terminates the driver and clears the slot.
    ///
    /// The locked-in flag is left set: after destruction, re-creation is
    /// only permitted through [`recover`](Self::recover).
    pub async fn destroy(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.session.take() {
            info!(id = ?session.id(), "destroying session");
            if let Err(e) = session.driver().quit().await {
                error!(error = %e, "driver quit failed during destroy");
            }
        }
    }

    /// Destroys any current session and runs a fresh creation cycle.
    ///
    /// This is the only path that replaces a dead session. A creation
    /// failure here leaves the manager locked in without a session, so
    /// acquires keep returning [`SessionError::Unavailable`] until another
    /// recovery attempt succeeds.
    pub async fn recover(&self) -> Result<SessionHandle, SessionError> {
        let mut slot = self.slot.lock().await;

        if let Some(session) = slot.session.take() {
            info!(id = ?session.id(), "recovery: destroying current session");
            if let Err(e) = session.driver().quit().await {
                error!(error = %e, "driver quit failed during recovery");
            }
        }

        slot.locked_in = true;

        let session = self.create_session().await?;
        let handle: SessionHandle = Arc::new(session);
        slot.session = Some(handle.clone());
        info!(id = ?handle.id(), "recovery complete");
        Ok(handle)
    }

    /// Whether the creation decision has been finalized.
    pub async fn is_locked_in(&self) -> bool {
        self.slot.lock().await.locked_in
    }

    /// Launches a driver with a fresh stealth profile and applies the
    /// override scripts before anything navigates.
    async fn create_session(&self) -> Result<Session, SessionError> {
        let profile = self.builder.build();
        info!(
            viewport = ?profile.viewport,
            user_agent = %profile.user_agent,
            "creating browser session"
        );

        let driver = self
            .factory
            .create(&profile)
            .await
            .map_err(SessionError::CreationFailed)?;

        for script in self.builder.injection_scripts(&profile) {
            if let Err(e) = driver.execute_script(&script).await {
                // An individual override failing narrows stealth coverage
                // but does not invalidate the session.
                warn!(error = %e, "stealth override script failed");
            }
        }

        Ok(Session::new(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::driver::MockDriverFactory;

    fn manager() -> (Arc<MockDriverFactory>, SessionManager) {
        let factory = Arc::new(MockDriverFactory::new("https://example.test"));
        let manager = SessionManager::new(factory.clone());
        (factory, manager)
    }

    #[tokio::test]
    async fn test_acquire_creates_once() {
        let (factory, manager) = manager();

        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();

        assert_eq!(factory.created_count(), 1);
        assert_eq!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_acquire_applies_stealth_scripts_on_creation() {
        let (factory, manager) = manager();

        manager.acquire().await.unwrap();

        let driver = &factory.drivers()[0];
        let scripts = driver.count_events(|e| {
            matches!(e, crate::session::driver::DriverEvent::ExecuteScript { .. })
        });
        assert_eq!(scripts, 8);
    }

    #[tokio::test]
    async fn test_locked_in_dead_session_is_terminal() {
        let (factory, manager) = manager();

        manager.acquire().await.unwrap();
        factory.drivers()[0].set_alive(false);

        for _ in 0..3 {
            assert!(matches!(
                manager.acquire().await,
                Err(SessionError::Unavailable)
            ));
        }
        // No replacement was created behind the caller's back.
        assert_eq!(factory.created_count(), 1);
    }

    #[tokio::test]
    async fn test_creation_failure_then_unavailable() {
        let (factory, manager) = manager();
        factory.set_fail(true);

        assert!(matches!(
            manager.acquire().await,
            Err(SessionError::CreationFailed(_))
        ));
        // The failed attempt locked the manager in; no silent retry.
        factory.set_fail(false);
        assert!(matches!(
            manager.acquire().await,
            Err(SessionError::Unavailable)
        ));
        assert_eq!(factory.created_count(), 0);
    }

    #[tokio::test]
    async fn test_recover_replaces_dead_session() {
        let (factory, manager) = manager();

        let first = manager.acquire().await.unwrap();
        let first_id = first.id();
        factory.drivers()[0].set_alive(false);

        let recovered = manager.recover().await.unwrap();
        assert_ne!(recovered.id(), first_id);
        assert_eq!(factory.created_count(), 2);

        let after = manager.acquire().await.unwrap();
        assert_eq!(after.id(), recovered.id());
    }

    #[tokio::test]
    async fn test_destroy_keeps_lock_in() {
        let (factory, manager) = manager();

        manager.acquire().await.unwrap();
        manager.destroy().await;

        assert!(manager.is_locked_in().await);
        assert!(matches!(
            manager.acquire().await,
            Err(SessionError::Unavailable)
        ));
        assert_eq!(factory.created_count(), 1);

        let snapshot = manager.status().await;
        assert!(!snapshot.alive);
        assert!(snapshot.message.contains("recovery required"));
    }

    #[tokio::test]
    async fn test_status_before_any_session() {
        let (_factory, manager) = manager();

        let snapshot = manager.status().await;
        assert!(!snapshot.alive);
        assert_eq!(snapshot.message, "no session created yet");
    }
}
