//! Browser driver abstraction layer.
//!
//! This module provides a trait-based abstraction over the remote-controlled
//! browser, allowing the real CDP-backed implementation and an in-memory mock
//! to be used interchangeably. The session lifecycle code never talks to a
//! concrete browser directly; it only sees [`BrowserDriver`] trait objects
//! handed out by a [`DriverFactory`].
//!
//! # Example
//!
//! ```rust
//! use seekbot::session::driver::{BrowserDriver, MockDriver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let driver = MockDriver::new("https://example.test");
//!     driver.navigate("https://example.test/jobs").await.unwrap();
//!     assert_eq!(driver.current_url().await.unwrap(), "https://example.test/jobs");
//! }
//! ```

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::stealth::StealthProfile;

/// Errors surfaced by driver operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriverError {
    /// No element matched the selector.
    #[error("element not found: {selector}")]
    NotFound { selector: String },

    /// A script evaluation was rejected by the page.
    #[error("script execution failed: {message}")]
    Script { message: String },

    /// Navigation did not complete.
    #[error("navigation failed: {message}")]
    Navigation { message: String },

    /// The browser process or its control channel is gone.
    #[error("browser connection lost")]
    ConnectionLost,

    /// The browser process could not be started.
    #[error("browser launch failed: {message}")]
    LaunchFailed { message: String },
}

/// Trait defining the remote browser interface.
///
/// All methods are non-destructive with respect to the session slot except
/// [`quit`](BrowserDriver::quit), which only the session manager may call.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Opaque identifier assigned by the underlying browser, if still known.
    fn session_id(&self) -> Option<String>;

    /// URL of the active tab.
    async fn current_url(&self) -> Result<String, DriverError>;

    /// Ordered handles of all open tabs.
    async fn window_handles(&self) -> Result<Vec<String>, DriverError>;

    /// Navigates the active tab.
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Evaluates JavaScript in the active tab and returns the result value.
    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, DriverError>;

    /// Returns whether at least one element matches the selector.
    async fn find_element(&self, selector: &str) -> Result<bool, DriverError>;

    /// Clicks the first element matching the selector.
    async fn click_element(&self, selector: &str) -> Result<(), DriverError>;

    /// Clicks a matching element at an offset from its clickable point.
    async fn click_at(&self, selector: &str, dx: f64, dy: f64) -> Result<(), DriverError>;

    /// Sends a key sequence to the first element matching the selector.
    async fn send_keys(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    /// Sends a named key (e.g. "Backspace", "Enter") to a matching element.
    async fn press_key(&self, selector: &str, key: &str) -> Result<(), DriverError>;

    /// Clears the value of the first element matching the selector.
    async fn clear_element(&self, selector: &str) -> Result<(), DriverError>;

    /// Visible text content of the first element matching the selector.
    async fn element_text(&self, selector: &str) -> Result<String, DriverError>;

    /// Full HTML source of the active tab.
    async fn page_source(&self) -> Result<String, DriverError>;

    /// Terminates the browser process. Only the session manager calls this.
    async fn quit(&self) -> Result<(), DriverError>;
}

/// Creates drivers from a stealth profile.
///
/// The factory seam is what keeps `SessionManager` driver-agnostic and lets
/// tests count creations and inject failures.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self, profile: &StealthProfile) -> Result<Arc<dyn BrowserDriver>, DriverError>;
}

/// A single recorded driver interaction, kept by [`MockDriver`] for
/// assertions about what automated flows actually did.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    Navigate { url: String },
    ExecuteScript { script: String },
    FindElement { selector: String },
    ClickElement { selector: String },
    ClickAt { selector: String, dx: f64, dy: f64 },
    SendKeys { selector: String, text: String },
    PressKey { selector: String, key: String },
    ClearElement { selector: String },
    Quit,
}

/// In-memory driver used throughout the test suite.
///
/// Records every call as a [`DriverEvent`] and simulates tab/URL state.
/// Presence queries (`find_element`) answer true only for selectors
/// registered with [`set_present`](MockDriver::set_present) or
/// [`set_element_text`](MockDriver::set_element_text); interaction calls
/// are lenient and succeed unless the selector was registered missing.
/// `set_alive(false)` makes liveness-related queries fail the way a
/// crashed browser would.
pub struct MockDriver {
    id: String,
    alive: AtomicBool,
    url: RwLock<String>,
    handles: RwLock<Vec<String>>,
    events: Mutex<Vec<DriverEvent>>,
    element_text: RwLock<HashMap<String, String>>,
    present: RwLock<Vec<String>>,
    missing: RwLock<Vec<String>>,
    source: RwLock<String>,
    source_queue: Mutex<VecDeque<String>>,
}

impl MockDriver {
    /// Creates a live mock driver with a single tab at `url`.
    pub fn new(url: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            alive: AtomicBool::new(true),
            url: RwLock::new(url.to_string()),
            handles: RwLock::new(vec!["tab-0".to_string()]),
            events: Mutex::new(Vec::new()),
            element_text: RwLock::new(HashMap::new()),
            present: RwLock::new(Vec::new()),
            missing: RwLock::new(Vec::new()),
            source: RwLock::new(String::from("<html></html>")),
            source_queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Flips liveness; a dead mock fails url/handle queries and reports no id.
    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Marks a selector as absent: presence queries answer false and
    /// interaction calls fail with [`DriverError::NotFound`].
    pub fn set_missing(&self, selector: &str) {
        self.missing.write().push(selector.to_string());
    }

    /// Marks a selector as present for `find_element`.
    pub fn set_present(&self, selector: &str) {
        self.present.write().push(selector.to_string());
    }

    /// Undoes [`set_present`](Self::set_present) for a selector.
    pub fn remove_present(&self, selector: &str) {
        self.present.write().retain(|s| s != selector);
    }

    /// Registers visible text for a selector; implies presence.
    pub fn set_element_text(&self, selector: &str, text: &str) {
        self.set_present(selector);
        self.element_text
            .write()
            .insert(selector.to_string(), text.to_string());
    }

    /// Sets the sticky page source returned once the queue is drained.
    pub fn set_page_source(&self, source: &str) {
        *self.source.write() = source.to_string();
    }

    /// Queues page sources returned one per `page_source()` call, in order.
    /// After the queue drains, the sticky source applies.
    pub fn queue_page_sources<I: IntoIterator<Item = String>>(&self, sources: I) {
        self.source_queue.lock().extend(sources);
    }

    /// Replaces the open tab handles.
    pub fn set_handles(&self, handles: Vec<String>) {
        *self.handles.write() = handles;
    }

    /// Snapshot of everything callers did to this driver.
    pub fn events(&self) -> Vec<DriverEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events matching a predicate.
    pub fn count_events<F: Fn(&DriverEvent) -> bool>(&self, pred: F) -> usize {
        self.events.lock().iter().filter(|e| pred(e)).count()
    }

    fn record(&self, event: DriverEvent) {
        self.events.lock().push(event);
    }

    fn check_selector(&self, selector: &str) -> Result<(), DriverError> {
        if self.missing.read().iter().any(|s| s == selector) {
            return Err(DriverError::NotFound {
                selector: selector.to_string(),
            });
        }
        Ok(())
    }

    fn check_alive(&self) -> Result<(), DriverError> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(DriverError::ConnectionLost)
        }
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    fn session_id(&self) -> Option<String> {
        if self.is_alive() {
            Some(self.id.clone())
        } else {
            None
        }
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.check_alive()?;
        Ok(self.url.read().clone())
    }

    async fn window_handles(&self) -> Result<Vec<String>, DriverError> {
        self.check_alive()?;
        Ok(self.handles.read().clone())
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        *self.url.write() = url.to_string();
        self.record(DriverEvent::Navigate {
            url: url.to_string(),
        });
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        self.check_alive()?;
        self.record(DriverEvent::ExecuteScript {
            script: script.to_string(),
        });
        Ok(serde_json::Value::Null)
    }

    async fn find_element(&self, selector: &str) -> Result<bool, DriverError> {
        self.check_alive()?;
        self.record(DriverEvent::FindElement {
            selector: selector.to_string(),
        });
        if self.check_selector(selector).is_err() {
            return Ok(false);
        }
        Ok(self.present.read().iter().any(|s| s == selector))
    }

    async fn click_element(&self, selector: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        self.check_selector(selector)?;
        self.record(DriverEvent::ClickElement {
            selector: selector.to_string(),
        });
        Ok(())
    }

    async fn click_at(&self, selector: &str, dx: f64, dy: f64) -> Result<(), DriverError> {
        self.check_alive()?;
        self.check_selector(selector)?;
        self.record(DriverEvent::ClickAt {
            selector: selector.to_string(),
            dx,
            dy,
        });
        Ok(())
    }

    async fn send_keys(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        self.check_selector(selector)?;
        self.record(DriverEvent::SendKeys {
            selector: selector.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        self.check_selector(selector)?;
        self.record(DriverEvent::PressKey {
            selector: selector.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }

    async fn clear_element(&self, selector: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        self.check_selector(selector)?;
        self.record(DriverEvent::ClearElement {
            selector: selector.to_string(),
        });
        Ok(())
    }

    async fn element_text(&self, selector: &str) -> Result<String, DriverError> {
        self.check_alive()?;
        self.check_selector(selector)?;
        Ok(self
            .element_text
            .read()
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.check_alive()?;
        if let Some(next) = self.source_queue.lock().pop_front() {
            return Ok(next);
        }
        Ok(self.source.read().clone())
    }

    async fn quit(&self) -> Result<(), DriverError> {
        self.record(DriverEvent::Quit);
        self.set_alive(false);
        Ok(())
    }
}

/// Factory producing [`MockDriver`] instances.
///
/// Counts creations and can be configured to fail, which is how the test
/// suite exercises the "one creation only" and creation-failure paths.
pub struct MockDriverFactory {
    created: AtomicUsize,
    fail: AtomicBool,
    start_url: String,
    drivers: Mutex<Vec<Arc<MockDriver>>>,
}

impl MockDriverFactory {
    pub fn new(start_url: &str) -> Self {
        Self {
            created: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            start_url: start_url.to_string(),
            drivers: Mutex::new(Vec::new()),
        }
    }

    /// When set, `create` returns [`DriverError::LaunchFailed`].
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Total number of successful creations.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// All drivers this factory has produced, in creation order.
    pub fn drivers(&self) -> Vec<Arc<MockDriver>> {
        self.drivers.lock().clone()
    }
}

#[async_trait]
impl DriverFactory for MockDriverFactory {
    async fn create(
        &self,
        _profile: &StealthProfile,
    ) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DriverError::LaunchFailed {
                message: "mock launch failure".to_string(),
            });
        }
        let driver = Arc::new(MockDriver::new(&self.start_url));
        self.drivers.lock().push(driver.clone());
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(driver)
    }
}
