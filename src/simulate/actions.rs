//! Human-like interaction primitives.
//!
//! [`HumanBehavior`] wraps the raw driver operations with plausible timing
//! and motion: variable-cadence typing with occasional corrected typos,
//! offset clicks with a hold duration, named scroll patterns, and
//! length-based reading pauses. Every pause is an inline
//! `tokio::time::sleep` in the calling task; the simulator keeps no state
//! between calls and never touches the session lifecycle.
//!
//! # Example
//!
//! ```rust,no_run
//! use seekbot::session::driver::{BrowserDriver, MockDriver};
//! use seekbot::simulate::{HumanBehavior, ScrollPattern};
//!
//! async fn example(driver: &dyn BrowserDriver) {
//!     let behavior = HumanBehavior::new();
//!     behavior.type_text(driver, "#keywords", "rust engineer").await.unwrap();
//!     behavior.click(driver, "button[type='submit']").await.unwrap();
//!     behavior.scroll(driver, ScrollPattern::Smooth).await.unwrap();
//! }
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

use super::timing;
use crate::session::driver::{BrowserDriver, DriverError};

/// Errors from behavioral primitives.
///
/// These are surfaced to the immediate caller and never affect the session
/// lifecycle; a failed interaction aborts at most the caller's unit of work.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The target element could not be located.
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// The driver rejected the action.
    #[error("action failed: {0}")]
    Execution(#[source] DriverError),
}

impl From<DriverError> for ActionError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::NotFound { selector } => ActionError::ElementNotFound { selector },
            other => ActionError::Execution(other),
        }
    }
}

/// Named scroll motion shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPattern {
    /// Even single-step scrolls.
    Linear,
    /// Browser-smoothed scrolls in smaller increments.
    Smooth,
    /// Bursts of small, quick scrolls.
    Jerky,
    /// Large scrolls with long pauses, like skimming then reading.
    PauseAndScroll,
}

impl ScrollPattern {
    pub const ALL: [ScrollPattern; 4] = [
        ScrollPattern::Linear,
        ScrollPattern::Smooth,
        ScrollPattern::Jerky,
        ScrollPattern::PauseAndScroll,
    ];

    /// Draws a random pattern.
    pub fn random() -> Self {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .expect("pattern list is non-empty")
    }
}

/// Tuning knobs for the simulator.
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Typing speed range in words per minute.
    pub wpm_range: (u32, u32),

    /// Probability of a typo-and-correction per alphabetic character.
    pub typo_rate: f64,

    /// Click hold duration range in milliseconds.
    pub click_hold_ms: (u64, u64),

    /// Maximum click offset from the element's clickable point, in pixels.
    pub click_offset_px: f64,

    /// Assumed reading speed in words per minute.
    pub reading_wpm: u32,

    /// Number of scroll iterations per `scroll()` call.
    pub scroll_count: (u32, u32),
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            wpm_range: (80, 120),
            typo_rate: 0.05,
            click_hold_ms: (50, 150),
            click_offset_px: 5.0,
            reading_wpm: 250,
            scroll_count: (2, 4),
        }
    }
}

impl BehaviorConfig {
    /// Near-instant timing for tests; typos disabled.
    pub fn quick() -> Self {
        Self {
            wpm_range: (2000, 3000),
            typo_rate: 0.0,
            click_hold_ms: (1, 3),
            click_offset_px: 2.0,
            reading_wpm: 20_000,
            scroll_count: (1, 2),
        }
    }
}

/// Applies human-plausible timing and motion to driver primitives.
#[derive(Debug, Clone, Default)]
pub struct HumanBehavior {
    config: BehaviorConfig,
}

impl HumanBehavior {
    pub fn new() -> Self {
        Self {
            config: BehaviorConfig::default(),
        }
    }

    pub fn with_config(config: BehaviorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BehaviorConfig {
        &self.config
    }

    /// Sleeps for a uniformly random duration in `[min_ms, max_ms)`.
    ///
    /// The primitive every other operation composes from.
    pub async fn random_delay(&self, min_ms: u64, max_ms: u64) {
        tokio::time::sleep(timing::random_delay(min_ms, max_ms)).await;
    }

    /// Types into an element with per-character cadence, word-boundary and
    /// punctuation pauses, and occasional corrected typos.
    pub async fn type_text(
        &self,
        driver: &dyn BrowserDriver,
        selector: &str,
        text: &str,
    ) -> Result<(), ActionError> {
        driver.clear_element(selector).await?;
        self.random_delay(100, 300).await;

        for c in text.chars() {
            if c.is_alphabetic() && rand::thread_rng().gen_bool(self.config.typo_rate) {
                self.inject_typo(driver, selector).await?;
            }

            driver.send_keys(selector, &c.to_string()).await?;

            match c {
                ' ' => self.random_delay(100, 300).await,
                '.' | ',' | '!' | '?' => self.random_delay(200, 400).await,
                _ => tokio::time::sleep(timing::char_delay(self.config.wpm_range)).await,
            }
        }

        Ok(())
    }

    /// Sends a wrong keystroke, pauses, and corrects it with Backspace.
    async fn inject_typo(
        &self,
        driver: &dyn BrowserDriver,
        selector: &str,
    ) -> Result<(), ActionError> {
        let wrong = *b"qwertyuiopasdfghjklzxcvbnm"
            .choose(&mut rand::thread_rng())
            .expect("key pool is non-empty") as char;
        debug!(selector, wrong = %wrong, "injecting typo");

        driver.send_keys(selector, &wrong.to_string()).await?;
        self.random_delay(100, 300).await;
        driver.press_key(selector, "Backspace").await?;
        self.random_delay(100, 200).await;
        Ok(())
    }

    /// Clicks an element at a small random offset after an aim pause,
    /// holding for a non-instant press duration.
    pub async fn click(&self, driver: &dyn BrowserDriver, selector: &str) -> Result<(), ActionError> {
        // Aim/reaction time before committing to the click.
        self.random_delay(100, 500).await;

        let offset = self.config.click_offset_px;
        let mut rng = rand::thread_rng();
        let dx = rng.gen_range(-offset..=offset);
        let dy = rng.gen_range(-offset..=offset);
        drop(rng);

        driver.click_at(selector, dx, dy).await?;

        let (lo, hi) = self.config.click_hold_ms;
        self.random_delay(lo, hi).await;
        Ok(())
    }

    /// Scrolls the page using a named pattern, occasionally reversing a
    /// small part of the distance at the end.
    pub async fn scroll(
        &self,
        driver: &dyn BrowserDriver,
        pattern: ScrollPattern,
    ) -> Result<(), ActionError> {
        let (lo, hi) = self.config.scroll_count;
        let count = rand::thread_rng().gen_range(lo..=hi);

        for _ in 0..count {
            match pattern {
                ScrollPattern::Linear => {
                    let amount = rand::thread_rng().gen_range(200..=600);
                    self.scroll_by(driver, amount).await?;
                }
                ScrollPattern::Smooth => {
                    let amount = rand::thread_rng().gen_range(100..=300);
                    driver
                        .execute_script(&format!(
                            "window.scrollBy({{top: {}, behavior: 'smooth'}});",
                            amount
                        ))
                        .await?;
                }
                ScrollPattern::Jerky => {
                    let bursts = rand::thread_rng().gen_range(2..=5);
                    for _ in 0..bursts {
                        let amount = rand::thread_rng().gen_range(50..=150);
                        self.scroll_by(driver, amount).await?;
                        self.random_delay(100, 300).await;
                    }
                }
                ScrollPattern::PauseAndScroll => {
                    let amount = rand::thread_rng().gen_range(300..=800);
                    self.scroll_by(driver, amount).await?;
                    self.random_delay(1000, 3000).await;
                }
            }

            self.random_delay(500, 2000).await;
        }

        // Humans overshoot and track back up sometimes.
        if rand::thread_rng().gen_bool(0.3) {
            let back = rand::thread_rng().gen_range(100..=400);
            self.scroll_by(driver, -back).await?;
        }

        Ok(())
    }

    async fn scroll_by(&self, driver: &dyn BrowserDriver, amount: i64) -> Result<(), ActionError> {
        driver
            .execute_script(&format!("window.scrollBy(0, {});", amount))
            .await?;
        Ok(())
    }

    /// Dwells on an element for a duration estimated from its visible text
    /// length, spent as micro-scroll increments when long enough.
    pub async fn simulate_reading(
        &self,
        driver: &dyn BrowserDriver,
        selector: &str,
    ) -> Result<(), ActionError> {
        driver
            .execute_script(&format!(
                "document.querySelector('{}')?.scrollIntoView(true);",
                selector
            ))
            .await?;
        self.random_delay(500, 1000).await;

        let text = driver.element_text(selector).await?;
        let dwell = timing::reading_time(text.chars().count(), self.config.reading_wpm);
        debug!(selector, chars = text.len(), dwell_ms = dwell.as_millis() as u64, "reading");

        if dwell > Duration::from_secs(2) {
            let micro_scrolls = (dwell.as_secs() / 2).max(1);
            for _ in 0..micro_scrolls {
                let amount = rand::thread_rng().gen_range(10..=50);
                self.scroll_by(driver, amount).await?;
                self.random_delay(1000, 3000).await;
            }
        } else {
            tokio::time::sleep(dwell).await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::driver::{DriverEvent, MockDriver};

    #[tokio::test(start_paused = true)]
    async fn test_type_text_sends_every_char() {
        let driver = MockDriver::new("https://example.test");
        let behavior = HumanBehavior::with_config(BehaviorConfig::quick());

        behavior
            .type_text(&driver, "#field", "hello")
            .await
            .unwrap();

        let sent = driver.count_events(|e| matches!(e, DriverEvent::SendKeys { .. }));
        assert_eq!(sent, 5);
        assert_eq!(
            driver.count_events(|e| matches!(e, DriverEvent::ClearElement { .. })),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_type_text_typos_are_corrected() {
        let driver = MockDriver::new("https://example.test");
        let config = BehaviorConfig {
            typo_rate: 1.0,
            ..BehaviorConfig::quick()
        };
        let behavior = HumanBehavior::with_config(config);

        behavior.type_text(&driver, "#field", "abc").await.unwrap();

        // Each char: wrong key + intended key, plus one Backspace each.
        let sent = driver.count_events(|e| matches!(e, DriverEvent::SendKeys { .. }));
        let backspaces = driver.count_events(
            |e| matches!(e, DriverEvent::PressKey { key, .. } if key == "Backspace"),
        );
        assert_eq!(sent, 6);
        assert_eq!(backspaces, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_uses_bounded_offset() {
        let driver = MockDriver::new("https://example.test");
        let behavior = HumanBehavior::with_config(BehaviorConfig::quick());

        behavior.click(&driver, "#submit").await.unwrap();

        let events = driver.events();
        let click = events
            .iter()
            .find_map(|e| match e {
                DriverEvent::ClickAt { selector, dx, dy } => Some((selector.clone(), *dx, *dy)),
                _ => None,
            })
            .expect("click event recorded");

        assert_eq!(click.0, "#submit");
        assert!(click.1.abs() <= 2.0);
        assert!(click.2.abs() <= 2.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_patterns_emit_scripts() {
        for pattern in ScrollPattern::ALL {
            let driver = MockDriver::new("https://example.test");
            let behavior = HumanBehavior::with_config(BehaviorConfig::quick());

            behavior.scroll(&driver, pattern).await.unwrap();

            let scripts = driver.count_events(
                |e| matches!(e, DriverEvent::ExecuteScript { script } if script.contains("scrollBy")),
            );
            assert!(scripts > 0, "pattern {:?} produced no scrolls", pattern);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_element_surfaces_action_error() {
        let driver = MockDriver::new("https://example.test");
        driver.set_missing("#gone");
        let behavior = HumanBehavior::with_config(BehaviorConfig::quick());

        let err = behavior
            .type_text(&driver, "#gone", "x")
            .await
            .expect_err("should fail");
        assert!(matches!(err, ActionError::ElementNotFound { .. }));
    }

    #[test]
    fn test_scroll_pattern_random_draws_from_all() {
        for _ in 0..20 {
            assert!(ScrollPattern::ALL.contains(&ScrollPattern::random()));
        }
    }
}
