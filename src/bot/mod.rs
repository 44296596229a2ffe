//! Bot orchestration.
//!
//! The bot drives the full cycle of validating configuration, authenticating,
//! and searching, as a thin consumer of the shared session. It owns no browser
//! state of its own: it acquires the session from the manager, passes every
//! interaction through the behavioral simulator, and reports progress
//! through a task label the dashboard polls.
//!
//! # Submodules
//!
//! - [`auth`] - Sign-in flow with captcha gating
//! - [`scraper`] - Search flow
//! - [`locate`] - Ordered fallback selectors for page elements

pub mod auth;
pub mod locate;
pub mod scraper;

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

use crate::captcha::{InterventionConfig, InterventionGauge, Notifier};
use crate::config::{BotSettings, ConfigError};
use crate::session::{SessionError, SessionManager};
use crate::simulate::{BehaviorConfig, HumanBehavior};
use crate::storage::{JsonStorage, LogRecord};
use std::time::Duration;

pub use auth::{AuthError, Authenticator};
pub use locate::{Locator, LoginLocators, SearchLocators};
pub use scraper::{ScrapeError, Scraper};

/// Errors from one full bot run.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("scraping error: {0}")]
    Scrape(#[from] ScrapeError),
}

/// Dashboard-visible bot state.
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub running: bool,
    pub current_task: String,
}

/// Orchestrates authenticate → search against the shared session.
pub struct Bot {
    settings: BotSettings,
    manager: Arc<SessionManager>,
    storage: JsonStorage,
    notifier: Arc<dyn Notifier>,
    gauge: InterventionGauge,
    running: AtomicBool,
    stop_requested: AtomicBool,
    current_task: RwLock<String>,
}

impl Bot {
    pub fn new(
        settings: BotSettings,
        manager: Arc<SessionManager>,
        storage: JsonStorage,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            manager,
            storage,
            notifier,
            gauge: InterventionGauge::new(),
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            current_task: RwLock::new("idle".to_string()),
        }
    }

    /// Shared intervention gauge for the dashboard.
    pub fn gauge(&self) -> InterventionGauge {
        self.gauge.clone()
    }

    /// Current run state.
    pub fn status(&self) -> BotStatus {
        BotStatus {
            running: self.running.load(Ordering::SeqCst),
            current_task: self.current_task.read().clone(),
        }
    }

    /// Asks a running cycle to stop at the next stage boundary.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    fn set_task(&self, task: &str) {
        *self.current_task.write() = task.to_string();
    }

    fn behavior(&self) -> HumanBehavior {
        HumanBehavior::with_config(BehaviorConfig {
            wpm_range: (self.settings.behavior.min_wpm, self.settings.behavior.max_wpm),
            typo_rate: self.settings.behavior.typo_rate,
            ..BehaviorConfig::default()
        })
    }

    fn intervention_config(&self) -> InterventionConfig {
        InterventionConfig {
            poll_interval: Duration::from_secs(self.settings.intervention.poll_interval_secs),
            timeout: Duration::from_secs(self.settings.intervention.timeout_secs),
        }
    }

    /// Runs one full cycle. On failure the process stays idle and
    /// restartable; the error is logged, persisted, and returned.
    pub async fn run(&self) -> Result<(), BotError> {
        self.settings.validate()?;
        self.running.store(true, Ordering::SeqCst);
        self.stop_requested.store(false, Ordering::SeqCst);

        let result = self.execute().await;

        if let Err(ref e) = result {
            error!(error = %e, "bot run failed");
            if let Err(log_err) = self.storage.append_log(
                LogRecord::new("error", e.to_string()).with_context("bot run"),
            ) {
                error!(error = %log_err, "failed to persist error log");
            }
        }

        self.running.store(false, Ordering::SeqCst);
        self.set_task("idle");
        result
    }

    async fn execute(&self) -> Result<(), BotError> {
        info!("starting bot cycle");

        self.set_task("authenticating");
        let session = self.manager.acquire().await?;

        let authenticator = Authenticator::new(
            self.behavior(),
            self.intervention_config(),
            self.notifier.clone(),
            self.gauge.clone(),
            format!("{}/sign-in", self.settings.base_url),
        );
        authenticator
            .login(
                &session,
                &self.settings.user.email,
                &self.settings.user.password,
            )
            .await?;

        if self.stop_requested.load(Ordering::SeqCst) {
            info!("stop requested; ending cycle after authentication");
            return Ok(());
        }

        self.set_task("scraping");
        let scraper = Scraper::new(
            self.behavior(),
            self.settings.base_url.clone(),
            self.settings.job_preferences.clone(),
            self.storage.clone(),
        );
        let record = scraper.run_search(&session).await?;
        info!(search = %record.search_term, "cycle completed");

        self.set_task("completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::NullNotifier;
    use crate::session::driver::MockDriverFactory;

    fn test_settings(data_dir: &std::path::Path) -> BotSettings {
        let mut settings = BotSettings::default();
        settings.user.email = "user@example.test".to_string();
        settings.user.password = "secret".to_string();
        settings.user.agreement_accepted = true;
        settings.base_url = "https://example.test".to_string();
        settings.data_dir = data_dir.to_path_buf();
        settings
    }

    #[tokio::test]
    async fn test_run_rejects_unconfigured_bot() {
        let dir = std::env::temp_dir().join(format!("seekbot-bot-{}", uuid::Uuid::new_v4()));
        let storage = JsonStorage::new(&dir).unwrap();
        let mut settings = test_settings(&dir);
        settings.user.email.clear();

        let bot = Bot::new(
            settings,
            Arc::new(SessionManager::new(Arc::new(MockDriverFactory::new(
                "https://example.test",
            )))),
            storage,
            Arc::new(NullNotifier),
        );

        assert!(matches!(
            bot.run().await,
            Err(BotError::Config(ConfigError::MissingKey(_)))
        ));
        assert!(!bot.status().running);
        assert_eq!(bot.status().current_task, "idle");

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_failed_run_persists_error_and_stays_idle() {
        let dir = std::env::temp_dir().join(format!("seekbot-bot-{}", uuid::Uuid::new_v4()));
        let storage = JsonStorage::new(&dir).unwrap();
        let settings = test_settings(&dir);

        let factory = Arc::new(MockDriverFactory::new("https://example.test"));
        factory.set_fail(true);

        let bot = Bot::new(
            settings,
            Arc::new(SessionManager::new(factory)),
            storage.clone(),
            Arc::new(NullNotifier),
        );

        assert!(matches!(
            bot.run().await,
            Err(BotError::Session(SessionError::CreationFailed(_)))
        ));
        assert_eq!(bot.status().current_task, "idle");

        let logs = storage.load_logs(0).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].level, "error");

        std::fs::remove_dir_all(dir).unwrap();
    }
}
