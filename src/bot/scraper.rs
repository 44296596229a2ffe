//! Job search flow.
//!
//! Fills the search form from the configured preferences, submits it, and
//! records the completed search. All interaction goes through the
//! behavioral simulator; a failed search aborts this unit of work only.

use chrono::Utc;
use tracing::{info, warn};

use crate::config::JobPreferences;
use crate::session::SessionHandle;
use crate::simulate::{ActionError, HumanBehavior, ScrollPattern};
use crate::storage::{JsonStorage, SearchFilters, SearchRecord};

use super::locate::SearchLocators;

/// Errors from one search run.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("search interaction failed: {0}")]
    Action(#[from] ActionError),
}

/// Runs job searches against the shared session.
pub struct Scraper {
    behavior: HumanBehavior,
    locators: SearchLocators,
    base_url: String,
    preferences: JobPreferences,
    storage: JsonStorage,
}

impl Scraper {
    pub fn new(
        behavior: HumanBehavior,
        base_url: String,
        preferences: JobPreferences,
        storage: JsonStorage,
    ) -> Self {
        Self {
            behavior,
            locators: SearchLocators::default(),
            base_url,
            preferences,
            storage,
        }
    }

    /// Fills and submits the search form, then records the search.
    pub async fn run_search(&self, session: &SessionHandle) -> Result<SearchRecord, ScrapeError> {
        let driver = session.driver().as_ref();

        // Another task may have navigated elsewhere in the meantime, so
        // the current URL is re-checked rather than assumed.
        let on_site = driver
            .current_url()
            .await
            .map(|url| url.starts_with(&self.base_url))
            .unwrap_or(false);
        if !on_site {
            info!(url = %self.base_url, "navigating to search page");
            driver
                .navigate(&self.base_url)
                .await
                .map_err(ActionError::from)?;
            self.behavior.random_delay(1500, 3000).await;
        }

        let keywords = self.preferences.keywords.join(" ");
        let location = self
            .preferences
            .locations
            .first()
            .cloned()
            .unwrap_or_default();

        let keywords_field = self.locators.keywords.resolve(driver).await?;
        self.behavior
            .type_text(driver, &keywords_field, &keywords)
            .await?;
        self.behavior.random_delay(300, 800).await;

        let location_field = self.locators.location.resolve(driver).await?;
        self.behavior
            .type_text(driver, &location_field, &location)
            .await?;
        self.behavior.random_delay(300, 800).await;

        driver
            .press_key(&keywords_field, "Enter")
            .await
            .map_err(ActionError::from)?;
        self.behavior.random_delay(2000, 4000).await;

        // Skim the results like a person would before anything else
        // touches the page.
        self.behavior.scroll(driver, ScrollPattern::random()).await?;

        let result_url = driver.current_url().await.unwrap_or_default();
        info!(keywords = %keywords, location = %location, url = %result_url, "search completed");

        let record = SearchRecord {
            search_term: keywords,
            location,
            result_url,
            filters: SearchFilters {
                job_types: self.preferences.job_types.clone(),
                salary_range: format!(
                    "{}-{}",
                    self.preferences
                        .salary_min
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "any".to_string()),
                    self.preferences
                        .salary_max
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "any".to_string()),
                ),
                excluded_keywords: self.preferences.excluded_keywords.clone(),
                experience_levels: self.preferences.experience_levels.clone(),
                remote_preference: self
                    .preferences
                    .remote_preference
                    .clone()
                    .unwrap_or_else(|| "any".to_string()),
            },
            timestamp: Utc::now(),
        };

        // Persistence is side-effect logging; its failure must not fail
        // the search.
        if let Err(e) = self.storage.append_search(record.clone()) {
            warn!(error = %e, "failed to persist search record");
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::driver::{DriverEvent, MockDriver};
    use crate::session::Session;
    use crate::simulate::BehaviorConfig;
    use std::sync::Arc;

    fn temp_storage() -> (JsonStorage, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("seekbot-scrape-{}", uuid::Uuid::new_v4()));
        (JsonStorage::new(&dir).unwrap(), dir)
    }

    fn search_page_driver(url: &str) -> Arc<MockDriver> {
        let driver = Arc::new(MockDriver::new(url));
        driver.set_present("#keywords-input");
        driver.set_present("input[name='where']");
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_search_fills_and_submits() {
        let driver = search_page_driver("https://example.test/");
        let session: SessionHandle = Arc::new(Session::new(driver.clone()));
        let (storage, dir) = temp_storage();

        let mut preferences = JobPreferences::default();
        preferences.keywords = vec!["rust".to_string(), "engineer".to_string()];
        preferences.locations = vec!["Melbourne".to_string()];

        let scraper = Scraper::new(
            HumanBehavior::with_config(BehaviorConfig::quick()),
            "https://example.test".to_string(),
            preferences,
            storage.clone(),
        );

        let record = scraper.run_search(&session).await.unwrap();
        assert_eq!(record.search_term, "rust engineer");
        assert_eq!(record.location, "Melbourne");

        // Submitted with Enter on the keywords field.
        let enters = driver.count_events(
            |e| matches!(e, DriverEvent::PressKey { key, .. } if key == "Enter"),
        );
        assert_eq!(enters, 1);

        // The search was persisted.
        assert_eq!(storage.load_searches().unwrap().len(), 1);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_search_navigates_when_off_site() {
        let driver = search_page_driver("https://elsewhere.test/page");
        let session: SessionHandle = Arc::new(Session::new(driver.clone()));
        let (storage, dir) = temp_storage();

        let scraper = Scraper::new(
            HumanBehavior::with_config(BehaviorConfig::quick()),
            "https://example.test".to_string(),
            JobPreferences::default(),
            storage,
        );

        scraper.run_search(&session).await.unwrap();

        let navigations = driver.count_events(
            |e| matches!(e, DriverEvent::Navigate { url } if url == "https://example.test"),
        );
        assert_eq!(navigations, 1);

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_search_missing_form_is_action_error() {
        let driver = Arc::new(MockDriver::new("https://example.test/"));
        let session: SessionHandle = Arc::new(Session::new(driver));
        let (storage, dir) = temp_storage();

        let scraper = Scraper::new(
            HumanBehavior::with_config(BehaviorConfig::quick()),
            "https://example.test".to_string(),
            JobPreferences::default(),
            storage.clone(),
        );

        let err = scraper.run_search(&session).await.expect_err("no form");
        assert!(matches!(
            err,
            ScrapeError::Action(ActionError::ElementNotFound { .. })
        ));
        // Nothing was recorded for the failed search.
        assert!(storage.load_searches().unwrap().is_empty());

        std::fs::remove_dir_all(dir).unwrap();
    }
}
