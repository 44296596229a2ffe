//! Pluggable element location.
//!
//! Site markup drifts, so every field the bot touches is addressed through
//! an ordered list of candidate CSS selectors tried in sequence. Keeping
//! the lists here, out of the flow code, means a markup change is a data
//! edit rather than a logic change.

use crate::session::driver::BrowserDriver;
use crate::simulate::ActionError;

/// Ordered fallback selectors for one logical page element.
#[derive(Debug, Clone)]
pub struct Locator {
    name: String,
    candidates: Vec<String>,
}

impl Locator {
    pub fn new(name: &str, candidates: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            candidates: candidates.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Logical field name, for error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first candidate present on the page.
    ///
    /// Individual lookup errors fall through to the next candidate; only
    /// exhausting the list is an error.
    pub async fn resolve(&self, driver: &dyn BrowserDriver) -> Result<String, ActionError> {
        for candidate in &self.candidates {
            match driver.find_element(candidate).await {
                Ok(true) => return Ok(candidate.clone()),
                Ok(false) => continue,
                Err(_) => continue,
            }
        }
        Err(ActionError::ElementNotFound {
            selector: format!("{} (tried {} selectors)", self.name, self.candidates.len()),
        })
    }
}

/// Locators for the sign-in form.
#[derive(Debug, Clone)]
pub struct LoginLocators {
    pub email: Locator,
    pub password: Locator,
    pub submit: Locator,
}

impl Default for LoginLocators {
    fn default() -> Self {
        Self {
            email: Locator::new(
                "email field",
                &[
                    "#emailAddress",
                    "input[type='email']",
                    "input[name='email']",
                    "[data-automation='email-input']",
                ],
            ),
            password: Locator::new(
                "password field",
                &[
                    "#password",
                    "input[type='password']",
                    "input[name='password']",
                ],
            ),
            submit: Locator::new(
                "sign-in button",
                &[
                    "button[type='submit']",
                    "input[type='submit']",
                    "[data-automation='signInButton']",
                    "[data-cy='sign-in-button']",
                ],
            ),
        }
    }
}

/// Locators for the job search form.
#[derive(Debug, Clone)]
pub struct SearchLocators {
    pub keywords: Locator,
    pub location: Locator,
}

impl Default for SearchLocators {
    fn default() -> Self {
        Self {
            keywords: Locator::new(
                "keywords field",
                &[
                    "#keywords-input",
                    "input[name='keywords']",
                    "input[placeholder='Enter keywords']",
                ],
            ),
            location: Locator::new(
                "location field",
                &[
                    "input[name='where']",
                    "input[data-automation='SearchBar__Where']",
                ],
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::driver::MockDriver;

    #[tokio::test]
    async fn test_resolve_prefers_earlier_candidates() {
        let driver = MockDriver::new("https://example.test");
        driver.set_present("input[name='keywords']");
        driver.set_present("input[placeholder='Enter keywords']");

        let locator = SearchLocators::default().keywords;
        let resolved = locator.resolve(&driver).await.unwrap();
        assert_eq!(resolved, "input[name='keywords']");
    }

    #[tokio::test]
    async fn test_resolve_exhausted_is_not_found() {
        let driver = MockDriver::new("https://example.test");

        let locator = SearchLocators::default().location;
        let err = locator.resolve(&driver).await.expect_err("nothing present");
        assert!(matches!(err, ActionError::ElementNotFound { .. }));
    }
}
