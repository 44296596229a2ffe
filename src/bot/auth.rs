//! Sign-in flow.
//!
//! A thin consumer of the shared session: navigates to the login page,
//! gates on captcha intervention before and after submitting, and fills
//! the form exclusively through the behavioral simulator. Failures here
//! are fatal to the attempt, never to the session.

use std::sync::Arc;
use tracing::info;

use crate::captcha::{
    detect_challenge, InterventionConfig, InterventionError, InterventionGauge, InterventionLoop,
    Notifier,
};
use crate::session::SessionHandle;
use crate::simulate::{ActionError, HumanBehavior};

use super::locate::LoginLocators;

/// Errors from one login attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("login interaction failed: {0}")]
    Action(#[from] ActionError),

    #[error("login blocked: {0}")]
    Intervention(#[from] InterventionError),

    #[error("login could not be verified: the sign-in form is still present")]
    VerificationFailed,
}

/// Runs the sign-in flow against the shared session.
pub struct Authenticator {
    behavior: HumanBehavior,
    intervention: InterventionConfig,
    notifier: Arc<dyn Notifier>,
    gauge: InterventionGauge,
    locators: LoginLocators,
    login_url: String,
}

impl Authenticator {
    pub fn new(
        behavior: HumanBehavior,
        intervention: InterventionConfig,
        notifier: Arc<dyn Notifier>,
        gauge: InterventionGauge,
        login_url: String,
    ) -> Self {
        Self {
            behavior,
            intervention,
            notifier,
            gauge,
            locators: LoginLocators::default(),
            login_url,
        }
    }

    /// Navigates to the login page and signs in as `email`.
    pub async fn login(
        &self,
        session: &SessionHandle,
        email: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let driver = session.driver().as_ref();

        info!(url = %self.login_url, "navigating to sign-in page");
        driver
            .navigate(&self.login_url)
            .await
            .map_err(ActionError::from)?;
        self.behavior.random_delay(1000, 3000).await;

        // A challenge can appear before the form is even visible.
        self.captcha_gate(session).await?;

        let email_field = self.locators.email.resolve(driver).await?;
        self.behavior.type_text(driver, &email_field, email).await?;
        self.behavior.random_delay(300, 800).await;

        let password_field = self.locators.password.resolve(driver).await?;
        self.behavior
            .type_text(driver, &password_field, password)
            .await?;
        self.behavior.random_delay(300, 800).await;

        let submit = self.locators.submit.resolve(driver).await?;
        self.behavior.click(driver, &submit).await?;
        self.behavior.random_delay(3000, 6000).await;

        // Submitting often triggers the challenge.
        self.captcha_gate(session).await?;

        self.verify_signed_in(session).await
    }

    /// Suspends on a detected challenge until a human resolves it.
    ///
    /// Each detection event gets a fresh intervention loop; the shared
    /// gauge keeps the dashboard informed across them.
    async fn captcha_gate(&self, session: &SessionHandle) -> Result<(), AuthError> {
        let driver = session.driver().as_ref();
        if detect_challenge(driver).await {
            let waited = InterventionLoop::new(self.intervention.clone(), self.notifier.clone())
                .with_gauge(self.gauge.clone())
                .wait_for_resolution(driver)
                .await?;
            info!(waited_secs = waited.as_secs(), "challenge cleared");
            self.behavior.random_delay(2000, 4000).await;
        }
        Ok(())
    }

    /// Login succeeded when the sign-in form is gone.
    async fn verify_signed_in(&self, session: &SessionHandle) -> Result<(), AuthError> {
        let driver = session.driver().as_ref();
        match self.locators.email.resolve(driver).await {
            Ok(_) => Err(AuthError::VerificationFailed),
            Err(_) => {
                info!("sign-in verified");
                Ok(())
            }
        }
    }
}
