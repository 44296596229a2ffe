//! Bot settings and configuration management.
//!
//! Configuration follows a precedence chain: built-in defaults, then a
//! TOML/JSON file, then `SEEKBOT_*` environment variables, then CLI
//! arguments. The core never validates more than it reads; missing
//! required keys surface as [`ConfigError::MissingKey`].

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML configuration.
    #[error("failed to parse TOML configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML configuration.
    #[error("failed to serialize TOML configuration: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Failed to parse JSON configuration.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A required key is absent or empty.
    #[error("missing required configuration key: {0}")]
    MissingKey(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// Unsupported file format.
    #[error("unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

/// Account credentials and the usage agreement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    /// The bot refuses to run until the operator accepts the terms.
    #[serde(default)]
    pub agreement_accepted: bool,
}

/// Job search preferences driving the scraper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPreferences {
    #[serde(default = "JobPreferences::default_keywords")]
    pub keywords: Vec<String>,

    #[serde(default = "JobPreferences::default_locations")]
    pub locations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<u32>,

    #[serde(default)]
    pub job_types: Vec<String>,

    #[serde(default)]
    pub excluded_keywords: Vec<String>,

    #[serde(default)]
    pub experience_levels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_preference: Option<String>,
}

impl JobPreferences {
    fn default_keywords() -> Vec<String> {
        vec!["rust".to_string()]
    }

    fn default_locations() -> Vec<String> {
        vec!["Sydney".to_string()]
    }
}

impl Default for JobPreferences {
    fn default() -> Self {
        Self {
            keywords: Self::default_keywords(),
            locations: Self::default_locations(),
            salary_min: None,
            salary_max: None,
            job_types: Vec::new(),
            excluded_keywords: Vec::new(),
            experience_levels: Vec::new(),
            remote_preference: None,
        }
    }
}

/// Application-submission limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    #[serde(default = "ApplicationSettings::default_auto_apply")]
    pub auto_apply: bool,

    #[serde(default = "ApplicationSettings::default_daily_cap")]
    pub max_applications_per_day: u32,

    #[serde(default)]
    pub cover_letter_template: String,

    #[serde(default)]
    pub cv_path: String,
}

impl ApplicationSettings {
    fn default_auto_apply() -> bool {
        true
    }

    fn default_daily_cap() -> u32 {
        20
    }
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            auto_apply: Self::default_auto_apply(),
            max_applications_per_day: Self::default_daily_cap(),
            cover_letter_template: String::new(),
            cv_path: String::new(),
        }
    }
}

/// Behavioral simulator tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSettings {
    #[serde(default = "BehaviorSettings::default_min_wpm")]
    pub min_wpm: u32,

    #[serde(default = "BehaviorSettings::default_max_wpm")]
    pub max_wpm: u32,

    #[serde(default = "BehaviorSettings::default_typo_rate")]
    pub typo_rate: f64,
}

impl BehaviorSettings {
    fn default_min_wpm() -> u32 {
        80
    }

    fn default_max_wpm() -> u32 {
        120
    }

    fn default_typo_rate() -> f64 {
        0.05
    }
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            min_wpm: Self::default_min_wpm(),
            max_wpm: Self::default_max_wpm(),
            typo_rate: Self::default_typo_rate(),
        }
    }
}

/// Captcha intervention tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionSettings {
    #[serde(default = "InterventionSettings::default_poll_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "InterventionSettings::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl InterventionSettings {
    fn default_poll_secs() -> u64 {
        2
    }

    fn default_timeout_secs() -> u64 {
        300
    }
}

impl Default for InterventionSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: Self::default_poll_secs(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Complete bot configuration.
///
/// Scalar fields come before the table-valued sections so the TOML
/// serializer never emits a value after a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Run the browser without a visible window. Off by default: captcha
    /// interventions need a window the operator can interact with.
    #[serde(default)]
    pub headless: bool,

    #[serde(default = "BotSettings::default_api_enabled")]
    pub api_enabled: bool,

    #[serde(default = "BotSettings::default_api_port")]
    pub api_port: u16,

    #[serde(default = "BotSettings::default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "BotSettings::default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub user: UserSettings,

    #[serde(default)]
    pub job_preferences: JobPreferences,

    #[serde(default)]
    pub application: ApplicationSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,

    #[serde(default)]
    pub intervention: InterventionSettings,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            headless: false,
            api_enabled: Self::default_api_enabled(),
            api_port: Self::default_api_port(),
            data_dir: Self::default_data_dir(),
            base_url: Self::default_base_url(),
            user: UserSettings::default(),
            job_preferences: JobPreferences::default(),
            application: ApplicationSettings::default(),
            behavior: BehaviorSettings::default(),
            intervention: InterventionSettings::default(),
        }
    }
}

impl BotSettings {
    fn default_api_enabled() -> bool {
        true
    }

    fn default_api_port() -> u16 {
        8700
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from(".seekbot")
    }

    fn default_base_url() -> String {
        "https://www.seek.com.au".to_string()
    }

    /// Loads settings from a TOML or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Writes settings to a TOML or JSON file, chosen by extension.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::to_string_pretty(self)?,
            Some("json") => serde_json::to_string_pretty(self)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        fs::write(path, content)?;
        Ok(())
    }

    /// Overrides fields from `SEEKBOT_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(email) = env::var("SEEKBOT_EMAIL") {
            self.user.email = email;
        }
        if let Ok(password) = env::var("SEEKBOT_PASSWORD") {
            self.user.password = password;
        }
        if let Ok(port) = env::var("SEEKBOT_API_PORT") {
            if let Ok(port) = port.parse() {
                self.api_port = port;
            }
        }
        if let Ok(headless) = env::var("SEEKBOT_HEADLESS") {
            self.headless = matches!(headless.as_str(), "1" | "true" | "yes");
        }
        if let Ok(dir) = env::var("SEEKBOT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Ok(url) = env::var("SEEKBOT_BASE_URL") {
            self.base_url = url;
        }
    }

    /// Checks that everything the bot needs before running is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user.email.is_empty() {
            return Err(ConfigError::MissingKey("user.email".to_string()));
        }
        if self.user.password.is_empty() {
            return Err(ConfigError::MissingKey("user.password".to_string()));
        }
        if !self.user.agreement_accepted {
            return Err(ConfigError::MissingKey(
                "user.agreement_accepted".to_string(),
            ));
        }
        if self.behavior.min_wpm == 0 || self.behavior.min_wpm > self.behavior.max_wpm {
            return Err(ConfigError::Validation(format!(
                "invalid WPM range {}..{}",
                self.behavior.min_wpm, self.behavior.max_wpm
            )));
        }
        if !(0.0..=1.0).contains(&self.behavior.typo_rate) {
            return Err(ConfigError::Validation(format!(
                "typo rate {} outside 0.0..=1.0",
                self.behavior.typo_rate
            )));
        }
        Ok(())
    }

    /// Copy with the password masked, for API responses and logs.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.user.password.is_empty() {
            copy.user.password = "***".to_string();
        }
        copy
    }
}

/// CLI argument overrides, applied last in the precedence chain.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub api_port: Option<u16>,
    pub api_enabled: Option<bool>,
    pub headless: Option<bool>,
    pub data_dir: Option<PathBuf>,
}

impl CliArgs {
    /// Resolves final settings: defaults, then file, then env, then CLI.
    pub fn load_settings(&self) -> Result<BotSettings, ConfigError> {
        let mut settings = match &self.config_file {
            Some(path) => BotSettings::from_file(path)?,
            None => BotSettings::default(),
        };

        settings.apply_env();

        if let Some(port) = self.api_port {
            settings.api_port = port;
        }
        if let Some(enabled) = self.api_enabled {
            settings.api_enabled = enabled;
        }
        if let Some(headless) = self.headless {
            settings.headless = headless;
        }
        if let Some(ref dir) = self.data_dir {
            settings.data_dir = dir.clone();
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> BotSettings {
        let mut settings = BotSettings::default();
        settings.user.email = "user@example.test".to_string();
        settings.user.password = "secret".to_string();
        settings.user.agreement_accepted = true;
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = BotSettings::default();
        assert!(settings.api_enabled);
        assert_eq!(settings.api_port, 8700);
        assert!(!settings.headless);
        assert_eq!(settings.behavior.min_wpm, 80);
        assert_eq!(settings.behavior.max_wpm, 120);
        assert_eq!(settings.intervention.timeout_secs, 300);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let settings = BotSettings::default();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingKey(key)) if key == "user.email"
        ));

        let mut settings = valid_settings();
        settings.user.agreement_accepted = false;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingKey(key)) if key == "user.agreement_accepted"
        ));

        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tuning() {
        let mut settings = valid_settings();
        settings.behavior.min_wpm = 200;
        settings.behavior.max_wpm = 100;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Validation(_))
        ));

        let mut settings = valid_settings();
        settings.behavior.typo_rate = 1.5;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let settings = valid_settings();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: BotSettings = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.user.email, settings.user.email);
        assert_eq!(parsed.api_port, settings.api_port);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: BotSettings = toml::from_str(
            r#"
            [user]
            email = "user@example.test"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.user.email, "user@example.test");
        assert_eq!(parsed.api_port, 8700);
        assert_eq!(parsed.job_preferences.locations, vec!["Sydney"]);
    }

    #[test]
    fn test_redacted_masks_password() {
        let settings = valid_settings();
        let redacted = settings.redacted();

        assert_eq!(redacted.user.password, "***");
        assert_eq!(redacted.user.email, settings.user.email);
        // The original is untouched.
        assert_eq!(settings.user.password, "secret");
    }

    #[test]
    fn test_cli_overrides_win() {
        let args = CliArgs {
            api_port: Some(9100),
            headless: Some(true),
            ..CliArgs::default()
        };

        let settings = args.load_settings().unwrap();
        assert_eq!(settings.api_port, 9100);
        assert!(settings.headless);
    }
}
