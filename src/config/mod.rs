//! Configuration management for loading settings from files, env, and CLI.

pub mod settings;

pub use settings::{
    ApplicationSettings, BehaviorSettings, BotSettings, CliArgs, ConfigError, InterventionSettings,
    JobPreferences, UserSettings,
};
