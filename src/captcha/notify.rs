//! Operator notification for human interventions.
//!
//! A notification failure is logged and otherwise ignored; the intervention
//! loop's correctness never depends on the notification arriving.

use std::process::Command;
use tracing::debug;

/// Errors from delivering a desktop notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification command failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("no notification mechanism on this platform")]
    Unsupported,
}

/// Delivers a one-shot, human-directed message.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError>;
}

/// Native desktop notifications via the platform's standard tool.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for DesktopNotifier {
    #[cfg(target_os = "linux")]
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        debug!(title, "sending desktop notification");
        Command::new("notify-send").arg(title).arg(message).spawn()?;
        Ok(())
    }

    #[cfg(target_os = "macos")]
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        debug!(title, "sending desktop notification");
        Command::new("osascript")
            .arg("-e")
            .arg(format!(
                "display notification \"{}\" with title \"{}\"",
                message, title
            ))
            .spawn()?;
        Ok(())
    }

    #[cfg(target_os = "windows")]
    fn notify(&self, title: &str, message: &str) -> Result<(), NotifyError> {
        debug!(title, "sending desktop notification");
        Command::new("powershell")
            .arg("-Command")
            .arg(format!(
                "[System.Reflection.Assembly]::LoadWithPartialName('System.Windows.Forms');\
                 [System.Windows.Forms.MessageBox]::Show('{}', '{}')",
                message, title
            ))
            .spawn()?;
        Ok(())
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    fn notify(&self, _title: &str, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Unsupported)
    }
}

/// Discards notifications; used in tests and headless deployments.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_notifier_always_succeeds() {
        let notifier = NullNotifier;
        assert!(notifier.notify("title", "message").is_ok());
    }
}
