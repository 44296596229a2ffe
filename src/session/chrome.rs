//! Chrome DevTools Protocol driver implementation.
//!
//! Drives a real Chrome/Chromium process through `chromiumoxide`. One
//! [`ChromeDriver`] wraps one launched browser with one primary page; the
//! CDP event handler runs on a background task for the life of the driver.
//!
//! Requires the `chrome-driver` feature (enabled by default).

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::driver::{BrowserDriver, DriverError, DriverFactory};
use crate::stealth::StealthProfile;

/// Locates a usable Chromium-family executable.
///
/// Resolution order: `CHROME_EXECUTABLE` env var, then a PATH scan, then
/// well-known install locations per platform.
pub fn find_chrome_executable() -> Option<String> {
    if let Ok(p) = std::env::var("CHROME_EXECUTABLE") {
        if Path::new(&p).exists() {
            return Some(p);
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = ["google-chrome", "chromium", "chromium-browser", "chrome"];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full.to_string_lossy().to_string());
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(c.to_string());
            }
        }
    }

    None
}

/// CDP-backed [`BrowserDriver`].
pub struct ChromeDriver {
    id: String,
    browser: Mutex<Browser>,
    page: Page,
    _handler_task: tokio::task::JoinHandle<()>,
}

impl ChromeDriver {
    /// Launches Chrome with the profile's launch arguments and opens the
    /// primary page.
    pub async fn launch(profile: &StealthProfile, headless: bool) -> Result<Self, DriverError> {
        let exe = find_chrome_executable().ok_or_else(|| DriverError::LaunchFailed {
            message: "no Chrome/Chromium executable found; set CHROME_EXECUTABLE".to_string(),
        })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&exe)
            .window_size(profile.viewport.0, profile.viewport.1);

        if !headless {
            builder = builder.with_head();
        }

        for arg in profile.launch_args() {
            builder = builder.arg(arg);
        }

        let config = builder.build().map_err(|e| DriverError::LaunchFailed {
            message: format!("invalid browser config: {}", e),
        })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DriverError::LaunchFailed {
                message: format!("launch via {} failed: {}", exe, e),
            })?;

        info!(executable = %exe, "browser launched");

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!(error = %e, "CDP handler error");
                }
            }
            debug!("CDP handler stream ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::LaunchFailed {
                message: format!("failed to open initial page: {}", e),
            })?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            browser: Mutex::new(browser),
            page,
            _handler_task: handler_task,
        })
    }

    fn script_err(e: impl std::fmt::Display) -> DriverError {
        DriverError::Script {
            message: e.to_string(),
        }
    }

    fn not_found(selector: &str) -> DriverError {
        DriverError::NotFound {
            selector: selector.to_string(),
        }
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    fn session_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.page
            .url()
            .await
            .map_err(|_| DriverError::ConnectionLost)
            .map(|u| u.unwrap_or_default())
    }

    async fn window_handles(&self) -> Result<Vec<String>, DriverError> {
        let browser = self.browser.lock().await;
        let pages = browser
            .pages()
            .await
            .map_err(|_| DriverError::ConnectionLost)?;
        Ok(pages
            .iter()
            .map(|p| p.target_id().inner().to_string())
            .collect())
    }

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| DriverError::Navigation {
                message: e.to_string(),
            })?;
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let result = self
            .page
            .evaluate(script.to_string())
            .await
            .map_err(Self::script_err)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn find_element(&self, selector: &str) -> Result<bool, DriverError> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn click_element(&self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| Self::not_found(selector))?;
        element.click().await.map_err(Self::script_err)?;
        Ok(())
    }

    async fn click_at(&self, selector: &str, dx: f64, dy: f64) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| Self::not_found(selector))?;
        let mut point = element
            .clickable_point()
            .await
            .map_err(Self::script_err)?;
        point.x += dx;
        point.y += dy;
        self.page.click(point).await.map_err(Self::script_err)?;
        Ok(())
    }

    async fn send_keys(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| Self::not_found(selector))?;
        element.type_str(text).await.map_err(Self::script_err)?;
        Ok(())
    }

    async fn press_key(&self, selector: &str, key: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| Self::not_found(selector))?;
        element.press_key(key).await.map_err(Self::script_err)?;
        Ok(())
    }

    async fn clear_element(&self, selector: &str) -> Result<(), DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| Self::not_found(selector))?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(Self::script_err)?;
        Ok(())
    }

    async fn element_text(&self, selector: &str) -> Result<String, DriverError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| Self::not_found(selector))?;
        let text = element.inner_text().await.map_err(Self::script_err)?;
        Ok(text.unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.page.content().await.map_err(Self::script_err)
    }

    async fn quit(&self) -> Result<(), DriverError> {
        info!("closing browser process");
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|_| DriverError::ConnectionLost)?;
        let _ = browser.wait().await;
        Ok(())
    }
}

/// [`DriverFactory`] producing [`ChromeDriver`] instances.
pub struct ChromeDriverFactory {
    headless: bool,
}

impl ChromeDriverFactory {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl DriverFactory for ChromeDriverFactory {
    async fn create(
        &self,
        profile: &StealthProfile,
    ) -> Result<Arc<dyn BrowserDriver>, DriverError> {
        let driver = ChromeDriver::launch(profile, self.headless).await?;
        Ok(Arc::new(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Launch tests require a local Chrome/Chromium installation; run with
    // cargo test -- --ignored

    #[tokio::test]
    #[ignore]
    async fn test_launch_and_quit() {
        let profile = crate::stealth::StealthProfileBuilder::new().build();
        let driver = ChromeDriver::launch(&profile, true).await.unwrap();

        assert!(driver.session_id().is_some());
        assert!(!driver.window_handles().await.unwrap().is_empty());

        driver.quit().await.unwrap();
    }
}
