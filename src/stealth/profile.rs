//! Stealth profile generation.
//!
//! A [`StealthProfile`] is an immutable bundle of launch parameters drawn
//! from fixed candidate pools: viewport size, user agent, language list and
//! window position. One profile is generated per browser session and
//! consumed at launch time.
//!
//! # Example
//!
//! ```rust
//! use seekbot::stealth::StealthProfileBuilder;
//!
//! let profile = StealthProfileBuilder::new().build();
//! assert!(profile.user_agent.contains("Mozilla/5.0"));
//! ```

use rand::seq::SliceRandom;
use rand::Rng;

/// Realistic desktop viewport candidates.
const VIEWPORTS: &[(u32, u32)] = &[
    (1920, 1080),
    (1366, 768),
    (1440, 900),
    (1536, 864),
    (1280, 720),
];

/// Current-generation Chrome user agents across common platforms.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// Immutable launch configuration for one browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct StealthProfile {
    /// Window dimensions as (width, height) in pixels.
    pub viewport: (u32, u32),

    /// Window position as (x, y) from the top-left screen corner.
    pub window_position: (u32, u32),

    /// User agent string presented by the browser.
    pub user_agent: String,

    /// Accepted languages, most preferred first.
    pub languages: Vec<String>,
}

impl StealthProfile {
    /// Browser launch arguments derived from this profile plus the fixed
    /// anti-automation flags.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-infobars".to_string(),
            "--disable-background-timer-throttling".to_string(),
            "--disable-popup-blocking".to_string(),
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", self.languages.join(",")),
            format!("--window-size={},{}", self.viewport.0, self.viewport.1),
            format!(
                "--window-position={},{}",
                self.window_position.0, self.window_position.1
            ),
        ]
    }
}

/// Builds randomized [`StealthProfile`] values.
///
/// Pure with respect to inputs: the only state it touches is the thread
/// RNG, and each `build()` draws a fresh combination from the pools.
#[derive(Debug, Default)]
pub struct StealthProfileBuilder;

impl StealthProfileBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Draws a fresh profile from the candidate pools.
    pub fn build(&self) -> StealthProfile {
        let mut rng = rand::thread_rng();

        let viewport = *VIEWPORTS
            .choose(&mut rng)
            .expect("viewport pool is non-empty");
        let user_agent = USER_AGENTS
            .choose(&mut rng)
            .expect("user agent pool is non-empty")
            .to_string();

        StealthProfile {
            viewport,
            window_position: (rng.gen_range(0..=100), rng.gen_range(0..=100)),
            user_agent,
            languages: vec!["en-US".to_string(), "en".to_string()],
        }
    }

    /// Ordered property-override scripts for a profile.
    ///
    /// Convenience wrapper over [`super::scripts::injection_scripts`].
    pub fn injection_scripts(&self, profile: &StealthProfile) -> Vec<String> {
        super::scripts::injection_scripts(profile)
    }
}
