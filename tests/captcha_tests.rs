//! Integration tests for the captcha intervention loop.
//!
//! Uses a paused tokio clock so detection/poll/timeout timing asserts are
//! exact rather than wall-clock dependent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use seekbot::captcha::{
    detect_challenge, InterventionConfig, InterventionError, InterventionLoop, InterventionPhase,
    Notifier, NotifyError, NullNotifier,
};
use seekbot::session::MockDriver;

/// Notifier that counts deliveries.
#[derive(Default)]
struct CountingNotifier {
    count: AtomicUsize,
}

impl Notifier for CountingNotifier {
    fn notify(&self, _title: &str, _message: &str) -> Result<(), NotifyError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn config(poll_secs: u64, timeout_secs: u64) -> InterventionConfig {
    InterventionConfig {
        poll_interval: Duration::from_secs(poll_secs),
        timeout: Duration::from_secs(timeout_secs),
    }
}

#[tokio::test(start_paused = true)]
async fn resolves_after_challenge_clears() {
    let driver = MockDriver::new("https://example.test");
    // Present for the first two polls, clear on the third.
    driver.queue_page_sources(vec![
        "blocked by recaptcha".to_string(),
        "blocked by recaptcha".to_string(),
    ]);
    driver.set_page_source("<html>welcome back</html>");

    let loop_ = InterventionLoop::new(config(2, 30), Arc::new(NullNotifier));
    let waited = loop_.wait_for_resolution(&driver).await.unwrap();

    // Three polls of 2 time-units each.
    assert_eq!(waited.as_secs(), 6);
}

#[tokio::test(start_paused = true)]
async fn times_out_when_challenge_never_clears() {
    let driver = MockDriver::new("https://example.test");
    driver.set_page_source("please verify you are human");

    let loop_ = InterventionLoop::new(config(2, 30), Arc::new(NullNotifier));
    let started = tokio::time::Instant::now();
    let err = loop_
        .wait_for_resolution(&driver)
        .await
        .expect_err("must time out");

    assert!(matches!(err, InterventionError::Timeout { .. }));
    // Not before the configured timeout and not significantly after.
    assert_eq!(started.elapsed().as_secs(), 30);
}

#[tokio::test(start_paused = true)]
async fn notifies_the_operator_exactly_once() {
    let driver = MockDriver::new("https://example.test");
    driver.queue_page_sources(vec!["recaptcha".to_string(); 4]);
    driver.set_page_source("<html>clean</html>");

    let notifier = Arc::new(CountingNotifier::default());
    let loop_ = InterventionLoop::new(config(2, 60), notifier.clone());
    loop_.wait_for_resolution(&driver).await.unwrap();

    assert_eq!(notifier.count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn scan_errors_resolve_instead_of_aborting() {
    let driver = Arc::new(MockDriver::new("https://example.test"));
    driver.set_page_source("recaptcha");

    // The driver stops answering mid-wait. The failing scan counts as
    // "not detected", so the wait returns success rather than an error.
    let watcher = driver.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        watcher.set_alive(false);
    });

    let loop_ = InterventionLoop::new(config(2, 30), Arc::new(NullNotifier));
    let waited = loop_.wait_for_resolution(driver.as_ref()).await.unwrap();
    assert_eq!(waited.as_secs(), 4);
}

#[tokio::test(start_paused = true)]
async fn gauge_tracks_phases_across_a_wait() {
    let driver = MockDriver::new("https://example.test");
    driver.queue_page_sources(vec!["recaptcha".to_string()]);
    driver.set_page_source("<html>clean</html>");

    let loop_ = InterventionLoop::new(config(2, 30), Arc::new(NullNotifier));
    let gauge = seekbot::captcha::InterventionGauge::new();
    let loop_ = loop_.with_gauge(gauge.clone());

    assert_eq!(gauge.state().phase, InterventionPhase::Idle);

    loop_.wait_for_resolution(&driver).await.unwrap();

    let state = gauge.state();
    assert_eq!(state.phase, InterventionPhase::Resolved);
    assert!(!state.active);
    assert!(state.started_at.is_some());
}

#[tokio::test(start_paused = true)]
async fn timed_out_wait_leaves_timed_out_phase() {
    let driver = MockDriver::new("https://example.test");
    driver.set_page_source("recaptcha");

    let gauge = seekbot::captcha::InterventionGauge::new();
    let loop_ =
        InterventionLoop::new(config(2, 10), Arc::new(NullNotifier)).with_gauge(gauge.clone());

    let _ = loop_.wait_for_resolution(&driver).await;
    assert_eq!(gauge.state().phase, InterventionPhase::TimedOut);
}

#[tokio::test]
async fn detection_combines_markers_and_keywords() {
    let driver = MockDriver::new("https://example.test");
    driver.set_page_source("<html>just a page</html>");
    assert!(!detect_challenge(&driver).await);

    driver.set_present("iframe[src*='recaptcha']");
    assert!(detect_challenge(&driver).await);

    driver.remove_present("iframe[src*='recaptcha']");
    driver.set_page_source("<html>I'm not a robot</html>");
    assert!(detect_challenge(&driver).await);
}

#[tokio::test(start_paused = true)]
async fn independent_interventions_share_no_state() {
    let driver = MockDriver::new("https://example.test");

    // First intervention resolves after one poll.
    driver.queue_page_sources(vec!["recaptcha".to_string()]);
    driver.set_page_source("<html>clean</html>");
    let first = InterventionLoop::new(config(2, 30), Arc::new(NullNotifier));
    let first_wait = first.wait_for_resolution(&driver).await.unwrap();

    // A fresh loop starts from zero elapsed time.
    driver.queue_page_sources(vec!["recaptcha".to_string()]);
    let second = InterventionLoop::new(config(2, 30), Arc::new(NullNotifier));
    let second_wait = second.wait_for_resolution(&driver).await.unwrap();

    assert_eq!(first_wait.as_secs(), second_wait.as_secs());
}
