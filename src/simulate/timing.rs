//! Timing math for human-like interaction.
//!
//! Every behavioral operation composes its pauses from one uniform delay
//! primitive, so timing variance stays centrally tunable and testable.
//!
//! Typing speed is expressed in words per minute and converted to a
//! per-character interval using the standard 5-characters-per-word
//! convention. Reading speed uses the same convention at a slower rate.

use rand::Rng;
use std::time::Duration;

/// Uniformly random delay in the inclusive-exclusive range `[min_ms, max_ms)`.
///
/// The primitive everything else composes from. `min >= max` collapses to a
/// fixed `min` delay.
pub fn random_delay(min_ms: u64, max_ms: u64) -> Duration {
    if min_ms >= max_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..max_ms))
}

/// Average per-character interval for a typing speed in words per minute.
pub fn wpm_to_char_delay(wpm: u32) -> Duration {
    if wpm == 0 {
        return Duration::from_millis(200);
    }
    let chars_per_second = (wpm as f64) * 5.0 / 60.0;
    Duration::from_millis((1000.0 / chars_per_second) as u64)
}

/// Per-character delay drawn for one keystroke.
///
/// Picks a speed in the WPM range, then scales the base interval by a
/// uniform 0.5–1.5 factor so consecutive keystrokes never land on a fixed
/// cadence. The result always stays within
/// [`char_delay_bounds`] for the same range.
pub fn char_delay(wpm_range: (u32, u32)) -> Duration {
    let mut rng = rand::thread_rng();
    let (lo, hi) = wpm_range;
    let wpm = if lo >= hi { lo } else { rng.gen_range(lo..=hi) };
    let base = wpm_to_char_delay(wpm).as_millis() as f64;
    let scaled = base * rng.gen_range(0.5..1.5);
    Duration::from_millis(scaled as u64)
}

/// Inclusive bounds every [`char_delay`] draw respects for a WPM range.
pub fn char_delay_bounds(wpm_range: (u32, u32)) -> (Duration, Duration) {
    let (lo, hi) = if wpm_range.0 >= wpm_range.1 {
        (wpm_range.0, wpm_range.0)
    } else {
        wpm_range
    };
    // Fastest keystroke: highest WPM at the 0.5 scale floor. Slowest:
    // lowest WPM at the 1.5 ceiling.
    let min = wpm_to_char_delay(hi).as_millis() as f64 * 0.5;
    let max = wpm_to_char_delay(lo).as_millis() as f64 * 1.5;
    (
        Duration::from_millis(min.floor() as u64),
        Duration::from_millis(max.ceil() as u64),
    )
}

/// Estimated dwell time for reading `char_count` characters of visible
/// text at `reading_wpm`, scaled by a uniform 0.5–1.5 factor.
pub fn reading_time(char_count: usize, reading_wpm: u32) -> Duration {
    let words = char_count as f64 / 5.0;
    let minutes = words / reading_wpm.max(1) as f64;
    let seconds = minutes * 60.0 * rand::thread_rng().gen_range(0.5..1.5);
    Duration::from_millis((seconds * 1000.0) as u64)
}
