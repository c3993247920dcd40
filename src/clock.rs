// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Process-local monotonic clock domain for deadlines.
//!
//! Deadlines are absolute `f64` seconds measured from a process-wide origin
//! captured on first use. Wall-clock seconds (counted from the UNIX epoch)
//! land billions of seconds away from this domain, which is what the
//! ten-year heuristic in [`looks_like_wall_clock`] detects.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const ONE_YEAR_IN_SECONDS: f64 = 365.0 * 24.0 * 60.0 * 60.0;
const WALL_CLOCK_THRESHOLD: f64 = 10.0 * ONE_YEAR_IN_SECONDS;

static CLOCK_ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Current time in the monotonic clock domain, in seconds.
///
/// All deadline arithmetic in this crate happens in this domain; values are
/// unaffected by system clock changes.
pub fn monotonic_now() -> f64 {
    CLOCK_ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64()
}

/// Current wall-clock time as UNIX epoch seconds.
///
/// Provided so callers (and tests) can demonstrate the mistake that
/// [`looks_like_wall_clock`] guards against. Never use this for deadlines.
pub fn wall_clock_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Heuristic check for a wall-clock timestamp supplied where a monotonic
/// one was expected. A value more than ten years away from the monotonic
/// now almost certainly came from the wrong clock.
pub(crate) fn looks_like_wall_clock(t: f64) -> bool {
    (t - monotonic_now()).abs() > WALL_CLOCK_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_now_is_near_origin() {
        let now = monotonic_now();
        assert!(now >= 0.0);
        assert!(now < ONE_YEAR_IN_SECONDS);
    }

    #[test]
    fn monotonic_now_is_monotonic() {
        let a = monotonic_now();
        let b = monotonic_now();
        assert!(b >= a);
    }

    #[test]
    fn wall_clock_values_are_flagged() {
        assert!(looks_like_wall_clock(wall_clock_now() + 30.0));
        assert!(!looks_like_wall_clock(monotonic_now() + 30.0));
    }
}
