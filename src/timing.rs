//! Coarse cooperative timing.
//!
//! The host calls `tick()` at irregular, unspecified spacing. Cadences are
//! therefore protected by elapsed-time checks on a `u32` millisecond clock,
//! using wrapping subtraction so the ~49-day rollover is harmless.

use crate::app::ports::KeepAlivePort;

/// Milliseconds from `since` to `now`, correct across one `u32` wrap.
#[inline]
pub fn elapsed_ms(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Lets an action run at most once per `period_ms`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalGate {
    period_ms: u32,
    last_ms: u32,
}

impl IntervalGate {
    /// The first opening happens once `period_ms` has passed since boot (t=0).
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: 0,
        }
    }

    /// Open (and re-arm) if at least `period_ms` has elapsed since the
    /// last opening.
    pub fn try_pass(&mut self, now_ms: u32) -> bool {
        if elapsed_ms(now_ms, self.last_ms) < self.period_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }

    /// Open (and re-arm) only if *strictly more* than `period_ms` has elapsed.
    pub fn try_pass_after(&mut self, now_ms: u32) -> bool {
        if elapsed_ms(now_ms, self.last_ms) <= self.period_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }

    pub fn last_ms(&self) -> u32 {
        self.last_ms
    }
}

/// Block for `slices` × `slice_ms`, feeding the watchdog after every slice.
///
/// The total is capped at [`MAX_KEEP_ALIVE_WAIT_MS`].
pub fn keep_alive_wait(port: &mut impl KeepAlivePort, slice_ms: u32, slices: u32) {
    let mut remaining = slice_ms.saturating_mul(slices).min(MAX_KEEP_ALIVE_WAIT_MS);
    port.feed();
    while remaining > 0 {
        let step = slice_ms.min(remaining);
        port.sleep_ms(step);
        port.feed();
        remaining -= step;
    }
}

/// Upper bound for one keep-alive wait.
pub const MAX_KEEP_ALIVE_WAIT_MS: u32 = 1_000;
