//! Per-type fixed-ceiling rate limiting.

use std::collections::HashMap;

use living_city_core::EventType;

/// Length of one rate window.
pub const RATE_WINDOW_MS: u64 = 1_000;
/// Events of one type accepted per window.
pub const RATE_CEILING: u32 = 6;

#[derive(Clone, Copy, Debug)]
struct Window {
    start_ms: u64,
    count: u32,
}

/// Counts events per type inside a window that restarts once it has elapsed.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    window_ms: u64,
    ceiling: u32,
    windows: HashMap<EventType, Window>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_WINDOW_MS, RATE_CEILING)
    }
}

impl RateLimiter {
    /// Creates a limiter that accepts `ceiling` events per `window_ms`.
    #[must_use]
    pub fn new(window_ms: u64, ceiling: u32) -> Self {
        Self {
            window_ms,
            ceiling,
            windows: HashMap::new(),
        }
    }

    /// Records an event of `event_type` at `now_ms` and reports whether it is allowed.
    pub fn allow(&mut self, event_type: EventType, now_ms: u64) -> bool {
        let window_ms = self.window_ms;
        let window = self.windows.entry(event_type).or_insert(Window {
            start_ms: now_ms,
            count: 0,
        });
        if now_ms.saturating_sub(window.start_ms) >= window_ms {
            *window = Window {
                start_ms: now_ms,
                count: 0,
            };
        }
        window.count = window.count.saturating_add(1);
        window.count <= self.ceiling
    }

    /// Forgets every window.
    pub fn reset(&mut self) {
        self.windows.clear();
    }
}
