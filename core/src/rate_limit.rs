//! Fixed-window request limiter.
//!
//! At most `limit` permits are handed out per window. Permits are not
//! returned; the budget refills when a new window starts. Waiters sleep on a
//! `Condvar` until the current window ends instead of spinning.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::ApiError;

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    state: Mutex<Window>,
    refilled: Condvar,
}

impl RateLimiter {
    /// Fails with `ApiError::Config` when `limit` or `window` is zero.
    pub fn new(limit: u32, window: Duration) -> Result<Self, ApiError> {
        if limit == 0 {
            return Err(ApiError::Config("rate limit must allow at least one request".to_string()));
        }
        if window.is_zero() {
            return Err(ApiError::Config("rate limit window must be longer than zero".to_string()));
        }
        Ok(Self {
            limit,
            window,
            state: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
            refilled: Condvar::new(),
        })
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Take a permit, blocking until the next window if the budget is spent.
    pub fn acquire(&self) {
        let mut state = self.lock();
        loop {
            let now = Instant::now();
            self.roll(&mut state, now);
            if state.used < self.limit {
                state.used += 1;
                return;
            }
            let wait = self.window.saturating_sub(now.duration_since(state.started));
            tracing::trace!(?wait, limit = self.limit, "rate limit reached, waiting");
            state = self
                .refilled
                .wait_timeout(state, wait)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
    }

    /// Take a permit if one is available in the current window.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        self.roll(&mut state, Instant::now());
        if state.used < self.limit {
            state.used += 1;
            true
        } else {
            false
        }
    }

    /// Permits left in the current window.
    pub fn available(&self) -> u32 {
        let mut state = self.lock();
        self.roll(&mut state, Instant::now());
        self.limit - state.used
    }

    fn roll(&self, state: &mut Window, now: Instant) {
        if now.duration_since(state.started) >= self.window {
            state.started = now;
            state.used = 0;
            self.refilled.notify_all();
        }
    }

    // The guarded state is two plain integers, always consistent.
    fn lock(&self) -> MutexGuard<'_, Window> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
