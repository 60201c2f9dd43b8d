//! Fixed-window rate limiting for provider operations.
//!
//! A [`RateLimiter`] holds the per-provider call counters. Each admitted
//! call increments the counter of its key; once the budget for the current
//! window is spent, callers sleep until the window ends and then compete
//! for the fresh window. Callers are delayed, never rejected.
//!
//! Because windows are fixed, up to twice the budget can be admitted in a
//! short span straddling a window boundary. Callers rely on that timing, so
//! it is kept as-is.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{sleep, Duration, Instant};

use crate::error::ConfigError;

/// Counter key used by every operation of a limiter in [`Scope::Shared`].
pub const SHARED_KEY: &str = "shared";

/// A validated "at most `calls` per `seconds`" budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    calls: u32,
    window: Duration,
}

impl RateLimit {
    /// Create a budget of `calls` per `seconds`-long window.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidRateLimit`] when either value is zero.
    pub fn new(calls: u32, seconds: u64) -> Result<Self, ConfigError> {
        if calls < 1 || seconds < 1 {
            return Err(ConfigError::InvalidRateLimit { calls, seconds });
        }
        Ok(Self {
            calls,
            window: Duration::from_secs(seconds),
        })
    }

    /// Maximum admissions per window.
    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// How operations map onto counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Each operation name has its own counter.
    #[default]
    PerOperation,
    /// All operations draw from one counter.
    Shared,
}

/// Counter state for one key.
#[derive(Debug, Default, Clone, Copy)]
struct Window {
    started: Option<Instant>,
    count: u32,
}

impl Window {
    /// Try to admit one call at `now`. Returns the time to wait when the
    /// budget is spent.
    fn admit(&mut self, now: Instant, limit: RateLimit) -> Option<Duration> {
        let expired = self
            .started
            .map_or(true, |started| now.duration_since(started) >= limit.window);
        if expired {
            self.started = Some(now);
            self.count = 0;
        }

        if self.count < limit.calls {
            self.count += 1;
            return None;
        }

        let elapsed = self
            .started
            .map_or(Duration::ZERO, |started| now.duration_since(started));
        Some(limit.window.saturating_sub(elapsed))
    }
}

#[derive(Debug)]
struct LimiterState {
    default_limit: RateLimit,
    scope: Scope,
    operation_limits: HashMap<String, RateLimit>,
    windows: Mutex<HashMap<String, Window>>,
}

/// Per-provider fixed-window rate limiter.
///
/// Clones share the same counters, so a provider can hand a clone to each
/// component that issues calls on its behalf.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    state: Arc<LimiterState>,
}

impl RateLimiter {
    /// Creates a limiter enforcing `limit` for every counter key.
    pub fn new(limit: RateLimit, scope: Scope) -> Self {
        Self {
            state: Arc::new(LimiterState {
                default_limit: limit,
                scope,
                operation_limits: HashMap::new(),
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Shorthand for a [`Scope::Shared`] limiter of `calls` per `seconds`.
    pub fn shared(calls: u32, seconds: u64) -> Result<Self, ConfigError> {
        Ok(Self::new(RateLimit::new(calls, seconds)?, Scope::Shared))
    }

    /// Shorthand for a [`Scope::PerOperation`] limiter of `calls` per
    /// `seconds`.
    pub fn per_operation(calls: u32, seconds: u64) -> Result<Self, ConfigError> {
        Ok(Self::new(
            RateLimit::new(calls, seconds)?,
            Scope::PerOperation,
        ))
    }

    /// Give `operation` its own budget instead of the default one.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a [`Scope::Shared`]
    /// limiter, which keeps a single budget, or once the limiter has been
    /// cloned and its counters are in use elsewhere.
    pub fn with_operation_limit(
        mut self,
        operation: &str,
        limit: RateLimit,
    ) -> Result<Self, ConfigError> {
        let reject = |message: &str| ConfigError::InvalidValue {
            key: format!("rate limit for {operation}"),
            message: message.to_string(),
        };
        if self.state.scope == Scope::Shared {
            return Err(reject("a shared limiter has a single budget"));
        }
        let state = Arc::get_mut(&mut self.state)
            .ok_or_else(|| reject("the limiter has already been cloned"))?;
        state.operation_limits.insert(operation.to_string(), limit);
        Ok(self)
    }

    /// The scope this limiter was built with.
    pub fn scope(&self) -> Scope {
        self.state.scope
    }

    /// The counter key an operation maps to.
    pub fn key_for<'a>(&self, operation: &'a str) -> &'a str {
        match self.state.scope {
            Scope::PerOperation => operation,
            Scope::Shared => SHARED_KEY,
        }
    }

    /// The budget that applies to a counter key.
    pub fn budget_for(&self, key: &str) -> RateLimit {
        self.state
            .operation_limits
            .get(key)
            .copied()
            .unwrap_or(self.state.default_limit)
    }

    /// Wait until a call to `operation` is admitted.
    ///
    /// Each return from this function accounts for exactly one admission.
    /// When the window is exhausted the caller sleeps for the rest of the
    /// window and then re-checks, since other callers may have claimed the
    /// fresh window first.
    pub async fn acquire(&self, operation: &str) {
        let key = self.key_for(operation);
        let limit = self.budget_for(key);

        loop {
            let cooldown = {
                let mut windows = self.state.windows.lock().await;
                let window = windows.entry(key.to_string()).or_default();
                match window.admit(Instant::now(), limit) {
                    None => return,
                    Some(cooldown) => cooldown,
                }
            };

            log::debug!(
                "rate limit reached for {} ({} per {:?}), waiting {:?}",
                key,
                limit.calls,
                limit.window,
                cooldown
            );
            sleep(cooldown).await;
        }
    }

    /// Run `op` once a call to `operation` has been admitted. The future is
    /// only created after admission.
    pub async fn run<F, Fut, T>(&self, operation: &str, op: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire(operation).await;
        op().await
    }

    /// Calls admitted in the current window of `operation`'s key.
    pub async fn calls_in_window(&self, operation: &str) -> u32 {
        let key = self.key_for(operation);
        let limit = self.budget_for(key);
        let windows = self.state.windows.lock().await;
        windows
            .get(key)
            .filter(|w| {
                w.started
                    .is_some_and(|started| started.elapsed() < limit.window)
            })
            .map_or(0, |w| w.count)
    }

    /// How long a call to `operation` would wait if issued now, or `None`
    /// if it would be admitted immediately. Does not consume budget.
    pub async fn cooldown(&self, operation: &str) -> Option<Duration> {
        let key = self.key_for(operation);
        let limit = self.budget_for(key);
        let windows = self.state.windows.lock().await;
        let mut probe = windows.get(key).copied().unwrap_or_default();
        probe.admit(Instant::now(), limit)
    }
}
