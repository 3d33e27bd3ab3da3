//! Resource limits backed by token buckets.
//!
//! Rate limits refill continuously at `value` tokens per second up to a
//! capacity of `value`; taking more tokens than available waits for the
//! refill. Total limits never refill: exhausting one fails with
//! `LimitReached`. A child context shares the bucket of its parent for every
//! limit the parent defines.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::errors::{self, EvalError};

/// How a limit's tokens are replenished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LimitKind {
    /// Occurrences per second.
    SimpleRate,
    /// Bytes per second.
    ByteRate,
    /// Fixed budget for the lifetime of the context tree.
    Total,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limit {
    pub name: String,
    pub kind: LimitKind,
    pub value: i64,
}

impl Limit {
    pub fn new(name: impl Into<String>, kind: LimitKind, value: i64) -> Self {
        Limit {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn less_restrictive_than(&self, other: &Limit) -> bool {
        self.value >= other.value
    }
}

#[derive(Debug)]
struct BucketState {
    available: f64,
    last_refill: Instant,
}

/// Token bucket of one limit.
#[derive(Debug)]
pub struct TokenBucket {
    limit: Limit,
    state: Mutex<BucketState>,
}

const REFILL_POLL: Duration = Duration::from_millis(5);

impl TokenBucket {
    pub fn new(limit: Limit) -> Self {
        #[allow(clippy::cast_precision_loss, reason = "limit values are small")]
        let capacity = limit.value as f64;
        TokenBucket {
            limit,
            state: Mutex::new(BucketState {
                available: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn limit(&self) -> &Limit {
        &self.limit
    }

    #[allow(clippy::cast_precision_loss, reason = "limit values are small")]
    fn refill(&self, state: &mut BucketState) {
        if self.limit.kind == LimitKind::Total {
            return;
        }
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        let capacity = self.limit.value as f64;
        state.available = (state.available + elapsed * capacity).min(capacity);
        state.last_refill = now;
    }

    /// Remaining tokens, rounded down.
    #[allow(clippy::cast_possible_truncation, reason = "bounded by the i64 capacity")]
    pub fn available(&self) -> i64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.available.floor() as i64
    }

    /// Take `count` tokens. Rate limits wait for the refill, polling
    /// `is_cancelled`; total limits fail when exhausted.
    #[allow(clippy::cast_precision_loss, reason = "token counts are small")]
    pub fn take(&self, count: i64, is_cancelled: impl Fn() -> bool) -> Result<(), EvalError> {
        let wanted = count as f64;
        loop {
            {
                let mut state = self.state.lock();
                self.refill(&mut state);
                if state.available >= wanted {
                    state.available -= wanted;
                    return Ok(());
                }
                if self.limit.kind == LimitKind::Total {
                    tracing::debug!(limit = %self.limit.name, "total limit reached");
                    return Err(errors::limit_reached(&self.limit.name));
                }
                // A request larger than the capacity can never be served at once.
                if wanted > self.limit.value as f64 {
                    state.available -= wanted;
                    return Ok(());
                }
            }
            if is_cancelled() {
                return Err(errors::cancelled());
            }
            std::thread::sleep(REFILL_POLL);
        }
    }

    #[allow(clippy::cast_precision_loss, reason = "token counts are small")]
    pub fn give_back(&self, count: i64) {
        let mut state = self.state.lock();
        let capacity = self.limit.value as f64;
        state.available = (state.available + count as f64).min(capacity);
    }
}

/// Buckets of one context, by limit name.
#[derive(Clone, Debug, Default)]
pub struct Limiters(Vec<Arc<TokenBucket>>);

impl Limiters {
    /// Buckets for `limits`, reusing the parent's bucket for any limit the
    /// parent already has.
    pub fn new(limits: &[Limit], parent: Option<&Limiters>) -> Self {
        let mut buckets: Vec<Arc<TokenBucket>> = parent.map(|p| p.0.clone()).unwrap_or_default();
        for limit in limits {
            if buckets.iter().any(|b| b.limit.name == limit.name) {
                continue;
            }
            buckets.push(Arc::new(TokenBucket::new(limit.clone())));
        }
        Limiters(buckets)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TokenBucket>> {
        self.0.iter().find(|b| b.limit.name == name)
    }

    pub fn limits(&self) -> Vec<Limit> {
        self.0.iter().map(|b| b.limit.clone()).collect()
    }
}
