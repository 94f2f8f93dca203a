//! Per-node health tracking.
//!
//! Health fields are plain atomics: they are mutated by every attempt of
//! every concurrently-running operation, and a lock over the network map
//! would serialize unrelated operations against different nodes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::debug;

use meridian_core::AccountId;

/// Largest failure-streak exponent applied to the backoff base.
const MAX_BACKOFF_EXPONENT: u64 = 16;

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// One addressable network endpoint plus the ledger account that owns it.
#[derive(Debug)]
pub struct Node {
    account_id: AccountId,
    address: String,
    health: NodeHealth,
}

/// Mutable health fields, all timestamps in unix milliseconds.
///
/// All loads/stores are `Relaxed`: the fields are independent scheduling
/// hints, not synchronization points.
#[derive(Debug, Default)]
struct NodeHealth {
    use_count: AtomicU64,
    last_used_at: AtomicU64,
    failure_streak: AtomicU64,
    last_error_at: AtomicU64,
    /// 0 while the node is healthy.
    backoff_until: AtomicU64,
    current_backoff: AtomicU64,
}

impl Node {
    pub(crate) fn new(account_id: AccountId, address: String) -> Self {
        Self {
            account_id,
            address,
            health: NodeHealth::default(),
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether the node is outside any backoff window at `now`.
    pub fn is_healthy(&self, now: u64) -> bool {
        self.health.backoff_until.load(Ordering::Relaxed) <= now
    }

    /// Unix-millisecond instant at which the node leaves backoff.
    pub fn backoff_until(&self) -> u64 {
        self.health.backoff_until.load(Ordering::Relaxed)
    }

    /// Milliseconds until the node leaves backoff, zero when healthy.
    pub fn remaining_backoff(&self, now: u64) -> u64 {
        self.backoff_until().saturating_sub(now)
    }

    pub fn use_count(&self) -> u64 {
        self.health.use_count.load(Ordering::Relaxed)
    }

    pub fn last_used_at(&self) -> u64 {
        self.health.last_used_at.load(Ordering::Relaxed)
    }

    pub fn last_error_at(&self) -> Option<u64> {
        match self.health.last_error_at.load(Ordering::Relaxed) {
            0 => None,
            at => Some(at),
        }
    }

    /// Marks an attempt against this node as answered.
    ///
    /// Any answer clears the backoff state: the node is reachable and
    /// serving, whatever it thought of the request itself.
    pub(crate) fn record_success(&self) {
        self.health.failure_streak.store(0, Ordering::Relaxed);
        self.health.backoff_until.store(0, Ordering::Relaxed);
        self.health.current_backoff.store(0, Ordering::Relaxed);
        self.health.use_count.fetch_add(1, Ordering::Relaxed);
        self.health.last_used_at.store(now_millis(), Ordering::Relaxed);
    }

    /// Marks an attempt against this node as failed at the transport level.
    ///
    /// The backoff window grows exponentially with the failure streak,
    /// capped at `max_backoff`, minus up to 20% random jitter so many
    /// clients recovering from the same outage do not retry in lockstep.
    pub(crate) fn record_failure(&self, min_backoff: Duration, max_backoff: Duration) {
        let now = now_millis();
        let streak = self.health.failure_streak.fetch_add(1, Ordering::Relaxed);

        let min_ms = min_backoff.as_millis() as u64;
        let max_ms = max_backoff.as_millis() as u64;
        let base = min_ms
            .saturating_mul(1u64 << streak.min(MAX_BACKOFF_EXPONENT))
            .min(max_ms);
        let jitter = if base >= 5 {
            rand::thread_rng().gen_range(0..=base / 5)
        } else {
            0
        };
        let backoff = base - jitter;

        self.health.current_backoff.store(backoff, Ordering::Relaxed);
        self.health.backoff_until.store(now + backoff, Ordering::Relaxed);
        self.health.last_error_at.store(now, Ordering::Relaxed);
        self.health.use_count.fetch_add(1, Ordering::Relaxed);
        self.health.last_used_at.store(now, Ordering::Relaxed);

        debug!(
            node = %self.account_id,
            address = %self.address,
            streak = streak + 1,
            backoff_ms = backoff,
            "node backed off after failure"
        );
    }

    /// Sort key for selection: least-used first, least-recently-used on ties.
    pub(crate) fn selection_key(&self) -> (u64, u64, AccountId) {
        (self.use_count(), self.last_used_at(), self.account_id)
    }
}
