//! Per-id timestamp gate.
//!
//! Stores only the last-allowed timestamp (ms since the Unix epoch) for each
//! id. [`TimestampGate::check`] decides and records in one step: the first
//! call for an id, or any call made at least `ttl` after the stored
//! timestamp, stores `now` and returns `true`. Anything else returns `false`
//! and leaves the stored value alone.
//!
//! Pass your own `now` (via [`TimestampGate::check_at`]) when batching or
//! testing so results don't depend on the wall clock.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lazy_static::lazy_static;
use std::time::Duration;

use crate::misc::now_millis;

/// Default time-to-live between two allowed checks of the same id.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

lazy_static! {
    static ref SHARED_GATE: TimestampGate = TimestampGate::default();
}

/// In-memory map of id -> last allowed timestamp (ms).
///
/// The gate is `Send + Sync`; wrap it in an `Arc` (or borrow the
/// [`shared`](TimestampGate::shared) instance) to use it from many tasks.
#[derive(Debug)]
pub struct TimestampGate {
    entries: DashMap<String, i64>,
    default_ttl: Duration,
}

impl TimestampGate {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Process-wide instance with [`DEFAULT_TTL`], built on first access.
    ///
    /// Every call returns the same gate. Construct a gate with
    /// [`TimestampGate::new`] when you need one isolated from the rest of
    /// the process.
    pub fn shared() -> &'static TimestampGate {
        &SHARED_GATE
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Check `id` against the wall clock and the default ttl.
    pub fn check(&self, id: &str) -> bool {
        self.check_with_ttl(id, now_millis(), self.default_ttl)
    }

    /// Check `id` at an explicit `now_ms` with the default ttl.
    pub fn check_at(&self, id: &str, now_ms: i64) -> bool {
        self.check_with_ttl(id, now_ms, self.default_ttl)
    }

    /// Check `id` at `now_ms` with a per-call ttl.
    ///
    /// Allowed when `id` has no stored timestamp or `now_ms - last >= ttl`;
    /// in that case `now_ms` becomes the stored timestamp. The lookup,
    /// comparison and write all happen under the entry's shard lock, so two
    /// concurrent checks for the same id can't both be allowed inside one
    /// ttl window.
    pub fn check_with_ttl(&self, id: &str, now_ms: i64, ttl: Duration) -> bool {
        self.check_recorded(id, now_ms, ttl).0
    }

    /// Same as [`check_with_ttl`](Self::check_with_ttl), also returning the
    /// timestamp stored for `id` once the check has run.
    ///
    /// The timestamp is read under the same lock as the decision, so it is
    /// the value this check either wrote or was denied against.
    pub fn check_recorded(&self, id: &str, now_ms: i64, ttl: Duration) -> (bool, i64) {
        let ttl_ms = ttl_millis(ttl);

        match self.entries.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(now_ms);
                (true, now_ms)
            }
            Entry::Occupied(mut slot) => {
                let last = *slot.get();
                if now_ms.saturating_sub(last) >= ttl_ms {
                    slot.insert(now_ms);
                    (true, now_ms)
                } else {
                    (false, last)
                }
            }
        }
    }

    /// Peek the last allowed timestamp for `id`.
    pub fn get(&self, id: &str) -> Option<i64> {
        self.entries.get(id).map(|ts| *ts)
    }

    /// Overwrite the stored timestamp for `id`, bypassing the ttl check.
    ///
    /// Meant for backfilling or importing state. Nothing stops this from
    /// moving a timestamp backwards; that is on the caller.
    pub fn set(&self, id: &str, timestamp_ms: i64) {
        self.entries.insert(id.to_string(), timestamp_ms);
    }

    pub fn delete(&self, id: &str) {
        self.entries.remove(id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop every entry stored strictly before `cutoff_ms`.
    ///
    /// Returns how many entries were removed.
    pub fn prune_from(&self, cutoff_ms: i64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, ts| {
            let keep = *ts >= cutoff_ms;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Number of tracked ids (diagnostics).
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}

impl Default for TimestampGate {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

pub(crate) fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn first_check_is_allowed_and_recorded() {
        let gate = TimestampGate::default();

        assert!(gate.check_at("new-id", 42));
        assert_eq!(gate.get("new-id"), Some(42));
    }

    #[test]
    fn default_ttl_scenario() {
        let gate = TimestampGate::default();
        assert_eq!(gate.default_ttl(), Duration::from_millis(300_000));

        assert!(gate.check_at("a", 1000));
        assert!(!gate.check_at("a", 1500));
        assert_eq!(gate.get("a"), Some(1000));
        assert!(gate.check_at("a", 301_000));
        assert_eq!(gate.get("a"), Some(301_000));
    }

    #[test]
    fn ttl_boundary_is_inclusive() {
        let gate = TimestampGate::new(Duration::from_millis(100));

        assert!(gate.check_at("k", 0));
        assert!(!gate.check_at("k", 99));
        assert!(gate.check_at("k", 100));
        assert_eq!(gate.get("k"), Some(100));
    }

    #[test]
    fn per_call_ttl_overrides_default() {
        let gate = TimestampGate::default();
        let short = Duration::from_millis(10);

        assert!(gate.check_with_ttl("k", 0, short));
        assert!(!gate.check_with_ttl("k", 5, short));
        assert!(gate.check_with_ttl("k", 10, short));
        // default ttl still applies to plain checks
        assert!(!gate.check_at("k", 20));
    }

    #[test]
    fn check_recorded_reports_the_timestamp_it_decided_on() {
        let gate = TimestampGate::new(Duration::from_millis(100));

        assert_eq!(gate.check_recorded("k", 10, gate.default_ttl()), (true, 10));
        assert_eq!(gate.check_recorded("k", 50, gate.default_ttl()), (false, 10));
        assert_eq!(gate.check_recorded("k", 110, gate.default_ttl()), (true, 110));
    }

    #[test]
    fn clock_going_backwards_is_denied() {
        let gate = TimestampGate::new(Duration::from_millis(100));

        assert!(gate.check_at("k", 1_000));
        assert!(!gate.check_at("k", 500));
        assert_eq!(gate.get("k"), Some(1_000));
    }

    #[test]
    fn wall_clock_check_records_current_time() {
        let gate = TimestampGate::default();
        let before = now_millis();

        assert!(gate.check("wall"));
        assert!(!gate.check("wall"));

        let stored = gate.get("wall").unwrap();
        assert!(stored >= before);
        assert!(stored <= now_millis());
    }

    #[test]
    fn set_becomes_the_baseline() {
        let gate = TimestampGate::new(Duration::from_millis(1_000));
        assert!(gate.check_at("k", 5_000));

        gate.set("k", 100);
        assert_eq!(gate.get("k"), Some(100));
        assert!(!gate.check_at("k", 1_099));
        assert!(gate.check_at("k", 1_100));

        gate.set("fresh", 7);
        assert_eq!(gate.get("fresh"), Some(7));
    }

    #[test]
    fn delete_resets_to_first_time() {
        let gate = TimestampGate::default();
        assert!(gate.check_at("k", 10));

        gate.delete("k");
        assert_eq!(gate.get("k"), None);
        assert!(gate.check_at("k", 11));

        // deleting a missing id is a no-op
        gate.delete("missing");
        assert_eq!(gate.size(), 1);
    }

    #[test]
    fn prune_removes_only_older_entries() {
        let gate = TimestampGate::default();
        gate.set("a", 100);
        gate.set("b", 600);
        gate.set("c", 500);

        assert_eq!(gate.prune_from(500), 1);
        assert_eq!(gate.get("a"), None);
        assert_eq!(gate.get("b"), Some(600));
        assert_eq!(gate.get("c"), Some(500));
        assert_eq!(gate.size(), 2);
    }

    #[test]
    fn prune_scenario() {
        let gate = TimestampGate::default();
        gate.set("a", 100);
        gate.set("b", 600);

        gate.prune_from(500);
        assert_eq!(gate.size(), 1);
        assert_eq!(gate.get("b"), Some(600));
    }

    #[test]
    fn clear_drops_everything() {
        let gate = TimestampGate::default();
        gate.set("a", 1);
        gate.set("b", 2);

        gate.clear();
        assert_eq!(gate.size(), 0);
        assert!(gate.check_at("a", 3));
    }

    #[test]
    fn shared_returns_the_same_instance() {
        let first = TimestampGate::shared();
        let second = TimestampGate::shared();
        assert!(std::ptr::eq(first, second));

        first.set("shared-instance-test", 123);
        assert_eq!(second.get("shared-instance-test"), Some(123));
        second.delete("shared-instance-test");
    }

    #[test]
    fn concurrent_checks_allow_exactly_one() {
        const THREADS: usize = 32;
        let gate = Arc::new(TimestampGate::default());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    gate.check_with_ttl("race", 1_000, Duration::from_secs(60))
                })
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|allowed| *allowed)
            .count();

        assert_eq!(allowed, 1);
        assert_eq!(gate.get("race"), Some(1_000));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_on_different_ids_are_independent() {
        let gate = Arc::new(TimestampGate::default());

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.check_at(&format!("id-{i}"), 0) })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(gate.size(), 64);
    }
}
