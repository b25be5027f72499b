use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, info};

use crate::gate::{TimestampGate, ttl_millis};
use crate::metrics::{GATE_PRUNED, GATE_TRACKED};
use crate::misc::now_millis;

// Periodic prune - drops ids whose last allowed check is older than `max_age`.
// Entries that old can no longer deny a check made with a ttl <= max_age, so
// callers must not check with a longer ttl while this runs.
pub async fn pruner(gate: Arc<TimestampGate>, every: Duration, max_age: Duration) {
    let mut interval = interval(every);
    let max_age_ms = ttl_millis(max_age);

    info!(every = ?every, max_age = ?max_age, "Gate pruner started");

    loop {
        interval.tick().await;

        let cutoff = now_millis().saturating_sub(max_age_ms);
        let removed = gate.prune_from(cutoff);
        let size = gate.size();

        GATE_PRUNED.inc_by(removed as f64);
        GATE_TRACKED.set(size as f64);

        if removed > 0 {
            debug!(removed, size, cutoff, "Pruned stale gate entries");
        }
    }
}
