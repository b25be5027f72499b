use std::sync::Arc;
use std::time::Duration;

use crate::gate::TimestampGate;

// app's shared state
pub struct AppState {
    pub gate: Arc<TimestampGate>,
    pub started_at: i64, // ms since epoch, for uptime
    // Longest per-call ttl a check may ask for; set while pruning runs,
    // since older entries get dropped by the pruner
    pub max_ttl: Option<Duration>,
}

impl AppState {
    pub fn new(gate: Arc<TimestampGate>) -> Self {
        Self {
            gate,
            started_at: crate::misc::now_millis(),
            max_ttl: None,
        }
    }

    pub fn with_max_ttl(mut self, max_ttl: Duration) -> Self {
        self.max_ttl = Some(max_ttl);
        self
    }
}
