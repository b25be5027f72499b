use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram,
};

lazy_static! {
    pub static ref GATE_CHECKS_TOTAL: Counter =
        register_counter!("gate_checks_total", "Total number of gate checks").unwrap();
    pub static ref GATE_ALLOWED: Counter =
        register_counter!("gate_allowed_total", "Gate checks that were allowed").unwrap();
    pub static ref GATE_DENIED: Counter =
        register_counter!("gate_denied_total", "Gate checks that were denied").unwrap();
    pub static ref GATE_PRUNED: Counter =
        register_counter!("gate_pruned_total", "Entries removed by pruning").unwrap();
    pub static ref GATE_CHECK_LATENCY: Histogram = register_histogram!(
        "gate_check_latency_seconds",
        "Gate check latency in seconds"
    )
    .unwrap();
    pub static ref GATE_TRACKED: Gauge =
        register_gauge!("gate_tracked_ids", "Current number of ids tracked by the gate").unwrap();
}
