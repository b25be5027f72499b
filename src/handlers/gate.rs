use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::metrics::{
    GATE_ALLOWED, GATE_CHECK_LATENCY, GATE_CHECKS_TOTAL, GATE_DENIED, GATE_PRUNED, GATE_TRACKED,
};
use crate::misc::now_millis;
use crate::models::{
    CheckParams, CheckResponse, EntryResponse, PruneRequest, PruneResponse, SetRequest,
    SizeResponse,
};
use crate::state::AppState;

// POST /gate/{id}/check?now=..&ttl_ms=..
pub async fn check_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<CheckParams>,
) -> Result<Json<CheckResponse>, StatusCode> {
    GATE_CHECKS_TOTAL.inc();
    let start_time = Instant::now();

    let now = params.now.unwrap_or_else(now_millis);
    let ttl = params
        .ttl_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| state.gate.default_ttl());

    // the pruner would forget this entry before its window closes
    if state.max_ttl.is_some_and(|max_ttl| ttl > max_ttl) {
        warn!(id = %id, ttl = ?ttl, max_ttl = ?state.max_ttl, "ttl longer than prune max age");
        return Err(StatusCode::BAD_REQUEST);
    }

    let (allowed, last_allowed) = state.gate.check_recorded(&id, now, ttl);

    GATE_CHECK_LATENCY.observe(start_time.elapsed().as_secs_f64());
    if allowed {
        GATE_ALLOWED.inc();
    } else {
        GATE_DENIED.inc();
    }
    GATE_TRACKED.set(state.gate.size() as f64);
    debug!(id = %id, now, allowed, "gate check");

    Ok(Json(CheckResponse {
        id,
        allowed,
        last_allowed: Some(last_allowed),
    }))
}

pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EntryResponse>, StatusCode> {
    let last_allowed = state.gate.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(EntryResponse { id, last_allowed }))
}

// Backfill: overwrites whatever is stored, no ttl check
pub async fn set_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<SetRequest>,
) -> Json<EntryResponse> {
    state.gate.set(&id, payload.timestamp);
    GATE_TRACKED.set(state.gate.size() as f64);
    info!(id = %id, timestamp = payload.timestamp, "gate entry set manually");

    Json(EntryResponse {
        id,
        last_allowed: payload.timestamp,
    })
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    state.gate.delete(&id);
    GATE_TRACKED.set(state.gate.size() as f64);
    StatusCode::NO_CONTENT
}

pub async fn size_handler(State(state): State<Arc<AppState>>) -> Json<SizeResponse> {
    Json(SizeResponse {
        size: state.gate.size(),
    })
}

pub async fn clear_handler(State(state): State<Arc<AppState>>) -> StatusCode {
    state.gate.clear();
    GATE_TRACKED.set(0.0);
    info!("gate cleared");
    StatusCode::NO_CONTENT
}

pub async fn prune_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PruneRequest>,
) -> Json<PruneResponse> {
    let removed = state.gate.prune_from(payload.cutoff);
    let size = state.gate.size();

    GATE_PRUNED.inc_by(removed as f64);
    GATE_TRACKED.set(size as f64);
    info!(cutoff = payload.cutoff, removed, size, "gate pruned");

    Json(PruneResponse { removed, size })
}
