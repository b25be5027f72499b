use serde::{Deserialize, Serialize};

// Optional overrides for a check; both default to the gate's own values
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct CheckParams {
    pub now: Option<i64>,
    pub ttl_ms: Option<u64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CheckResponse {
    pub id: String,
    pub allowed: bool,
    pub last_allowed: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EntryResponse {
    pub id: String,
    pub last_allowed: i64,
}

// Backfill body for PUT /gate/{id}
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SetRequest {
    pub timestamp: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PruneRequest {
    pub cutoff: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PruneResponse {
    pub removed: usize,
    pub size: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SizeResponse {
    pub size: usize,
}
