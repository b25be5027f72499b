//! Small utilities: a keyed timestamp gate, an S3 object wrapper, a JSONL
//! codec and a handful of array / async helpers, plus the HTTP surface the
//! `toolbelt` binary uses to serve a gate.

pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod jsonl;
pub mod metrics;
pub mod misc;
pub mod models;
pub mod pruner;
pub mod s3;
pub mod state;

pub use error::{Error, Result};
pub use gate::TimestampGate;
pub use s3::{ObjectStorage, S3Config};
