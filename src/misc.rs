// Small array / async helpers
use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;

pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Outcomes of a batch of fallible operations, split by result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<T, E> {
    pub settled: Vec<T>,
    pub rejected: Vec<E>,
    pub total: usize,
}

// Current wall-clock time in ms since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub async fn sleep(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Split `source` into consecutive chunks of `chunk_size` items.
///
/// The last chunk holds whatever is left and may be shorter. A
/// `chunk_size` of 0 is treated as 1.
pub fn chunk_array<T: Clone>(source: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    source
        .chunks(chunk_size.max(1))
        .map(<[T]>::to_vec)
        .collect()
}

/// Partition results into fulfilled and rejected values, keeping order.
pub fn settled_separator<T, E>(results: Vec<Result<T, E>>) -> Settled<T, E> {
    let total = results.len();
    let mut settled = Vec::new();
    let mut rejected = Vec::new();

    for result in results {
        match result {
            Ok(value) => settled.push(value),
            Err(err) => rejected.push(err),
        }
    }

    Settled {
        settled,
        rejected,
        total,
    }
}

/// Drive every future to completion concurrently, then partition the results.
///
/// Unlike `try_join_all`, a failure doesn't cancel the remaining futures.
pub async fn settle_all<I, F, T, E>(futures: I) -> Settled<T, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    settled_separator(join_all(futures).await)
}

/// Render a millisecond duration in the largest unit that fits.
///
/// `"850 ms"`, `"1.50 s"`, `"2.25 min"`, `"1.00 h"`, `"3.50 d"`.
pub fn format_duration(ms: i64) -> String {
    let sign = if ms < 0 { "-" } else { "" };
    let abs = ms.unsigned_abs();

    if abs < 1_000 {
        return format!("{sign}{abs} ms");
    }

    let secs = abs as f64 / 1_000.0;
    let (value, unit) = if secs < 60.0 {
        (secs, "s")
    } else if secs < 3_600.0 {
        (secs / 60.0, "min")
    } else if secs < 86_400.0 {
        (secs / 3_600.0, "h")
    } else {
        (secs / 86_400.0, "d")
    };

    format!("{sign}{value:.2} {unit}")
}

/// [`format_duration`] for a `Duration`; lengths past `i64::MAX` ms saturate.
pub fn format_std_duration(duration: Duration) -> String {
    format_duration(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}

/// Human-readable time elapsed between `past_ms` and `now_ms`.
pub fn elapsed_between(past_ms: i64, now_ms: i64) -> String {
    format_duration(now_ms.saturating_sub(past_ms))
}

/// Human-readable time elapsed since `past_ms`.
pub fn elapsed_since(past_ms: i64) -> String {
    elapsed_between(past_ms, now_millis())
}
