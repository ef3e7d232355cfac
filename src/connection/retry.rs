//! Retry/backoff classification (§4.5). Timeouts and connection-class sqlx
//! errors (`sqlx::Error::Io`/`PoolTimedOut`/`PoolClosed`) are retried with
//! exponential backoff up to `config::RetryPolicy`'s attempt cap; any other
//! sqlx error (constraint violation, syntax error, permission denied)
//! propagates on the first attempt since retrying it can't change the
//! outcome.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryPolicy;

/// Base of the backoff sleep's own exponential growth. Distinct from
/// `RetryPolicy::backoff_growth`, which §4.5 reserves for growing the
/// per-call timeout 1.5× on every retried attempt.
const BACKOFF_BASE_FACTOR: f64 = 2.0;

pub fn is_retryable(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::WorkerCrashed
    )
}

/// §4.5's "grow next timeout by 1.5×": the per-call timeout for the next
/// attempt after a retried failure.
pub fn grown_timeout(policy: &RetryPolicy, timeout: Duration) -> Duration {
    Duration::from_secs_f64(timeout.as_secs_f64() * policy.backoff_growth)
}

/// Attempt's sleep duration before attempt `attempt` (1-indexed): exponential
/// in the attempt number plus a randomized jitter term, capped at
/// `max_tunnel_delay` per §4.5's "max delay capped at 30s on tunnels".
pub fn backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    let base = Duration::from_millis(200);
    let factor = BACKOFF_BASE_FACTOR.powi(attempt.saturating_sub(1) as i32);
    let millis = (base.as_millis() as f64 * factor) as u64;
    let jittered = millis + jitter_millis(millis);
    Duration::from_millis(jittered).min(policy.max_tunnel_delay)
}

/// Up to 25% of `millis` added on top, so retries from concurrent callers
/// don't all wake up on the same tick.
fn jitter_millis(millis: u64) -> u64 {
    if millis == 0 {
        return 0;
    }
    let fraction: f64 = rand::thread_rng().gen_range(0.0..=0.25);
    (millis as f64 * fraction) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_but_is_capped() {
        let policy = RetryPolicy::default();
        let first = backoff_delay(&policy, 1);
        let third = backoff_delay(&policy, 3);
        assert!(third > first);
        assert!(third <= policy.max_tunnel_delay);
    }

    #[test]
    fn timeout_grows_by_configured_factor() {
        let policy = RetryPolicy::default();
        let start = Duration::from_secs(10);
        let grown = grown_timeout(&policy, start);
        assert_eq!(grown, Duration::from_secs_f64(15.0));
        assert_eq!(grown_timeout(&policy, grown), Duration::from_secs_f64(22.5));
    }

    #[test]
    fn non_connection_errors_are_not_retryable() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_retryable(&err));
    }
}
