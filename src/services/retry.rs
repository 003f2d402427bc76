//! Bounded retry for upstream calls.

use std::future::Future;

use tracing::debug;

/// Last outcome of a retried operation and how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempts<T> {
    pub outcome: T,
    pub attempts: u32,
}

/// Run `op` until `is_success` accepts its outcome or `max_attempts` is
/// reached. `max_attempts` below 1 is treated as 1.
pub async fn retry_bounded<T, F, Fut>(
    max_attempts: u32,
    mut op: F,
    is_success: impl Fn(&T) -> bool,
) -> Attempts<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = T>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = op(attempt).await;
        if is_success(&outcome) || attempt >= max_attempts {
            return Attempts {
                outcome,
                attempts: attempt,
            };
        }
        debug!(attempt, max_attempts, "Attempt failed, retrying");
        attempt += 1;
    }
}
