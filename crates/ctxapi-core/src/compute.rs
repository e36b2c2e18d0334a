//! Synthetic compute and latency endpoints.

use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// Largest index whose Fibonacci term fits in a `u128`.
pub const MAX_FIB_INDEX: u64 = 186;

/// Validation message for a bad Fibonacci index.
pub const FIB_INVALID: &str = "Bad request: number must be a non-negative integer";

/// Validation message for a bad delay.
pub const SLEEP_INVALID: &str = "Bad request: seconds must be a non-negative integer";

/// Parses a path segment as a non-negative integer.
///
/// Only ASCII digits are accepted: signs, whitespace, fractions and values
/// beyond `u64::MAX` all fail with `message`.
pub fn parse_non_negative(raw: &str, message: &str) -> ApiResult<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation(message));
    }
    raw.parse().map_err(|_| ApiError::validation(message))
}

/// Returns the `n`-th Fibonacci term (`fib(0) = 0`, `fib(1) = 1`).
///
/// Iterative, O(n) time and O(1) space. Indices above [`MAX_FIB_INDEX`]
/// are rejected rather than overflowing.
pub fn fibonacci(n: u64) -> ApiResult<u128> {
    if n > MAX_FIB_INDEX {
        return Err(ApiError::validation(format!(
            "Bad request: number must not exceed {MAX_FIB_INDEX}"
        )));
    }

    let (mut a, mut b) = (0u128, 1u128);
    for _ in 0..n {
        // b overflows on the final step for n == MAX_FIB_INDEX, and is unused
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    Ok(a)
}

/// Suspends for `seconds` and returns the confirmation text.
///
/// The timer lives inside the returned future. Dropping the future (for
/// example when the client disconnects) cancels it.
pub async fn delay(seconds: u64) -> String {
    DelayTimer::new(seconds).wait().await
}

struct DelayTimer {
    seconds: u64,
    completed: bool,
}

impl DelayTimer {
    fn new(seconds: u64) -> Self {
        Self {
            seconds,
            completed: false,
        }
    }

    async fn wait(mut self) -> String {
        if self.seconds > 0 {
            tokio::time::sleep(Duration::from_secs(self.seconds)).await;
        }
        self.completed = true;
        format!("Delayed by {} seconds", self.seconds)
    }
}

impl Drop for DelayTimer {
    fn drop(&mut self) {
        if !self.completed {
            tracing::debug!(seconds = self.seconds, "Delay cancelled before completion");
        }
    }
}
