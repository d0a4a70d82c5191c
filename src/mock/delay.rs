//! Shutdown-aware response delay.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::lifecycle::ShutdownSignal;

/// Longest single sleep; bounds how late a shutdown can be noticed.
pub const DELAY_INCREMENT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("delay interrupted by shutdown")]
pub struct Interrupted;

/// Waits for `total`, in steps of at most [`DELAY_INCREMENT`].
///
/// Every step sleeps until an absolute instant derived from a single
/// deadline, so the steps never accumulate drift and the last one is
/// shortened to land exactly on the deadline. Returns [`Interrupted`] as soon
/// as shutdown is triggered.
pub async fn interruptible_delay(
    total: Duration,
    shutdown: &mut ShutdownSignal,
) -> Result<(), Interrupted> {
    if total.is_zero() {
        return Ok(());
    }

    let deadline = Instant::now() + total;

    loop {
        if shutdown.is_triggered() {
            return Err(Interrupted);
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }

        let step_end = (now + DELAY_INCREMENT).min(deadline);
        tokio::select! {
            _ = sleep_until(step_end) => {}
            _ = shutdown.recv() => return Err(Interrupted),
        }
    }
}
