//! Timing constants and the shared bounded-poll helper.
//!
//! Every polling loop in the engine runs off one of these cadences, and every
//! bounded wait goes through [`poll_until`] so cancellation is structural: the
//! loop owns no timer that can outlive its future.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

/// Cadence while waiting for action targets to appear or become visible.
pub const TARGET_AVAILABILITY_POLL: Duration = Duration::from_millis(200);

/// Cadence for generic condition checks (`wait` predicates, `waitFor`
/// selectors).
pub const CONDITION_POLL: Duration = Duration::from_millis(50);

/// Cadence of the delegated-frame existence watcher.
pub const FRAME_EXISTENCE_WATCH: Duration = Duration::from_millis(1000);

/// Cadence of the file-download flag poll during before-unload handling.
pub const FILE_DOWNLOAD_POLL: Duration = Duration::from_millis(500);

/// Default outer timeout of the `waitFor` gesture.
pub const WAIT_FOR_DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Settle delay after triggering navigation. A heuristic, not a completion
/// signal.
pub const NAVIGATION_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Settle delay for animations before the first step runs.
pub const ANIMATIONS_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Interval/timeout pair driving one bounded poll.
#[derive(Clone, Copy, Debug)]
pub struct PollSchedule {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSchedule {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// The 200 ms availability cadence with a caller-supplied outer timeout.
    pub fn target_availability(timeout: Duration) -> Self {
        Self::new(TARGET_AVAILABILITY_POLL, timeout)
    }

    /// The 50 ms condition cadence with a caller-supplied outer timeout.
    pub fn condition(timeout: Duration) -> Self {
        Self::new(CONDITION_POLL, timeout)
    }
}

/// Runs `check` immediately, then on the schedule's interval, until it yields
/// a value or the timeout elapses. Returns `None` on timeout. The final
/// interval is clamped so the deadline is never overshot by a full tick.
pub async fn poll_until<T, F, Fut>(schedule: PollSchedule, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = Instant::now() + schedule.timeout;
    loop {
        if let Some(found) = check().await {
            return Some(found);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(schedule.interval.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn immediate_hit_returns_without_sleeping() {
        let before = Instant::now();
        let found = poll_until(
            PollSchedule::target_availability(Duration::from_secs(5)),
            || async { Some(42u32) },
        )
        .await;
        assert_eq!(found, Some(42));
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_the_interval_until_the_value_appears() {
        let calls = AtomicU32::new(0);
        let found = poll_until(
            PollSchedule::target_availability(Duration::from_secs(5)),
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) >= 3 {
                    Some("here")
                } else {
                    None
                }
            },
        )
        .await;
        assert_eq!(found, Some("here"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_at_the_deadline() {
        let calls = AtomicU32::new(0);
        let before = Instant::now();
        let found: Option<()> = poll_until(
            PollSchedule::new(Duration::from_millis(200), Duration::from_millis(500)),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            },
        )
        .await;
        assert_eq!(found, None);
        // 0 ms, 200 ms, 400 ms, clamped 500 ms check.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(Instant::now() - before, Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_still_tries_once() {
        let calls = AtomicU32::new(0);
        let found: Option<()> = poll_until(
            PollSchedule::condition(Duration::ZERO),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                None
            },
        )
        .await;
        assert_eq!(found, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
