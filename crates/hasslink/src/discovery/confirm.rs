use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::hub::HttpClient;
use crate::hub::HubApi;

/// Timing of the wait for a published entity to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Delay before the first lookup, giving the hub-side decoder time to run.
    pub settle: Duration,
    /// Delay between lookups.
    pub interval: Duration,
    /// How long to keep polling, measured from the end of `settle`.
    pub timeout: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(3),
            interval: Duration::from_millis(500),
            timeout: Duration::from_secs(10),
        }
    }
}

impl PollSchedule {
    /// Longest time [`wait_for_entity`] can take. Neither a lookup in flight nor
    /// the gap before the next one runs past the deadline.
    pub fn max_wait(&self) -> Duration {
        self.settle + self.timeout
    }
}

/// Wait until `entity_id` exists on the hub.
///
/// Sleeps for `settle`, then looks the entity up immediately and every
/// `interval` until it is found or `timeout` has passed since settling. A
/// lookup still running at the deadline is abandoned. Returns the number of
/// lookups made on success, `None` on timeout.
///
/// The future holds no resources besides the borrowed hub, so dropping it (for
/// example from `tokio::select!`) cancels the wait at any point.
pub async fn wait_for_entity<C: HttpClient>(
    hub: &HubApi<C>,
    entity_id: &str,
    schedule: &PollSchedule,
) -> Option<u32> {
    tokio::time::sleep(schedule.settle).await;

    let deadline = Instant::now() + schedule.timeout;
    let mut polls = 0;

    while Instant::now() < deadline {
        polls += 1;
        match tokio::time::timeout_at(deadline, hub.entity_exists(entity_id)).await {
            Ok(true) => {
                debug!("{} found after {} lookups", entity_id, polls);
                return Some(polls);
            }
            Ok(false) => {}
            Err(_) => break,
        }
        tokio::time::sleep_until((Instant::now() + schedule.interval).min(deadline)).await;
    }

    debug!("{} still missing after {} lookups", entity_id, polls);
    None
}
