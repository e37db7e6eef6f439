//! Async driver for [`BreathingCycleController`].
//!
//! Feeds the controller wall-clock deltas from a tokio interval on the
//! current task. The controller itself stays synchronous; this is the only
//! place that touches a timer.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{Instant, MissedTickBehavior};

use super::controller::BreathingCycleController;
use crate::error::{CoreError, Result};
use crate::events::CycleEvent;

/// How a driven session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub elapsed_ms: u64,
    /// True when the countdown ran out, false when `stop` resolved first.
    pub completed: bool,
}

/// Start `controller` and drive it until the session completes or `stop`
/// resolves.
///
/// `poll_every` only controls how often time is sampled; events are always
/// reported at their exact timeline position. Once `stop` wins, the
/// `Stopped` event is the last thing passed to `on_event`.
///
/// # Errors
/// [`CoreError::AlreadyRunning`] if `controller` has a session in progress;
/// it is left untouched and no event is emitted.
pub async fn run_session<S, F>(
    controller: &mut BreathingCycleController,
    poll_every: Duration,
    stop: S,
    mut on_event: F,
) -> Result<SessionOutcome>
where
    S: Future<Output = ()>,
    F: FnMut(&CycleEvent),
{
    if controller.is_running() {
        return Err(CoreError::AlreadyRunning);
    }
    if let Some(event) = controller.start()? {
        on_event(&event);
    }

    let mut interval = tokio::time::interval(poll_every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock = DeltaClock::new();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                if let Some(outcome) = dispatch(controller.advance(clock.take()), &mut on_event) {
                    return Ok(outcome);
                }
                let elapsed_ms = match controller.stop() {
                    Some(event) => {
                        on_event(&event);
                        event.elapsed_ms()
                    }
                    None => 0,
                };
                return Ok(SessionOutcome { elapsed_ms, completed: false });
            }
            _ = interval.tick() => {
                if let Some(outcome) = dispatch(controller.advance(clock.take()), &mut on_event) {
                    return Ok(outcome);
                }
            }
        }
    }
}

fn dispatch<F: FnMut(&CycleEvent)>(events: Vec<CycleEvent>, on_event: &mut F) -> Option<SessionOutcome> {
    for event in &events {
        on_event(event);
        if let CycleEvent::Completed { elapsed_ms } = *event {
            return Some(SessionOutcome {
                elapsed_ms,
                completed: true,
            });
        }
    }
    None
}

/// Hands out whole milliseconds since the previous call, carrying the
/// sub-millisecond remainder forward so no time is lost to truncation.
struct DeltaClock {
    last: Instant,
}

impl DeltaClock {
    fn new() -> Self {
        Self { last: Instant::now() }
    }

    fn take(&mut self) -> u64 {
        let whole_ms = Instant::now().saturating_duration_since(self.last).as_millis() as u64;
        self.last += Duration::from_millis(whole_ms);
        whole_ms
    }
}
