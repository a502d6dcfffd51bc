use std::future;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Period of the elapsed-time tick.
pub const TIMER_TICK: Duration = Duration::from_secs(1);
/// Period of the background autosave.
pub const AUTOSAVE_PERIOD: Duration = Duration::from_secs(5);

/// A periodic callback that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    TimerTick,
    Autosave,
}

/// The two periodic ticks that run while a test is active.
///
/// Both intervals are created and dropped together, so stopping the schedule
/// cancels the timer tick and the autosave at once.
#[derive(Debug, Default)]
pub struct Schedule {
    running: Option<Running>,
}

#[derive(Debug)]
struct Running {
    timer: Interval,
    autosave: Interval,
}

impl Schedule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start both ticks. The first of each fires one period from now.
    pub fn start(&mut self) {
        let now = Instant::now();
        let mut timer = interval_at(now + TIMER_TICK, TIMER_TICK);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut autosave = interval_at(now + AUTOSAVE_PERIOD, AUTOSAVE_PERIOD);
        autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.running = Some(Running { timer, autosave });
    }

    pub fn stop(&mut self) {
        self.running = None;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Wait for the next due tick. Never resolves while stopped.
    ///
    /// When both are due, the timer tick comes first so the autosave sees the
    /// latest elapsed time.
    pub async fn next(&mut self) -> ScheduledEvent {
        let Some(running) = self.running.as_mut() else {
            return future::pending().await;
        };
        tokio::select! {
            biased;
            _ = running.timer.tick() => ScheduledEvent::TimerTick,
            _ = running.autosave.tick() => ScheduledEvent::Autosave,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn emits_five_ticks_per_autosave() {
        let mut schedule = Schedule::new();
        schedule.start();

        let mut events = Vec::new();
        for _ in 0..6 {
            events.push(schedule.next().await);
        }

        assert_eq!(
            events,
            vec![
                ScheduledEvent::TimerTick,
                ScheduledEvent::TimerTick,
                ScheduledEvent::TimerTick,
                ScheduledEvent::TimerTick,
                ScheduledEvent::TimerTick,
                ScheduledEvent::Autosave,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_schedule_never_fires() {
        let mut schedule = Schedule::new();
        schedule.start();
        schedule.stop();

        let fired = tokio::time::timeout(Duration::from_secs(60), schedule.next()).await;
        assert!(fired.is_err());
        assert!(!schedule.is_running());
    }
}
