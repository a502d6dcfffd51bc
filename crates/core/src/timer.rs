use crate::time::format_hms;

/// Whether the elapsed-time counter is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
}

/// Elapsed-seconds counter for the active test.
///
/// The counter only moves through `tick`, which the caller drives once per
/// second. A tick that arrives after `stop` is dropped.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    state: TimerState,
    elapsed: u64,
}

impl Timer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from zero.
    pub fn start(&mut self) {
        self.resume_from(0);
    }

    /// Start counting from a carried-over value (resuming a saved test).
    pub fn resume_from(&mut self, elapsed: u64) {
        self.elapsed = elapsed;
        self.state = TimerState::Running;
    }

    /// Stop counting and return the final elapsed seconds.
    pub fn stop(&mut self) -> u64 {
        self.state = TimerState::Stopped;
        self.elapsed
    }

    /// Stop and zero the counter.
    pub fn reset(&mut self) {
        self.state = TimerState::Stopped;
        self.elapsed = 0;
    }

    /// Advance one second. Returns the new value, or `None` while stopped.
    pub fn tick(&mut self) -> Option<u64> {
        if self.state != TimerState::Running {
            return None;
        }
        self.elapsed = self.elapsed.saturating_add(1);
        Some(self.elapsed)
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[must_use]
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// `HH:MM:SS` rendering of the elapsed time.
    #[must_use]
    pub fn display(&self) -> String {
        format_hms(self.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_only_while_running() {
        let mut timer = Timer::new();
        assert_eq!(timer.tick(), None);

        timer.start();
        assert_eq!(timer.tick(), Some(1));
        assert_eq!(timer.tick(), Some(2));

        assert_eq!(timer.stop(), 2);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.elapsed(), 2);
    }

    #[test]
    fn start_resets_elapsed() {
        let mut timer = Timer::new();
        timer.resume_from(90);
        timer.tick();
        timer.stop();
        timer.start();
        assert_eq!(timer.elapsed(), 0);
        assert!(timer.is_running());
    }

    #[test]
    fn resume_carries_value() {
        let mut timer = Timer::new();
        timer.resume_from(3_599);
        timer.tick();
        assert_eq!(timer.display(), "01:00:00");
    }

    #[test]
    fn reset_zeroes_and_stops() {
        let mut timer = Timer::new();
        timer.start();
        timer.tick();
        timer.reset();
        assert_eq!(timer.state(), TimerState::Stopped);
        assert_eq!(timer.elapsed(), 0);
    }
}
