#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod time;
pub mod timer;

pub use progress::Progress;
pub use time::Clock;
pub use timer::{Timer, TimerState};
