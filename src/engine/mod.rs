pub mod grid;
pub mod playback;
pub mod timer;

pub use playback::{PlaybackController, TickReport};
pub use timer::{ManualTimer, TimerHandle, TimerHost};
