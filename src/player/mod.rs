//! Playhead sources and the loop that follows lyrics along them

pub mod clock;
pub mod follow;

pub use clock::PlaybackClock;
pub use follow::follow;
