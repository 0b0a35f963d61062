//! Frame-throttled dispatch of the preload queue.

pub(crate) mod countdown;
mod dispatcher;

pub use countdown::{Countdown, SharedCountdown};
pub use dispatcher::{PreloadStats, Preloader};
