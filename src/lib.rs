//! Frame-throttled background image preloading.
//!
//! A manifest lists image names per category. The [`Preloader`] pops them one at a time from
//! the host frame loop, fetches each through a per-category primitive, and waits either a
//! configured number of ticks or, for a fetch still decoding, until its completion listener
//! fires. Decoded surfaces are committed lazily: the first composite that sources a surface
//! copies its pixels in, exactly once.
//!
//! - Load a [`Manifest`] (or let [`PreloadSession::open`] do it)
//! - Register the session or a [`Preloader`] as a [`FrameStep`]
//! - Composite through [`blt`] or the sprite types so deferred pixels are committed on use
#![forbid(unsafe_code)]

mod config;
mod fetch;
mod foundation;
mod manifest;
mod render;
mod schedule;
mod session;
mod surface;

pub use crate::config::{DEFAULT_MANIFEST_NAME, PreloadOpts};
pub use crate::fetch::{FetchFn, FetchRouter, ImageLoader, WaitSignal, bridge_completion};
pub use crate::foundation::core::PixelRect;
pub use crate::foundation::error::{PreloadError, PreloadResult};
pub use crate::manifest::{
    Category, Manifest, WorkItem, WorkQueue, load_work_queue, work_queue_from_value,
};
pub use crate::render::composite::{blt, blt_all};
pub use crate::render::sprite::{BitmapBinding, Sprite, TilingSprite};
pub use crate::schedule::{Countdown, PreloadStats, Preloader, SharedCountdown};
pub use crate::session::frame_loop::{FrameLoop, FrameStep};
pub use crate::session::preload_session::{DATA_DIR, PreloadSession};
pub use crate::surface::cache::{
    CacheStats, DecodeMode, FinishedDecode, SurfaceCache, resource_rel_path,
};
pub use crate::surface::decode::{decode_image, decode_image_file};
pub use crate::surface::{
    CompletionRegistration, LoadState, Readiness, Surface, SurfaceHandle, readiness,
};
