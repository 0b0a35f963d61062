//! Category routing and the sync/async completion bridge.

mod router;

pub use router::{FetchFn, FetchRouter, ImageLoader, WaitSignal, bridge_completion};
