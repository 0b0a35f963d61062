//! Host-facing wiring: the per-frame step registry and the preload session.

pub(crate) mod frame_loop;
pub(crate) mod preload_session;
