//! Compositing entry points. Every path that sources one surface into another goes through
//! [`composite::blt`], which commits deferred pixels first.

pub(crate) mod composite;
pub(crate) mod sprite;
