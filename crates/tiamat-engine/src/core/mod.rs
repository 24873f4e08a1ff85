//! Core engine-facing contracts.
//!
//! Defines the stable interface between the runtime (platform loop) and the
//! application: one `on_frame` per rendered frame, window events as they
//! arrive. The per-frame begin/end sequence the dispatch controller depends
//! on hangs off this contract.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
