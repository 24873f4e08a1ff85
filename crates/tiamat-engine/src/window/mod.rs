//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and wires them to the
//! GPU layer. One renderer, one camera, one window.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
