//! Time subsystem.
//!
//! One `FrameClock` per render loop; `tick()` once per presented frame.
//! `FrameTime::elapsed` is the absolute scene time fed to the compute
//! kernel's time uniform.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
