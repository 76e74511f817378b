//! Frame timing.
//!
//! One `FrameClock` per window; `tick()` once per presented frame yields the
//! `FrameTime` handed to per-frame updates (instance animation uses `dt`).

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
