//! Lithos engine crate.
//!
//! Platform + GPU runtime pieces (window loop, device, input, timing) and the
//! renderers built on them, most notably the instanced mesh renderer in
//! [`render::instancing`].

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
