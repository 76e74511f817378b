//! Input subsystem.
//!
//! Public API does not expose winit types; the window runtime translates
//! platform events into `InputEvent`s. Scope is what a fly/orbit camera needs:
//! held keys, pointer motion, mouse buttons and the wheel.

mod frame;
mod state;
mod types;

pub use frame::InputFrame;
pub use state::InputState;
pub use types::{
    InputEvent,
    Key,
    KeyState,
    Modifiers,
    MouseButton,
    MouseButtonState,
    MouseWheelDelta,
    PointerButtonEvent,
    PointerMoveEvent,
};
