//! Normalized input and lifecycle events.
//!
//! Backends translate device/protocol callbacks (libinput motion, xdg
//! surface map, etc.) into [`Event`] values and push them onto the
//! [`EventQueue`](crate::queue::EventQueue). Kind and payload are bound
//! atomically by the enum, so a handler can never read the wrong
//! payload for an event.

use crate::input::Modifiers;
use crate::state::ResizeEdges;
use crate::window::{SurfaceId, WindowId};

/// Handle to a keyboard device, allocated by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyboardId(pub u64);

/// Handle to an output (monitor), allocated by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub u64);

/// Pointer button state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Key state as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Scroll axis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrientation {
    Vertical,
    Horizontal,
}

/// What produced a scroll event. Forwarded verbatim to clients, which
/// use it to pick kinetic-scrolling behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    Wheel,
    Finger,
    Continuous,
    WheelTilt,
}

/// A timestamped, normalized notification.
///
/// `time_msec` is monotonic only within one producer stream; the queue
/// preserves push order and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub time_msec: u32,
    pub kind: EventKind,
}

impl Event {
    pub const fn new(time_msec: u32, kind: EventKind) -> Self {
        Self { time_msec, kind }
    }
}

/// Every notification the dispatcher knows how to handle.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Relative pointer motion in layout pixels.
    CursorMotion { delta_x: f64, delta_y: f64 },

    /// Absolute pointer motion, coordinates normalized to `0.0..=1.0`
    /// of the output layout (tablets, the winit backend).
    CursorMotionAbsolute { x: f64, y: f64 },

    /// Pointer button press/release. `button` uses Linux event codes.
    CursorButton { button: u32, state: ButtonState },

    /// Scroll wheel / touchpad scroll.
    CursorAxis {
        orientation: AxisOrientation,
        source: AxisSource,
        delta: f64,
        delta_discrete: i32,
    },

    /// Groups the preceding pointer events into one logical frame.
    CursorFrame,

    /// An output is ready for the next repaint.
    OutputReady { output: OutputId },

    /// Modifier state changed on a keyboard.
    KeyModifiersChanged {
        keyboard: KeyboardId,
        modifiers: Modifiers,
    },

    /// Raw key press/release. `keycode` is the untranslated device
    /// keycode; keysym resolution happens at dispatch time.
    Key {
        keyboard: KeyboardId,
        state: KeyState,
        keycode: u32,
    },

    /// A client asked for an interactive move of its window.
    RequestInteractiveMove { window: WindowId },

    /// A client asked for an interactive resize along `edges`.
    RequestInteractiveResize {
        window: WindowId,
        edges: ResizeEdges,
    },

    /// The protocol layer created a toplevel (not yet shown).
    WindowCreated { window: WindowId, surface: SurfaceId },

    /// The window is ready to be shown on screen.
    WindowMapped { window: WindowId },

    /// The window should no longer be shown. It stays in the registry
    /// until destroyed.
    WindowUnmapped { window: WindowId },

    /// The toplevel is gone; every reference to it must be dropped.
    WindowDestroyed { window: WindowId },
}
