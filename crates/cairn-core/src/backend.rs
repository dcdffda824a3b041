//! Boundary traits between the core and the display/protocol layer.
//!
//! The core never talks to a display server directly. Everything it
//! needs from the outside world, querying pointer focus, notifying
//! clients, asking a surface to resize, is expressed here and
//! implemented by a backend crate. Handlers call these synchronously
//! mid-dispatch, so the seam is a set of traits rather than a deferred
//! action list.

use thiserror::Error;

use crate::event::{AxisOrientation, AxisSource, ButtonState, KeyState, KeyboardId, OutputId};
use crate::input::{Keysym, Modifiers};
use crate::state::Geometry;
use crate::window::{SurfaceId, Window, WindowId};

/// Why servicing the protocol connection stopped working.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection to the session is gone (display closed, script
    /// exhausted on the headless backend).
    #[error("display connection closed")]
    Disconnected,

    /// The transport failed while processing pending activity.
    #[error("display dispatch failed: {0}")]
    Dispatch(String),
}

/// The cursor device. Implementations own output-layout clamping.
pub trait Pointer {
    /// Current cursor position in layout coordinates.
    fn position(&self) -> (f64, f64);

    /// Applies relative motion, clamped to the output layout.
    fn move_relative(&mut self, delta_x: f64, delta_y: f64);

    /// Warps to normalized `0.0..=1.0` layout coordinates.
    fn warp_normalized(&mut self, x: f64, y: f64);

    /// Shows the default pointer glyph (used when nothing is under
    /// the cursor).
    fn set_default_image(&mut self);
}

/// The shared seat: pointer/keyboard focus bookkeeping and client
/// notification. One keyboard is active at a time; [`set_keyboard`]
/// switches which one, transparently to clients.
///
/// [`set_keyboard`]: Seat::set_keyboard
pub trait Seat {
    fn pointer_focused_surface(&self) -> Option<SurfaceId>;
    fn keyboard_focused_surface(&self) -> Option<SurfaceId>;

    /// Gives `surface` pointer focus and tells the client the cursor
    /// entered at surface-local coordinates.
    fn pointer_enter(&mut self, surface: SurfaceId, sx: f64, sy: f64);
    fn pointer_motion(&mut self, time_msec: u32, sx: f64, sy: f64);
    fn pointer_button(&mut self, time_msec: u32, button: u32, state: ButtonState);
    fn pointer_axis(
        &mut self,
        time_msec: u32,
        orientation: AxisOrientation,
        delta: f64,
        delta_discrete: i32,
        source: AxisSource,
    );
    fn pointer_frame(&mut self);

    /// Drops pointer focus so stale clients stop receiving button and
    /// axis events.
    fn pointer_clear_focus(&mut self);

    fn set_keyboard(&mut self, keyboard: KeyboardId);
    fn keyboard_modifiers(&mut self, modifiers: Modifiers);
    fn keyboard_key(&mut self, time_msec: u32, keycode: u32, state: KeyState);

    /// Gives `surface` keyboard focus. The implementation supplies the
    /// currently pressed keys and modifier state with the enter.
    fn keyboard_enter(&mut self, surface: SurfaceId);

    /// Resolves a raw device keycode through the keyboard's keymap.
    /// Keycode translation conventions (the evdev offset) live in the
    /// implementation. Codes the keymap does not know resolve to
    /// [`Keysym::Unknown`], which never matches a binding.
    fn keysyms(&self, keyboard: KeyboardId, keycode: u32) -> Vec<Keysym>;

    /// Current modifier mask on the keyboard.
    fn modifiers(&self, keyboard: KeyboardId) -> Modifiers;
}

/// A hit-test result: the concrete surface under the point and the
/// point in that surface's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub surface: SurfaceId,
    pub sx: f64,
    pub sy: f64,
}

/// Window-protocol operations on client surfaces.
pub trait Surfaces {
    /// The geometry box: the visible extent of the surface and its
    /// offset within the surface coordinate space.
    fn geometry(&self, surface: SurfaceId) -> Geometry;

    /// Asks the client to resize. Advisory; the client commits a new
    /// buffer later and nothing here waits for it.
    fn request_size(&mut self, surface: SurfaceId, width: u32, height: u32);

    /// Finds the surface (the toplevel itself or a nested popup) at
    /// coordinates local to `surface`'s origin.
    fn surface_at(&self, surface: SurfaceId, sx: f64, sy: f64) -> Option<SurfaceHit>;

    /// Tells the client it gained or lost activation.
    fn set_activated(&mut self, surface: SurfaceId, activated: bool);
}

/// Paints an output. Invoked once per `OutputReady` event.
pub trait Renderer {
    /// `windows` is the mapped part of the stack in paint order,
    /// back first, front of stack last.
    fn render(&mut self, output: OutputId, windows: &[&Window]);
}

/// Connection servicing, the blocking half of [`EventQueue::pop`].
///
/// [`EventQueue::pop`]: crate::queue::EventQueue::pop
pub trait Transport {
    /// Flushes buffered outbound client I/O.
    fn flush_clients(&mut self);

    /// Blocks until the connection sees activity and processes it.
    /// Producer callbacks run inside this call.
    fn dispatch(&mut self) -> Result<(), TransportError>;

    /// Begins session teardown; subsequent [`dispatch`](Self::dispatch)
    /// calls fail.
    fn shutdown(&mut self);
}

/// Process-level effects requested by keybindings.
pub trait Session {
    /// Launches a detached child for a `spawn` binding.
    fn spawn(&mut self, command_line: &str);
}

/// Everything the dispatcher needs from one backend value.
pub trait Backend: Pointer + Seat + Surfaces + Renderer + Transport + Session {}

impl<T: Pointer + Seat + Surfaces + Renderer + Transport + Session> Backend for T {}
