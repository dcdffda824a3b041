//! Cairn Core — display-agnostic window manager engine
//!
//! This crate contains the interaction logic of the window manager:
//! the event queue, the dispatch loop, stacking order, keyboard focus,
//! interactive move/resize grabs, and keybinding routing. It never
//! talks to a display server.
//!
//! Backends implement the traits in [`backend`], translate their
//! device/protocol callbacks into [`Event`]s, and push them onto the
//! shared [`EventQueue`]. The [`Dispatcher`] pops events one at a time
//! and calls back into the backend to notify clients, reposition the
//! cursor, or repaint an output.
//!
//! # Quick Start
//! ```
//! use std::sync::Arc;
//!
//! use cairn_backend_headless::HeadlessBackend;
//! use cairn_core::input::Keybindings;
//! use cairn_core::state::Geometry;
//! use cairn_core::{Dispatcher, EventQueue};
//!
//! let queue = Arc::new(EventQueue::new());
//! let mut backend = HeadlessBackend::new(Arc::clone(&queue));
//!
//! // The protocol layer announces a toplevel and maps it.
//! let (window, _surface) = backend.new_toplevel(Geometry::new(0, 0, 800, 600));
//! backend.map_toplevel(window);
//!
//! let mut wm = Dispatcher::new(Arc::clone(&queue), backend, Keybindings::new());
//! while let Some(event) = queue.try_pop() {
//!     wm.handle_event(event);
//! }
//! assert_eq!(wm.focused_window(), Some(window));
//! ```

pub mod backend;
pub mod event;
pub mod input;
pub mod invariants;
pub mod queue;
pub mod state;
pub mod window;

// Re-export primary API types at crate root
pub use backend::{Backend, TransportError};
pub use event::{Event, EventKind};
pub use input::Command;
pub use queue::EventQueue;
pub use state::{CursorMode, Geometry};
pub use window::{SurfaceId, WindowId};

use std::sync::Arc;

use tracing::{debug, info};

use backend::{Pointer, Renderer, Seat, Session, Surfaces, Transport};
use event::{ButtonState, KeyState, KeyboardId, OutputId};
use input::{Keybindings, Keysym, Modifiers};
use invariants::InvariantError;
use state::{FocusState, GrabOperation, InteractionState, ResizeEdges};
use window::{Window, WindowRegistry};

/// The dispatch engine: one of these owns the whole session.
///
/// Pops events from the [`EventQueue`], mutates its own state (window
/// registry, grab, focus), and drives the backend. Strictly
/// single-consumer: handlers run to completion in pop order, so no
/// event ever observes another handler mid-flight.
pub struct Dispatcher<B: Backend> {
    queue: Arc<EventQueue>,
    /// The display/protocol adapter.
    pub backend: B,
    /// Managed windows in stacking order.
    pub registry: WindowRegistry,
    interaction: InteractionState,
    focus: FocusState,
    bindings: Keybindings,
    running: bool,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(queue: Arc<EventQueue>, backend: B, bindings: Keybindings) -> Self {
        Self {
            queue,
            backend,
            registry: WindowRegistry::new(),
            interaction: InteractionState::new(),
            focus: FocusState::default(),
            bindings,
            running: true,
        }
    }

    // ── Dispatch loop ────────────────────────────────────────────────

    /// Runs the dispatch loop until a quit command or transport death.
    ///
    /// Blocking happens inside [`EventQueue::pop`], which services the
    /// transport while the queue is empty. A [`TransportError`] is the
    /// only abnormal exit; `Ok(())` means a binding asked to quit.
    pub fn run(&mut self) -> Result<(), TransportError> {
        info!("entering dispatch loop");
        while self.running {
            let event = self.queue.pop(&mut self.backend)?;
            self.handle_event(event);
        }
        Ok(())
    }

    // ── Event handling (backend → dispatcher) ────────────────────────

    /// Processes one event to completion.
    pub fn handle_event(&mut self, event: Event) {
        let Event { time_msec, kind } = event;

        match kind {
            EventKind::CursorMotion { delta_x, delta_y } => {
                self.backend.move_relative(delta_x, delta_y);
                self.process_cursor_motion(time_msec);
            }

            EventKind::CursorMotionAbsolute { x, y } => {
                self.backend.warp_normalized(x, y);
                self.process_cursor_motion(time_msec);
            }

            EventKind::CursorButton { button, state } => {
                self.on_cursor_button(time_msec, button, state);
            }

            EventKind::CursorAxis {
                orientation,
                source,
                delta,
                delta_discrete,
            } => {
                self.backend
                    .pointer_axis(time_msec, orientation, delta, delta_discrete, source);
            }

            EventKind::CursorFrame => self.backend.pointer_frame(),

            EventKind::OutputReady { output } => self.on_output_ready(output),

            EventKind::KeyModifiersChanged {
                keyboard,
                modifiers,
            } => {
                self.backend.set_keyboard(keyboard);
                self.backend.keyboard_modifiers(modifiers);
            }

            EventKind::Key {
                keyboard,
                state,
                keycode,
            } => self.on_key(time_msec, keyboard, state, keycode),

            EventKind::RequestInteractiveMove { window } => {
                self.begin_interactive(window, GrabOperation::Move, ResizeEdges::empty());
            }

            EventKind::RequestInteractiveResize { window, edges } => {
                self.begin_interactive(window, GrabOperation::Resize, edges);
            }

            EventKind::WindowCreated { window, surface } => {
                self.on_window_created(window, surface);
            }

            EventKind::WindowMapped { window } => self.on_window_mapped(window),

            EventKind::WindowUnmapped { window } => self.on_window_unmapped(window),

            EventKind::WindowDestroyed { window } => self.on_window_destroyed(window),
        }

        #[cfg(debug_assertions)]
        if let Err(e) = self.validate() {
            tracing::warn!("Invariant violation after handle_event: {}", e);
        }
    }

    // ── Cursor motion ────────────────────────────────────────────────

    /// Routes a motion event by the current interaction mode. The
    /// backend has already applied the motion to the cursor position.
    fn process_cursor_motion(&mut self, time_msec: u32) {
        match self.interaction.mode() {
            CursorMode::Move => self.process_cursor_move(),
            CursorMode::Resize => self.process_cursor_resize(),
            CursorMode::Passthrough => self.process_cursor_passthrough(time_msec),
        }
    }

    /// The grabbed window follows the cursor at its grab-time offset.
    fn process_cursor_move(&mut self) {
        let Some(grab) = self.interaction.grab() else {
            return;
        };
        let (cursor_x, cursor_y) = self.backend.position();
        let (x, y) = grab.move_position(cursor_x, cursor_y);
        if let Some(window) = self.registry.get_mut(grab.window) {
            window.x = x;
            window.y = y;
        }
    }

    /// Recomputes geometry from the grab anchor and asks the client
    /// for the new size. The client applies it on its next commit.
    fn process_cursor_resize(&mut self) {
        let Some(grab) = self.interaction.grab() else {
            return;
        };
        let (cursor_x, cursor_y) = self.backend.position();
        let Some(window) = self.registry.get(grab.window) else {
            return;
        };
        let geometry = grab.resize_geometry(cursor_x, cursor_y, window.x, window.y);
        let surface = window.surface;
        let id = window.id;

        if let Some(window) = self.registry.get_mut(id) {
            window.x = geometry.x;
            window.y = geometry.y;
        }
        self.backend.request_size(surface, geometry.width, geometry.height);
    }

    /// No grab: report enter/motion to whatever surface sits under
    /// the cursor, or show the default cursor over bare wallpaper.
    fn process_cursor_passthrough(&mut self, time_msec: u32) {
        let (cursor_x, cursor_y) = self.backend.position();
        let Some(hit) = self.registry.window_at(&self.backend, cursor_x, cursor_y) else {
            self.backend.set_default_image();
            self.backend.pointer_clear_focus();
            return;
        };

        // An enter implicitly moves pointer focus; a plain motion is
        // enough while focus already sits on the hit surface.
        if self.backend.pointer_focused_surface() == Some(hit.surface) {
            self.backend.pointer_motion(time_msec, hit.sx, hit.sy);
        } else {
            self.backend.pointer_enter(hit.surface, hit.sx, hit.sy);
        }
    }

    // ── Buttons and keys ─────────────────────────────────────────────

    fn on_cursor_button(&mut self, time_msec: u32, button: u32, state: ButtonState) {
        // Clients see every button regardless of what the WM does
        // with it.
        self.backend.pointer_button(time_msec, button, state);

        // A release terminates any drag, even over bare wallpaper.
        if state == ButtonState::Released && self.interaction.mode() != CursorMode::Passthrough {
            debug!("button released, ending grab");
            self.interaction.end_grab();
        }

        let (cursor_x, cursor_y) = self.backend.position();
        let Some(hit) = self.registry.window_at(&self.backend, cursor_x, cursor_y) else {
            return;
        };

        if state == ButtonState::Pressed {
            self.focus_window(hit.window, hit.surface);
        }
    }

    fn on_key(&mut self, time_msec: u32, keyboard: KeyboardId, state: KeyState, keycode: u32) {
        let mut handled = false;

        if state == KeyState::Pressed {
            let modifiers = self.backend.modifiers(keyboard);
            // A keycode can resolve to several syms; the first one
            // with a live binding consumes the press.
            for keysym in self.backend.keysyms(keyboard, keycode) {
                if self.try_binding(modifiers, keysym) {
                    handled = true;
                    break;
                }
            }
        }

        if !handled {
            self.backend.set_keyboard(keyboard);
            self.backend.keyboard_key(time_msec, keycode, state);
        }
    }

    /// Returns whether the chord resolved to a command that ran.
    fn try_binding(&mut self, modifiers: Modifiers, keysym: Keysym) -> bool {
        let Some(command) = self.bindings.resolve(modifiers, keysym) else {
            return false;
        };
        let command = command.clone();
        self.exec(command)
    }

    // ── Interactive move/resize ──────────────────────────────────────

    /// Starts a move or resize grab for a client request.
    fn begin_interactive(&mut self, window: WindowId, operation: GrabOperation, edges: ResizeEdges) {
        let Some(window) = self.registry.get(window) else {
            // Destroyed before the request drained.
            return;
        };
        let pointer_focus = self.backend.pointer_focused_surface();
        let (cursor_x, cursor_y) = self.backend.position();
        let geometry = self.backend.geometry(window.surface);

        if self.interaction.begin_interactive(
            window,
            operation,
            edges,
            pointer_focus,
            cursor_x,
            cursor_y,
            geometry,
        ) {
            debug!("{:?} grab on {}", operation, window.id);
        } else {
            debug!(
                "denied {:?} grab on {}: surface lacks pointer focus",
                operation, window.id
            );
        }
    }

    // ── Window lifecycle ─────────────────────────────────────────────

    fn on_window_created(&mut self, window: WindowId, surface: SurfaceId) {
        info!("window {} created", window);
        self.registry.insert(Window::new(window, surface));
    }

    fn on_window_mapped(&mut self, window: WindowId) {
        let Some(w) = self.registry.get_mut(window) else {
            return;
        };
        w.mapped = true;
        let surface = w.surface;
        info!("window {} mapped", window);
        self.focus_window(window, surface);
    }

    /// An unmapped window keeps its registry slot and stack position
    /// until it is destroyed; hit-testing and rendering skip it.
    fn on_window_unmapped(&mut self, window: WindowId) {
        if let Some(w) = self.registry.get_mut(window) {
            w.mapped = false;
            info!("window {} unmapped", window);
        }
    }

    fn on_window_destroyed(&mut self, window: WindowId) {
        if self.interaction.clear_if_grabbed(window) {
            debug!("window {} destroyed mid-grab", window);
        }
        if self.focus.focused_window == Some(window) {
            self.focus.focused_window = None;
        }
        if self.registry.remove(window).is_some() {
            info!("window {} destroyed", window);
        }
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn on_output_ready(&mut self, output: OutputId) {
        let windows = self.registry.render_list();
        self.backend.render(output, &windows);
    }

    // ── Focus ────────────────────────────────────────────────────────

    /// Gives a window keyboard focus, raising and activating it.
    ///
    /// No-op when `surface` already holds keyboard focus, so clicking
    /// the focused window does not re-send activation or re-enter the
    /// keyboard. Otherwise the previous surface is deactivated, the
    /// window raised to the front of the stack, and the keyboard moved
    /// onto the new surface.
    pub fn focus_window(&mut self, window: WindowId, surface: SurfaceId) {
        let previous = self.backend.keyboard_focused_surface();
        if previous == Some(surface) {
            return;
        }
        if let Some(previous) = previous {
            self.backend.set_activated(previous, false);
        }

        self.registry.raise(window);
        self.backend.set_activated(surface, true);
        self.backend.keyboard_enter(surface);
        self.focus.focused_window = Some(window);
        debug!("focused window {}", window);
    }

    // ── Command execution ────────────────────────────────────────────

    /// Executes a bound command.
    ///
    /// Returns whether the command took effect. A command that cannot
    /// apply (cycling with a lone window) reports `false`, which lets
    /// the triggering key fall through to the focused client.
    pub fn exec(&mut self, command: Command) -> bool {
        debug!("exec: {:?}", command);
        let handled = match command {
            Command::Quit => {
                info!("quit requested, shutting down");
                self.backend.shutdown();
                self.running = false;
                true
            }
            Command::CycleFocus => self.cycle_focus(),
            Command::Spawn(command_line) => {
                self.backend.spawn(&command_line);
                true
            }
        };

        #[cfg(debug_assertions)]
        if let Err(e) = self.validate() {
            tracing::warn!("Invariant violation after exec: {}", e);
        }

        handled
    }

    /// Focuses the window just beneath the front one and sends the old
    /// front to the back of the stack. With fewer than two windows
    /// there is nothing to cycle through.
    fn cycle_focus(&mut self) -> bool {
        let (front, next) = match (self.registry.stack().first(), self.registry.stack().get(1)) {
            (Some(&front), Some(&next)) => (front, next),
            _ => return false,
        };
        let Some(surface) = self.registry.get(next).map(|w| w.surface) else {
            return false;
        };

        self.focus_window(next, surface);
        self.registry.send_to_back(front);
        true
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Current interaction mode.
    pub fn mode(&self) -> CursorMode {
        self.interaction.mode()
    }

    /// Window held by the active grab, if any.
    pub fn grabbed_window(&self) -> Option<WindowId> {
        self.interaction.grabbed_window()
    }

    /// Window that last received keyboard focus and still exists.
    pub fn focused_window(&self) -> Option<WindowId> {
        self.focus.focused_window
    }

    /// False once a quit command has run.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle to the event queue this dispatcher drains.
    pub fn queue(&self) -> Arc<EventQueue> {
        Arc::clone(&self.queue)
    }

    /// Checks the cross-structure invariants. Debug builds run this
    /// after every event; tests call it directly.
    pub fn validate(&self) -> Result<(), InvariantError> {
        invariants::validate(&self.registry, &self.interaction, &self.focus)
    }
}
