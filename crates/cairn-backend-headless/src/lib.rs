//! In-memory backend for tests, benchmarks, and scripted demo sessions.
//!
//! Every display-server effect is replaced by plain state: a surface
//! store, a seat record, and a log of outbound [`Notification`]s that
//! tests assert against. The transport side replays a script, one
//! batch of events per [`Transport::dispatch`] call, so the dispatch
//! loop runs exactly as it would against a live connection and ends
//! with [`TransportError::Disconnected`] once the script runs dry.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use cairn_core::backend::{
    Pointer, Renderer, Seat, Session, SurfaceHit, Surfaces, Transport, TransportError,
};
use cairn_core::event::{
    AxisOrientation, AxisSource, ButtonState, Event, EventKind, KeyState, KeyboardId, OutputId,
};
use cairn_core::input::{Keysym, Modifiers};
use cairn_core::queue::EventQueue;
use cairn_core::state::{Geometry, ResizeEdges};
use cairn_core::window::{SurfaceId, Window, WindowId};

/// One outbound notification, as a client or output would observe it.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PointerEnter {
        surface: SurfaceId,
        sx: f64,
        sy: f64,
    },
    PointerMotion {
        time_msec: u32,
        sx: f64,
        sy: f64,
    },
    PointerButton {
        time_msec: u32,
        button: u32,
        state: ButtonState,
    },
    PointerAxis {
        time_msec: u32,
        orientation: AxisOrientation,
        delta: f64,
        delta_discrete: i32,
        source: AxisSource,
    },
    PointerFrame,
    PointerFocusCleared,
    DefaultCursorImage,
    KeyboardModifiers {
        modifiers: Modifiers,
    },
    KeyboardKey {
        time_msec: u32,
        keycode: u32,
        state: KeyState,
    },
    KeyboardEnter {
        surface: SurfaceId,
    },
    Activated {
        surface: SurfaceId,
        active: bool,
    },
    SizeRequested {
        surface: SurfaceId,
        width: u32,
        height: u32,
    },
    Rendered {
        output: OutputId,
        windows: Vec<WindowId>,
    },
    Spawned {
        command_line: String,
    },
}

/// Backing store for one surface: its geometry box, popup regions,
/// and the flags a client would track.
#[derive(Debug, Clone)]
struct SurfaceRecord {
    geometry: Geometry,
    children: Vec<ChildRegion>,
    activated: bool,
    requested_size: Option<(u32, u32)>,
}

impl SurfaceRecord {
    fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            children: Vec::new(),
            activated: false,
            requested_size: None,
        }
    }
}

/// A popup child, positioned in parent-local coordinates.
#[derive(Debug, Clone)]
struct ChildRegion {
    surface: SurfaceId,
    region: Geometry,
}

#[derive(Debug, Clone, Default)]
struct KeyboardRecord {
    modifiers: Modifiers,
    keymap: HashMap<u32, Vec<Keysym>>,
}

/// A backend whose display server is a pile of hash maps.
///
/// Construct one around the shared queue, describe the session with
/// the producer methods ([`new_toplevel`](Self::new_toplevel),
/// [`add_keyboard`](Self::add_keyboard), [`script`](Self::script)),
/// then hand it to the dispatcher. Afterwards,
/// [`notifications`](Self::notifications) holds everything a client
/// would have seen, in order.
#[derive(Debug)]
pub struct HeadlessBackend {
    queue: Arc<EventQueue>,
    script: VecDeque<Vec<Event>>,

    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    keyboards: HashMap<KeyboardId, KeyboardRecord>,

    layout: Geometry,
    cursor_x: f64,
    cursor_y: f64,
    default_image: bool,
    pointer_focus: Option<SurfaceId>,
    keyboard_focus: Option<SurfaceId>,
    bound_keyboard: Option<KeyboardId>,

    notifications: Vec<Notification>,
    flushes: usize,
    shut_down: bool,
    next_id: u64,
}

impl HeadlessBackend {
    /// A backend with a single 1920x1080 output layout.
    pub fn new(queue: Arc<EventQueue>) -> Self {
        Self::with_layout(queue, Geometry::new(0, 0, 1920, 1080))
    }

    /// A backend whose cursor is confined to `layout`.
    pub fn with_layout(queue: Arc<EventQueue>, layout: Geometry) -> Self {
        Self {
            queue,
            script: VecDeque::new(),
            surfaces: HashMap::new(),
            keyboards: HashMap::new(),
            layout,
            cursor_x: f64::from(layout.x),
            cursor_y: f64::from(layout.y),
            default_image: false,
            pointer_focus: None,
            keyboard_focus: None,
            bound_keyboard: None,
            notifications: Vec::new(),
            flushes: 0,
            shut_down: false,
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ── Scripted transport ───────────────────────────────────────────

    /// Queues a batch of events for one future dispatch pass, the way
    /// a real connection delivers a burst of device activity.
    pub fn script(&mut self, batch: Vec<Event>) {
        self.script.push_back(batch);
    }

    // ── Protocol producers (what real listeners would do) ────────────

    /// A client created a toplevel: allocate ids, store the surface,
    /// and announce it. The window is not shown until mapped.
    pub fn new_toplevel(&mut self, geometry: Geometry) -> (WindowId, SurfaceId) {
        let window = WindowId(self.next_id());
        let surface = SurfaceId(self.next_id());
        self.surfaces.insert(surface, SurfaceRecord::new(geometry));
        self.queue
            .push(Event::new(0, EventKind::WindowCreated { window, surface }));
        (window, surface)
    }

    pub fn map_toplevel(&mut self, window: WindowId) {
        self.queue
            .push(Event::new(0, EventKind::WindowMapped { window }));
    }

    pub fn unmap_toplevel(&mut self, window: WindowId) {
        self.queue
            .push(Event::new(0, EventKind::WindowUnmapped { window }));
    }

    /// The toplevel is gone: drop the surface store and any seat focus
    /// it held, then announce the destruction.
    pub fn destroy_toplevel(&mut self, window: WindowId, surface: SurfaceId) {
        self.surfaces.remove(&surface);
        if self.pointer_focus == Some(surface) {
            self.pointer_focus = None;
        }
        if self.keyboard_focus == Some(surface) {
            self.keyboard_focus = None;
        }
        self.queue
            .push(Event::new(0, EventKind::WindowDestroyed { window }));
    }

    /// Attaches a popup over `parent` at a parent-local region. The
    /// popup wins hit-testing inside its region.
    pub fn add_popup(&mut self, parent: SurfaceId, region: Geometry) -> SurfaceId {
        let surface = SurfaceId(self.next_id());
        self.surfaces.insert(
            surface,
            SurfaceRecord::new(Geometry::new(0, 0, region.width, region.height)),
        );
        if let Some(record) = self.surfaces.get_mut(&parent) {
            record.children.push(ChildRegion { surface, region });
        }
        surface
    }

    /// A client asked to drag `window`.
    pub fn request_move(&mut self, window: WindowId) {
        self.queue
            .push(Event::new(0, EventKind::RequestInteractiveMove { window }));
    }

    /// A client asked to resize `window` along `edges`.
    pub fn request_resize(&mut self, window: WindowId, edges: ResizeEdges) {
        self.queue.push(Event::new(
            0,
            EventKind::RequestInteractiveResize { window, edges },
        ));
    }

    pub fn add_keyboard(&mut self) -> KeyboardId {
        let keyboard = KeyboardId(self.next_id());
        self.keyboards.insert(keyboard, KeyboardRecord::default());
        keyboard
    }

    /// Teaches the keymap which syms a raw keycode resolves to.
    pub fn bind_keysyms(&mut self, keyboard: KeyboardId, keycode: u32, keysyms: &[Keysym]) {
        if let Some(record) = self.keyboards.get_mut(&keyboard) {
            record.keymap.insert(keycode, keysyms.to_vec());
        }
    }

    /// Modifier state changed on the device: record it and emit the
    /// event, exactly like a hardware modifier callback.
    pub fn set_modifiers(&mut self, keyboard: KeyboardId, modifiers: Modifiers) {
        if let Some(record) = self.keyboards.get_mut(&keyboard) {
            record.modifiers = modifiers;
        }
        self.queue.push(Event::new(
            0,
            EventKind::KeyModifiersChanged {
                keyboard,
                modifiers,
            },
        ));
    }

    pub fn add_output(&mut self) -> OutputId {
        OutputId(self.next_id())
    }

    // ── Inspection ───────────────────────────────────────────────────

    /// Everything sent client-ward so far, in order.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drains the notification log, handy between test phases.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Whether the client was told its surface is the active one.
    pub fn activated(&self, surface: SurfaceId) -> bool {
        self.surfaces
            .get(&surface)
            .is_some_and(|record| record.activated)
    }

    /// The last size the window manager asked this surface to take.
    pub fn requested_size(&self, surface: SurfaceId) -> Option<(u32, u32)> {
        self.surfaces
            .get(&surface)
            .and_then(|record| record.requested_size)
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

// ── Backend trait implementations ────────────────────────────────────

impl Pointer for HeadlessBackend {
    fn position(&self) -> (f64, f64) {
        (self.cursor_x, self.cursor_y)
    }

    fn move_relative(&mut self, delta_x: f64, delta_y: f64) {
        let min_x = f64::from(self.layout.x);
        let min_y = f64::from(self.layout.y);
        let max_x = min_x + f64::from(self.layout.width);
        let max_y = min_y + f64::from(self.layout.height);
        self.cursor_x = (self.cursor_x + delta_x).clamp(min_x, max_x);
        self.cursor_y = (self.cursor_y + delta_y).clamp(min_y, max_y);
    }

    fn warp_normalized(&mut self, x: f64, y: f64) {
        self.cursor_x = f64::from(self.layout.x) + x.clamp(0.0, 1.0) * f64::from(self.layout.width);
        self.cursor_y =
            f64::from(self.layout.y) + y.clamp(0.0, 1.0) * f64::from(self.layout.height);
    }

    fn set_default_image(&mut self) {
        // Re-setting the same image is a no-op, like a live cursor.
        if !self.default_image {
            self.default_image = true;
            self.notifications.push(Notification::DefaultCursorImage);
        }
    }
}

impl Seat for HeadlessBackend {
    fn pointer_focused_surface(&self) -> Option<SurfaceId> {
        self.pointer_focus
    }

    fn keyboard_focused_surface(&self) -> Option<SurfaceId> {
        self.keyboard_focus
    }

    fn pointer_enter(&mut self, surface: SurfaceId, sx: f64, sy: f64) {
        self.pointer_focus = Some(surface);
        // The entered client installs its own cursor image.
        self.default_image = false;
        self.notifications
            .push(Notification::PointerEnter { surface, sx, sy });
    }

    fn pointer_motion(&mut self, time_msec: u32, sx: f64, sy: f64) {
        self.notifications
            .push(Notification::PointerMotion { time_msec, sx, sy });
    }

    fn pointer_button(&mut self, time_msec: u32, button: u32, state: ButtonState) {
        self.notifications.push(Notification::PointerButton {
            time_msec,
            button,
            state,
        });
    }

    fn pointer_axis(
        &mut self,
        time_msec: u32,
        orientation: AxisOrientation,
        delta: f64,
        delta_discrete: i32,
        source: AxisSource,
    ) {
        self.notifications.push(Notification::PointerAxis {
            time_msec,
            orientation,
            delta,
            delta_discrete,
            source,
        });
    }

    fn pointer_frame(&mut self) {
        self.notifications.push(Notification::PointerFrame);
    }

    fn pointer_clear_focus(&mut self) {
        if self.pointer_focus.take().is_some() {
            self.notifications.push(Notification::PointerFocusCleared);
        }
    }

    fn set_keyboard(&mut self, keyboard: KeyboardId) {
        self.bound_keyboard = Some(keyboard);
    }

    fn keyboard_modifiers(&mut self, modifiers: Modifiers) {
        // The seat-visible mask doubles as the device mask here; a
        // real backend reads the device directly.
        if let Some(keyboard) = self.bound_keyboard {
            if let Some(record) = self.keyboards.get_mut(&keyboard) {
                record.modifiers = modifiers;
            }
        }
        self.notifications
            .push(Notification::KeyboardModifiers { modifiers });
    }

    fn keyboard_key(&mut self, time_msec: u32, keycode: u32, state: KeyState) {
        self.notifications.push(Notification::KeyboardKey {
            time_msec,
            keycode,
            state,
        });
    }

    fn keyboard_enter(&mut self, surface: SurfaceId) {
        self.keyboard_focus = Some(surface);
        self.notifications.push(Notification::KeyboardEnter { surface });
    }

    fn keysyms(&self, keyboard: KeyboardId, keycode: u32) -> Vec<Keysym> {
        self.keyboards
            .get(&keyboard)
            .and_then(|record| record.keymap.get(&keycode))
            .cloned()
            .unwrap_or_else(|| vec![Keysym::Unknown(keycode)])
    }

    fn modifiers(&self, keyboard: KeyboardId) -> Modifiers {
        self.keyboards
            .get(&keyboard)
            .map(|record| record.modifiers)
            .unwrap_or_default()
    }
}

impl Surfaces for HeadlessBackend {
    fn geometry(&self, surface: SurfaceId) -> Geometry {
        self.surfaces
            .get(&surface)
            .map(|record| record.geometry)
            .unwrap_or_default()
    }

    fn request_size(&mut self, surface: SurfaceId, width: u32, height: u32) {
        if let Some(record) = self.surfaces.get_mut(&surface) {
            record.requested_size = Some((width, height));
        }
        self.notifications.push(Notification::SizeRequested {
            surface,
            width,
            height,
        });
    }

    fn surface_at(&self, surface: SurfaceId, sx: f64, sy: f64) -> Option<SurfaceHit> {
        let record = self.surfaces.get(&surface)?;

        // Popups sit above their parent.
        for child in &record.children {
            let cx = sx - f64::from(child.region.x);
            let cy = sy - f64::from(child.region.y);
            if cx >= 0.0
                && cy >= 0.0
                && cx < f64::from(child.region.width)
                && cy < f64::from(child.region.height)
            {
                return Some(SurfaceHit {
                    surface: child.surface,
                    sx: cx,
                    sy: cy,
                });
            }
        }

        if sx >= 0.0
            && sy >= 0.0
            && sx < f64::from(record.geometry.width)
            && sy < f64::from(record.geometry.height)
        {
            return Some(SurfaceHit { surface, sx, sy });
        }
        None
    }

    fn set_activated(&mut self, surface: SurfaceId, activated: bool) {
        if let Some(record) = self.surfaces.get_mut(&surface) {
            record.activated = activated;
        }
        self.notifications.push(Notification::Activated {
            surface,
            active: activated,
        });
    }
}

impl Renderer for HeadlessBackend {
    fn render(&mut self, output: OutputId, windows: &[&Window]) {
        let windows = windows.iter().map(|w| w.id).collect();
        self.notifications
            .push(Notification::Rendered { output, windows });
    }
}

impl Transport for HeadlessBackend {
    fn flush_clients(&mut self) {
        self.flushes += 1;
    }

    fn dispatch(&mut self) -> Result<(), TransportError> {
        if self.shut_down {
            return Err(TransportError::Disconnected);
        }
        match self.script.pop_front() {
            Some(batch) => {
                debug!("replaying {} scripted events", batch.len());
                for event in batch {
                    self.queue.push(event);
                }
                Ok(())
            }
            None => Err(TransportError::Disconnected),
        }
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.script.clear();
    }
}

impl Session for HeadlessBackend {
    fn spawn(&mut self, command_line: &str) {
        self.notifications.push(Notification::Spawned {
            command_line: command_line.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> HeadlessBackend {
        HeadlessBackend::new(Arc::new(EventQueue::new()))
    }

    #[test]
    fn surface_at_prefers_popup_over_parent() {
        let mut backend = backend();
        let (_, surface) = backend.new_toplevel(Geometry::new(0, 0, 400, 300));
        let popup = backend.add_popup(surface, Geometry::new(100, 100, 50, 50));

        let hit = backend.surface_at(surface, 120.0, 110.0).unwrap();
        assert_eq!(hit.surface, popup);
        assert_eq!((hit.sx, hit.sy), (20.0, 10.0));

        let hit = backend.surface_at(surface, 10.0, 10.0).unwrap();
        assert_eq!(hit.surface, surface);

        assert!(backend.surface_at(surface, 500.0, 10.0).is_none());
    }

    #[test]
    fn cursor_stays_inside_layout() {
        let queue = Arc::new(EventQueue::new());
        let mut backend = HeadlessBackend::with_layout(queue, Geometry::new(0, 0, 800, 600));

        backend.move_relative(-50.0, -50.0);
        assert_eq!(backend.position(), (0.0, 0.0));

        backend.move_relative(5000.0, 5000.0);
        assert_eq!(backend.position(), (800.0, 600.0));

        backend.warp_normalized(0.5, 0.5);
        assert_eq!(backend.position(), (400.0, 300.0));
    }

    #[test]
    fn dispatch_replays_one_batch_per_call_then_disconnects() {
        let queue = Arc::new(EventQueue::new());
        let mut backend = HeadlessBackend::new(Arc::clone(&queue));
        backend.script(vec![Event::new(1, EventKind::CursorFrame)]);
        backend.script(vec![
            Event::new(2, EventKind::CursorFrame),
            Event::new(3, EventKind::CursorFrame),
        ]);

        backend.dispatch().unwrap();
        assert_eq!(queue.len(), 1);
        backend.dispatch().unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(backend.dispatch(), Err(TransportError::Disconnected));
    }

    #[test]
    fn shutdown_kills_the_transport() {
        let mut backend = backend();
        backend.script(vec![Event::new(1, EventKind::CursorFrame)]);
        backend.shutdown();
        assert!(backend.is_shut_down());
        assert_eq!(backend.dispatch(), Err(TransportError::Disconnected));
    }

    #[test]
    fn repeated_default_image_logs_once() {
        let mut backend = backend();
        backend.set_default_image();
        backend.set_default_image();
        assert_eq!(backend.notifications(), &[Notification::DefaultCursorImage]);

        // Entering a surface resets the image, so leaving logs again.
        let (_, surface) = backend.new_toplevel(Geometry::new(0, 0, 10, 10));
        backend.pointer_enter(surface, 1.0, 1.0);
        backend.set_default_image();
        assert_eq!(backend.notifications().len(), 3);
    }
}
