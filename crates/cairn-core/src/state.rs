//! Interaction state: geometry, cursor modes, and grab math.

use bitflags::bitflags;

use crate::window::{SurfaceId, Window, WindowId};

/// Geometry of a rectangular region in layout coordinates.
///
/// For client surfaces this is the geometry box: the visible extent of
/// the window and its offset within the surface coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[allow(clippy::cast_possible_wrap)]
    pub const fn contains(self, x: i32, y: i32) -> bool {
        x >= self.x
            && x < self.x + self.width as i32
            && y >= self.y
            && y < self.y + self.height as i32
    }
}

bitflags! {
    /// Which edges of a window an interactive resize drags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ResizeEdges: u8 {
        const TOP    = 0b0001;
        const BOTTOM = 0b0010;
        const LEFT   = 0b0100;
        const RIGHT  = 0b1000;
    }
}

/// What the cursor is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMode {
    /// Events route to clients based on what is under the cursor.
    Passthrough,
    /// The cursor drags a window around.
    Move,
    /// The cursor drags one or two edges of a window.
    Resize,
}

/// The two interactive grab operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabOperation {
    Move,
    Resize,
}

/// A live move/resize grab.
///
/// `anchor` means different things per operation: for a move it is the
/// cursor's offset from the window position at grab time, so the
/// window tracks the cursor exactly; for a resize it is the cursor
/// position plus the geometry-box origin, the fixed point the edge
/// deltas are measured from. `width`/`height` are the geometry-box
/// size at grab time. Every motion recomputes from these, so the math
/// never accumulates drift across motion events.
#[derive(Debug, Clone, PartialEq)]
pub struct Grab {
    pub window: WindowId,
    pub operation: GrabOperation,
    pub anchor_x: f64,
    pub anchor_y: f64,
    pub width: u32,
    pub height: u32,
    pub edges: ResizeEdges,
}

impl Grab {
    /// Window position while this move grab tracks the cursor.
    #[allow(clippy::cast_possible_truncation)]
    pub fn move_position(&self, cursor_x: f64, cursor_y: f64) -> (i32, i32) {
        ((cursor_x - self.anchor_x) as i32, (cursor_y - self.anchor_y) as i32)
    }

    /// Window geometry while this resize grab tracks the cursor.
    ///
    /// Each axis is independent. Dragging a near edge (top/left) keeps
    /// the far edge fixed: the origin follows the cursor and the size
    /// shrinks by the same delta; if the size would drop below 1 the
    /// overflow folds back into the origin, so `origin + size` still
    /// equals the grab-time far edge. Dragging a far edge
    /// (bottom/right) keeps the origin and grows the size. An axis
    /// with no edge in the mask keeps the window's current origin and
    /// the grab-time size. Near wins when both edges of an axis are
    /// set.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resize_geometry(
        &self,
        cursor_x: f64,
        cursor_y: f64,
        window_x: i32,
        window_y: i32,
    ) -> Geometry {
        let dx = cursor_x - self.anchor_x;
        let dy = cursor_y - self.anchor_y;

        let mut x = f64::from(window_x);
        let mut y = f64::from(window_y);
        let mut width = f64::from(self.width);
        let mut height = f64::from(self.height);

        if self.edges.contains(ResizeEdges::TOP) {
            y = self.anchor_y + dy;
            height -= dy;
            if height < 1.0 {
                y += height - 1.0;
                height = 1.0;
            }
        } else if self.edges.contains(ResizeEdges::BOTTOM) {
            height += dy;
        }
        if self.edges.contains(ResizeEdges::LEFT) {
            x = self.anchor_x + dx;
            width -= dx;
            if width < 1.0 {
                x += width - 1.0;
                width = 1.0;
            }
        } else if self.edges.contains(ResizeEdges::RIGHT) {
            width += dx;
        }

        // Sizes are unsigned; a far-edge drag past the near edge
        // bottoms out at 1 instead of going negative.
        Geometry::new(x as i32, y as i32, width.max(1.0) as u32, height.max(1.0) as u32)
    }
}

/// The interaction state machine: Passthrough until a grab starts,
/// back to Passthrough when the grab ends.
#[derive(Debug, Default)]
pub struct InteractionState {
    grab: Option<Grab>,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CursorMode {
        match &self.grab {
            None => CursorMode::Passthrough,
            Some(grab) => match grab.operation {
                GrabOperation::Move => CursorMode::Move,
                GrabOperation::Resize => CursorMode::Resize,
            },
        }
    }

    pub fn grab(&self) -> Option<&Grab> {
        self.grab.as_ref()
    }

    pub fn grabbed_window(&self) -> Option<WindowId> {
        self.grab.as_ref().map(|g| g.window)
    }

    /// Starts a move or resize grab.
    ///
    /// Denied (returns `false`, no state change) unless the window's
    /// surface currently holds pointer focus; that keeps unfocused
    /// clients from hijacking the cursor. `geometry` is the surface's
    /// current geometry box and `cursor_x`/`cursor_y` the cursor's
    /// layout position, both sampled by the caller at request time.
    pub fn begin_interactive(
        &mut self,
        window: &Window,
        operation: GrabOperation,
        edges: ResizeEdges,
        pointer_focus: Option<SurfaceId>,
        cursor_x: f64,
        cursor_y: f64,
        geometry: Geometry,
    ) -> bool {
        if pointer_focus != Some(window.surface) {
            return false;
        }

        let (anchor_x, anchor_y) = match operation {
            GrabOperation::Move => {
                (cursor_x - f64::from(window.x), cursor_y - f64::from(window.y))
            }
            GrabOperation::Resize => {
                (cursor_x + f64::from(geometry.x), cursor_y + f64::from(geometry.y))
            }
        };

        self.grab = Some(Grab {
            window: window.id,
            operation,
            anchor_x,
            anchor_y,
            width: geometry.width,
            height: geometry.height,
            edges,
        });
        true
    }

    /// Ends any grab, returning to Passthrough. Safe to call when no
    /// grab is active.
    pub fn end_grab(&mut self) {
        self.grab = None;
    }

    /// Drops the grab if `window` holds it. Returns whether a grab was
    /// cleared; callers use this when a window is destroyed mid-drag.
    pub fn clear_if_grabbed(&mut self, window: WindowId) -> bool {
        if self.grabbed_window() == Some(window) {
            self.grab = None;
            true
        } else {
            false
        }
    }
}

/// Keyboard-focus bookkeeping.
///
/// The seat's focused surface stays the source of truth for focus
/// decisions; this record exists so window destruction can tell
/// whether it took the focused window with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    pub focused_window: Option<WindowId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_at(id: u64, x: i32, y: i32) -> Window {
        let mut window = Window::new(WindowId(id), SurfaceId(id));
        window.x = x;
        window.y = y;
        window.mapped = true;
        window
    }

    fn resize_grab(edges: ResizeEdges) -> Grab {
        Grab {
            window: WindowId(1),
            operation: GrabOperation::Resize,
            anchor_x: 100.0,
            anchor_y: 100.0,
            width: 200,
            height: 150,
            edges,
        }
    }

    #[test]
    fn geometry_contains_is_half_open() {
        let geometry = Geometry::new(10, 10, 100, 50);
        assert!(geometry.contains(10, 10));
        assert!(geometry.contains(109, 59));
        assert!(!geometry.contains(110, 30));
        assert!(!geometry.contains(9, 30));
    }

    #[test]
    fn begin_requires_pointer_focus() {
        let mut interaction = InteractionState::new();
        let window = window_at(1, 30, 40);

        let started = interaction.begin_interactive(
            &window,
            GrabOperation::Move,
            ResizeEdges::empty(),
            Some(SurfaceId(99)),
            50.0,
            60.0,
            Geometry::new(0, 0, 200, 150),
        );
        assert!(!started);
        assert_eq!(interaction.mode(), CursorMode::Passthrough);
        assert!(interaction.grab().is_none());

        let started = interaction.begin_interactive(
            &window,
            GrabOperation::Move,
            ResizeEdges::empty(),
            Some(SurfaceId(1)),
            50.0,
            60.0,
            Geometry::new(0, 0, 200, 150),
        );
        assert!(started);
        assert_eq!(interaction.mode(), CursorMode::Move);
    }

    #[test]
    fn move_grab_tracks_cursor_offset() {
        let mut interaction = InteractionState::new();
        let window = window_at(1, 30, 40);
        interaction.begin_interactive(
            &window,
            GrabOperation::Move,
            ResizeEdges::empty(),
            Some(SurfaceId(1)),
            50.0,
            60.0,
            Geometry::new(0, 0, 200, 150),
        );

        // Anchor is the cursor's offset inside the window (20, 20).
        let grab = interaction.grab().unwrap();
        let (x, y) = grab.move_position(110.0, 95.0);
        assert_eq!((x, y), (90, 75));
    }

    #[test]
    fn resize_anchor_includes_geometry_box_origin() {
        let mut interaction = InteractionState::new();
        let window = window_at(1, 0, 0);
        interaction.begin_interactive(
            &window,
            GrabOperation::Resize,
            ResizeEdges::RIGHT,
            Some(SurfaceId(1)),
            100.0,
            100.0,
            Geometry::new(5, 7, 200, 150),
        );

        let grab = interaction.grab().unwrap();
        assert_eq!((grab.anchor_x, grab.anchor_y), (105.0, 107.0));
        assert_eq!((grab.width, grab.height), (200, 150));
    }

    #[test]
    fn resize_right_edge_grows_width_only() {
        let grab = resize_grab(ResizeEdges::RIGHT);
        let geometry = grab.resize_geometry(120.0, 100.0, 10, 20);
        assert_eq!(geometry, Geometry::new(10, 20, 220, 150));
    }

    #[test]
    fn resize_left_past_zero_folds_into_origin() {
        let grab = resize_grab(ResizeEdges::LEFT);
        // Drag 10 px past the full width of the window.
        let geometry = grab.resize_geometry(100.0 + 210.0, 100.0, 10, 20);
        assert_eq!(geometry.width, 1);
        assert_eq!(
            i64::from(geometry.x) + i64::from(geometry.width),
            i64::from(grab.anchor_x as i32) + i64::from(grab.width),
        );
        // The untouched axis keeps the current origin and grab size.
        assert_eq!(geometry.y, 20);
        assert_eq!(geometry.height, 150);
    }

    #[test]
    fn resize_top_left_corner_moves_origin_on_both_axes() {
        let grab = resize_grab(ResizeEdges::TOP | ResizeEdges::LEFT);
        let geometry = grab.resize_geometry(110.0, 130.0, 10, 20);
        // Origin follows the cursor from the anchor, sizes shrink.
        assert_eq!(geometry, Geometry::new(110, 130, 190, 120));
    }

    #[test]
    fn resize_bottom_shrink_past_top_clamps_to_one() {
        let grab = resize_grab(ResizeEdges::BOTTOM);
        let geometry = grab.resize_geometry(100.0, 100.0 - 300.0, 10, 20);
        assert_eq!(geometry.height, 1);
        assert_eq!(geometry.y, 20);
    }

    #[test]
    fn end_and_clear_return_to_passthrough() {
        let mut interaction = InteractionState::new();
        let window = window_at(7, 0, 0);
        interaction.begin_interactive(
            &window,
            GrabOperation::Resize,
            ResizeEdges::BOTTOM,
            Some(SurfaceId(7)),
            0.0,
            0.0,
            Geometry::new(0, 0, 100, 100),
        );
        assert_eq!(interaction.mode(), CursorMode::Resize);

        assert!(!interaction.clear_if_grabbed(WindowId(8)));
        assert_eq!(interaction.mode(), CursorMode::Resize);

        assert!(interaction.clear_if_grabbed(WindowId(7)));
        assert_eq!(interaction.mode(), CursorMode::Passthrough);

        interaction.end_grab();
        assert_eq!(interaction.mode(), CursorMode::Passthrough);
    }
}
