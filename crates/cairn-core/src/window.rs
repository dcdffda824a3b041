//! Managed windows and the stacking order.
//!
//! Protocol-agnostic window representation. No display-server handles
//! leak here; backends keep their own surface-handle maps and hand the
//! core opaque ids.

use std::collections::HashMap;

use crate::backend::Surfaces;

/// Unique, opaque identifier for a managed window.
///
/// Backends maintain the mapping from their protocol-specific toplevel
/// handle to this id and allocate ids themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "win:{}", self.0)
    }
}

/// Unique, opaque identifier for a client surface.
///
/// A window owns one root surface, but hit-testing can land on nested
/// child surfaces (popups, tooltips), which get their own ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// A managed toplevel window.
///
/// Position lives here; width and height belong to the client surface
/// and are queried through [`Surfaces::geometry`] when needed.
#[derive(Debug, Clone)]
pub struct Window {
    pub id: WindowId,
    pub surface: SurfaceId,
    pub x: i32,
    pub y: i32,
    pub mapped: bool,
}

impl Window {
    /// A freshly created window: origin position, not yet shown.
    pub fn new(id: WindowId, surface: SurfaceId) -> Self {
        Self {
            id,
            surface,
            x: 0,
            y: 0,
            mapped: false,
        }
    }
}

/// A hit-test result: the window, the concrete surface under the
/// cursor (possibly a nested popup), and surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowHit {
    pub window: WindowId,
    pub surface: SurfaceId,
    pub sx: f64,
    pub sy: f64,
}

/// The ordered set of managed windows.
///
/// `stack` holds front-to-back order, front at index 0, meaning "most
/// recently raised". Order changes only through [`insert`] (new
/// windows go in front), [`raise`], and [`send_to_back`].
///
/// [`insert`]: WindowRegistry::insert
/// [`raise`]: WindowRegistry::raise
/// [`send_to_back`]: WindowRegistry::send_to_back
#[derive(Debug, Default)]
pub struct WindowRegistry {
    stack: Vec<WindowId>,
    windows: HashMap<WindowId, Window>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window at the front of the stack.
    pub fn insert(&mut self, window: Window) {
        let id = window.id;
        if self.windows.insert(id, window).is_none() {
            self.stack.insert(0, id);
        }
    }

    /// Removes a window everywhere it is referenced.
    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        let window = self.windows.remove(&id)?;
        self.stack.retain(|w| *w != id);
        Some(window)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    /// Front-to-back stacking order.
    pub fn stack(&self) -> &[WindowId] {
        &self.stack
    }

    /// All managed windows, in no particular order.
    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Moves a known window to the front of the stack.
    pub fn raise(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            return;
        }
        self.stack.retain(|w| *w != id);
        self.stack.insert(0, id);
    }

    /// Moves a known window to the tail of the stack.
    pub fn send_to_back(&mut self, id: WindowId) {
        if !self.windows.contains_key(&id) {
            return;
        }
        self.stack.retain(|w| *w != id);
        self.stack.push(id);
    }

    /// Finds the topmost mapped window under a layout-space point.
    ///
    /// Walks the stack front to back and asks the protocol layer
    /// whether any surface of the window (toplevel or popup child)
    /// sits at the window-local coordinates.
    pub fn window_at<S: Surfaces + ?Sized>(
        &self,
        surfaces: &S,
        lx: f64,
        ly: f64,
    ) -> Option<WindowHit> {
        for id in &self.stack {
            let window = &self.windows[id];
            if !window.mapped {
                continue;
            }
            let local_x = lx - f64::from(window.x);
            let local_y = ly - f64::from(window.y);
            if let Some(hit) = surfaces.surface_at(window.surface, local_x, local_y) {
                return Some(WindowHit {
                    window: window.id,
                    surface: hit.surface,
                    sx: hit.sx,
                    sy: hit.sy,
                });
            }
        }
        None
    }

    /// Mapped windows in paint order: back of the stack first, front
    /// painted last (topmost).
    pub fn render_list(&self) -> Vec<&Window> {
        self.stack
            .iter()
            .rev()
            .map(|id| &self.windows[id])
            .filter(|w| w.mapped)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SurfaceHit;
    use crate::state::Geometry;

    /// Every surface is a fixed 100x100 rectangle.
    struct SquareSurfaces;

    impl Surfaces for SquareSurfaces {
        fn geometry(&self, _surface: SurfaceId) -> Geometry {
            Geometry::new(0, 0, 100, 100)
        }

        fn request_size(&mut self, _surface: SurfaceId, _width: u32, _height: u32) {}

        fn surface_at(&self, surface: SurfaceId, sx: f64, sy: f64) -> Option<SurfaceHit> {
            if (0.0..100.0).contains(&sx) && (0.0..100.0).contains(&sy) {
                Some(SurfaceHit { surface, sx, sy })
            } else {
                None
            }
        }

        fn set_activated(&mut self, _surface: SurfaceId, _activated: bool) {}
    }

    fn mapped_window(id: u64, x: i32, y: i32) -> Window {
        let mut window = Window::new(WindowId(id), SurfaceId(id));
        window.x = x;
        window.y = y;
        window.mapped = true;
        window
    }

    #[test]
    fn new_windows_stack_in_front() {
        let mut registry = WindowRegistry::new();
        registry.insert(Window::new(WindowId(1), SurfaceId(1)));
        registry.insert(Window::new(WindowId(2), SurfaceId(2)));
        assert_eq!(registry.stack(), &[WindowId(2), WindowId(1)]);
    }

    #[test]
    fn raise_and_send_to_back_reorder() {
        let mut registry = WindowRegistry::new();
        for id in 1..=3 {
            registry.insert(Window::new(WindowId(id), SurfaceId(id)));
        }
        // Stack is [3, 2, 1].
        registry.raise(WindowId(1));
        assert_eq!(registry.stack(), &[WindowId(1), WindowId(3), WindowId(2)]);
        registry.send_to_back(WindowId(1));
        assert_eq!(registry.stack(), &[WindowId(3), WindowId(2), WindowId(1)]);

        // Unknown ids never enter the stack.
        registry.raise(WindowId(9));
        registry.send_to_back(WindowId(9));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn remove_clears_stack_and_map() {
        let mut registry = WindowRegistry::new();
        registry.insert(Window::new(WindowId(1), SurfaceId(1)));
        registry.insert(Window::new(WindowId(2), SurfaceId(2)));
        let removed = registry.remove(WindowId(1)).unwrap();
        assert_eq!(removed.id, WindowId(1));
        assert_eq!(registry.stack(), &[WindowId(2)]);
        assert!(registry.remove(WindowId(1)).is_none());
    }

    #[test]
    fn hit_test_prefers_front_of_stack() {
        let mut registry = WindowRegistry::new();
        registry.insert(mapped_window(1, 0, 0));
        registry.insert(mapped_window(2, 50, 0));
        // Window 2 is in front and overlaps window 1 on x in 50..100.

        let hit = registry.window_at(&SquareSurfaces, 60.0, 10.0).unwrap();
        assert_eq!(hit.window, WindowId(2));
        assert_eq!((hit.sx, hit.sy), (10.0, 10.0));

        let hit = registry.window_at(&SquareSurfaces, 20.0, 10.0).unwrap();
        assert_eq!(hit.window, WindowId(1));

        assert!(registry.window_at(&SquareSurfaces, 400.0, 10.0).is_none());
    }

    #[test]
    fn hit_test_and_render_skip_unmapped() {
        let mut registry = WindowRegistry::new();
        registry.insert(mapped_window(1, 0, 0));
        let mut hidden = mapped_window(2, 0, 0);
        hidden.mapped = false;
        registry.insert(hidden);

        // Window 2 is frontmost but unmapped, so window 1 gets the hit.
        let hit = registry.window_at(&SquareSurfaces, 10.0, 10.0).unwrap();
        assert_eq!(hit.window, WindowId(1));

        let order: Vec<WindowId> = registry.render_list().iter().map(|w| w.id).collect();
        assert_eq!(order, vec![WindowId(1)]);
    }
}
