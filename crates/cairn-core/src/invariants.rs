//! Invariant validation for the interaction state.
//!
//! Called after every handled event in debug builds.

use crate::state::{FocusState, InteractionState};
use crate::window::WindowRegistry;

/// Error indicating which invariant was violated.
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("Window {0} is stacked but missing from the window map")]
    StackedWindowMissing(String),

    #[error("Window {0} is in the window map but not stacked")]
    WindowNotStacked(String),

    #[error("Window {0} appears in the stack more than once")]
    DuplicateStackEntry(String),

    #[error("Focused window {0} is not in the registry")]
    FocusedWindowMissing(String),

    #[error("Grabbed window {0} is not in the registry")]
    GrabbedWindowMissing(String),
}

/// Validate all core invariants. Returns the first violation found.
///
/// Focus deliberately checks registry membership only: an unmapped
/// window may stay focused until it is destroyed or focus moves on.
pub fn validate(
    registry: &WindowRegistry,
    interaction: &InteractionState,
    focus: &FocusState,
) -> Result<(), InvariantError> {
    // 1. Stack and window map agree one-to-one.
    for (index, &id) in registry.stack().iter().enumerate() {
        if !registry.contains(id) {
            return Err(InvariantError::StackedWindowMissing(format!("{id}")));
        }
        if registry.stack()[..index].contains(&id) {
            return Err(InvariantError::DuplicateStackEntry(format!("{id}")));
        }
    }
    for window in registry.windows() {
        if !registry.stack().contains(&window.id) {
            return Err(InvariantError::WindowNotStacked(format!("{}", window.id)));
        }
    }

    // 2. Focus points at a live window.
    if let Some(id) = focus.focused_window {
        if !registry.contains(id) {
            return Err(InvariantError::FocusedWindowMissing(format!("{id}")));
        }
    }

    // 3. A grab points at a live window.
    if let Some(id) = interaction.grabbed_window() {
        if !registry.contains(id) {
            return Err(InvariantError::GrabbedWindowMissing(format!("{id}")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Geometry, GrabOperation, ResizeEdges};
    use crate::window::{SurfaceId, Window, WindowId};

    #[test]
    fn empty_state_is_valid() {
        let registry = WindowRegistry::new();
        let interaction = InteractionState::new();
        let focus = FocusState::default();
        assert!(validate(&registry, &interaction, &focus).is_ok());
    }

    #[test]
    fn focused_window_must_be_registered() {
        let mut registry = WindowRegistry::new();
        registry.insert(Window::new(WindowId(1), SurfaceId(1)));
        let interaction = InteractionState::new();

        let focus = FocusState {
            focused_window: Some(WindowId(1)),
        };
        assert!(validate(&registry, &interaction, &focus).is_ok());

        let focus = FocusState {
            focused_window: Some(WindowId(42)),
        };
        assert!(matches!(
            validate(&registry, &interaction, &focus),
            Err(InvariantError::FocusedWindowMissing(_)),
        ));
    }

    #[test]
    fn grabbed_window_must_be_registered() {
        let registry = WindowRegistry::new();
        let focus = FocusState::default();

        // A grab on a window that never entered the registry.
        let stray = Window::new(WindowId(9), SurfaceId(9));
        let mut interaction = InteractionState::new();
        interaction.begin_interactive(
            &stray,
            GrabOperation::Move,
            ResizeEdges::empty(),
            Some(SurfaceId(9)),
            0.0,
            0.0,
            Geometry::new(0, 0, 10, 10),
        );

        assert!(matches!(
            validate(&registry, &interaction, &focus),
            Err(InvariantError::GrabbedWindowMissing(_)),
        ));
    }
}
