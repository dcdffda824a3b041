//! Scripted demonstration session.
//!
//! Real display backends live outside this repository, so the stock
//! binary drives the full pipeline against the headless backend: two
//! toplevels, a pointer sweep, a click, a focus cycle, and a quit
//! through the configured chord. The session doubles as a smoke test
//! of the wiring between the queue, the dispatcher, and a backend.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use cairn_backend_headless::HeadlessBackend;
use cairn_core::event::{ButtonState, Event, EventKind, KeyState};
use cairn_core::input::{Keysym, Modifiers};
use cairn_core::state::Geometry;
use cairn_core::{Dispatcher, EventQueue, TransportError};

use crate::config::Config;

// Linux evdev codes used by the script.
const KEY_ESC: u32 = 1;
const KEY_F1: u32 = 59;
const BTN_LEFT: u32 = 0x110;

/// Runs the synthetic session to completion.
///
/// Ends when the quit chord fires or, with a config that unbinds it,
/// when the script runs out and the transport disconnects. Both are
/// normal termination.
pub fn run(config: &Config) -> Result<()> {
    let queue = Arc::new(EventQueue::new());
    let mut backend = HeadlessBackend::new(Arc::clone(&queue));

    let keyboard = backend.add_keyboard();
    backend.bind_keysyms(keyboard, KEY_ESC, &[Keysym::Escape]);
    backend.bind_keysyms(keyboard, KEY_F1, &[Keysym::F1]);
    let output = backend.add_output();

    // The protocol layer announces two toplevels and maps them.
    let (left, _) = backend.new_toplevel(Geometry::new(0, 0, 800, 600));
    let (right, _) = backend.new_toplevel(Geometry::new(0, 0, 800, 600));
    backend.map_toplevel(left);
    backend.map_toplevel(right);
    backend.set_modifiers(keyboard, Modifiers::ALT);
    info!("demo: mapped {} and {}", left, right);

    // Each batch replays as one burst of device activity.
    backend.script(vec![
        Event::new(10, EventKind::CursorMotion { delta_x: 120.0, delta_y: 90.0 }),
        Event::new(10, EventKind::CursorFrame),
    ]);
    backend.script(vec![
        Event::new(20, EventKind::CursorButton { button: BTN_LEFT, state: ButtonState::Pressed }),
        Event::new(28, EventKind::CursorButton { button: BTN_LEFT, state: ButtonState::Released }),
        Event::new(28, EventKind::CursorFrame),
    ]);
    backend.script(vec![
        Event::new(40, EventKind::Key { keyboard, state: KeyState::Pressed, keycode: KEY_F1 }),
        Event::new(45, EventKind::Key { keyboard, state: KeyState::Released, keycode: KEY_F1 }),
    ]);
    backend.script(vec![Event::new(50, EventKind::OutputReady { output })]);
    backend.script(vec![
        Event::new(60, EventKind::Key { keyboard, state: KeyState::Pressed, keycode: KEY_ESC }),
    ]);

    let mut wm = Dispatcher::new(Arc::clone(&queue), backend, config.keybindings());
    match wm.run() {
        Ok(()) => info!("demo: quit chord fired"),
        Err(TransportError::Disconnected) => info!("demo: script exhausted"),
        Err(e) => return Err(e.into()),
    }

    info!(
        "demo: done; focused {:?}, stack {:?}, {} notifications sent",
        wm.focused_window(),
        wm.registry.stack(),
        wm.backend.notifications().len(),
    );
    Ok(())
}
