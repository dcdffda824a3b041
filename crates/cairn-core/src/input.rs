//! Keybinding routing.
//!
//! Chords (modifiers + keysym) map to compositor commands. Anything
//! the router does not recognize is forwarded to the focused client
//! untouched, so an empty table degrades to a plain pass-through
//! window manager.

use std::collections::HashMap;

use bitflags::bitflags;
use thiserror::Error;

/// Input parsing errors.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid key: {0}")]
    Key(String),
    #[error("Invalid binding: {0}")]
    Binding(String),
    #[error("Unknown command: {0}")]
    Command(String),
}

bitflags! {
    /// Keyboard modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT     = 0b0000_0001;
        const CTRL      = 0b0000_0010;
        const ALT       = 0b0000_0100;
        const SUPER     = 0b0000_1000;
        const CAPS_LOCK = 0b0001_0000;
        const NUM_LOCK  = 0b0010_0000;
    }
}

impl Modifiers {
    /// Lock keys do not participate in chord matching.
    pub const LOCKS: Self = Self::CAPS_LOCK.union(Self::NUM_LOCK);
}

/// A resolved key symbol.
///
/// Backends translate raw keycodes through their keymap into these;
/// one keycode can resolve to several syms depending on layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keysym {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Numbers
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    Key0,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Special keys
    Escape,
    Tab,
    Space,
    Return,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Left,
    Right,
    Up,
    Down,

    /// Unknown/unmapped sym, carrying the raw keycode.
    Unknown(u32),
}

impl Keysym {
    /// Parse a key name as written in config files.
    pub fn from_name(name: &str) -> Result<Self, InputError> {
        let name_lower = name.to_lowercase();

        let sym = match name_lower.as_str() {
            "a" => Self::A,
            "b" => Self::B,
            "c" => Self::C,
            "d" => Self::D,
            "e" => Self::E,
            "f" => Self::F,
            "g" => Self::G,
            "h" => Self::H,
            "i" => Self::I,
            "j" => Self::J,
            "k" => Self::K,
            "l" => Self::L,
            "m" => Self::M,
            "n" => Self::N,
            "o" => Self::O,
            "p" => Self::P,
            "q" => Self::Q,
            "r" => Self::R,
            "s" => Self::S,
            "t" => Self::T,
            "u" => Self::U,
            "v" => Self::V,
            "w" => Self::W,
            "x" => Self::X,
            "y" => Self::Y,
            "z" => Self::Z,

            "1" | "key1" => Self::Key1,
            "2" | "key2" => Self::Key2,
            "3" | "key3" => Self::Key3,
            "4" | "key4" => Self::Key4,
            "5" | "key5" => Self::Key5,
            "6" | "key6" => Self::Key6,
            "7" | "key7" => Self::Key7,
            "8" | "key8" => Self::Key8,
            "9" | "key9" => Self::Key9,
            "0" | "key0" => Self::Key0,

            "f1" => Self::F1,
            "f2" => Self::F2,
            "f3" => Self::F3,
            "f4" => Self::F4,
            "f5" => Self::F5,
            "f6" => Self::F6,
            "f7" => Self::F7,
            "f8" => Self::F8,
            "f9" => Self::F9,
            "f10" => Self::F10,
            "f11" => Self::F11,
            "f12" => Self::F12,

            "escape" | "esc" => Self::Escape,
            "tab" => Self::Tab,
            "space" => Self::Space,
            "return" | "enter" => Self::Return,
            "backspace" => Self::Backspace,
            "delete" => Self::Delete,
            "insert" => Self::Insert,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "page_up" | "prior" => Self::PageUp,
            "pagedown" | "page_down" | "next" => Self::PageDown,
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,

            _ => return Err(InputError::Key(name.to_string())),
        };

        Ok(sym)
    }
}

/// A key binding chord (modifiers + keysym).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub modifiers: Modifiers,
    pub key: Keysym,
}

impl KeyBinding {
    pub const fn new(modifiers: Modifiers, key: Keysym) -> Self {
        Self { modifiers, key }
    }

    /// Parse a binding string like "Alt+F1" or "Mod1+Shift+Return".
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let mut modifiers = Modifiers::empty();
        let mut key_part: Option<&str> = None;

        for part in s.split('+') {
            let part = part.trim();
            match part.to_lowercase().as_str() {
                "shift" => modifiers.insert(Modifiers::SHIFT),
                "ctrl" | "control" => modifiers.insert(Modifiers::CTRL),
                "alt" | "mod1" => modifiers.insert(Modifiers::ALT),
                "super" | "mod4" | "logo" | "win" => modifiers.insert(Modifiers::SUPER),
                _ => key_part = Some(part),
            }
        }

        let key = match key_part {
            Some(k) => Keysym::from_name(k)?,
            None => return Err(InputError::Binding(s.to_string())),
        };

        Ok(Self { modifiers, key })
    }
}

/// Command bound to a chord.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Terminate the session and exit the dispatch loop.
    Quit,
    /// Focus the window behind the front one; the old front goes to
    /// the back of the stack.
    CycleFocus,
    /// Launch a detached child process.
    Spawn(String),
}

impl Command {
    /// Parse a command string as written in config files.
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let s = s.trim();
        let (cmd, args) = match s.split_once(' ') {
            Some((cmd, args)) => (cmd, args.trim()),
            None => (s, ""),
        };

        match cmd.to_lowercase().as_str() {
            "quit" | "exit" => Ok(Self::Quit),
            "cycle-focus" | "cycle_focus" => Ok(Self::CycleFocus),
            "spawn" | "exec" if !args.is_empty() => Ok(Self::Spawn(args.to_string())),
            _ => Err(InputError::Command(s.to_string())),
        }
    }
}

/// The keybinding router: a chord table consulted on every key press.
#[derive(Debug, Default)]
pub struct Keybindings {
    bindings: HashMap<KeyBinding, Command>,
}

impl Keybindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, binding: KeyBinding, command: Command) {
        self.bindings.insert(binding, command);
    }

    /// Looks up the command for a chord. Lock modifiers are ignored,
    /// everything else must match the binding exactly.
    pub fn resolve(&self, modifiers: Modifiers, key: Keysym) -> Option<&Command> {
        let chord = KeyBinding::new(modifiers.difference(Modifiers::LOCKS), key);
        self.bindings.get(&chord)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
