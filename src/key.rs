//! Key bindings.
//!
//! A [`Binding`] is a set of key presses sharing one action, plus the short
//! help text a help view would show for it.
//!
//! ```rust
//! use bubbletea_scrollback::key::Binding;
//! use bubbletea_rs::KeyMsg;
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let bottom = Binding::new(vec![KeyCode::End, KeyCode::Char('G')]).with_help("G/end", "bottom");
//! let msg = KeyMsg { key: KeyCode::Char('G'), modifiers: KeyModifiers::NONE };
//! assert!(bottom.matches(&msg));
//! ```

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A key code with its required modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key.
    pub code: KeyCode,
    /// Modifiers that must be held.
    pub modifiers: KeyModifiers,
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }
}

impl From<(KeyCode, KeyModifiers)> for KeyPress {
    fn from((code, modifiers): (KeyCode, KeyModifiers)) -> Self {
        Self { code, modifiers }
    }
}

/// Help text for a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// Key legend, e.g. `"↑/k"`.
    pub key: String,
    /// What the binding does.
    pub desc: String,
}

/// Key presses bound to one action.
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    enabled: bool,
}

impl Binding {
    /// Creates a binding from anything convertible to [`KeyPress`].
    pub fn new<K: Into<KeyPress>>(keys: Vec<K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            help: Help::default(),
            enabled: true,
        }
    }

    /// Sets the help legend and description.
    pub fn with_help(mut self, key: impl Into<String>, desc: impl Into<String>) -> Self {
        self.help = Help {
            key: key.into(),
            desc: desc.into(),
        };
        self
    }

    /// Enables or disables the binding.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether the binding is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Bound key presses.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// Help text.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// Whether `msg` triggers this binding.
    ///
    /// Shift is ignored for character keys since the character already
    /// carries it.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        if !self.enabled {
            return false;
        }
        self.keys.iter().any(|press| {
            if press.code != msg.key {
                return false;
            }
            let mut held = msg.modifiers;
            if matches!(msg.key, KeyCode::Char(_)) {
                held.remove(KeyModifiers::SHIFT);
            }
            held == press.modifiers
        })
    }
}

/// Components that expose their bindings for help views.
pub trait KeyMap {
    /// Bindings for a one-line help view.
    fn short_help(&self) -> Vec<&Binding>;

    /// Bindings grouped into columns for an expanded help view.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}
