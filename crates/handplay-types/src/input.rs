//! Platform-agnostic key input types.
//!
//! Platforms report the held keys as a [`KeyBits`] mask once per frame. The
//! main loop compares it with the previous mask and turns every changed bit
//! into a [`Key`] transition for the current panel.

use serde::{Deserialize, Serialize};

/// Logical keys. The discriminant is the bit index in a [`KeyBits`] mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyCode {
    DpadLeft = 0,
    DpadRight,
    DpadUp,
    DpadDown,
    Square,
    Circle,
    Triangle,
    Cross,
    TriggerL,
    TriggerR,
    Start,
    Select,
    /// Confirm button; Circle or Cross depending on the regional setting.
    VirtualOk,
    /// Back button; the opposite of [`KeyCode::VirtualOk`].
    VirtualCancel,
}

impl KeyCode {
    /// Every key, in bit order.
    pub const ALL: [KeyCode; 14] = [
        KeyCode::DpadLeft,
        KeyCode::DpadRight,
        KeyCode::DpadUp,
        KeyCode::DpadDown,
        KeyCode::Square,
        KeyCode::Circle,
        KeyCode::Triangle,
        KeyCode::Cross,
        KeyCode::TriggerL,
        KeyCode::TriggerR,
        KeyCode::Start,
        KeyCode::Select,
        KeyCode::VirtualOk,
        KeyCode::VirtualCancel,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn from_index(index: usize) -> Option<KeyCode> {
        Self::ALL.get(index).copied()
    }
}

/// Direction of a key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    Down,
    Up,
}

/// A single key transition delivered to a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub state: KeyState,
}

impl Key {
    pub const fn down(code: KeyCode) -> Self {
        Self {
            code,
            state: KeyState::Down,
        }
    }

    pub const fn up(code: KeyCode) -> Self {
        Self {
            code,
            state: KeyState::Up,
        }
    }
}

/// Bitmask of held keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyBits(pub u32);

impl KeyBits {
    pub const NONE: KeyBits = KeyBits(0);

    pub const fn of(codes: &[KeyCode]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < codes.len() {
            bits |= codes[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, code: KeyCode) -> bool {
        self.0 & code.bit() != 0
    }

    /// True when every key held in `mask` is also held in `self`.
    pub const fn contains_all(self, mask: KeyBits) -> bool {
        self.0 & mask.0 == mask.0
    }

    pub fn insert(&mut self, code: KeyCode) {
        self.0 |= code.bit();
    }

    pub fn remove(&mut self, code: KeyCode) {
        self.0 &= !code.bit();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Key transitions that turn `self` into `next`, in bit order.
    pub fn transitions(self, next: KeyBits) -> impl Iterator<Item = Key> {
        let changed = self.0 ^ next.0;
        KeyCode::ALL
            .into_iter()
            .filter(move |code| changed & code.bit() != 0)
            .map(move |code| {
                if next.contains(code) {
                    Key::down(code)
                } else {
                    Key::up(code)
                }
            })
    }
}
