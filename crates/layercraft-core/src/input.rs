//! Pointer and keyboard events delivered by the host.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Pointer event in screen coordinates relative to the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PointerEvent {
    Down {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
        #[serde(default)]
        button: MouseButton,
    },
    /// The pointer left the editing surface.
    Leave,
    Wheel {
        position: Point,
        delta: Vec2,
    },
}

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    /// Held for a momentary pan.
    Space,
    /// Discards the crop box while cropping.
    Escape,
    #[serde(other)]
    Other,
}

/// Keyboard event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Tracks the input state that persists between events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Last known pointer position in screen coordinates.
    pub pointer_position: Point,
    pressed_buttons: HashSet<MouseButton>,
    pressed_keys: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match *event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.insert(button);
            }
            PointerEvent::Move { position } | PointerEvent::Wheel { position, .. } => {
                self.pointer_position = position;
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = position;
                self.pressed_buttons.remove(&button);
            }
            PointerEvent::Leave => {
                self.pressed_buttons.clear();
            }
        }
    }

    /// Process a key event.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        match *event {
            KeyEvent::Pressed(key) => {
                self.pressed_keys.insert(key);
            }
            KeyEvent::Released(key) => {
                self.pressed_keys.remove(&key);
            }
        }
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    /// Space turns any tool into a momentary pan.
    pub fn pan_override(&self) -> bool {
        self.is_key_pressed(Key::Space)
    }
}
