#[cfg(target_arch = "wasm32")]
pub mod wasm;

use std::collections::HashSet;

use glam::Vec2;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// A letter key, stored upper-case so `w` and `W` (shift held) are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(char);

impl KeyCode {
    pub const W: Self = Self('W');
    pub const A: Self = Self('A');
    pub const S: Self = Self('S');
    pub const D: Self = Self('D');

    /// Maps a `KeyboardEvent.key` value or a command-line name to a key.
    /// Only single ASCII letters are tracked.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) if ch.is_ascii_alphabetic() => Some(Self(ch.to_ascii_uppercase())),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        self.0
    }
}

/// DOM mouse button number (`MouseEvent.button`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(i16);

impl MouseButton {
    /// Primary button; dragging with it orbits the camera.
    pub const LEFT: Self = Self(0);

    pub fn from_dom(button: i16) -> Self {
        Self(button)
    }
}

#[derive(Debug, Default)]
struct Pointer {
    position: Vec2,
    buttons: HashSet<MouseButton>,
    drag: Vec2,
    wheel: f32,
}

/// Input written by host event listeners and read by simulation steps.
///
/// Keys are level-triggered: a step sees whatever is held at that moment.
/// Pointer drag and wheel motion are accumulated between steps and consumed
/// with [`InputState::take_drag`] / [`InputState::take_wheel`].
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    pointer: Mutex<Pointer>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn release_key(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn press_button(&self, button: MouseButton) {
        self.pointer.lock().buttons.insert(button);
    }

    pub fn release_button(&self, button: MouseButton) {
        self.pointer.lock().buttons.remove(&button);
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.pointer.lock().buttons.contains(&button)
    }

    /// Records a pointer move. Movement while the left button is held counts as a drag.
    pub fn move_pointer(&self, position: Vec2) {
        let mut guard = self.pointer.lock();
        let pointer = &mut *guard;
        let last = std::mem::replace(&mut pointer.position, position);
        if pointer.buttons.contains(&MouseButton::LEFT) {
            pointer.drag += position - last;
        }
    }

    pub fn pointer_position(&self) -> Vec2 {
        self.pointer.lock().position
    }

    pub fn scroll(&self, delta: f32) {
        self.pointer.lock().wheel += delta;
    }

    pub fn take_drag(&self) -> Vec2 {
        std::mem::take(&mut self.pointer.lock().drag)
    }

    pub fn take_wheel(&self) -> f32 {
        std::mem::take(&mut self.pointer.lock().wheel)
    }

    /// Forgets every held key and button, e.g. when the window loses focus.
    pub fn release_all(&self) {
        self.keys.write().clear();
        self.pointer.lock().buttons.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_fold_case() {
        assert_eq!(KeyCode::from_name("w"), Some(KeyCode::W));
        assert_eq!(KeyCode::from_name("D"), Some(KeyCode::D));
        assert_eq!(KeyCode::from_name("q").map(KeyCode::letter), Some('Q'));
        assert_eq!(KeyCode::from_name("ArrowUp"), None);
        assert_eq!(KeyCode::from_name("7"), None);
        assert_eq!(KeyCode::from_name(""), None);
    }

    #[test]
    fn held_keys_are_level_triggered() {
        let input = InputState::new();
        input.press_key(KeyCode::D);
        input.press_key(KeyCode::D);
        assert!(input.is_pressed(KeyCode::D));
        input.release_key(KeyCode::D);
        assert!(!input.is_pressed(KeyCode::D));
    }

    #[test]
    fn drag_accumulates_only_while_left_button_held() {
        let input = InputState::new();
        input.move_pointer(Vec2::new(10.0, 10.0));
        input.move_pointer(Vec2::new(20.0, 10.0));
        assert_eq!(input.take_drag(), Vec2::ZERO);

        input.press_button(MouseButton::LEFT);
        input.move_pointer(Vec2::new(25.0, 4.0));
        input.move_pointer(Vec2::new(30.0, 4.0));
        assert_eq!(input.take_drag(), Vec2::new(10.0, -6.0));
        assert_eq!(input.take_drag(), Vec2::ZERO);
        assert_eq!(input.pointer_position(), Vec2::new(30.0, 4.0));

        input.press_button(MouseButton::from_dom(2));
        input.release_all();
        assert!(!input.is_button_down(MouseButton::LEFT));
        input.move_pointer(Vec2::new(40.0, 4.0));
        assert_eq!(input.take_drag(), Vec2::ZERO);
    }

    #[test]
    fn wheel_is_consumed_once() {
        let input = InputState::new();
        input.scroll(1.5);
        input.scroll(-0.5);
        assert_eq!(input.take_wheel(), 1.0);
        assert_eq!(input.take_wheel(), 0.0);
    }
}
