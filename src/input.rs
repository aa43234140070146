//! Input state tracking for the demo window.
//!
//! Wraps raw winit window events into per-frame queries: instantaneous
//! (just pressed / just released this frame) and continuous (held). The
//! frame driver passes this state explicitly to whatever wants it — the
//! simulation core never reaches for a global input object.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::PhysicalKey;

pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;

/// Keyboard and mouse state, rebuilt from window events each frame.
///
/// Call [`handle_event`](Self::handle_event) for every window event and
/// [`begin_frame`](Self::begin_frame) once per frame after consuming the
/// state.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,

    buttons_held: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,

    mouse_position: Vec2,
    mouse_delta: Vec2,
    scroll_delta: f32,
    has_cursor_sample: bool,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key went down this frame (no auto-repeat).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Key is currently down.
    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Key went up this frame.
    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Either shift key is currently down.
    pub fn shift_held(&self) -> bool {
        self.key_held(KeyCode::ShiftLeft) || self.key_held(KeyCode::ShiftRight)
    }

    /// Mouse button went down this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    /// Mouse button is currently down.
    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.buttons_held.contains(&button)
    }

    /// Cursor position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Cursor movement accumulated since the last `begin_frame`.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll accumulated since the last `begin_frame`; positive is up.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Clear per-frame state. Call once per frame, after reading.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Fold one winit window event into the tracked state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !self.keys_held.contains(&key) {
                                self.keys_pressed.insert(key);
                            }
                            self.keys_held.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_held.remove(&key);
                            self.keys_released.insert(key);
                        }
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    self.buttons_pressed.insert(*button);
                    self.buttons_held.insert(*button);
                }
                ElementState::Released => {
                    self.buttons_held.remove(button);
                }
            },

            WindowEvent::CursorMoved { position, .. } => {
                let new_pos = Vec2::new(position.x as f32, position.y as f32);
                if self.has_cursor_sample {
                    self.mouse_delta += new_pos - self.mouse_position;
                }
                self.mouse_position = new_pos;
                self.has_cursor_sample = true;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    winit::event::MouseScrollDelta::LineDelta(_, y) => *y,
                    winit::event::MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_pressed_cleared_by_begin_frame() {
        let mut input = Input::new();

        input.keys_pressed.insert(KeyCode::Space);
        input.keys_held.insert(KeyCode::Space);

        assert!(input.key_pressed(KeyCode::Space));
        assert!(input.key_held(KeyCode::Space));

        input.begin_frame();
        assert!(!input.key_pressed(KeyCode::Space));
        assert!(input.key_held(KeyCode::Space));
    }

    #[test]
    fn test_shift_held_covers_both_keys() {
        let mut input = Input::new();
        assert!(!input.shift_held());
        input.keys_held.insert(KeyCode::ShiftRight);
        assert!(input.shift_held());
    }

    #[test]
    fn test_mouse_delta_accumulates_within_frame() {
        let mut input = Input::new();
        input.mouse_position = Vec2::new(10.0, 10.0);
        input.has_cursor_sample = true;

        input.mouse_delta += Vec2::new(5.0, 0.0);
        input.mouse_delta += Vec2::new(3.0, 2.0);
        assert_eq!(input.mouse_delta(), Vec2::new(8.0, 2.0));

        input.begin_frame();
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
    }
}
