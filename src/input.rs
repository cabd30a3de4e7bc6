//! Per-frame keyboard and mouse state.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Shared handle to the input tracker, cloned into every scene.
pub type InputHandle = Rc<RefCell<Input>>;

/// Tracks input state for keyboard and mouse.
#[derive(Default)]
pub struct Input {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    mouse_buttons_down: HashSet<MouseButton>,
    mouse_buttons_pressed: HashSet<MouseButton>,
    mouse_position: Vec2,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call at the end of each frame to reset per-frame state.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_buttons_pressed.clear();
    }

    /// Process a window event and update input state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    match event.state {
                        ElementState::Pressed => {
                            if !self.keys_down.contains(&key) {
                                self.keys_pressed.insert(key);
                            }
                            self.keys_down.insert(key);
                        }
                        ElementState::Released => {
                            self.keys_down.remove(&key);
                        }
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => match state {
                ElementState::Pressed => {
                    if !self.mouse_buttons_down.contains(button) {
                        self.mouse_buttons_pressed.insert(*button);
                    }
                    self.mouse_buttons_down.insert(*button);
                }
                ElementState::Released => {
                    self.mouse_buttons_down.remove(button);
                }
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse_position = Vec2::new(position.x as f32, position.y as f32);
            }
            _ => {}
        }
    }

    /// Returns true if the key is currently held down.
    pub fn key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the mouse button was pressed this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_buttons_pressed.contains(&button)
    }

    /// Returns true if the left mouse button was pressed this frame.
    pub fn clicked(&self) -> bool {
        self.mouse_pressed(MouseButton::Left)
    }

    /// Current mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Force key/button state for tests and headless hosts.
    #[doc(hidden)]
    pub fn press_key(&mut self, key: KeyCode) {
        self.keys_pressed.insert(key);
        self.keys_down.insert(key);
    }

    /// Force a left click at a position for tests and headless hosts.
    #[doc(hidden)]
    pub fn click_at(&mut self, position: Vec2) {
        self.mouse_position = position;
        self.mouse_buttons_pressed.insert(MouseButton::Left);
        self.mouse_buttons_down.insert(MouseButton::Left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_is_cleared_each_frame_but_down_persists() {
        let mut input = Input::new();
        input.press_key(KeyCode::Enter);
        assert!(input.key_pressed(KeyCode::Enter));
        assert!(input.key_down(KeyCode::Enter));

        input.begin_frame();
        assert!(!input.key_pressed(KeyCode::Enter));
        assert!(input.key_down(KeyCode::Enter));
    }

    #[test]
    fn click_reports_position() {
        let mut input = Input::new();
        input.click_at(Vec2::new(42.0, 7.0));
        assert!(input.clicked());
        assert_eq!(input.mouse_position(), Vec2::new(42.0, 7.0));
    }
}
