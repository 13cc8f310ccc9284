use std::collections::HashMap;

use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Lifecycle of a mouse button across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Unpressed,
    /// Went down this frame and nobody has claimed it yet.
    Pressed,
    /// Went down this frame and a widget already acted on it.
    PressedTaken,
    Held,
}

impl ButtonState {
    pub fn is_down(self) -> bool {
        !matches!(self, ButtonState::Unpressed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Middle, MouseButton::Right];

    fn index(self) -> usize {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Grave,
    Backspace,
    Enter,
    Escape,
    Tab,
    Left,
    Right,
    Up,
    Down,
}

impl Key {
    fn from_code(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::Backquote => Key::Grave,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
            KeyCode::Escape => Key::Escape,
            KeyCode::Tab => Key::Tab,
            KeyCode::ArrowLeft => Key::Left,
            KeyCode::ArrowRight => Key::Right,
            KeyCode::ArrowUp => Key::Up,
            KeyCode::ArrowDown => Key::Down,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// Went down this frame (also set again by key repeat).
    Pressed,
    Held,
}

/// Per-frame snapshot of mouse, keyboard and text input shared by every
/// widget in the input phase.
///
/// Window events are folded in as they arrive; [`advance_frame`] runs once at
/// the end of each frame and ages the edge states.
///
/// [`advance_frame`]: InputState::advance_frame
#[derive(Debug, Default)]
pub struct InputState {
    mouse: (i32, i32),
    buttons: [ButtonState; 3],
    keys: HashMap<Key, KeyState>,
    wheel: f32,
    text: String,
    queued_clicks: Vec<MouseButton>,
    simulated: Vec<MouseButton>,
    queued_text: String,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mouse_position(&self) -> (i32, i32) {
        self.mouse
    }

    pub fn set_mouse_position(&mut self, x: i32, y: i32) {
        self.mouse = (x, y);
    }

    pub fn button(&self, button: MouseButton) -> ButtonState {
        self.buttons[button.index()]
    }

    pub fn set_button(&mut self, button: MouseButton, state: ButtonState) {
        self.buttons[button.index()] = state;
    }

    /// Whether `button` went down this frame and is still unclaimed.
    pub fn pressed(&self, button: MouseButton) -> bool {
        self.button(button) == ButtonState::Pressed
    }

    /// Claims a fresh press. Returns false if there was none to claim.
    pub fn take_button(&mut self, button: MouseButton) -> bool {
        if self.pressed(button) {
            self.set_button(button, ButtonState::PressedTaken);
            true
        } else {
            false
        }
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.button(button).is_down()
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys.get(&key) == Some(&KeyState::Pressed)
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys.contains_key(&key)
    }

    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            self.keys.insert(key, KeyState::Pressed);
        } else {
            self.keys.remove(&key);
        }
    }

    /// Wheel movement this frame in lines, positive away from the user.
    pub fn wheel(&self) -> f32 {
        self.wheel
    }

    pub fn add_wheel(&mut self, lines: f32) {
        self.wheel += lines;
    }

    /// Text typed this frame.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Presses `button` at the start of the next frame and releases it one
    /// frame later.
    pub fn simulate_click(&mut self, button: MouseButton) {
        self.queued_clicks.push(button);
    }

    /// Delivers `text` as typed input on the next frame.
    pub fn queue_text(&mut self, text: &str) {
        self.queued_text.push_str(text);
    }

    /// Ages this frame's edges: fresh presses become held, text and wheel are
    /// cleared. Queued simulated input is applied for the coming frame.
    pub fn advance_frame(&mut self) {
        for state in &mut self.buttons {
            if matches!(*state, ButtonState::Pressed | ButtonState::PressedTaken) {
                *state = ButtonState::Held;
            }
        }
        for state in self.keys.values_mut() {
            *state = KeyState::Held;
        }
        self.wheel = 0.0;
        self.text.clear();

        for button in std::mem::take(&mut self.simulated) {
            self.set_button(button, ButtonState::Unpressed);
        }
        for button in std::mem::take(&mut self.queued_clicks) {
            self.set_button(button, ButtonState::Pressed);
            self.simulated.push(button);
        }
        if !self.queued_text.is_empty() {
            self.text = std::mem::take(&mut self.queued_text);
        }
    }

    /// Folds one winit window event into the snapshot.
    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.mouse = (position.x as i32, position.y as i32);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    _ => return,
                };
                let next = match state {
                    ElementState::Pressed => ButtonState::Pressed,
                    ElementState::Released => ButtonState::Unpressed,
                };
                self.set_button(button, next);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.wheel += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 20.0,
                };
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(key) = Key::from_code(code) {
                        if pressed && (event.repeat || !self.key_down(key)) {
                            self.set_key(key, true);
                        } else if !pressed {
                            self.set_key(key, false);
                        }
                    }
                }
                if pressed {
                    if let Some(text) = event.text.as_deref() {
                        self.text
                            .extend(text.chars().filter(|c| !c.is_control()));
                    }
                }
            }
            _ => {}
        }
    }
}
