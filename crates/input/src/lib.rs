//! Per-frame input state and the player command derived from it.
//!
//! Device polling belongs to the host. It feeds raw key, button, motion and
//! wheel events into [`InputState`]; the simulation only ever sees the
//! [`PlayerCommand`] built from it.

use glam::Vec2;
use std::collections::HashSet;

/// Keys the arena binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    KeyW,
    KeyA,
    KeyS,
    KeyD,
    KeyQ,
    KeyE,
    Space,
    ShiftLeft,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Pressed,
    Released,
}

/// What the player asked for this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerCommand {
    /// x: strafe right, y: forward. Length at most 1.
    pub move_axis: Vec2,
    /// x: yaw change, y: pitch change, in radians.
    pub look_delta: Vec2,
    pub fire: bool,
    pub jump: bool,
    /// Weapon slots to advance; negative cycles backwards.
    pub weapon_cycle: i32,
}

impl PlayerCommand {
    pub fn idle() -> Self {
        Self::default()
    }
}

/// Manages input state for the current frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Keys pressed this frame.
    keys_pressed: HashSet<KeyCode>,

    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,
    /// Mouse buttons pressed this frame.
    mouse_pressed: HashSet<MouseButton>,

    /// Mouse movement delta this frame.
    mouse_delta: Vec2,
    /// Accumulated mouse delta since the last frame boundary.
    accumulated_delta: Vec2,

    /// Wheel notches this frame.
    wheel: f32,
    accumulated_wheel: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.mouse_delta = self.accumulated_delta;
        self.accumulated_delta = Vec2::ZERO;
        self.wheel = self.accumulated_wheel;
        self.accumulated_wheel = 0.0;
    }

    /// Process a keyboard event.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Process a mouse button event.
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.mouse_held.contains(&button) {
                    self.mouse_pressed.insert(button);
                }
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    /// Process mouse movement.
    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.accumulated_delta.x += delta.0 as f32;
        self.accumulated_delta.y += delta.1 as f32;
    }

    pub fn process_wheel(&mut self, notches: f32) {
        self.accumulated_wheel += notches;
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    /// Get the mouse movement delta for this frame.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Get movement input as a normalized vector (WASD).
    pub fn get_movement_input(&self) -> Vec2 {
        let mut movement = Vec2::ZERO;

        if self.is_key_held(KeyCode::KeyW) {
            movement.y += 1.0;
        }
        if self.is_key_held(KeyCode::KeyS) {
            movement.y -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyA) {
            movement.x -= 1.0;
        }
        if self.is_key_held(KeyCode::KeyD) {
            movement.x += 1.0;
        }

        movement.normalize_or_zero()
    }

    /// Build this frame's command. `sensitivity` maps mouse counts to radians;
    /// moving the mouse up pitches the view up.
    pub fn command(&self, sensitivity: f32) -> PlayerCommand {
        let mut weapon_cycle = self.wheel.round() as i32;
        if self.is_key_pressed(KeyCode::KeyE) {
            weapon_cycle += 1;
        }
        if self.is_key_pressed(KeyCode::KeyQ) {
            weapon_cycle -= 1;
        }
        PlayerCommand {
            move_axis: self.get_movement_input(),
            look_delta: Vec2::new(self.mouse_delta.x, -self.mouse_delta.y) * sensitivity,
            fire: self.is_mouse_held(MouseButton::Left),
            jump: self.is_key_pressed(KeyCode::Space),
            weapon_cycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_only_lasts_one_frame() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        assert!(input.command(1.0).jump);
        input.begin_frame();
        assert!(input.is_key_held(KeyCode::Space));
        assert!(!input.command(1.0).jump);
    }

    #[test]
    fn diagonal_movement_is_normalised() {
        let mut input = InputState::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyD, ElementState::Pressed);
        let axis = input.command(1.0).move_axis;
        assert!((axis.length() - 1.0).abs() < 1e-6);
        assert!(axis.x > 0.0 && axis.y > 0.0);
    }

    #[test]
    fn motion_and_wheel_are_latched_at_frame_start() {
        let mut input = InputState::new();
        input.process_mouse_motion((10.0, 4.0));
        input.process_wheel(-1.0);
        assert_eq!(input.command(0.01).look_delta, Vec2::ZERO);
        input.begin_frame();
        let cmd = input.command(0.01);
        assert!((cmd.look_delta - Vec2::new(0.1, -0.04)).length() < 1e-6);
        assert_eq!(cmd.weapon_cycle, -1);
    }

    #[test]
    fn fire_follows_left_button() {
        let mut input = InputState::new();
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.command(1.0).fire);
        input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert!(!input.command(1.0).fire);
    }
}
