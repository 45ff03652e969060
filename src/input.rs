use raylib::prelude::*;

use crate::sequencer::Trigger;

/// Input for one frame, with pointer positions in framebuffer coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Wheel(f32), // page-style delta: positive scrolls down
    Click(Vector2),
    Next,
    Previous,
    ToggleMenu,
    CloseMenu,
    Digit(u32),
}

const DIGIT_KEYS: [(KeyboardKey, u32); 9] = [
    (KeyboardKey::KEY_ONE, 1),
    (KeyboardKey::KEY_TWO, 2),
    (KeyboardKey::KEY_THREE, 3),
    (KeyboardKey::KEY_FOUR, 4),
    (KeyboardKey::KEY_FIVE, 5),
    (KeyboardKey::KEY_SIX, 6),
    (KeyboardKey::KEY_SEVEN, 7),
    (KeyboardKey::KEY_EIGHT, 8),
    (KeyboardKey::KEY_NINE, 9),
];

/// Maps a window position onto the fixed-size framebuffer.
pub fn to_framebuffer(pos: Vector2, screen: (f32, f32), framebuffer: (f32, f32)) -> Vector2 {
    Vector2::new(
        pos.x * framebuffer.0 / screen.0.max(1.0),
        pos.y * framebuffer.1 / screen.1.max(1.0),
    )
}

pub fn collect(rl: &RaylibHandle, framebuffer: (f32, f32)) -> Vec<InputEvent> {
    let mut events = Vec::new();

    // raylib reports wheel-up as positive
    let wheel = rl.get_mouse_wheel_move();
    if wheel != 0.0 {
        events.push(InputEvent::Wheel(-wheel));
    }
    if rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT) {
        let screen = (rl.get_screen_width() as f32, rl.get_screen_height() as f32);
        events.push(InputEvent::Click(to_framebuffer(rl.get_mouse_position(), screen, framebuffer)));
    }
    if rl.is_key_pressed(KeyboardKey::KEY_RIGHT) || rl.is_key_pressed(KeyboardKey::KEY_DOWN) {
        events.push(InputEvent::Next);
    }
    if rl.is_key_pressed(KeyboardKey::KEY_LEFT) || rl.is_key_pressed(KeyboardKey::KEY_UP) {
        events.push(InputEvent::Previous);
    }
    if rl.is_key_pressed(KeyboardKey::KEY_M) {
        events.push(InputEvent::ToggleMenu);
    }
    if rl.is_key_pressed(KeyboardKey::KEY_BACKSPACE) {
        events.push(InputEvent::CloseMenu);
    }
    for (key, digit) in DIGIT_KEYS {
        if rl.is_key_pressed(key) {
            events.push(InputEvent::Digit(digit));
        }
    }
    events
}

/// Collapses a burst of wheel events into one step once the wheel goes quiet.
#[derive(Debug, Clone)]
pub struct WheelDebouncer {
    quiet: f32,
    timer: Option<f32>,
    direction: i32,
}

impl WheelDebouncer {
    pub fn new(quiet: f32) -> Self {
        Self { quiet: quiet.max(0.0), timer: None, direction: 0 }
    }

    /// Feeds a wheel delta. Positive deltas scroll down the page, i.e. towards the next slide.
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y == 0.0 {
            return;
        }
        self.direction = if delta_y > 0.0 { 1 } else { -1 };
        self.timer = Some(self.quiet);
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    pub fn update(&mut self, dt: f32) -> Option<Trigger> {
        let remaining = self.timer.as_mut()?;
        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        self.timer = None;
        Some(Trigger::Step(self.direction))
    }
}

/// A jump scheduled to fire after the menu finishes closing.
#[derive(Debug, Clone, Default)]
pub struct DelayedGoto {
    pending: Option<(usize, f32)>,
}

impl DelayedGoto {
    pub fn schedule(&mut self, index: usize, delay: f32) {
        self.pending = Some((index, delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn update(&mut self, dt: f32) -> Option<Trigger> {
        let (index, remaining) = self.pending.as_mut()?;
        *remaining -= dt;
        if *remaining > 0.0 {
            return None;
        }
        let index = *index;
        self.pending = None;
        Some(Trigger::Goto(index))
    }
}

/// Steps to the next slide once the slider has sat idle for the interval.
#[derive(Debug, Clone, Default)]
pub struct Autoplay {
    interval: Option<f32>,
    idle: f32,
}

impl Autoplay {
    pub fn new(interval: Option<f32>) -> Self {
        Self { interval, idle: 0.0 }
    }

    /// Idle time only accumulates while `settled`.
    pub fn update(&mut self, dt: f32, settled: bool) -> Option<Trigger> {
        let interval = self.interval?;
        if !settled {
            return None;
        }
        self.idle += dt;
        (self.idle >= interval).then_some(Trigger::Step(1))
    }

    pub fn reset(&mut self) {
        self.idle = 0.0;
    }
}

/// Digit keys 1-9 jump straight to a slide.
pub fn digit_target(digit: u32, slide_count: usize) -> Option<usize> {
    let index = (digit as usize).checked_sub(1)?;
    (digit <= 9 && index < slide_count).then_some(index)
}
