use glam::Vec2;

/// Mouse buttons the orbit camera distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

/// Raw mouse input in window pixel coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseEvent {
    Down { button: MouseButton, x: f32, y: f32 },
    Up { button: MouseButton, x: f32, y: f32 },
    /// Cursor moved to (x, y); (dx, dy) is the motion since the previous move.
    Move { x: f32, y: f32, dx: f32, dy: f32 },
    /// Scroll in notches. Positive scrolls toward the user, which zooms out.
    Wheel { delta: f32 },
    /// Cursor left the window.
    Leave,
}

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(id: u64, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

/// A touch event carrying every contact still on the screen afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
}

impl TouchEvent {
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>) -> Self {
        Self { phase, touches }
    }
}

/// Anything delivered through the [`InputBus`](crate::InputBus).
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Mouse(MouseEvent),
    Touch(TouchEvent),
}

impl From<MouseEvent> for InputEvent {
    fn from(e: MouseEvent) -> Self {
        InputEvent::Mouse(e)
    }
}

impl From<TouchEvent> for InputEvent {
    fn from(e: TouchEvent) -> Self {
        InputEvent::Touch(e)
    }
}
