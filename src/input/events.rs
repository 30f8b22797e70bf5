//! Window-independent input events and their translation from winit

use std::collections::HashMap;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

/// Maximum travel, in physical pixels, for a touch to still count as a tap.
pub const TAP_SLOP_PX: f32 = 10.0;

/// Pixel height of one wheel "line" when a device reports pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMoved { x: f32, y: f32 },
    TouchStarted { id: u64, x: f32, y: f32 },
    TouchMoved { id: u64, x: f32, y: f32 },
    TouchEnded { id: u64 },
    /// Primary click or tap at a window position.
    Click { x: f32, y: f32 },
    /// Wheel motion in lines, positive away from the user.
    Wheel { delta: f32 },
    ViewportResized { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Pointer,
    Touch,
    Click,
    Wheel,
    Resize,
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::PointerMoved { .. } => EventKind::Pointer,
            InputEvent::TouchStarted { .. }
            | InputEvent::TouchMoved { .. }
            | InputEvent::TouchEnded { .. } => EventKind::Touch,
            InputEvent::Click { .. } => EventKind::Click,
            InputEvent::Wheel { .. } => EventKind::Wheel,
            InputEvent::ViewportResized { .. } => EventKind::Resize,
        }
    }
}

/// Stateful translator from winit window events.
///
/// Tracks the cursor so button releases can be reported as positioned clicks,
/// and touch origins so short touches can be reported as taps.
#[derive(Debug, Default)]
pub struct WinitTranslator {
    cursor: Option<(f32, f32)>,
    pressed: bool,
    touch_origins: HashMap<u64, (f32, f32)>,
}

impl WinitTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Vec<InputEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32)
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.pressed = false;
                Vec::new()
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.primary_button(*state == ElementState::Pressed),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                vec![InputEvent::Wheel { delta: lines }]
            }
            WindowEvent::Touch(touch) => self.touch(
                touch.phase,
                touch.id,
                touch.location.x as f32,
                touch.location.y as f32,
            ),
            WindowEvent::Resized(size) => vec![InputEvent::ViewportResized {
                width: size.width as f32,
                height: size.height as f32,
            }],
            _ => Vec::new(),
        }
    }

    pub fn cursor_moved(&mut self, x: f32, y: f32) -> Vec<InputEvent> {
        self.cursor = Some((x, y));
        vec![InputEvent::PointerMoved { x, y }]
    }

    pub fn primary_button(&mut self, pressed: bool) -> Vec<InputEvent> {
        if pressed {
            self.pressed = true;
            return Vec::new();
        }
        let was_pressed = std::mem::replace(&mut self.pressed, false);
        match (was_pressed, self.cursor) {
            (true, Some((x, y))) => vec![InputEvent::Click { x, y }],
            _ => Vec::new(),
        }
    }

    pub fn touch(&mut self, phase: TouchPhase, id: u64, x: f32, y: f32) -> Vec<InputEvent> {
        match phase {
            TouchPhase::Started => {
                self.touch_origins.insert(id, (x, y));
                vec![InputEvent::TouchStarted { id, x, y }]
            }
            TouchPhase::Moved => vec![InputEvent::TouchMoved { id, x, y }],
            TouchPhase::Ended => {
                let mut events = vec![InputEvent::TouchEnded { id }];
                if let Some((ox, oy)) = self.touch_origins.remove(&id) {
                    if (x - ox).hypot(y - oy) <= TAP_SLOP_PX {
                        events.push(InputEvent::Click { x, y });
                    }
                }
                events
            }
            TouchPhase::Cancelled => {
                self.touch_origins.remove(&id);
                vec![InputEvent::TouchEnded { id }]
            }
        }
    }
}
