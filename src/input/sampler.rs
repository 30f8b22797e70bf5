//! Input sampler
//!
//! Keeps the latest pointer, scroll and touch readings of one viewer in
//! normalized device space. Values are raw: no smoothing happens here.

use cgmath::Vector2;

use super::events::InputEvent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub position: Vector2<f32>,
    pub active: bool,
}

impl Default for TouchSample {
    fn default() -> Self {
        Self {
            position: Vector2::new(0.0, 0.0),
            active: false,
        }
    }
}

/// Snapshot read by the integrator each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledInput {
    /// Pointer in [-1, 1] on both axes, +y up.
    pub pointer: Vector2<f32>,
    pub scroll: Option<f32>,
    pub touch: TouchSample,
}

impl Default for SampledInput {
    fn default() -> Self {
        Self {
            pointer: Vector2::new(0.0, 0.0),
            scroll: None,
            touch: TouchSample::default(),
        }
    }
}

/// Maps a pixel position inside a `width` x `height` viewport to [-1, 1]².
pub fn normalize_to_viewport(x: f32, y: f32, width: f32, height: f32) -> Option<Vector2<f32>> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Vector2::new(
        (x / width) * 2.0 - 1.0,
        -((y / height) * 2.0 - 1.0),
    ))
}

#[derive(Debug, Clone)]
pub struct InputSampler {
    sample: SampledInput,
    viewport: (f32, f32),
    /// Touch points currently down, oldest first.
    touches: Vec<(u64, Vector2<f32>)>,
}

impl InputSampler {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            sample: SampledInput::default(),
            viewport: (viewport_width, viewport_height),
            touches: Vec::new(),
        }
    }

    pub fn sample(&self) -> SampledInput {
        self.sample
    }

    pub fn viewport(&self) -> (f32, f32) {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = (width, height);
    }

    pub fn set_scroll(&mut self, scroll: Option<f32>) {
        self.sample.scroll = scroll;
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some(p) = self.normalize(x, y) {
            self.sample.pointer = p;
        }
    }

    pub fn touch_started(&mut self, id: u64, x: f32, y: f32) {
        let Some(p) = self.normalize(x, y) else {
            return;
        };
        match self.touches.iter_mut().find(|(t, _)| *t == id) {
            Some(entry) => entry.1 = p,
            None => self.touches.push((id, p)),
        }
        self.refresh_touch();
    }

    pub fn touch_moved(&mut self, id: u64, x: f32, y: f32) {
        let Some(p) = self.normalize(x, y) else {
            return;
        };
        if let Some(entry) = self.touches.iter_mut().find(|(t, _)| *t == id) {
            entry.1 = p;
            self.refresh_touch();
        }
    }

    /// Releases a touch point. The last coordinates are kept; the sample
    /// only goes inactive once no touch point remains down.
    pub fn touch_ended(&mut self, id: u64) {
        self.touches.retain(|(t, _)| *t != id);
        if self.touches.is_empty() {
            self.sample.touch.active = false;
        }
    }

    /// Feeds one translated event. Events the sampler does not track are ignored.
    pub fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::PointerMoved { x, y } => self.pointer_moved(x, y),
            InputEvent::TouchStarted { id, x, y } => self.touch_started(id, x, y),
            InputEvent::TouchMoved { id, x, y } => self.touch_moved(id, x, y),
            InputEvent::TouchEnded { id } => self.touch_ended(id),
            InputEvent::ViewportResized { width, height } => self.set_viewport(width, height),
            InputEvent::Click { .. } | InputEvent::Wheel { .. } => {}
        }
    }

    fn refresh_touch(&mut self) {
        if let Some((_, p)) = self.touches.first() {
            self.sample.touch = TouchSample {
                position: *p,
                active: true,
            };
        }
    }

    fn normalize(&self, x: f32, y: f32) -> Option<Vector2<f32>> {
        normalize_to_viewport(x, y, self.viewport.0, self.viewport.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_starts_centered() {
        let sampler = InputSampler::new(800.0, 600.0);
        assert_eq!(sampler.sample().pointer, Vector2::new(0.0, 0.0));
        assert_eq!(sampler.sample().scroll, None);
        assert!(!sampler.sample().touch.active);
    }

    #[test]
    fn test_pointer_normalization() {
        let mut sampler = InputSampler::new(800.0, 600.0);
        sampler.pointer_moved(0.0, 0.0);
        assert_eq!(sampler.sample().pointer, Vector2::new(-1.0, 1.0));
        sampler.pointer_moved(800.0, 600.0);
        assert_eq!(sampler.sample().pointer, Vector2::new(1.0, -1.0));
        sampler.pointer_moved(400.0, 150.0);
        assert_eq!(sampler.sample().pointer, Vector2::new(0.0, 0.5));
    }

    #[test]
    fn test_zero_viewport_ignores_motion() {
        let mut sampler = InputSampler::new(0.0, 0.0);
        sampler.pointer_moved(10.0, 10.0);
        assert_eq!(sampler.sample().pointer, Vector2::new(0.0, 0.0));
    }

    #[test]
    fn test_touch_uses_first_point_and_keeps_coordinates_on_end() {
        let mut sampler = InputSampler::new(100.0, 100.0);
        sampler.touch_started(7, 25.0, 25.0);
        sampler.touch_started(9, 100.0, 100.0);
        let touch = sampler.sample().touch;
        assert!(touch.active);
        assert_eq!(touch.position, Vector2::new(-0.5, 0.5));

        sampler.touch_moved(9, 0.0, 0.0);
        assert_eq!(sampler.sample().touch.position, Vector2::new(-0.5, 0.5));

        sampler.touch_ended(7);
        assert!(sampler.sample().touch.active);

        sampler.touch_ended(9);
        let touch = sampler.sample().touch;
        assert!(!touch.active);
        assert_eq!(touch.position, Vector2::new(-0.5, 0.5));
    }

    #[test]
    fn test_touch_does_not_move_pointer() {
        let mut sampler = InputSampler::new(100.0, 100.0);
        sampler.handle(&InputEvent::TouchStarted { id: 1, x: 0.0, y: 0.0 });
        assert_eq!(sampler.sample().pointer, Vector2::new(0.0, 0.0));
    }
}
