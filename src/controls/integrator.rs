//! Per-tick smoothing of controlled transform scalars
//!
//! Every tick each control entry resolves its input, evaluates its mapping and
//! moves the addressed scalar a fixed fraction of the way toward the result.
//! The approach is state based: a skipped tick simply resumes from the last
//! value, there is no delta-time term.

use log::trace;

use super::table::{InputValue, TransformControl};
use super::target::InputSource;
use crate::gfx::scene::transform::Transform;
use crate::input::sampler::SampledInput;

/// Fraction of the remaining distance covered per tick.
pub const SMOOTHING_FACTOR: f32 = 0.1;

pub fn smooth_toward(current: f32, target: f32, alpha: f32) -> f32 {
    current + (target - current) * alpha
}

/// Resolves the live input for `source`, or `None` when the entry should be
/// skipped this tick.
pub fn resolve_input(source: InputSource, input: &SampledInput) -> Option<InputValue> {
    match source {
        InputSource::Pointer => Some(InputValue::Pointer(input.pointer)),
        InputSource::Scroll => input.scroll.map(InputValue::Scroll),
        InputSource::Touch if input.touch.active => Some(InputValue::Touch(input.touch)),
        InputSource::Touch | InputSource::None => None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    alpha: f32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self {
            alpha: SMOOTHING_FACTOR,
        }
    }
}

impl Integrator {
    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Applies every entry in list order and returns how many were applied.
    ///
    /// Entries addressing the same scalar are applied one after another, so
    /// the last one in the list has the final say.
    pub fn step(
        &self,
        controls: &[TransformControl],
        input: &SampledInput,
        transform: &mut Transform,
    ) -> usize {
        let mut applied = 0;
        for control in controls {
            let Some(value) = resolve_input(control.source, input) else {
                continue;
            };
            let target = control.evaluate(&value);
            let current = transform.component_mut(control.target);
            *current = smooth_toward(*current, target, self.alpha);
            applied += 1;
        }
        trace!("integrator applied {applied}/{} controls", controls.len());
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::target::TransformTarget;
    use crate::input::sampler::TouchSample;
    use cgmath::Vector2;

    fn target(s: &str) -> TransformTarget {
        s.parse().unwrap()
    }

    #[test]
    fn test_converges_geometrically_without_overshoot() {
        let controls = vec![TransformControl::constant(
            target("rotation.y"),
            InputSource::Pointer,
            2.0,
        )];
        let input = SampledInput::default();
        let mut transform = Transform::identity();
        let integrator = Integrator::default();

        let mut previous = 0.0;
        for n in 1..=60 {
            integrator.step(&controls, &input, &mut transform);
            let current = transform.rotation.y;
            let expected = 2.0 * (1.0 - (1.0 - SMOOTHING_FACTOR).powi(n));
            assert!((current - expected).abs() < 1e-4, "tick {n}: {current} vs {expected}");
            assert!(current >= previous);
            assert!(current <= 2.0);
            previous = current;
        }
    }

    #[test]
    fn test_inactive_touch_is_skipped() {
        let controls = vec![TransformControl::new(
            target("position.x"),
            InputSource::Touch,
            |v| match v {
                InputValue::Touch(t) => t.position.x * 10.0,
                _ => 0.0,
            },
        )];
        let input = SampledInput {
            touch: TouchSample {
                position: Vector2::new(0.8, 0.2),
                active: false,
            },
            ..SampledInput::default()
        };
        let mut transform = Transform::identity().with_position(0.5, 0.0, 0.0);

        for _ in 0..10 {
            assert_eq!(Integrator::default().step(&controls, &input, &mut transform), 0);
        }
        assert_eq!(transform.position.x, 0.5);
    }

    #[test]
    fn test_missing_scroll_leaves_value_untouched() {
        let controls = vec![TransformControl::new(
            target("scale.y"),
            InputSource::Scroll,
            |v| v.component(crate::controls::InputAxis::X),
        )];
        let mut transform = Transform::identity();
        Integrator::default().step(&controls, &SampledInput::default(), &mut transform);
        assert_eq!(transform.scale.y, 1.0);

        let input = SampledInput {
            scroll: Some(3.0),
            ..SampledInput::default()
        };
        Integrator::default().step(&controls, &input, &mut transform);
        assert!((transform.scale.y - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_none_source_never_applies() {
        let controls = vec![TransformControl::constant(target("rotation.z"), InputSource::None, 5.0)];
        let mut transform = Transform::identity();
        assert_eq!(
            Integrator::default().step(&controls, &SampledInput::default(), &mut transform),
            0
        );
        assert_eq!(transform.rotation.z, 0.0);
    }

    #[test]
    fn test_last_entry_for_same_scalar_wins() {
        let controls = vec![
            TransformControl::constant(target("rotation.x"), InputSource::Pointer, 10.0),
            TransformControl::constant(target("rotation.x"), InputSource::Pointer, 0.0),
        ];
        let mut transform = Transform::identity();
        let integrator = Integrator::with_alpha(1.0);
        integrator.step(&controls, &SampledInput::default(), &mut transform);
        assert_eq!(transform.rotation.x, 0.0);
    }
}
