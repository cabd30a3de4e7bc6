//! Fade parameters and easing for scene transitions.

/// Easing curves for an opacity ramp.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// Constant speed throughout.
    #[default]
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
}

impl Easing {
    /// Apply the easing curve to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Configuration for the visual cross-fade of a scene transition.
///
/// The outgoing scene's layer ramps from its current opacity to zero over
/// `duration` seconds, and the incoming layer ramps from zero to one over
/// the same duration, sampled once per render frame. A zero duration
/// skips both ramps entirely — the layers are swapped at full opacity
/// with no intermediate values written.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fade {
    /// Ramp duration in seconds. Zero disables the fade.
    pub duration: f32,
    /// Curve applied to the ramp progress.
    pub easing: Easing,
}

impl Default for Fade {
    fn default() -> Self {
        Self::millis(300.0)
    }
}

impl Fade {
    /// No visual fade; unload/load are still strictly sequenced.
    pub fn none() -> Self {
        Self {
            duration: 0.0,
            easing: Easing::Linear,
        }
    }

    /// Fade over the given number of seconds.
    pub fn seconds(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            easing: Easing::Linear,
        }
    }

    /// Fade over the given number of milliseconds.
    pub fn millis(duration: f32) -> Self {
        Self::seconds(duration / 1000.0)
    }

    /// Set the easing curve for this fade.
    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Whether this fade performs any ramp at all.
    pub fn is_active(&self) -> bool {
        self.duration > 0.0
    }

    /// Opacity at linear progress `t`, ramping `from` → `to`.
    pub(crate) fn sample(&self, from: f32, to: f32, t: f32) -> f32 {
        let eased = self.easing.apply(t);
        from + (to - from) * eased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_endpoints_are_exact() {
        for easing in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
        ] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
        }
    }

    #[test]
    fn easing_clamps_out_of_range_progress() {
        assert_eq!(Easing::Linear.apply(-0.5), 0.0);
        assert_eq!(Easing::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn linear_sample_interpolates() {
        let fade = Fade::seconds(1.0);
        assert_eq!(fade.sample(1.0, 0.0, 0.25), 0.75);
        assert_eq!(fade.sample(0.0, 1.0, 0.5), 0.5);
    }

    #[test]
    fn zero_duration_is_inactive() {
        assert!(!Fade::none().is_active());
        assert!(!Fade::seconds(-2.0).is_active());
        assert!(Fade::millis(300.0).is_active());
    }

    #[test]
    fn millis_converts_to_seconds() {
        assert_eq!(Fade::millis(300.0).duration, 0.3);
    }
}
