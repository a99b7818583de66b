//! Small numeric helpers shared by every animating subsystem.
//!
//! The invariant they enforce together: no NaN, no Inf, and no out-of-range
//! value ever crosses a subsystem boundary. Degrade to a fallback, warn, and
//! keep the animation loop alive.

/// Linear interpolation with clamped t.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Guard against NaN and Infinity. Non-finite values are replaced with the
/// fallback and logged — they must never propagate into stored state.
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected, resetting to fallback {}", fallback);
        fallback
    }
}

/// Exponential approach: move `current` toward `target` at `rate` per second.
/// Frame-rate independent form of the classic `current += (target-current)*k`.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let k = 1.0 - (-rate * dt.max(0.0)).exp();
    current + (target - current) * k
}

/// Easing curves for emotion transitions.
///
/// Spring and Bounce are closed-form approximations evaluated directly from
/// progress — there is no physical integration behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    Spring,
    Bounce,
}

impl Default for Easing {
    fn default() -> Self {
        Easing::EaseInOut
    }
}

impl Easing {
    /// Evaluate the curve at progress `t` (clamped to [0, 1]).
    ///
    /// Spring may overshoot past 1.0 on purpose; callers clamp when the
    /// result is used as a blend weight.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (2.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::Spring => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c = (2.0 * std::f32::consts::PI) / 3.0;
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c).sin() + 1.0
                }
            }
            Easing::Bounce => {
                let n1 = 7.5625;
                let d1 = 2.75;
                if t < 1.0 / d1 {
                    n1 * t * t
                } else if t < 2.0 / d1 {
                    let t = t - 1.5 / d1;
                    n1 * t * t + 0.75
                } else if t < 2.5 / d1 {
                    let t = t - 2.25 / d1;
                    n1 * t * t + 0.9375
                } else {
                    let t = t - 2.625 / d1;
                    n1 * t * t + 0.984375
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lerp_basic() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, -1.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 2.0), 10.0);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_f32(f32::NAN, 0.5), 0.5);
        assert_eq!(sanitize_f32(f32::INFINITY, 0.1), 0.1);
        assert_eq!(sanitize_f32(0.7, 0.0), 0.7);
    }

    #[test]
    fn test_approach_converges() {
        let mut v = 0.0;
        for _ in 0..100 {
            v = approach(v, 1.0, 3.0, 0.016);
        }
        assert!(v > 0.95, "approach should converge, got {}", v);
    }

    #[test]
    fn test_approach_large_dt_does_not_overshoot() {
        let v = approach(0.0, 1.0, 3.0, 100.0);
        assert!(v >= 0.0 && v <= 1.0, "got {}", v);
    }

    #[test]
    fn test_easing_endpoints() {
        for e in [
            Easing::Linear,
            Easing::EaseIn,
            Easing::EaseOut,
            Easing::EaseInOut,
            Easing::Spring,
            Easing::Bounce,
        ] {
            assert!((e.apply(0.0) - 0.0).abs() < 1e-3, "{:?} at 0", e);
            assert!((e.apply(1.0) - 1.0).abs() < 1e-3, "{:?} at 1", e);
        }
    }

    proptest! {
        #[test]
        fn prop_easing_finite_and_bounded(t in -10.0f32..10.0, idx in 0usize..6) {
            let curves = [
                Easing::Linear,
                Easing::EaseIn,
                Easing::EaseOut,
                Easing::EaseInOut,
                Easing::Spring,
                Easing::Bounce,
            ];
            let v = curves[idx].apply(t);
            prop_assert!(v.is_finite());
            // Spring overshoots by design, but never wildly.
            prop_assert!(v > -0.5 && v < 1.5, "{:?}({}) = {}", curves[idx], t, v);
        }

        #[test]
        fn prop_sanitize_always_finite(v in proptest::num::f32::ANY) {
            prop_assert!(sanitize_f32(v, 0.0).is_finite());
        }
    }
}
