//! Easing curves used by the ring's tweens.

use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// Quadratic ease-out.
    Power1Out,
    /// Cubic ease-in.
    Power2In,
    /// Cubic ease-out.
    Power2Out,
    /// Cubic ease-in-out.
    Power2InOut,
    /// Quintic ease-out; the smoothing curve for wheel ticks.
    Power4Out,
    /// Overshoot then settle with a small wobble.
    ElasticOut { amplitude: f64, period: f64 },
    /// Overshoot once past the target then come back.
    BackOut { overshoot: f64 },
}

impl Easing {
    pub fn elastic(amplitude: f64, period: f64) -> Self {
        Self::ElasticOut { amplitude, period }
    }

    /// Maps linear progress in `[0, 1]` to eased progress. Overshooting
    /// curves may leave `[0, 1]` in between but always end exactly on 1.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::Linear => t,
            Easing::Power1Out => 1.0 - (1.0 - t).powi(2),
            Easing::Power2In => t.powi(3),
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power2InOut => {
                if t < 0.5 {
                    4.0 * t.powi(3)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::Power4Out => 1.0 - (1.0 - t).powi(5),
            Easing::ElasticOut { amplitude, period } => {
                let a = amplitude.max(1.0);
                let base = if period > 0.0 { period } else { 0.3 };
                let p = base / amplitude.clamp(f64::EPSILON, 1.0);
                let shift = p / TAU * (1.0 / a).asin();
                a * 2f64.powf(-10.0 * t) * ((t - shift) * TAU / p).sin() + 1.0
            }
            Easing::BackOut { overshoot } => {
                let c = overshoot + 1.0;
                let u = t - 1.0;
                1.0 + c * u.powi(3) + overshoot * u.powi(2)
            }
        }
    }

    /// How fast the curve leaves its start, relative to a linear tween of
    /// the same duration. Used to pick throw durations that preserve the
    /// release velocity.
    pub fn initial_slope(&self) -> f64 {
        match self {
            Easing::Power1Out => 2.0,
            Easing::Power2Out => 3.0,
            Easing::Power4Out => 5.0,
            _ => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 8] = [
        Easing::Linear,
        Easing::Power1Out,
        Easing::Power2In,
        Easing::Power2Out,
        Easing::Power2InOut,
        Easing::Power4Out,
        Easing::ElasticOut {
            amplitude: 1.0,
            period: 0.4,
        },
        Easing::BackOut { overshoot: 1.2 },
    ];

    #[test]
    fn test_endpoints_are_exact() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-12, "{easing:?} at 0");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?} at 1");
            assert_eq!(easing.apply(7.0), 1.0, "{easing:?} past the end");
        }
    }

    #[test]
    fn test_elastic_overshoots() {
        let easing = Easing::elastic(1.0, 0.35);
        let peak = (1..100)
            .map(|i| easing.apply(i as f64 / 100.0))
            .fold(f64::MIN, f64::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_power_curves_are_monotonic() {
        for easing in [
            Easing::Power2In,
            Easing::Power2Out,
            Easing::Power2InOut,
            Easing::Power4Out,
        ] {
            let mut last = 0.0;
            for i in 1..=50 {
                let v = easing.apply(i as f64 / 50.0);
                assert!(v >= last, "{easing:?} went backwards at step {i}");
                last = v;
            }
        }
    }
}
