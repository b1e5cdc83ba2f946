//! Turns a drag release into a throw that comes to rest on a card.

use crate::easing::Easing;
use crate::tuning::DragTuning;
use std::collections::VecDeque;
use std::time::Duration;

/// Where a throw ends and how long it takes to get there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowPlan {
    pub end: f64,
    pub duration: Duration,
    pub easing: Easing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResolver {
    snap_angle: f64,
}

impl SnapResolver {
    pub fn new(card_count: usize) -> Self {
        Self {
            snap_angle: crate::angle::snap_angle(card_count.max(1)),
        }
    }

    pub fn snap_angle(&self) -> f64 {
        self.snap_angle
    }

    /// Nearest multiple of the snap angle.
    pub fn snap(&self, value: f64) -> f64 {
        (value / self.snap_angle).round() * self.snap_angle
    }

    /// Projects where a ring released at `rotation` spinning at `velocity`
    /// (deg/s) would coast to under exponential decay, snaps that, and picks
    /// a duration whose opening speed matches the release.
    pub fn resolve(&self, rotation: f64, velocity: f64, tuning: &DragTuning) -> ThrowPlan {
        let easing = Easing::Power2Out;
        let velocity = if velocity.is_finite() { velocity } else { 0.0 };
        let projected = rotation + velocity * tuning.decay_ms as f64 / 1000.0;
        let end = self.snap(projected);

        let distance = (end - rotation).abs();
        let min = tuning.min_throw_ms as f64 / 1000.0;
        let max = (tuning.max_throw_ms as f64 / 1000.0).max(min);
        let seconds = if velocity.abs() > f64::EPSILON {
            (easing.initial_slope() * distance / velocity.abs()).clamp(min, max)
        } else {
            min
        };

        ThrowPlan {
            end,
            duration: Duration::from_secs_f64(seconds),
            easing,
        }
    }
}

/// Recent `(time, rotation)` samples of a drag, for release velocity.
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(Duration, f64)>,
}

impl VelocityTracker {
    pub fn record(&mut self, at: Duration, rotation: f64, window: Duration) {
        self.samples.push_back((at, rotation));
        while let Some(&(first, _)) = self.samples.front() {
            if at.saturating_sub(first) > window && self.samples.len() > 2 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Degrees per second over the retained window; zero if the pointer has
    /// been still for longer than `window` before `now`.
    pub fn velocity(&self, now: Duration, window: Duration) -> f64 {
        let (Some(&(t0, r0)), Some(&(t1, r1))) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        if now.saturating_sub(t1) > window {
            return 0.0;
        }
        let dt = t1.saturating_sub(t0).as_secs_f64();
        if dt <= 0.0 { 0.0 } else { (r1 - r0) / dt }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_lands_on_multiples() {
        let resolver = SnapResolver::new(8);
        let allowed: Vec<f64> = (0..8).map(|i| i as f64 * 45.0).collect();
        let mut value = -1000.0;
        while value < 1000.0 {
            let snapped = resolver.snap(value);
            assert_eq!(snapped % 45.0, 0.0, "{value} snapped to {snapped}");
            let wrapped = crate::angle::normalize(snapped);
            assert!(allowed.contains(&wrapped), "{wrapped} not a card angle");
            value += 7.77;
        }
    }

    #[test]
    fn test_resolve_follows_velocity() {
        let resolver = SnapResolver::new(8);
        let tuning = DragTuning::default();

        let still = resolver.resolve(20.0, 0.0, &tuning);
        assert_eq!(still.end, 0.0);
        assert_eq!(still.duration, Duration::from_millis(tuning.min_throw_ms));

        let fling = resolver.resolve(20.0, 600.0, &tuning);
        assert_eq!(fling.end, 225.0);
        assert!(fling.duration > still.duration);
        assert!(fling.duration <= Duration::from_millis(tuning.max_throw_ms));

        let back = resolver.resolve(20.0, -600.0, &tuning);
        assert_eq!(back.end % 45.0, 0.0);
        assert!(back.end < 0.0);
    }

    #[test]
    fn test_velocity_tracker_uses_recent_window() {
        let window = Duration::from_millis(100);
        let mut tracker = VelocityTracker::default();
        let ms = Duration::from_millis;

        tracker.record(ms(0), 0.0, window);
        tracker.record(ms(500), 0.0, window);
        tracker.record(ms(550), 10.0, window);
        tracker.record(ms(600), 20.0, window);
        assert!((tracker.velocity(ms(600), window) - 200.0).abs() < 1e-9);

        // held still before release
        assert_eq!(tracker.velocity(ms(900), window), 0.0);
    }
}
