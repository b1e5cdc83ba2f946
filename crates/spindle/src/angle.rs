//! The ring's single source of truth for rotation.
//!
//! Rotation accumulates without wrapping while the user spins; anything that
//! needs a bounded value goes through [`normalize`].

use crate::easing::Easing;
use crate::error::CarouselError;
use crate::timeline::{Channel, Coordinator, HintTarget, Property, Timeline};
use crate::tuning::Tuning;

/// Maps any angle into `[0, 360)`.
pub fn normalize(angle: f64) -> f64 {
    ((angle % 360.0) + 360.0) % 360.0
}

/// Signed delta from `from` to `to` taking the short way around the circle.
/// Always within `[-180, 180]`.
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    let delta = (to - from) % 360.0;
    if delta > 180.0 {
        delta - 360.0
    } else if delta < -180.0 {
        delta + 360.0
    } else {
        delta
    }
}

/// Spacing between adjacent cards.
pub fn snap_angle(card_count: usize) -> f64 {
    360.0 / card_count as f64
}

#[derive(Debug, Clone)]
pub struct AngleModel {
    rotation: f64,
    card_count: usize,
}

impl AngleModel {
    pub fn new(card_count: usize, rotation: f64) -> Result<Self, CarouselError> {
        if card_count == 0 {
            return Err(CarouselError::EmptyRing);
        }
        Ok(Self {
            rotation,
            card_count,
        })
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// The position indicator spins the other way.
    pub fn indicator_rotation(&self) -> f64 {
        -self.rotation
    }

    pub fn card_count(&self) -> usize {
        self.card_count
    }

    pub fn snap_angle(&self) -> f64 {
        snap_angle(self.card_count)
    }

    /// Accumulates `delta` and eases both the ring and the mirrored indicator
    /// toward the new value, superseding any smoothing tween already running.
    pub fn apply_delta(&mut self, delta: f64, tuning: &Tuning, timelines: &mut Coordinator) -> f64 {
        self.rotation += delta;

        timelines.start(
            Channel::Spin,
            Timeline::new("spin")
                .tween(
                    Property::RingRotation,
                    self.rotation,
                    tuning.spin(),
                    Easing::Power4Out,
                )
                .hint(HintTarget::Ring),
        );
        self.push_indicator(tuning, timelines);
        self.rotation
    }

    pub fn set_absolute(&mut self, angle: f64) {
        self.rotation = angle;
    }

    pub fn push_indicator(&self, tuning: &Tuning, timelines: &mut Coordinator) {
        timelines.start(
            Channel::IndicatorSpin,
            Timeline::new("indicator-spin").tween(
                Property::IndicatorRotation,
                self.indicator_rotation(),
                tuning.spin(),
                Easing::Power4Out,
            ),
        );
    }
}
