//! Emphasis of the position indicator while the ring is being spun.

use crate::easing::Easing;
use crate::timeline::{Channel, Coordinator, HintTarget, Property, Timeline};
use crate::tuning::IndicatorTuning;

/// Switches the indicator to its emphasized state right away and schedules
/// the fade back to idle after the quiet period. Restarting on every input
/// kills the pending fade, which is what keeps it emphasized while input
/// keeps arriving.
pub fn emphasize(tuning: &IndicatorTuning, timelines: &mut Coordinator) {
    timelines.start(
        Channel::IndicatorEmphasis,
        Timeline::new("indicator-emphasis")
            .tween(Property::IndicatorScale, 1.0, tuning.active(), Easing::Power2Out)
            .tween(Property::IndicatorOpacity, 1.0, tuning.active(), Easing::Power2Out)
            .tween_at(
                tuning.quiet(),
                Property::IndicatorScale,
                tuning.idle_scale,
                tuning.idle(),
                Easing::Power2InOut,
            )
            .tween_at(
                tuning.quiet(),
                Property::IndicatorOpacity,
                tuning.idle_opacity,
                tuning.idle(),
                Easing::Power2InOut,
            )
            .hint(HintTarget::Indicator),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::scene::Scene;
    use crate::tuning::RingTuning;
    use std::time::Duration;

    #[test]
    fn test_emphasis_decays_after_quiet_period() {
        let tuning = IndicatorTuning::default();
        let mut scene = Scene::new(4, Size::new(800.0, 600.0), &RingTuning::default());
        scene.indicator.scale = tuning.idle_scale;
        scene.indicator.opacity = tuning.idle_opacity;
        let mut timelines = Coordinator::default();

        emphasize(&tuning, &mut timelines);
        timelines.tick(tuning.active(), &mut scene);
        assert_eq!(scene.indicator.scale, 1.0);
        assert_eq!(scene.indicator.opacity, 1.0);

        // more input before the quiet period ends keeps it emphasized
        timelines.tick(Duration::from_millis(500), &mut scene);
        emphasize(&tuning, &mut timelines);
        timelines.tick(Duration::from_millis(700), &mut scene);
        assert_eq!(scene.indicator.scale, 1.0);

        timelines.tick(tuning.idle() + Duration::from_millis(200), &mut scene);
        assert_eq!(scene.indicator.scale, tuning.idle_scale);
        assert_eq!(scene.indicator.opacity, tuning.idle_opacity);
        assert!(timelines.is_idle());
    }
}
