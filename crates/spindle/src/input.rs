//! Wheel, keyboard, pointer and click handling. Every entry point checks the
//! interaction mode first; nothing else decides what may touch the ring.

use crate::angle::shortest_delta;
use crate::card::SourceUrl;
use crate::carousel::Carousel;
use crate::easing::Easing;
use crate::error::CarouselError;
use crate::geometry::Point;
use crate::indicator;
use crate::mode::InteractionMode;
use crate::snap::VelocityTracker;
use crate::timeline::{Channel, Cue, HintTarget, Property, Timeline};
use serde_with::DeserializeFromStr;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, DeserializeFromStr)]
#[strum(ascii_case_insensitive)]
pub enum Key {
    Left,
    Right,
    #[strum(serialize = "escape", serialize = "esc")]
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutcome {
    /// Not consumed; the host may let it through.
    Ignored,
    /// Swallowed without effect.
    Blocked,
    Spun,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    Opened(usize),
    Navigated(usize),
    Closed,
    /// The lifted card was clicked; the host should open its link.
    OpenSource(SourceUrl),
}

/// A pointer held down on the ring. Becomes a drag once it travels past the
/// threshold.
#[derive(Debug, Clone)]
pub(crate) struct Press {
    start: Point,
    bearing: f64,
    dragging: bool,
    tracker: VelocityTracker,
}

impl Carousel {
    pub fn wheel(&mut self, delta_y: f64) -> WheelOutcome {
        if self.mode == InteractionMode::Entry {
            return WheelOutcome::Ignored;
        }
        if self.mode.is_detail() || self.mode == InteractionMode::Dragging {
            return WheelOutcome::Blocked;
        }
        let delta = -delta_y / self.tuning.wheel_divisor;
        if !self.mode.accepts_spin() || !delta.is_finite() {
            return WheelOutcome::Ignored;
        }
        self.angle.apply_delta(delta, &self.tuning, &mut self.timelines);
        indicator::emphasize(&self.tuning.indicator, &mut self.timelines);
        self.locate();
        WheelOutcome::Spun
    }

    /// Returns whether the key was consumed.
    pub fn key(&mut self, key: Key) -> bool {
        if self.mode == InteractionMode::Entry {
            return false;
        }
        if self.mode.is_detail() {
            if self.mode.can_navigate() {
                match key {
                    Key::Left => self.navigate(-1),
                    Key::Right => self.navigate(1),
                    Key::Escape => self.close(),
                }
            }
            return true;
        }
        if !self.mode.accepts_spin() {
            return false;
        }
        let direction = match key {
            Key::Left => 1.0,
            Key::Right => -1.0,
            Key::Escape => return false,
        };
        self.step(direction);
        true
    }

    fn step(&mut self, direction: f64) {
        let target = self.angle.rotation() + self.angle.snap_angle() * direction;
        self.angle.set_absolute(target);
        self.timelines.start(
            Channel::Spin,
            Timeline::new("step")
                .tween(
                    Property::RingRotation,
                    target,
                    self.tuning.step(),
                    Easing::elastic(1.0, self.tuning.step_elastic_period),
                )
                .hint(HintTarget::Ring),
        );
        self.angle.push_indicator(&self.tuning, &mut self.timelines);
        indicator::emphasize(&self.tuning.indicator, &mut self.timelines);
        self.locate();
    }

    /// Starts tracking a press. Only an idle ring can be grabbed.
    pub fn pointer_down(&mut self, at: Point) -> bool {
        if self.mode != InteractionMode::Idle {
            return false;
        }
        self.press = Some(Press {
            start: at,
            bearing: (at - self.scene.ring_center).bearing(),
            dragging: false,
            tracker: VelocityTracker::default(),
        });
        true
    }

    /// Turns the ring 1:1 with the pointer once the press became a drag.
    /// Returns whether the scene changed.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        let Some(mut press) = self.press.take() else {
            return false;
        };
        if !press.dragging {
            if (at - press.start).length() < self.tuning.drag.threshold_px {
                self.press = Some(press);
                return false;
            }
            if !self.set_mode(InteractionMode::Dragging) {
                return false;
            }
            // the ring is grabbed where it is drawn, not where a tween was heading
            for channel in [
                Channel::Spin,
                Channel::Throw,
                Channel::Settle,
                Channel::IndicatorSpin,
            ] {
                self.timelines.kill(channel);
            }
            self.timelines.claim(Property::RingRotation);
            self.angle.set_absolute(self.scene.ring_rotation);
            press.dragging = true;
            let window = self.tuning.drag.velocity_window();
            press
                .tracker
                .record(self.clock, self.scene.ring_rotation, window);
        }

        let radial = at - self.scene.ring_center;
        if radial.length() > f64::EPSILON {
            let bearing = radial.bearing();
            let rotation = self.scene.ring_rotation + shortest_delta(press.bearing, bearing);
            press.bearing = bearing;
            self.scene.ring_rotation = rotation;
            self.angle.set_absolute(rotation);
            press
                .tracker
                .record(self.clock, rotation, self.tuning.drag.velocity_window());
            self.angle.push_indicator(&self.tuning, &mut self.timelines);
            indicator::emphasize(&self.tuning.indicator, &mut self.timelines);
            self.locate();
        }
        self.press = Some(press);
        true
    }

    /// Ends a press. A drag hands its release velocity to the snap resolver
    /// and arms the click guard.
    pub fn pointer_up(&mut self) -> bool {
        let Some(press) = self.press.take() else {
            return false;
        };
        if !press.dragging {
            return false;
        }
        let drag = self.tuning.drag.clone();
        let velocity = press.tracker.velocity(self.clock, drag.velocity_window());
        let rotation = self.scene.ring_rotation;
        let throw = self.resolver.resolve(rotation, velocity, &drag);
        log::debug!(
            "drag released at {rotation:.1} with {velocity:.0} deg/s, throwing to {}",
            throw.end
        );

        self.set_mode(InteractionMode::Idle);
        self.click_guard_until = Some(self.clock + drag.click_guard());
        self.timelines.claim(Property::IndicatorRotation);
        self.timelines.start(
            Channel::Throw,
            Timeline::new("throw")
                .tween(Property::RingRotation, throw.end, throw.duration, throw.easing)
                .on_complete(Cue::ThrowFinished)
                .hint(HintTarget::Ring),
        );
        true
    }

    fn click_guarded(&self) -> bool {
        self.mode == InteractionMode::Dragging
            || self.click_guard_until.is_some_and(|until| self.clock < until)
    }

    /// A click (press and release without a drag) at `at`.
    pub fn click(&mut self, at: Point) -> ClickOutcome {
        if self.click_guarded() {
            log::trace!("click swallowed by the drag that preceded it");
            return ClickOutcome::Ignored;
        }
        match self.mode {
            InteractionMode::Idle => match self.scene.card_at(at) {
                Some(index) => self.activate(index).unwrap_or(ClickOutcome::Ignored),
                None => ClickOutcome::Ignored,
            },
            mode if mode.can_navigate() => {
                let active = self.session.as_ref().map(|s| s.active());
                if active.is_some() && self.scene.card_at(at) == active {
                    return active
                        .and_then(|i| self.cards.get(i))
                        .map_or(ClickOutcome::Ignored, |card| {
                            ClickOutcome::OpenSource(card.source.clone())
                        });
                }
                self.close();
                ClickOutcome::Closed
            }
            _ => ClickOutcome::Ignored,
        }
    }

    /// Opens card `index`, or walks the open session over to it.
    pub fn activate(&mut self, index: usize) -> Result<ClickOutcome, CarouselError> {
        let count = self.cards.len();
        if index >= count {
            return Err(CarouselError::IndexOutOfRange { index, count });
        }
        if self.mode == InteractionMode::Idle {
            self.open(index)?;
            return Ok(ClickOutcome::Opened(index));
        }
        if !self.mode.can_navigate() {
            return Ok(ClickOutcome::Ignored);
        }
        match self.session.as_ref().map(|s| s.active()) {
            Some(active) if active == index => {
                Ok(ClickOutcome::OpenSource(self.cards[index].source.clone()))
            }
            Some(active) => {
                self.navigate(index as isize - active as isize);
                Ok(ClickOutcome::Navigated(index))
            }
            None => Ok(ClickOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angle::normalize;
    use crate::carousel::testing::{FRAME, ready, run_until_idle};
    use std::str::FromStr;

    fn top_card(carousel: &Carousel) -> Point {
        let index = carousel.central().unwrap();
        carousel.scene().card_point_on_screen(index, Point::CENTER).unwrap()
    }

    #[test]
    fn test_wheel_spins_and_tracks_central_card() {
        let mut carousel = ready(8);
        assert_eq!(carousel.wheel(-1800.0), WheelOutcome::Spun);
        assert_eq!(carousel.angle().rotation(), 45.0);
        // locator follows the model immediately, before the ring catches up
        assert_eq!(carousel.central(), Some(7));
        assert_eq!(carousel.scene().indicator.scale, 1.0);

        run_until_idle(&mut carousel);
        assert_eq!(carousel.scene().ring_rotation, 45.0);
        assert_eq!(carousel.scene().indicator.rotation, -45.0);
        assert_eq!(carousel.scene().indicator.scale, 0.6);
    }

    #[test]
    fn test_wheel_accumulates_without_wrapping() {
        let mut carousel = ready(4);
        for _ in 0..21 {
            carousel.wheel(-800.0);
        }
        assert_eq!(carousel.angle().rotation(), 420.0);
        assert_eq!(carousel.central(), Some(3));
    }

    #[test]
    fn test_wheel_blocked_in_detail() {
        let mut carousel = ready(8);
        carousel.open(2).unwrap();
        let rotation = carousel.angle().rotation();
        assert_eq!(carousel.wheel(300.0), WheelOutcome::Blocked);
        assert_eq!(carousel.angle().rotation(), rotation);
        assert!(carousel.key(Key::Left));
        assert_eq!(carousel.angle().rotation(), rotation);
    }

    #[test]
    fn test_arrow_keys_step_one_card() {
        let mut carousel = ready(8);
        assert!(carousel.key(Key::Left));
        assert_eq!(carousel.central(), Some(7));
        assert!(carousel.key(Key::Left));
        run_until_idle(&mut carousel);
        assert_eq!(carousel.scene().ring_rotation, 90.0);
        assert_eq!(carousel.central(), Some(6));

        assert!(carousel.key(Key::Right));
        run_until_idle(&mut carousel);
        assert_eq!(carousel.scene().ring_rotation, 45.0);
        assert!(!carousel.key(Key::Escape));
    }

    #[test]
    fn test_keys_in_detail_navigate_and_close() {
        let mut carousel = ready(6);
        carousel.open(0).unwrap();
        run_until_idle(&mut carousel);
        assert!(carousel.key(Key::Right));
        assert_eq!(carousel.detail_session().unwrap().active(), 1);
        assert!(carousel.key(Key::Left));
        assert_eq!(carousel.detail_session().unwrap().active(), 0);
        assert!(carousel.key(Key::Escape));
        assert_eq!(carousel.mode(), InteractionMode::DetailClosing);
        run_until_idle(&mut carousel);
        assert_eq!(carousel.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_key_names_parse() {
        assert_eq!(Key::from_str("ESC").unwrap(), Key::Escape);
        assert_eq!(Key::from_str("left").unwrap(), Key::Left);
        assert!(Key::from_str("up").is_err());
    }

    fn drag(carousel: &mut Carousel, path: &[Point]) {
        assert!(carousel.pointer_down(path[0]));
        for &at in &path[1..] {
            carousel.tick(FRAME);
            carousel.pointer_move(at);
        }
        carousel.pointer_up();
    }

    #[test]
    fn test_drag_turns_ring_directly_then_snaps() {
        let mut carousel = ready(8);
        let center = carousel.scene().ring_center;
        let start = top_card(&carousel);
        assert!(carousel.pointer_down(start));
        carousel.tick(FRAME);
        // quarter turn clockwise around the ring center
        let side = center + (start - center).rotated(30.0);
        assert!(carousel.pointer_move(side));
        assert_eq!(carousel.mode(), InteractionMode::Dragging);
        assert!((carousel.scene().ring_rotation - 30.0).abs() < 1e-9);
        assert_eq!(carousel.angle().rotation(), carousel.scene().ring_rotation);
        assert_eq!(carousel.central(), Some(7));

        carousel.tick(FRAME);
        carousel.pointer_move(center + (start - center).rotated(40.0));
        carousel.pointer_up();
        assert_eq!(carousel.mode(), InteractionMode::Idle);
        run_until_idle(&mut carousel);

        let rotation = carousel.scene().ring_rotation;
        assert_eq!(rotation % 45.0, 0.0);
        assert!(rotation > 0.0);
        assert_eq!(carousel.angle().rotation(), rotation);
        assert_eq!(carousel.scene().indicator.rotation, -rotation);
        assert_eq!(
            carousel.central(),
            Some(crate::locator::central_index(rotation, 8))
        );
    }

    #[test]
    fn test_wheel_and_keys_wait_for_drag_release() {
        let mut carousel = ready(8);
        let center = carousel.scene().ring_center;
        let start = top_card(&carousel);
        let at = |degrees: f64| center + (start - center).rotated(degrees);
        carousel.pointer_down(start);
        carousel.tick(FRAME);
        carousel.pointer_move(at(10.0));

        assert!(!carousel.key(Key::Left));
        assert_eq!(carousel.wheel(-400.0), WheelOutcome::Blocked);
        for degrees in [20.0, 30.0] {
            carousel.tick(FRAME);
            carousel.pointer_move(at(degrees));
            carousel.tick(FRAME);
            assert!((carousel.scene().ring_rotation - degrees).abs() < 1e-9);
        }
        assert!(!carousel.timelines.is_running(Channel::Spin));

        carousel.pointer_up();
        run_until_idle(&mut carousel);
        assert!(carousel.key(Key::Left));
    }

    #[test]
    fn test_small_jitter_is_not_a_drag() {
        let mut carousel = ready(8);
        let start = top_card(&carousel);
        carousel.pointer_down(start);
        assert!(!carousel.pointer_move(start + Point::new(1.0, 1.0)));
        assert!(!carousel.pointer_up());
        assert_eq!(carousel.scene().ring_rotation, 0.0);
        assert_eq!(carousel.click(start), ClickOutcome::Opened(0));
    }

    #[test]
    fn test_click_right_after_drag_is_ignored() {
        let mut carousel = ready(8);
        let center = carousel.scene().ring_center;
        let start = top_card(&carousel);
        drag(
            &mut carousel,
            &[
                start,
                center + (start - center).rotated(2.0),
                center + (start - center).rotated(4.0),
            ],
        );
        assert_eq!(carousel.click(start), ClickOutcome::Ignored);
        assert_eq!(carousel.mode(), InteractionMode::Idle);

        run_until_idle(&mut carousel);
        assert_eq!(normalize(carousel.scene().ring_rotation) % 45.0, 0.0);
        let target = top_card(&carousel);
        let central = carousel.central().unwrap();
        assert_eq!(carousel.click(target), ClickOutcome::Opened(central));
    }

    #[test]
    fn test_clicks_in_detail() {
        let mut carousel = ready(8);
        assert_eq!(carousel.activate(3).unwrap(), ClickOutcome::Opened(3));
        run_until_idle(&mut carousel);

        let center = carousel.scene().viewport.center();
        assert_eq!(
            carousel.click(center),
            ClickOutcome::OpenSource(SourceUrl::new("https://example.com/3"))
        );
        assert_eq!(carousel.activate(5).unwrap(), ClickOutcome::Navigated(5));
        assert_eq!(carousel.detail_session().unwrap().active(), 5);
        run_until_idle(&mut carousel);

        assert_eq!(carousel.click(Point::new(5.0, 5.0)), ClickOutcome::Closed);
        assert_eq!(carousel.click(center), ClickOutcome::Ignored);
        run_until_idle(&mut carousel);
        assert_eq!(carousel.mode(), InteractionMode::Idle);
        assert!(carousel.activate(8).is_err());
    }

    #[test]
    fn test_input_ignored_during_entry() {
        let mut carousel = crate::carousel::Carousel::new(
            crate::carousel::testing::descriptors(3),
            crate::geometry::Size::new(800.0, 600.0),
            crate::tuning::Tuning::default(),
        )
        .unwrap();
        carousel.begin_entry();
        assert_eq!(carousel.wheel(10.0), WheelOutcome::Ignored);
        assert!(!carousel.key(Key::Left));
        assert!(!carousel.pointer_down(Point::new(400.0, 300.0)));
        assert_eq!(carousel.click(Point::new(400.0, 300.0)), ClickOutcome::Ignored);
        assert!(carousel.activate(0).is_ok());
        assert_eq!(carousel.mode(), InteractionMode::Entry);
    }
}
