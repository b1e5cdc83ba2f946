//! Lifting a card out of the ring to the middle of the viewport and back.
//!
//! Every gesture is split into a measurement, which only reads the scene,
//! and a commit that works from that measurement alone. The screen position
//! of a card is only meaningful once the ring has stopped turning, so the
//! second phase of an open or a navigation is measured again when the
//! rotation cue fires.

use crate::angle::shortest_delta;
use crate::card::Card;
use crate::carousel::Carousel;
use crate::easing::Easing;
use crate::error::CarouselError;
use crate::geometry::{Point, Size};
use crate::mode::InteractionMode;
use crate::scene::{CardPose, Scene};
use crate::timeline::{Channel, Cue, HintTarget, Property, Timeline};
use std::collections::BTreeMap;
use std::time::Duration;

/// Scale that fits `rendered` into `viewport` with the given margin. Falls
/// back to 1 when either side can't be measured.
pub fn fit_scale(viewport: Size, rendered: Size, margin: f64) -> f64 {
    if rendered.is_degenerate() || viewport.is_degenerate() {
        log::warn!("cannot fit {rendered:?} into {viewport:?}, keeping scale 1");
        return 1.0;
    }
    let scale = (viewport.width * margin / rendered.width)
        .min(viewport.height * margin / rendered.height);
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

/// Normalized point at the visual center of media drawn into a `layout` box
/// with contain fit, bottom aligned.
pub fn visual_anchor(layout: Size, natural: Option<Size>) -> Point {
    let Some(natural) = natural.filter(|n| !n.is_degenerate()) else {
        return Point::CENTER;
    };
    if layout.is_degenerate() {
        return Point::CENTER;
    }
    let rendered_height = if natural.aspect() > layout.aspect() {
        layout.width / natural.aspect()
    } else {
        layout.height
    };
    Point::new(0.5, (layout.height - rendered_height / 2.0) / layout.height)
}

/// Everything an open or a navigation needs, read before anything moves.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailMeasurement {
    pub index: usize,
    pub ring_rotation: f64,
    pub angular_offset: f64,
    pub pose: CardPose,
    pub origin: Point,
    /// Card box on screen at the current ring scale.
    pub rendered: Size,
    pub layout: Size,
    pub viewport: Size,
    pub natural: Option<Size>,
}

impl DetailMeasurement {
    pub fn take(scene: &Scene, card: &Card) -> Option<Self> {
        let visual = scene.cards.get(card.index)?;
        Some(Self {
            index: card.index,
            ring_rotation: scene.ring_rotation,
            angular_offset: scene.angular_offset(card.index),
            pose: visual.pose,
            origin: visual.origin,
            rendered: scene.card_box.scaled(scene.ring_scale),
            layout: scene.card_box,
            viewport: scene.viewport,
            natural: card.natural_size,
        })
    }

    pub fn plan(&self, margin: f64) -> DetailPlan {
        DetailPlan {
            index: self.index,
            target_rotation: self.ring_rotation
                + shortest_delta(self.ring_rotation, -self.angular_offset),
            target_scale: fit_scale(self.viewport, self.rendered, margin),
            anchor: visual_anchor(self.layout, self.natural),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailPlan {
    pub index: usize,
    /// Ring rotation that brings the card to the top, at most half a turn
    /// away from where the ring was measured.
    pub target_rotation: f64,
    pub target_scale: f64,
    pub anchor: Point,
}

/// Phase two measurement: the card's translation that puts its anchor on the
/// viewport center with the ring at rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandMeasurement {
    pub anchor_on_screen: Point,
    pub translation: Point,
}

impl ExpandMeasurement {
    pub fn take(scene: &Scene, plan: &DetailPlan) -> Option<Self> {
        let visual = scene.cards.get(plan.index)?;
        let anchor_on_screen = scene.card_point_on_screen(plan.index, plan.anchor)?;
        let to_center = scene.viewport.center() - anchor_on_screen;
        let translation =
            visual.pose.translation() + scene.screen_vector_to_local(plan.index, to_center);
        translation.is_finite().then_some(Self {
            anchor_on_screen,
            translation,
        })
    }
}

/// A card's ring placement before it was first lifted this session.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SavedCard {
    pose: CardPose,
    origin: Point,
    /// The same placement expressed about the anchor origin.
    home: CardPose,
}

#[derive(Debug, Clone)]
pub struct DetailSession {
    active: usize,
    opened_at_rotation: f64,
    plan: DetailPlan,
    navigated: bool,
    saved: BTreeMap<usize, SavedCard>,
}

impl DetailSession {
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn opened_at_rotation(&self) -> f64 {
        self.opened_at_rotation
    }

    pub fn plan(&self) -> &DetailPlan {
        &self.plan
    }

    pub fn original_pose(&self, index: usize) -> Option<CardPose> {
        self.saved.get(&index).map(|s| s.pose)
    }
}

impl Carousel {
    /// Lifts card `index` out of the ring. Ignored unless the ring is idle.
    pub fn open(&mut self, index: usize) -> Result<(), CarouselError> {
        let count = self.cards.len();
        let card = self
            .cards
            .get(index)
            .ok_or(CarouselError::IndexOutOfRange { index, count })?;
        if self.mode != InteractionMode::Idle {
            log::debug!("open({index}) ignored while {}", self.mode);
            return Ok(());
        }
        let measurement = DetailMeasurement::take(&self.scene, card)
            .ok_or(CarouselError::IndexOutOfRange { index, count })?;
        let plan = measurement.plan(self.tuning.detail.fit_margin);

        if !self.set_mode(InteractionMode::DetailOpening) {
            return Ok(());
        }
        let saved = self.lift(&measurement, plan.anchor);
        self.session = Some(DetailSession {
            active: index,
            opened_at_rotation: measurement.ring_rotation,
            plan,
            navigated: false,
            saved: BTreeMap::from([(index, saved)]),
        });
        self.scene.elevated = Some(index);

        let d = self.tuning.detail.clone();
        let mut timeline = Timeline::new("detail-open")
            .tween(Property::RingRotation, plan.target_rotation, d.rotate(), Easing::Power2Out)
            .tween(Property::BackdropOpacity, 1.0, d.fade(), Easing::Power1Out)
            .cue_at(
                d.rotate(),
                Cue::ExpandActive {
                    index,
                    duration: d.expand(),
                },
            )
            .hint(HintTarget::Ring)
            .hint(HintTarget::Backdrop);
        for other in (0..count).filter(|&i| i != index) {
            timeline = timeline.tween_at(
                d.dim_delay(),
                Property::CardOpacity(other),
                d.dim_opacity,
                d.fade(),
                Easing::Power1Out,
            );
        }
        self.timelines.start(Channel::Detail, timeline);
        self.play(index);

        log::info!(
            "opened card {index}: ring {:.1} -> {:.1}, scale {:.3}",
            measurement.ring_rotation,
            plan.target_rotation,
            plan.target_scale
        );
        Ok(())
    }

    /// Steps to the neighbouring card, `step` cards along. A navigation
    /// arriving before the previous one settled replaces it.
    pub fn navigate(&mut self, step: isize) {
        let count = self.cards.len();
        if count < 2 {
            log::debug!("nothing to navigate to with {count} card(s)");
            return;
        }
        if !self.mode.can_navigate() {
            return;
        }
        let Some(from) = self.session.as_ref().map(|s| s.active) else {
            return;
        };
        let to = (from as isize + step).rem_euclid(count as isize) as usize;
        if to == from {
            return;
        }
        let Some(measurement) = DetailMeasurement::take(&self.scene, &self.cards[to]) else {
            return;
        };
        let plan = measurement.plan(self.tuning.detail.fit_margin);

        self.timelines.kill(Channel::Detail);
        self.timelines.kill(Channel::DetailExpand);
        if !self.set_mode(InteractionMode::DetailNavigating) {
            return;
        }
        let already_lifted = self
            .session
            .as_ref()
            .is_some_and(|s| s.saved.contains_key(&to));
        let lifted = (!already_lifted).then(|| self.lift(&measurement, plan.anchor));

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(saved) = lifted {
            session.saved.insert(to, saved);
        }
        session.active = to;
        session.plan = plan;
        session.navigated = true;
        let homes: Vec<(usize, CardPose)> = session
            .saved
            .iter()
            .filter(|&(&i, _)| i != to)
            .map(|(&i, s)| (i, s.home))
            .collect();

        // playback swaps with the index, not when the motion ends
        self.scene.elevated = Some(to);
        self.pause(from);
        self.play(to);

        let d = self.tuning.detail.clone();
        let mut timeline = Timeline::new("detail-navigate")
            .tween_at(
                d.navigate_rotate_delay(),
                Property::RingRotation,
                plan.target_rotation,
                d.navigate_rotate(),
                Easing::Power2InOut,
            )
            .tween(Property::BackdropOpacity, 1.0, d.fade(), Easing::Power1Out)
            .cue_at(
                d.navigate_rotate_delay() + d.navigate_rotate(),
                Cue::ExpandActive {
                    index: to,
                    duration: d.navigate_expand(),
                },
            )
            .hint(HintTarget::Ring)
            .hint(HintTarget::Backdrop);
        for (i, home) in homes {
            timeline = shrink(timeline, i, home, d.navigate_shrink(), Easing::Power2In);
        }
        for i in 0..count {
            let opacity = if i == to { 1.0 } else { d.dim_opacity };
            timeline =
                timeline.tween(Property::CardOpacity(i), opacity, d.fade(), Easing::Power1Out);
        }
        self.timelines.start(Channel::Detail, timeline);
        log::debug!("navigating {from} -> {to}, ring to {:.1}", plan.target_rotation);
    }

    /// Returns every lifted card to the ring. Without any navigation the ring
    /// turns back to where it was when the session opened; otherwise it
    /// finishes turning to the active card, even if a navigation was cut off.
    pub fn close(&mut self) {
        if !self.mode.can_navigate() {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let ring_target = if session.navigated {
            session.plan.target_rotation
        } else {
            session.opened_at_rotation
        };
        let homes: Vec<(usize, CardPose)> =
            session.saved.iter().map(|(&i, s)| (i, s.home)).collect();

        self.timelines.kill(Channel::Detail);
        self.timelines.kill(Channel::DetailExpand);
        if !self.set_mode(InteractionMode::DetailClosing) {
            return;
        }

        let d = self.tuning.detail.clone();
        let mut timeline = Timeline::new("detail-close")
            .tween(Property::RingRotation, ring_target, d.close(), Easing::Power2Out)
            .tween(Property::BackdropOpacity, 0.0, d.fade(), Easing::Power1Out)
            .on_complete(Cue::CloseFinished)
            .hint(HintTarget::Ring)
            .hint(HintTarget::Backdrop);
        for (i, home) in homes {
            timeline = shrink(timeline, i, home, d.close(), Easing::Power2Out);
        }
        for i in 0..self.cards.len() {
            timeline = timeline.tween_at(
                d.dim_delay(),
                Property::CardOpacity(i),
                1.0,
                d.fade(),
                Easing::Power1Out,
            );
        }
        self.timelines.start(Channel::Detail, timeline);
    }

    pub fn detail_session(&self) -> Option<&DetailSession> {
        self.session.as_ref()
    }

    /// Rebases the card's origin on its anchor so scaling leaves the anchor
    /// in place, and remembers where it came from.
    fn lift(&mut self, measurement: &DetailMeasurement, anchor: Point) -> SavedCard {
        let index = measurement.index;
        self.scene.rebase_origin(index, anchor);
        SavedCard {
            pose: measurement.pose,
            origin: measurement.origin,
            home: self.scene.cards.get(index).map_or(measurement.pose, |c| c.pose),
        }
    }

    pub(crate) fn expand_active(&mut self, index: usize, duration: Duration) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.active != index
            || !matches!(
                self.mode,
                InteractionMode::DetailOpening | InteractionMode::DetailNavigating
            )
        {
            return;
        }
        let plan = session.plan;
        let Some(measurement) = ExpandMeasurement::take(&self.scene, &plan) else {
            log::warn!("card {index} has no usable screen position, leaving it in place");
            self.detail_settled(index);
            return;
        };
        log::trace!(
            "expanding card {index} from {:?} by {:?}",
            measurement.anchor_on_screen,
            measurement.translation
        );
        self.timelines.start(
            Channel::DetailExpand,
            Timeline::new("detail-expand")
                .tween(
                    Property::CardX(index),
                    measurement.translation.x,
                    duration,
                    Easing::Power2Out,
                )
                .tween(
                    Property::CardY(index),
                    measurement.translation.y,
                    duration,
                    Easing::Power2Out,
                )
                .tween(Property::CardScale(index), plan.target_scale, duration, Easing::Power2Out)
                .on_complete(Cue::DetailSettled { index })
                .hint(HintTarget::Card(index)),
        );
    }

    pub(crate) fn detail_settled(&mut self, index: usize) {
        if self.session.as_ref().map(|s| s.active) != Some(index) {
            return;
        }
        if matches!(
            self.mode,
            InteractionMode::DetailOpening | InteractionMode::DetailNavigating
        ) {
            self.set_mode(InteractionMode::DetailOpen);
        }
    }

    pub(crate) fn finish_close(&mut self) {
        if self.mode != InteractionMode::DetailClosing {
            return;
        }
        let Some(session) = self.session.take() else {
            return;
        };
        for (&i, saved) in &session.saved {
            if let Some(card) = self.scene.cards.get_mut(i) {
                card.pose = saved.pose;
                card.origin = saved.origin;
            }
        }
        self.scene.elevated = None;
        self.pause(session.active);

        self.angle.set_absolute(self.scene.ring_rotation);
        self.set_mode(InteractionMode::Idle);
        self.angle.push_indicator(&self.tuning, &mut self.timelines);
        self.locate();
        self.apply_pending_viewport();
        log::info!(
            "closed detail on card {}, ring at {:.1}",
            session.active,
            self.angle.rotation()
        );
    }
}

fn shrink(
    timeline: Timeline,
    index: usize,
    home: CardPose,
    duration: Duration,
    easing: Easing,
) -> Timeline {
    timeline
        .tween(Property::CardX(index), home.x, duration, easing)
        .tween(Property::CardY(index), home.y, duration, easing)
        .tween(Property::CardScale(index), home.scale, duration, easing)
        .hint(HintTarget::Card(index))
}
