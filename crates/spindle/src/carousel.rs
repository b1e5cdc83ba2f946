//! The engine hub: owns the card set, the scene and every running timeline,
//! and routes cues back into the components that started them.

use crate::angle::AngleModel;
use crate::card::{Card, CardDescriptor};
use crate::detail::DetailSession;
use crate::easing::Easing;
use crate::error::CarouselError;
use crate::geometry::Size;
use crate::indicator;
use crate::input::Press;
use crate::locator::CentralLocator;
use crate::media::{MediaControl, NoPlayback};
use crate::mode::InteractionMode;
use crate::scene::Scene;
use crate::snap::SnapResolver;
use crate::timeline::{Channel, Coordinator, Cue, HintTarget, Property, RenderHints, Timeline};
use crate::tuning::Tuning;
use std::time::Duration;

#[derive(Debug)]
pub struct Carousel {
    pub(crate) cards: Vec<Card>,
    pub(crate) tuning: Tuning,
    pub(crate) scene: Scene,
    pub(crate) angle: AngleModel,
    pub(crate) locator: CentralLocator,
    pub(crate) resolver: SnapResolver,
    pub(crate) timelines: Coordinator,
    pub(crate) mode: InteractionMode,
    pub(crate) session: Option<DetailSession>,
    pub(crate) press: Option<Press>,
    pub(crate) click_guard_until: Option<Duration>,
    /// Viewport of a resize that arrived while recentering was not allowed.
    pending_viewport: Option<Size>,
    /// Sum of every `tick`; the clock drag velocity and the click guard run on.
    pub(crate) clock: Duration,
    media: Box<dyn MediaControl>,
}

impl Carousel {
    /// Builds the ring from an ingested card list. Input stays gated until
    /// [`Carousel::ready`] runs, either directly or at the end of the entry
    /// reveal.
    pub fn new(
        descriptors: Vec<CardDescriptor>,
        viewport: Size,
        tuning: Tuning,
    ) -> Result<Self, CarouselError> {
        if descriptors.is_empty() {
            return Err(CarouselError::EmptyRing);
        }
        let cards = Card::build(descriptors);
        let angle = AngleModel::new(cards.len(), 0.0)?;
        let scene = Scene::new(cards.len(), viewport, &tuning.ring);
        log::debug!("built ring of {} cards for {:?}", cards.len(), viewport);

        Ok(Self {
            resolver: SnapResolver::new(cards.len()),
            cards,
            tuning,
            scene,
            angle,
            locator: CentralLocator::default(),
            timelines: Coordinator::default(),
            mode: InteractionMode::Entry,
            session: None,
            press: None,
            click_guard_until: None,
            pending_viewport: None,
            clock: Duration::ZERO,
            media: Box::new(NoPlayback),
        })
    }

    pub fn with_media(mut self, media: Box<dyn MediaControl>) -> Self {
        self.media = media;
        self
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn angle(&self) -> &AngleModel {
        &self.angle
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Index of the card at the top, once the ring is live.
    pub fn central(&self) -> Option<usize> {
        self.locator.central()
    }

    pub fn hints(&self) -> &RenderHints {
        self.timelines.hints()
    }

    pub fn is_animating(&self) -> bool {
        !self.timelines.is_idle()
    }

    /// Advances every animation by `dt`. Returns whether anything moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.clock += dt;
        if self.timelines.is_idle() {
            return false;
        }
        let following = self.timelines.is_running(Channel::Throw)
            || self.timelines.is_running(Channel::Settle);
        let cues = self.timelines.tick(dt, &mut self.scene);
        if following {
            // a throw drives the ring directly; the model and mirror follow
            self.angle.set_absolute(self.scene.ring_rotation);
            self.scene.indicator.rotation = self.angle.indicator_rotation();
            self.locate();
        }
        for cue in cues {
            self.dispatch(cue);
        }
        true
    }

    fn dispatch(&mut self, cue: Cue) {
        log::trace!("cue {cue:?}");
        match cue {
            Cue::EntryFinished => self.ready(),
            Cue::ThrowFinished => self.settle_throw(),
            Cue::ExpandActive { index, duration } => self.expand_active(index, duration),
            Cue::DetailSettled { index } => self.detail_settled(index),
            Cue::CloseFinished => self.finish_close(),
        }
    }

    /// Plays the entry reveal: the ring turns in from its start angle while
    /// cards pop in one after another, then the indicator fades in just
    /// before the end. Input unlocks when it finishes.
    pub fn begin_entry(&mut self) {
        if self.mode != InteractionMode::Entry {
            return;
        }
        let entry = self.tuning.entry.clone();
        let count = self.cards.len();

        self.scene.ring_rotation = entry.start_rotation;
        self.scene.indicator.opacity = 0.0;
        self.scene.indicator.rotation = -entry.start_rotation;
        for card in &mut self.scene.cards {
            card.opacity = 0.0;
            card.pose.scale = 0.0;
        }

        let stagger = entry.reveal() / count.max(1) as u32;
        let indicator_at = entry.total().saturating_sub(entry.indicator_lead());
        let mut timeline = Timeline::new("entry")
            .tween(Property::RingRotation, 0.0, entry.total(), Easing::Power1Out)
            .tween_at(
                indicator_at,
                Property::IndicatorOpacity,
                1.0,
                entry.indicator_fade(),
                Easing::Power2Out,
            )
            .tween_at(
                indicator_at,
                Property::IndicatorRotation,
                0.0,
                entry.indicator_fade(),
                Easing::Power2Out,
            )
            .on_complete(Cue::EntryFinished)
            .hint(HintTarget::Ring);
        for (slot, index) in reveal_order(count).into_iter().enumerate() {
            let at = stagger * slot as u32;
            timeline = timeline
                .tween_at(
                    at,
                    Property::CardOpacity(index),
                    1.0,
                    entry.card_fade(),
                    Easing::Power2Out,
                )
                .tween_at(
                    at,
                    Property::CardScale(index),
                    1.0,
                    entry.card_fade(),
                    Easing::BackOut { overshoot: 1.2 },
                );
        }
        self.timelines.start(Channel::Entry, timeline);
        log::debug!("entry reveal started, {:?} total", entry.total());
    }

    /// Unlocks input. Cutting the entry reveal short jumps to its end state.
    pub fn ready(&mut self) {
        if self.mode != InteractionMode::Entry {
            return;
        }
        if self.timelines.kill(Channel::Entry) {
            self.scene.ring_rotation = 0.0;
            self.scene.indicator.opacity = 1.0;
            for card in &mut self.scene.cards {
                card.opacity = 1.0;
                card.pose.scale = 1.0;
            }
        }
        self.set_mode(InteractionMode::Idle);
        self.angle.set_absolute(self.scene.ring_rotation);
        self.scene.indicator.rotation = self.angle.indicator_rotation();
        self.locate();
        indicator::emphasize(&self.tuning.indicator, &mut self.timelines);
        self.apply_pending_viewport();
        log::info!("carousel ready with {} cards", self.cards.len());
    }

    /// Moves the ring so its top card sits at the layout height of a resized
    /// viewport. Never rescales. Deferred while entry or detail mode runs.
    pub fn recenter(&mut self, viewport: Size) -> bool {
        if self.mode == InteractionMode::Entry || self.mode.is_detail() {
            self.pending_viewport = Some(viewport);
            return false;
        }
        self.scene.viewport = viewport;
        let center = self.scene.layout_center(viewport, &self.tuning.ring);
        let duration = self.tuning.ring.recenter();
        self.timelines.start(
            Channel::Recenter,
            Timeline::new("recenter")
                .tween(Property::RingX, center.x, duration, Easing::Power2Out)
                .tween(Property::RingY, center.y, duration, Easing::Power2Out)
                .hint(HintTarget::Ring),
        );
        true
    }

    pub(crate) fn apply_pending_viewport(&mut self) {
        if let Some(viewport) = self.pending_viewport.take() {
            self.recenter(viewport);
        }
    }

    /// Swaps in reloaded tuning. Ring geometry is fixed once built, so only
    /// timings, thresholds and easing take effect.
    pub fn retune(&mut self, tuning: Tuning) {
        if tuning.ring != self.tuning.ring {
            log::warn!("ring layout changes apply on the next start");
        }
        self.tuning = tuning;
    }

    /// Validated mode change. An illegal transition is logged and refused.
    pub(crate) fn set_mode(&mut self, to: InteractionMode) -> bool {
        match self.mode.transition(to) {
            Ok(mode) => {
                log::debug!("mode {} -> {}", self.mode, mode);
                self.mode = mode;
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    pub(crate) fn locate(&mut self) {
        if let Some(index) = self.locator.recompute(self.angle.rotation(), self.cards.len()) {
            log::debug!("central card is now {index}");
        }
    }

    fn settle_throw(&mut self) {
        let target = self.resolver.snap(self.scene.ring_rotation);
        let drag = &self.tuning.drag;
        self.timelines.start(
            Channel::Settle,
            Timeline::new("settle")
                .tween(
                    Property::RingRotation,
                    target,
                    drag.settle(),
                    Easing::elastic(drag.settle_amplitude, drag.settle_period),
                )
                .hint(HintTarget::Ring),
        );
    }

    pub(crate) fn play(&mut self, index: usize) {
        let Some(card) = self.cards.get(index).filter(|c| c.is_video()) else {
            return;
        };
        if let Err(e) = self.media.play(card) {
            log::warn!("{e}");
        }
    }

    pub(crate) fn pause(&mut self, index: usize) {
        let Some(card) = self.cards.get(index).filter(|c| c.is_video()) else {
            return;
        };
        if let Err(e) = self.media.pause(card) {
            log::warn!("{e}");
        }
    }
}

/// Scattered but stable order in which cards appear during the entry reveal:
/// walks the ring with a stride coprime to its size.
fn reveal_order(count: usize) -> Vec<usize> {
    fn gcd(a: usize, b: usize) -> usize {
        if b == 0 { a } else { gcd(b, a % b) }
    }
    let stride = (count / 2 + 1..count)
        .find(|&s| gcd(s, count) == 1)
        .unwrap_or(1);
    (0..count).map(|k| k * stride % count).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::card::{MediaKind, MediaRef, SourceUrl};

    pub(crate) const FRAME: Duration = Duration::from_millis(16);

    pub(crate) fn descriptors(count: usize) -> Vec<CardDescriptor> {
        (0..count)
            .map(|i| CardDescriptor {
                title: format!("card {i}"),
                media: MediaRef::new(format!("media/{i}.jpg")),
                poster: None,
                source: SourceUrl::new(format!("https://example.com/{i}")),
                kind: MediaKind::Image,
                natural_size: None,
            })
            .collect()
    }

    pub(crate) fn ready_with(count: usize, tuning: Tuning) -> Carousel {
        let mut carousel =
            Carousel::new(descriptors(count), Size::new(1600.0, 1000.0), tuning).unwrap();
        carousel.ready();
        carousel
    }

    /// One ring unit per pixel on a 1600x1000 viewport.
    pub(crate) fn ready(count: usize) -> Carousel {
        let mut tuning = Tuning::default();
        tuning.ring.reference_height = 1000.0;
        ready_with(count, tuning)
    }

    pub(crate) fn run_until_idle(carousel: &mut Carousel) {
        for _ in 0..5000 {
            if !carousel.tick(FRAME) {
                return;
            }
        }
        panic!("carousel never settled");
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::card::{MediaKind, MediaRef, SourceUrl};
    use crate::error::PlaybackError;
    use crate::geometry::Point;
    use crate::input::WheelOutcome;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_empty_ring_is_rejected() {
        let err =
            Carousel::new(Vec::new(), Size::new(800.0, 600.0), Tuning::default()).unwrap_err();
        assert!(matches!(err, CarouselError::EmptyRing));
    }

    #[test]
    fn test_entry_gates_input_until_finished() {
        let mut carousel =
            Carousel::new(descriptors(8), Size::new(1600.0, 1000.0), Tuning::default()).unwrap();
        carousel.begin_entry();
        assert_eq!(carousel.scene().ring_rotation, -45.0);
        assert_eq!(carousel.wheel(120.0), WheelOutcome::Ignored);
        assert_eq!(carousel.central(), None);

        run_until_idle(&mut carousel);
        assert_eq!(carousel.mode(), InteractionMode::Idle);
        assert_eq!(carousel.scene().ring_rotation, 0.0);
        assert!(carousel.scene().cards.iter().all(|c| c.opacity == 1.0 && c.pose.scale == 1.0));
        assert_eq!(carousel.central(), Some(0));
        // emphasis ran its course after the entry
        assert_eq!(carousel.scene().indicator.scale, 0.6);
    }

    #[test]
    fn test_ready_cuts_entry_short() {
        let mut carousel =
            Carousel::new(descriptors(4), Size::new(1600.0, 1000.0), Tuning::default()).unwrap();
        carousel.begin_entry();
        carousel.tick(Duration::from_secs(1));
        carousel.ready();
        assert_eq!(carousel.mode(), InteractionMode::Idle);
        assert_eq!(carousel.scene().ring_rotation, 0.0);
        assert!(!carousel.timelines.is_running(Channel::Entry));
        assert_eq!(carousel.wheel(-40.0), WheelOutcome::Spun);
    }

    #[test]
    fn test_reveal_order_visits_every_card_once() {
        for count in 1..12 {
            let mut order = reveal_order(count);
            order.sort_unstable();
            assert_eq!(order, (0..count).collect::<Vec<_>>());
        }
        assert_eq!(reveal_order(8), vec![0, 5, 2, 7, 4, 1, 6, 3]);
    }

    #[test]
    fn test_recenter_moves_without_rescaling() {
        let mut carousel = ready(8);
        let scale = carousel.scene().ring_scale;
        assert!(carousel.recenter(Size::new(1200.0, 800.0)));
        run_until_idle(&mut carousel);
        assert_eq!(carousel.scene().ring_scale, scale);
        assert_eq!(carousel.scene().ring_center.x, 600.0);
        let top = carousel.scene().card_point_on_screen(0, Point::CENTER).unwrap();
        assert!((top.y - 800.0 * 0.42).abs() < 1e-6);
    }

    #[test]
    fn test_recenter_waits_for_detail_to_close() {
        let mut carousel = ready(8);
        carousel.open(0).unwrap();
        let center = carousel.scene().ring_center;
        assert!(!carousel.recenter(Size::new(1000.0, 1000.0)));
        run_until_idle(&mut carousel);
        assert_eq!(carousel.scene().ring_center, center);

        carousel.close();
        run_until_idle(&mut carousel);
        assert_eq!(carousel.scene().ring_center.x, 500.0);
    }

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
        reject: bool,
    }

    impl MediaControl for Recorder {
        fn play(&mut self, card: &Card) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(format!("play {}", card.index));
            if self.reject {
                return Err(PlaybackError::Rejected("autoplay blocked".into()));
            }
            Ok(())
        }

        fn pause(&mut self, card: &Card) -> Result<(), PlaybackError> {
            self.calls.borrow_mut().push(format!("pause {}", card.index));
            Ok(())
        }
    }

    fn video_carousel(reject: bool) -> (Carousel, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut cards = descriptors(4);
        for card in cards.iter_mut().skip(1) {
            card.kind = MediaKind::Video;
            card.poster = Some(MediaRef::new("poster.jpg"));
        }
        cards[0].source = SourceUrl::new("https://example.com/still");
        let mut carousel = Carousel::new(cards, Size::new(1600.0, 1000.0), Tuning::default())
            .unwrap()
            .with_media(Box::new(Recorder {
                calls: calls.clone(),
                reject,
            }));
        carousel.ready();
        (carousel, calls)
    }

    #[test]
    fn test_playback_swaps_with_the_index() {
        let (mut carousel, calls) = video_carousel(false);
        carousel.open(1).unwrap();
        assert_eq!(*calls.borrow(), vec!["play 1"]);

        carousel.navigate(1);
        // synchronous with the index change, before any frame runs
        assert_eq!(*calls.borrow(), vec!["play 1", "pause 1", "play 2"]);

        carousel.navigate(2);
        assert_eq!(carousel.detail_session().unwrap().active(), 0);
        assert_eq!(calls.borrow().last().map(String::as_str), Some("pause 2"));
    }

    #[test]
    fn test_rejected_playback_does_not_block() {
        let (mut carousel, calls) = video_carousel(true);
        carousel.open(2).unwrap();
        run_until_idle(&mut carousel);
        assert_eq!(carousel.mode(), InteractionMode::DetailOpen);
        assert_eq!(*calls.borrow(), vec!["play 2"]);
    }

    #[test]
    fn test_retune_keeps_running_state() {
        let mut carousel = ready(8);
        let mut tuning = carousel.tuning().clone();
        tuning.wheel_divisor = 10.0;
        carousel.retune(tuning);
        carousel.wheel(-100.0);
        assert_eq!(carousel.angle().rotation(), 10.0);
    }
}
