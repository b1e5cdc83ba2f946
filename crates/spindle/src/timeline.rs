//! Cancellable, composable tweens over scene properties.
//!
//! A [`Timeline`] is a bundle of property tweens plus cue points, started on
//! a [`Channel`]. Starting a timeline kills whatever was running on the same
//! channel, and strips the properties it animates out of every other running
//! timeline, so no two animations ever drive one property at once.
//!
//! Render hints are held as [`HintLease`]s owned by the timeline. Dropping the
//! timeline, whether it finished or was killed, releases them.

use crate::easing::Easing;
use crate::scene::Scene;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    RingRotation,
    RingX,
    RingY,
    IndicatorRotation,
    IndicatorScale,
    IndicatorOpacity,
    BackdropOpacity,
    CardOpacity(usize),
    CardX(usize),
    CardY(usize),
    CardScale(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Channel {
    Entry,
    Spin,
    IndicatorSpin,
    IndicatorEmphasis,
    Throw,
    Settle,
    Recenter,
    /// Ring rotation and fades of a detail open, navigate or close.
    Detail,
    /// Phase two: the lifted card travelling to viewport center.
    DetailExpand,
}

/// Events a timeline reports back to the engine when a cue point passes or
/// the timeline completes. Killed timelines report nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Cue {
    EntryFinished,
    ThrowFinished,
    /// The ring has reached its detail rotation; the card at `index` can now
    /// be measured in screen space and expanded.
    ExpandActive { index: usize, duration: Duration },
    DetailSettled { index: usize },
    CloseFinished,
}

/// Things a renderer may promote to a faster compositing path while they
/// animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintTarget {
    Ring,
    Backdrop,
    Indicator,
    Card(usize),
}

#[derive(Debug, Clone, Default)]
pub struct RenderHints(Rc<RefCell<HashMap<HintTarget, usize>>>);

impl RenderHints {
    pub fn acquire(&self, target: HintTarget) -> HintLease {
        *self.0.borrow_mut().entry(target).or_insert(0) += 1;
        HintLease {
            hints: self.clone(),
            target,
        }
    }

    pub fn is_active(&self, target: HintTarget) -> bool {
        self.0.borrow().contains_key(&target)
    }

    pub fn active_count(&self) -> usize {
        self.0.borrow().len()
    }
}

#[derive(Debug)]
pub struct HintLease {
    hints: RenderHints,
    target: HintTarget,
}

impl Drop for HintLease {
    fn drop(&mut self) {
        let mut map = self.hints.0.borrow_mut();
        if let Some(count) = map.get_mut(&self.target) {
            *count -= 1;
            if *count == 0 {
                map.remove(&self.target);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Tween {
    property: Property,
    to: f64,
    /// Captured from the scene the first frame the tween is live, so a tween
    /// queued behind another picks up wherever that one left the property.
    from: Option<f64>,
    at: Duration,
    duration: Duration,
    easing: Easing,
    done: bool,
}

impl Tween {
    fn end(&self) -> Duration {
        self.at + self.duration
    }

    fn advance(&mut self, elapsed: Duration, scene: &mut Scene) {
        if self.done || elapsed < self.at {
            return;
        }
        let from = *self.from.get_or_insert_with(|| scene.get(self.property));
        let local = elapsed - self.at;
        if local >= self.duration {
            // exact landing, not from + (to - from) * 1.0
            scene.set(self.property, self.to);
            self.done = true;
            return;
        }
        let progress = local.as_secs_f64() / self.duration.as_secs_f64();
        scene.set(
            self.property,
            from + (self.to - from) * self.easing.apply(progress),
        );
    }
}

#[derive(Debug, Clone)]
struct CuePoint {
    at: Duration,
    cue: Cue,
    fired: bool,
}

#[derive(Debug)]
pub struct Timeline {
    label: &'static str,
    tweens: Vec<Tween>,
    cues: Vec<CuePoint>,
    on_complete: Option<Cue>,
    hint_targets: Vec<HintTarget>,
    leases: Vec<HintLease>,
    elapsed: Duration,
    had_tweens: bool,
    finished: bool,
}

impl Timeline {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            tweens: Vec::new(),
            cues: Vec::new(),
            on_complete: None,
            hint_targets: Vec::new(),
            leases: Vec::new(),
            elapsed: Duration::ZERO,
            had_tweens: false,
            finished: false,
        }
    }

    pub fn tween(self, property: Property, to: f64, duration: Duration, easing: Easing) -> Self {
        self.tween_at(Duration::ZERO, property, to, duration, easing)
    }

    pub fn tween_at(
        mut self,
        at: Duration,
        property: Property,
        to: f64,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        self.tweens.push(Tween {
            property,
            to,
            from: None,
            at,
            duration,
            easing,
            done: false,
        });
        self.had_tweens = true;
        self
    }

    pub fn cue_at(mut self, at: Duration, cue: Cue) -> Self {
        self.cues.push(CuePoint {
            at,
            cue,
            fired: false,
        });
        self
    }

    pub fn on_complete(mut self, cue: Cue) -> Self {
        self.on_complete = Some(cue);
        self
    }

    pub fn hint(mut self, target: HintTarget) -> Self {
        if !self.hint_targets.contains(&target) {
            self.hint_targets.push(target);
        }
        self
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn duration(&self) -> Duration {
        let tweens = self.tweens.iter().map(Tween::end);
        let cues = self.cues.iter().map(|c| c.at);
        tweens.chain(cues).max().unwrap_or(Duration::ZERO)
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn animates(&self, property: Property) -> bool {
        self.tweens.iter().any(|t| t.property == property)
    }

    fn properties(&self) -> Vec<Property> {
        self.tweens.iter().map(|t| t.property).collect()
    }

    fn drop_property(&mut self, property: Property) {
        self.tweens.retain(|t| t.property != property);
    }

    /// Lost every tween to newer timelines; treated as killed.
    fn is_overwritten(&self) -> bool {
        self.had_tweens && self.tweens.is_empty()
    }

    fn advance(&mut self, dt: Duration, scene: &mut Scene, cues: &mut Vec<Cue>) {
        if self.finished {
            return;
        }
        self.elapsed += dt;

        for tween in &mut self.tweens {
            tween.advance(self.elapsed, scene);
        }
        for point in &mut self.cues {
            if !point.fired && self.elapsed >= point.at {
                point.fired = true;
                cues.push(point.cue.clone());
            }
        }

        if self.tweens.iter().all(|t| t.done) && self.cues.iter().all(|c| c.fired) {
            self.finished = true;
            cues.extend(self.on_complete.take());
        }
    }
}

#[derive(Debug, Default)]
pub struct Coordinator {
    running: Vec<(Channel, Timeline)>,
    hints: RenderHints,
}

impl Coordinator {
    pub fn hints(&self) -> &RenderHints {
        &self.hints
    }

    /// Kills whatever runs on `channel`, takes ownership of the new
    /// timeline's properties and acquires its render hints.
    pub fn start(&mut self, channel: Channel, mut timeline: Timeline) {
        self.kill(channel);
        for property in timeline.properties() {
            self.claim(property);
        }
        timeline.leases = timeline
            .hint_targets
            .iter()
            .map(|&target| self.hints.acquire(target))
            .collect();
        log::trace!("timeline '{}' started on {}", timeline.label, channel);
        self.running.push((channel, timeline));
    }

    pub fn kill(&mut self, channel: Channel) -> bool {
        let before = self.running.len();
        self.running.retain(|(c, t)| {
            let keep = *c != channel;
            if !keep {
                log::debug!("timeline '{}' on {} killed", t.label, c);
            }
            keep
        });
        before != self.running.len()
    }

    /// Stops every running tween of `property`, e.g. before the property is
    /// set directly by a drag.
    pub fn claim(&mut self, property: Property) {
        for (_, timeline) in &mut self.running {
            timeline.drop_property(property);
        }
        self.running.retain(|(c, t)| {
            let overwritten = t.is_overwritten();
            if overwritten {
                log::debug!("timeline '{}' on {} overwritten", t.label, c);
            }
            !overwritten
        });
    }

    pub fn is_running(&self, channel: Channel) -> bool {
        self.running.iter().any(|(c, _)| *c == channel)
    }

    pub fn is_animating(&self, property: Property) -> bool {
        self.running.iter().any(|(_, t)| t.animates(property))
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    /// Advances every running timeline by `dt`, writing tweened values into
    /// `scene`. Finished timelines are dropped, which releases their hints.
    pub fn tick(&mut self, dt: Duration, scene: &mut Scene) -> Vec<Cue> {
        let mut cues = Vec::new();
        for (_, timeline) in &mut self.running {
            timeline.advance(dt, scene, &mut cues);
        }
        self.running.retain(|(_, t)| !t.is_finished());
        cues
    }
}
