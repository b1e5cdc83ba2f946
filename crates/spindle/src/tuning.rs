//! Every constant of the interaction model, deserializable from the app's
//! config file. Missing keys fall back to the defaults below.

use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Wheel `deltaY` units per degree of rotation.
    pub wheel_divisor: f64,
    /// Smoothing applied to wheel ticks and the indicator mirror.
    pub spin_ms: u64,
    /// Arrow-key step duration.
    pub step_ms: u64,
    pub step_elastic_period: f64,
    pub indicator: IndicatorTuning,
    pub drag: DragTuning,
    pub detail: DetailTuning,
    pub ring: RingTuning,
    pub entry: EntryTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            wheel_divisor: 40.0,
            spin_ms: 800,
            step_ms: 800,
            step_elastic_period: 0.35,
            indicator: IndicatorTuning::default(),
            drag: DragTuning::default(),
            detail: DetailTuning::default(),
            ring: RingTuning::default(),
            entry: EntryTuning::default(),
        }
    }
}

impl Tuning {
    pub fn spin(&self) -> Duration {
        ms(self.spin_ms)
    }

    pub fn step(&self) -> Duration {
        ms(self.step_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorTuning {
    pub active_ms: u64,
    /// Quiet period after the last input before the indicator dims.
    pub quiet_ms: u64,
    pub idle_ms: u64,
    pub idle_scale: f64,
    pub idle_opacity: f64,
}

impl Default for IndicatorTuning {
    fn default() -> Self {
        Self {
            active_ms: 200,
            quiet_ms: 800,
            idle_ms: 600,
            idle_scale: 0.6,
            idle_opacity: 0.5,
        }
    }
}

impl IndicatorTuning {
    pub fn active(&self) -> Duration {
        ms(self.active_ms)
    }

    pub fn quiet(&self) -> Duration {
        ms(self.quiet_ms)
    }

    pub fn idle(&self) -> Duration {
        ms(self.idle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragTuning {
    /// Pointer travel (px) before a press becomes a drag.
    pub threshold_px: f64,
    /// How long after release a click is still treated as part of the drag.
    pub click_guard_ms: u64,
    /// Samples older than this are ignored when estimating release velocity.
    pub velocity_window_ms: u64,
    /// Time constant (ms) of the velocity decay used to project where a throw
    /// comes to rest.
    pub decay_ms: u64,
    pub min_throw_ms: u64,
    pub max_throw_ms: u64,
    pub settle_ms: u64,
    pub settle_amplitude: f64,
    pub settle_period: f64,
}

impl Default for DragTuning {
    fn default() -> Self {
        Self {
            threshold_px: 3.0,
            click_guard_ms: 50,
            velocity_window_ms: 100,
            decay_ms: 325,
            min_throw_ms: 200,
            max_throw_ms: 3000,
            settle_ms: 600,
            settle_amplitude: 1.0,
            settle_period: 0.4,
        }
    }
}

impl DragTuning {
    pub fn click_guard(&self) -> Duration {
        ms(self.click_guard_ms)
    }

    pub fn velocity_window(&self) -> Duration {
        ms(self.velocity_window_ms)
    }

    pub fn settle(&self) -> Duration {
        ms(self.settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailTuning {
    /// Fraction of the viewport a lifted card may occupy.
    pub fit_margin: f64,
    pub rotate_ms: u64,
    pub fade_ms: u64,
    pub dim_delay_ms: u64,
    pub dim_opacity: f64,
    pub expand_ms: u64,
    pub navigate_shrink_ms: u64,
    pub navigate_rotate_delay_ms: u64,
    pub navigate_rotate_ms: u64,
    pub navigate_expand_ms: u64,
    pub close_ms: u64,
}

impl Default for DetailTuning {
    fn default() -> Self {
        Self {
            fit_margin: 0.85,
            rotate_ms: 500,
            fade_ms: 400,
            dim_delay_ms: 100,
            dim_opacity: 0.15,
            expand_ms: 600,
            navigate_shrink_ms: 300,
            navigate_rotate_delay_ms: 100,
            navigate_rotate_ms: 400,
            navigate_expand_ms: 400,
            close_ms: 500,
        }
    }
}

impl DetailTuning {
    pub fn rotate(&self) -> Duration {
        ms(self.rotate_ms)
    }

    pub fn fade(&self) -> Duration {
        ms(self.fade_ms)
    }

    pub fn dim_delay(&self) -> Duration {
        ms(self.dim_delay_ms)
    }

    pub fn expand(&self) -> Duration {
        ms(self.expand_ms)
    }

    pub fn navigate_shrink(&self) -> Duration {
        ms(self.navigate_shrink_ms)
    }

    pub fn navigate_rotate_delay(&self) -> Duration {
        ms(self.navigate_rotate_delay_ms)
    }

    pub fn navigate_rotate(&self) -> Duration {
        ms(self.navigate_rotate_ms)
    }

    pub fn navigate_expand(&self) -> Duration {
        ms(self.navigate_expand_ms)
    }

    pub fn close(&self) -> Duration {
        ms(self.close_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingTuning {
    /// Distance from the ring center to each card's center, in ring units.
    pub radius: f64,
    pub card_width: f64,
    pub card_height: f64,
    /// Viewport height at which one ring unit is one pixel.
    pub reference_height: f64,
    /// Where the top card's center sits, as a fraction of viewport height.
    pub top_card_y: f64,
    pub recenter_ms: u64,
}

impl Default for RingTuning {
    fn default() -> Self {
        Self {
            radius: 900.0,
            card_width: 240.0,
            card_height: 320.0,
            reference_height: 1440.0,
            top_card_y: 0.42,
            recenter_ms: 300,
        }
    }
}

impl RingTuning {
    pub fn card_box(&self) -> Size {
        Size::new(self.card_width, self.card_height)
    }

    pub fn recenter(&self) -> Duration {
        ms(self.recenter_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryTuning {
    pub start_rotation: f64,
    /// Window over which the card reveals are staggered.
    pub reveal_ms: u64,
    pub pause_ms: u64,
    pub zoom_ms: u64,
    pub card_fade_ms: u64,
    /// The indicator slides in this long before the entry ends.
    pub indicator_lead_ms: u64,
    pub indicator_fade_ms: u64,
}

impl Default for EntryTuning {
    fn default() -> Self {
        Self {
            start_rotation: -45.0,
            reveal_ms: 3500,
            pause_ms: 600,
            zoom_ms: 2800,
            card_fade_ms: 600,
            indicator_lead_ms: 1000,
            indicator_fade_ms: 800,
        }
    }
}

impl EntryTuning {
    pub fn total(&self) -> Duration {
        ms(self.reveal_ms + self.pause_ms + self.zoom_ms)
    }

    pub fn reveal(&self) -> Duration {
        ms(self.reveal_ms)
    }

    pub fn card_fade(&self) -> Duration {
        ms(self.card_fade_ms)
    }

    pub fn indicator_lead(&self) -> Duration {
        ms(self.indicator_lead_ms)
    }

    pub fn indicator_fade(&self) -> Duration {
        ms(self.indicator_fade_ms)
    }
}
