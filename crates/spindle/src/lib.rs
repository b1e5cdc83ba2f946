//! Headless engine for a rotary card carousel.
//!
//! [`Carousel`] owns the ring and is driven by input calls plus a `tick`
//! per frame. Everything it animates lives in a [`Scene`] that a renderer
//! reads back.

#[macro_use]
mod macros;

pub mod angle;
pub mod card;
pub mod carousel;
pub mod detail;
pub mod easing;
pub mod error;
pub mod geometry;
pub mod indicator;
pub mod input;
pub mod locator;
pub mod media;
pub mod mode;
pub mod scene;
pub mod snap;
pub mod timeline;
pub mod tuning;

pub use card::{Card, CardDescriptor, MediaKind, MediaRef, SourceUrl};
pub use carousel::Carousel;
pub use error::{CarouselError, IngestError, PlaybackError, TransitionError};
pub use geometry::{Point, Size};
pub use input::{ClickOutcome, Key, WheelOutcome};
pub use media::{MediaControl, NoPlayback};
pub use mode::InteractionMode;
pub use scene::Scene;
pub use timeline::{HintTarget, RenderHints};
pub use tuning::Tuning;
