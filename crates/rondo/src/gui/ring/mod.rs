//! Cairo rendering of the ring scene.

pub mod view;

pub use view::{Stage, draw};

use crate::sys::manifest;
use gdk_pixbuf::Pixbuf;
use spindle::{CardDescriptor, MediaKind, Size};

pub const CARD_CORNER_RADIUS: f64 = 14.0;
pub const CENTRAL_OUTLINE_WIDTH: f64 = 3.0;
pub const TITLE_FONT_SIZE: f64 = 18.0;
/// Position indicator dial, in pixels at ring scale 1.
pub const INDICATOR_RADIUS: f64 = 26.0;
pub const INDICATOR_TICK: f64 = 5.0;
pub const INDICATOR_BOTTOM_MARGIN: f64 = 64.0;

/// Decoded stills for every card, by card index. Video cards show their
/// poster until a frame is available.
#[derive(Debug, Default)]
pub struct Artwork {
    stills: Vec<Option<Pixbuf>>,
}

impl Artwork {
    /// Decodes what can be read from disk and fills in intrinsic sizes the
    /// manifest left out.
    pub fn load(descriptors: &mut [CardDescriptor]) -> Self {
        let stills = descriptors
            .iter_mut()
            .map(|d| {
                let still = match d.kind {
                    MediaKind::Video => d.poster.as_ref(),
                    MediaKind::Image => Some(&d.media),
                }?;
                let path = manifest::local_path(still)?;
                match Pixbuf::from_file(&path) {
                    Ok(pixbuf) => {
                        if d.natural_size.is_none() {
                            d.natural_size = Some(Size::new(
                                pixbuf.width() as f64,
                                pixbuf.height() as f64,
                            ));
                        }
                        Some(pixbuf)
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect::<Vec<_>>();
        log::info!(
            "decoded {} of {} card stills",
            stills.iter().flatten().count(),
            stills.len()
        );
        Self { stills }
    }

    pub fn still(&self, index: usize) -> Option<&Pixbuf> {
        self.stills.get(index).and_then(Option::as_ref)
    }
}
