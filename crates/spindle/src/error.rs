use crate::mode::InteractionMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CarouselError {
    #[error("A carousel needs at least one card")]
    EmptyRing,
    #[error("Card {index} is out of range for {count} cards")]
    IndexOutOfRange { index: usize, count: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid interaction transition {from} -> {to}")]
pub struct TransitionError {
    pub from: InteractionMode,
    pub to: InteractionMode,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback rejected: {0}")]
    Rejected(String),
    #[error("No playable media for card {0}")]
    Unavailable(usize),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Manifest error: {0}")]
    Json(#[from] serde_json::Error),
}
