use crate::card::Card;
use crate::error::PlaybackError;

/// Pauses and resumes card media on behalf of the detail engine. The engine
/// only ever logs failures.
pub trait MediaControl: std::fmt::Debug {
    fn play(&mut self, card: &Card) -> Result<(), PlaybackError>;
    fn pause(&mut self, card: &Card) -> Result<(), PlaybackError>;
}

/// For hosts without playback.
#[derive(Debug, Default)]
pub struct NoPlayback;

impl MediaControl for NoPlayback {
    fn play(&mut self, _card: &Card) -> Result<(), PlaybackError> {
        Ok(())
    }

    fn pause(&mut self, _card: &Card) -> Result<(), PlaybackError> {
        Ok(())
    }
}
