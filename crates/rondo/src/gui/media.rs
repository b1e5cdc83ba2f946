use crate::sys::manifest;
use gtk::gdk;
use gtk::gio;
use gtk::prelude::*;
use gtk4 as gtk;
use spindle::{Card, MediaControl, PlaybackError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::rc::Rc;

/// Video streams for cards that have been played at least once. Clones
/// share the same streams, so the renderer reads what the engine drives.
#[derive(Debug, Clone, Default)]
pub struct Playback {
    streams: Rc<RefCell<HashMap<usize, gtk::MediaFile>>>,
}

impl Playback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frame of card `index`, once its stream has one.
    pub fn frame(&self, index: usize) -> Option<gdk::Paintable> {
        self.streams
            .borrow()
            .get(&index)
            .filter(|s| s.is_prepared() && s.error().is_none())
            .map(|s| s.clone().upcast())
    }

    pub fn is_playing(&self) -> bool {
        self.streams.borrow().values().any(|s| s.is_playing())
    }
}

fn open(card: &Card) -> Result<gtk::MediaFile, PlaybackError> {
    if card.media.as_str().is_empty() {
        return Err(PlaybackError::Unavailable(card.index));
    }
    let file = match manifest::local_path(&card.media) {
        Some(path) => gio::File::for_path(path),
        None => gio::File::for_uri(card.media.as_str()),
    };
    let stream = gtk::MediaFile::for_file(&file);
    stream.set_loop(true);
    stream.set_muted(true);
    Ok(stream)
}

impl MediaControl for Playback {
    fn play(&mut self, card: &Card) -> Result<(), PlaybackError> {
        let mut streams = self.streams.borrow_mut();
        let stream = match streams.entry(card.index) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(v) => v.insert(open(card)?),
        };
        if let Some(err) = stream.error() {
            return Err(PlaybackError::Rejected(err.to_string()));
        }
        stream.play();
        log::debug!("playing card {}", card.index);
        Ok(())
    }

    fn pause(&mut self, card: &Card) -> Result<(), PlaybackError> {
        if let Some(stream) = self.streams.borrow().get(&card.index) {
            stream.pause();
        }
        Ok(())
    }
}
