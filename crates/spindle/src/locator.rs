//! Which card sits at the top of the ring.

use crate::angle::{normalize, snap_angle};

/// Index of the card closest to the top for a ring turned by `rotation`.
///
/// Card `i` is at the top when the ring is at `-i * snap`, so the index is
/// the rounded snap count of the negated angle, wrapped into range.
pub fn central_index(rotation: f64, card_count: usize) -> usize {
    if card_count == 0 {
        return 0;
    }
    let steps = (-normalize(rotation) / snap_angle(card_count)).round() as i64;
    steps.rem_euclid(card_count as i64) as usize
}

/// Remembers only which card was last flagged, so the renderer can tell a
/// change apart from a repeat. The value itself is always derived.
#[derive(Debug, Clone, Default)]
pub struct CentralLocator {
    central: Option<usize>,
}

impl CentralLocator {
    pub fn central(&self) -> Option<usize> {
        self.central
    }

    /// Returns the new central index when it changed.
    pub fn recompute(&mut self, rotation: f64, card_count: usize) -> Option<usize> {
        if card_count == 0 {
            self.central = None;
            return None;
        }
        let index = central_index(rotation, card_count);
        if self.central == Some(index) {
            return None;
        }
        log::trace!("central card {:?} -> {}", self.central, index);
        self.central = Some(index);
        Some(index)
    }
}
