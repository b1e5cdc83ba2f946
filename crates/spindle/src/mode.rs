//! The one place that decides which input sources may touch the ring.

use crate::error::TransitionError;
use strum::{Display, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum InteractionMode {
    /// Entry reveal still running; all input is ignored.
    Entry,
    Idle,
    Dragging,
    DetailOpening,
    DetailOpen,
    DetailNavigating,
    DetailClosing,
}

impl InteractionMode {
    pub fn is_detail(self) -> bool {
        matches!(
            self,
            Self::DetailOpening | Self::DetailOpen | Self::DetailNavigating | Self::DetailClosing
        )
    }

    /// Wheel and keyboard spin only reach a resting ring. A drag owns the
    /// rotation until it is released.
    pub fn accepts_spin(self) -> bool {
        self == Self::Idle
    }

    /// A detail session exists and is not already on its way out.
    pub fn can_navigate(self) -> bool {
        matches!(
            self,
            Self::DetailOpening | Self::DetailOpen | Self::DetailNavigating
        )
    }

    pub fn can_transition(self, to: Self) -> bool {
        use InteractionMode::*;
        matches!(
            (self, to),
            (Entry, Idle)
                | (Idle, Dragging)
                | (Dragging, Idle)
                | (Idle, DetailOpening)
                | (DetailOpening, DetailOpen)
                | (DetailOpening | DetailOpen | DetailNavigating, DetailNavigating)
                | (DetailNavigating, DetailOpen)
                | (DetailOpening | DetailOpen | DetailNavigating, DetailClosing)
                | (DetailClosing, Idle)
        )
    }

    pub fn transition(self, to: Self) -> Result<Self, TransitionError> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InteractionMode::*;

    #[test]
    fn test_spin_blocked_during_entry_drag_and_detail() {
        assert!(!Entry.accepts_spin());
        assert!(Idle.accepts_spin());
        assert!(!Dragging.accepts_spin());
        for mode in [DetailOpening, DetailOpen, DetailNavigating, DetailClosing] {
            assert!(!mode.accepts_spin());
            assert!(mode.is_detail());
        }
    }

    #[test]
    fn test_detail_lifecycle_transitions() {
        let path = [
            Idle,
            DetailOpening,
            DetailOpen,
            DetailNavigating,
            DetailNavigating,
            DetailOpen,
            DetailClosing,
            Idle,
        ];
        let mut mode = Entry.transition(Idle).unwrap();
        for next in path.into_iter().skip(1) {
            mode = mode.transition(next).unwrap();
        }
        assert_eq!(mode, Idle);
    }

    #[test]
    fn test_invalid_transitions_are_reported() {
        assert_eq!(
            Idle.transition(DetailOpen),
            Err(TransitionError {
                from: Idle,
                to: DetailOpen
            })
        );
        assert!(DetailClosing.transition(DetailOpening).is_err());
        assert!(Dragging.transition(DetailOpening).is_err());
        assert!(Entry.transition(Dragging).is_err());
    }
}
