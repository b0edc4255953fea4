//! The daily attendance cycle.
//!
//! An employee moves through four submittable checkpoints and ends the day at
//! [`Checkpoint::Completed`]. [`SessionCycleTracker`] holds the current
//! checkpoint and only ever moves it one step forward.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// A point in the daily attendance cycle.
///
/// Ordering follows the cycle: `AmLogin < AmLogout < PmLogin < PmLogout <
/// Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Checkpoint {
    /// Morning arrival.
    AmLogin,
    /// Morning departure.
    AmLogout,
    /// Afternoon arrival.
    PmLogin,
    /// Afternoon departure.
    PmLogout,
    /// Every checkpoint for the day has been submitted.
    Completed,
}

impl Checkpoint {
    /// All checkpoints in cycle order.
    pub const ALL: [Checkpoint; 5] = [
        Self::AmLogin,
        Self::AmLogout,
        Self::PmLogin,
        Self::PmLogout,
        Self::Completed,
    ];

    /// The checkpoint that follows a successful submission of `self`.
    ///
    /// Returns `None` only for [`Checkpoint::Completed`], which has nothing
    /// left to submit.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::AmLogin => Some(Self::AmLogout),
            Self::AmLogout => Some(Self::PmLogin),
            Self::PmLogin => Some(Self::PmLogout),
            Self::PmLogout => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    /// Check if this is the terminal checkpoint.
    #[must_use]
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }

    /// The wire identifier, e.g. `AM_LOGIN`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AmLogin => "AM_LOGIN",
            Self::AmLogout => "AM_LOGOUT",
            Self::PmLogin => "PM_LOGIN",
            Self::PmLogout => "PM_LOGOUT",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current checkpoint of a tracking session.
///
/// Starts at [`Checkpoint::AmLogin`]. Performs no I/O; the submitter calls
/// [`SessionCycleTracker::advance_from`] after the backend accepted a
/// submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCycleTracker {
    current: Checkpoint,
}

impl SessionCycleTracker {
    /// Create a tracker at the start of the day.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Checkpoint::AmLogin,
        }
    }

    /// The checkpoint the next submission is for.
    #[must_use]
    pub fn current(&self) -> Checkpoint {
        self.current
    }

    /// Check if the day's cycle is finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current.is_completed()
    }

    /// The checkpoint to submit next.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleAlreadyComplete`] once the cycle is finished.
    pub fn pending(&self) -> Result<Checkpoint> {
        if self.current.is_completed() {
            Err(Error::CycleAlreadyComplete)
        } else {
            Ok(self.current)
        }
    }

    /// Advance past `submitted`, which must be the current checkpoint.
    ///
    /// Returns the new current checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleAlreadyComplete`] if the cycle is finished and
    /// [`Error::CheckpointMismatch`] if `submitted` is not the current
    /// checkpoint. The tracker is unchanged on error.
    pub fn advance_from(&mut self, submitted: Checkpoint) -> Result<Checkpoint> {
        let Some(next) = self.current.next() else {
            return Err(Error::CycleAlreadyComplete);
        };
        if submitted != self.current {
            return Err(Error::CheckpointMismatch {
                current: self.current,
                submitted,
            });
        }

        info!(from = %self.current, to = %next, "Checkpoint advanced");
        self.current = next;
        Ok(next)
    }
}

impl Default for SessionCycleTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_order() {
        let mut sorted = Checkpoint::ALL;
        sorted.sort();
        assert_eq!(sorted, Checkpoint::ALL);
        assert!(Checkpoint::AmLogin < Checkpoint::Completed);
    }

    #[test]
    fn test_checkpoint_next_walks_the_cycle() {
        for pair in Checkpoint::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Checkpoint::Completed.next(), None);
    }

    #[test]
    fn test_checkpoint_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&Checkpoint::AmLogin).unwrap(),
            "\"AM_LOGIN\""
        );
        assert_eq!(
            serde_json::to_string(&Checkpoint::PmLogout).unwrap(),
            "\"PM_LOGOUT\""
        );
        let parsed: Checkpoint = serde_json::from_str("\"COMPLETED\"").unwrap();
        assert_eq!(parsed, Checkpoint::Completed);
    }

    #[test]
    fn test_checkpoint_display_matches_wire_form() {
        for checkpoint in Checkpoint::ALL {
            let json = serde_json::to_string(&checkpoint).unwrap();
            assert_eq!(json, format!("\"{checkpoint}\""));
        }
    }

    #[test]
    fn test_tracker_starts_at_am_login() {
        let tracker = SessionCycleTracker::new();
        assert_eq!(tracker.current(), Checkpoint::AmLogin);
        assert!(!tracker.is_complete());
        assert_eq!(tracker.pending().unwrap(), Checkpoint::AmLogin);
    }

    #[test]
    fn test_tracker_full_cycle() {
        let mut tracker = SessionCycleTracker::new();

        assert_eq!(
            tracker.advance_from(Checkpoint::AmLogin).unwrap(),
            Checkpoint::AmLogout
        );
        assert_eq!(
            tracker.advance_from(Checkpoint::AmLogout).unwrap(),
            Checkpoint::PmLogin
        );
        assert_eq!(
            tracker.advance_from(Checkpoint::PmLogin).unwrap(),
            Checkpoint::PmLogout
        );
        assert_eq!(
            tracker.advance_from(Checkpoint::PmLogout).unwrap(),
            Checkpoint::Completed
        );
        assert!(tracker.is_complete());
    }

    #[test]
    fn test_tracker_rejects_after_completion() {
        let mut tracker = SessionCycleTracker::new();
        for checkpoint in &Checkpoint::ALL[..4] {
            tracker.advance_from(*checkpoint).unwrap();
        }

        assert!(matches!(
            tracker.advance_from(Checkpoint::Completed),
            Err(Error::CycleAlreadyComplete)
        ));
        assert!(matches!(tracker.pending(), Err(Error::CycleAlreadyComplete)));
        assert_eq!(tracker.current(), Checkpoint::Completed);
    }

    #[test]
    fn test_tracker_rejects_skip_and_regress() {
        let mut tracker = SessionCycleTracker::new();

        assert!(matches!(
            tracker.advance_from(Checkpoint::PmLogin),
            Err(Error::CheckpointMismatch { .. })
        ));
        assert_eq!(tracker.current(), Checkpoint::AmLogin);

        tracker.advance_from(Checkpoint::AmLogin).unwrap();
        assert!(tracker.advance_from(Checkpoint::AmLogin).is_err());
        assert_eq!(tracker.current(), Checkpoint::AmLogout);
    }
}
