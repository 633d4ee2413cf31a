use serde::{Deserialize, Serialize};
use std::fmt;

/// Change notifications a client mirror delivers to its subscribers.
///
/// Notifications are always delivered after the call that caused them has
/// returned, in the order the underlying changes happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorEvent {
    TotalChanged(u32),
    PositionChanged(u32),
    AlphabetChanged,
    /// The mirror has resynchronized with the store; a step that failed
    /// with an out-of-sync error may now be reissued.
    Refresh,
}

impl fmt::Display for CursorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorEvent::TotalChanged(total) => write!(f, "total-changed({total})"),
            CursorEvent::PositionChanged(position) => write!(f, "position-changed({position})"),
            CursorEvent::AlphabetChanged => f.write_str("alphabet-changed"),
            CursorEvent::Refresh => f.write_str("refresh"),
        }
    }
}
