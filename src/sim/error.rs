use core::fmt;

/// Fatal simulation errors. Both mean a bug in the game, not a condition to
/// recover from: the host is expected to stop the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// More live entities than the hard cap after applying queued additions
    EntityCapExceeded { live: usize, cap: usize },
    /// Tried to advance past the last level
    LevelSequenceExhausted { index: usize, len: usize },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityCapExceeded { live, cap } => {
                write!(f, "live entity cap exceeded: {live} > {cap}")
            }
            Self::LevelSequenceExhausted { index, len } => {
                write!(f, "no level at index {index} (sequence has {len})")
            }
        }
    }
}

impl std::error::Error for SimError {}
