//! Walker phase definitions
//!
//! A walker cycles `Fetching -> Parsing -> Evaluating` until a stop
//! condition moves it to the terminal `Stopped` phase.

use std::fmt;

/// Why a channel walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// A page could not be fetched after all retries
    FetchFailed,

    /// Too many consecutive pages produced no new messages
    EmptyPages,

    /// The cursor reached the first message of the channel
    ReachedEarliest,

    /// The operator interrupted the run
    Cancelled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "fetch_failed",
            Self::EmptyPages => "empty_pages",
            Self::ReachedEarliest => "reached_earliest",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true if the walk covered everything it was asked to
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::EmptyPages | Self::ReachedEarliest)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the current phase of a channel walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkPhase {
    /// Requesting the page at the current cursor
    Fetching,

    /// Splitting the page into message fragments and extracting records
    Parsing,

    /// Applying the stop conditions to the page outcome
    Evaluating,

    /// Terminal: the walk is over and its state is frozen
    Stopped(StopReason),
}

impl WalkPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Stopped(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for WalkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetching => write!(f, "fetching"),
            Self::Parsing => write!(f, "parsing"),
            Self::Evaluating => write!(f, "evaluating"),
            Self::Stopped(reason) => write!(f, "stopped ({})", reason),
        }
    }
}
