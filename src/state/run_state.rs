/// Run state definitions for a crawl instance
///
/// A coordinator moves through these states exactly once; terminal states
/// are final and a new run needs a fresh coordinator.
use std::fmt;

/// Lifecycle of a single crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Created but not started
    Idle,

    /// Fetching pages or downloading images
    Running,

    // ===== Terminal States =====
    /// Both phases finished and a result list was produced
    Completed,

    /// The run aborted before producing results
    Failed,

    /// A stop was requested and the run drained its in-flight work
    Cancelled,
}

impl RunState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if `next` is a legal successor of this state
    ///
    /// Idle -> Running -> {Completed | Failed | Cancelled}. A run is
    /// Running before validation, so a rejected configuration ends in
    /// Failed from Running.
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
