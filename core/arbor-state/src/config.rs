#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for a [`ReactiveSentence`](crate::ReactiveSentence).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SentenceConfig {
    /// Report benign no-ops (duplicate attach, unknown detach) and notifications.
    pub verbose: bool,
}

impl SentenceConfig {
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Settings for a [`SentenceHistory`](crate::SentenceHistory).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct HistoryConfig {
    /// Report undo at the oldest / redo at the newest snapshot and evictions.
    pub verbose: bool,
    /// Maximum snapshots retained; the oldest is evicted first. `None` keeps all.
    pub max_snapshots: Option<usize>,
}

impl HistoryConfig {
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_max_snapshots(mut self, max_snapshots: usize) -> Self {
        self.max_snapshots = Some(max_snapshots.max(1));
        self
    }
}
