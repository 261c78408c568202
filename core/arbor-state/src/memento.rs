use arbor_protocol::SentenceState;
use chrono::{DateTime, Utc};
use rkyv::AlignedVec;

use crate::error::SentenceError;

/// Immutable, timestamped snapshot of a sentence.
///
/// The state is kept as a validated `rkyv` archive, so every read hands out a
/// fresh copy and restoring the same snapshot twice never aliases.
#[derive(Debug, Clone)]
pub struct SentenceMemento {
    bytes: AlignedVec,
    timestamp: DateTime<Utc>,
}

impl SentenceMemento {
    pub(crate) fn capture(state: &SentenceState) -> Result<Self, SentenceError> {
        let bytes = rkyv::to_bytes::<_, 1024>(state).map_err(|err| SentenceError::Snapshot {
            action: "captured",
            message: err.to_string(),
        })?;
        Ok(Self {
            bytes,
            timestamp: Utc::now(),
        })
    }

    /// A new deserialized copy of the snapshotted state.
    pub fn state(&self) -> Result<SentenceState, SentenceError> {
        rkyv::from_bytes::<SentenceState>(&self.bytes).map_err(|err| SentenceError::Snapshot {
            action: "restored",
            message: err.to_string(),
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Display label, e.g. `2024-03-01 12:30:05`.
    pub fn name(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Archive size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
