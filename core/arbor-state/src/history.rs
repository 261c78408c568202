//! Linear undo/redo over sentence snapshots.
//!
//! ```text
//! backup() x3             [m0, m1, m2]   cursor 2
//! undo() x2               [m0, m1, m2]   cursor 0   can_redo
//! edit + backup()         [m0, m3]       cursor 1   redo branch dropped
//! ```

use std::collections::VecDeque;
use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::config::HistoryConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
use crate::error::SentenceError;
use crate::memento::SentenceMemento;
use crate::sentence::ReactiveSentence;

/// Caretaker of a sentence's snapshots.
///
/// The history does not own the sentence: callers pass it to `backup`, `undo`
/// and `redo`, deciding themselves how often a change deserves a snapshot.
///
/// # Invariants
///
/// 1. `cursor` is `None` exactly when there are no snapshots.
/// 2. `cursor < mementos.len()` otherwise.
/// 3. `mementos.len() <= config.max_snapshots` when a limit is set.
#[derive(Debug)]
pub struct SentenceHistory {
    mementos: VecDeque<SentenceMemento>,
    cursor: Option<usize>,
    config: HistoryConfig,
    diagnostics: Diagnostics,
}

impl Default for SentenceHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceHistory {
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            mementos: VecDeque::new(),
            cursor: None,
            diagnostics: Diagnostics::new(config.verbose),
            config,
        }
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.diagnostics.set_sink(sink);
        self
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Snapshots the sentence's current state after the cursor.
    ///
    /// Everything after the cursor is dropped first, so a backup following
    /// an undo discards the undone branch for good.
    pub fn backup(&mut self, sentence: &ReactiveSentence) -> Result<(), SentenceError> {
        let memento = sentence.save()?;
        self.mementos.truncate(self.cursor.map_or(0, |cursor| cursor + 1));
        self.mementos.push_back(memento);
        self.cursor = Some(self.mementos.len() - 1);
        self.enforce_limit();
        Ok(())
    }

    fn enforce_limit(&mut self) {
        let Some(max) = self.config.max_snapshots else {
            return;
        };
        while self.mementos.len() > max.max(1) {
            self.mementos.pop_front();
            self.cursor = self.cursor.map(|cursor| cursor.saturating_sub(1));
            self.diagnostics.emit(Diagnostic::SnapshotEvicted {
                retained: self.mementos.len(),
            });
        }
    }

    /// True when an older snapshot exists before the cursor.
    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor + 1 < self.mementos.len())
    }

    /// Restores the previous snapshot. Returns `false` if there is none.
    pub fn undo(&mut self, sentence: &mut ReactiveSentence) -> Result<bool, SentenceError> {
        match self.cursor {
            Some(cursor) if cursor > 0 => self.step(cursor - 1, sentence),
            _ => {
                self.diagnostics.emit(Diagnostic::UndoAtStart);
                Ok(false)
            }
        }
    }

    /// Restores the next snapshot. Returns `false` if there is none.
    pub fn redo(&mut self, sentence: &mut ReactiveSentence) -> Result<bool, SentenceError> {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.mementos.len() => self.step(cursor + 1, sentence),
            _ => {
                self.diagnostics.emit(Diagnostic::RedoAtEnd);
                Ok(false)
            }
        }
    }

    fn step(&mut self, target: usize, sentence: &mut ReactiveSentence) -> Result<bool, SentenceError> {
        match sentence.restore(&self.mementos[target]) {
            Ok(()) => {
                self.cursor = Some(target);
                Ok(true)
            }
            // the state was swapped in before the observer failed
            Err(err @ SentenceError::Observer(_)) => {
                self.cursor = Some(target);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Position of the snapshot matching the sentence; `None` while empty.
    pub fn current_index(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.mementos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mementos.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SentenceMemento> {
        self.mementos.get(index)
    }

    /// `(index, timestamp)` of every retained snapshot, oldest first.
    pub fn snapshots(&self) -> impl Iterator<Item = (usize, DateTime<Utc>)> + '_ {
        self.mementos
            .iter()
            .enumerate()
            .map(|(index, memento)| (index, memento.timestamp()))
    }

    pub fn clear(&mut self) {
        self.mementos.clear();
        self.cursor = None;
    }
}
