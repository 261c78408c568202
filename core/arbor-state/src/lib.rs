pub mod config;
pub mod diagnostics;
pub mod error;
pub mod history;
pub mod memento;
pub mod observer;
pub mod sentence;

pub use arbor_protocol as protocol;

pub use config::{HistoryConfig, SentenceConfig};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use error::{ObserverError, SentenceError};
pub use history::SentenceHistory;
pub use memento::SentenceMemento;
pub use observer::Observer;
pub use sentence::{ReactiveSentence, FEATURE_ON};
