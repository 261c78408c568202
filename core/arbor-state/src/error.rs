use arbor_conllu::ParseError;
use arbor_edit::EditError;
use arbor_protocol::TokenId;
use thiserror::Error;

/// Failure reported by an observer's `update`.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SentenceError {
    /// The CoNLL-U text was rejected; the current sentence is untouched.
    #[error("failed to parse sentence: {0}")]
    Parse(#[from] ParseError),

    /// A structural edit would break the ID invariants; nothing was changed.
    #[error("structural edit rejected: {0}")]
    Structural(#[from] EditError),

    #[error("no token with ID {0}")]
    NotFound(TokenId),

    #[error("snapshot could not be {action}: {message}")]
    Snapshot {
        action: &'static str,
        message: String,
    },

    /// An observer failed. The new state is already in place; observers
    /// attached after the failing one were not called.
    #[error("observer failed: {0}")]
    Observer(#[source] ObserverError),
}
