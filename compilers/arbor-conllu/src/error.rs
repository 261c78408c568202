use arbor_protocol::{TokenId, TreeError};
use thiserror::Error;

/// Why a block of CoNLL-U text could not be read as a sentence.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: expected 10 tab-separated columns, found {found}")]
    ColumnCount { line: usize, found: usize },

    #[error("line {line}: invalid token ID '{value}'")]
    InvalidId { line: usize, value: String },

    #[error("line {line}: invalid HEAD '{value}'")]
    InvalidHead { line: usize, value: String },

    #[error("line {line}: malformed {column} column '{value}'")]
    InvalidField {
        line: usize,
        column: &'static str,
        value: String,
    },

    #[error("line {line}: expected token {expected}, found {found}")]
    NonContiguous {
        line: usize,
        expected: u32,
        found: TokenId,
    },

    #[error("line {line}: text continues after the blank line ending the sentence")]
    TrailingContent { line: usize },

    #[error("invalid sentence structure: {0}")]
    Structure(TreeError),
}
