use core::fmt;
use core::str::FromStr;

use alloc::string::{String, ToString};

use rkyv::{Archive, Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// The three kinds of line a CoNLL-U sentence can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A syntactic word on the primary linear sequence (`3`).
    Normal,
    /// A multiword surface token spanning a range of words (`3-4`).
    Group,
    /// An empty node of the enhanced graph (`3.1`).
    Enhanced,
}

/// Identifier of a token line, parsed once from its textual form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Archive, Serialize, Deserialize)]
#[cfg_attr(
    feature = "serde",
    derive(SerdeDeserialize, SerdeSerialize),
    serde(into = "String", try_from = "String")
)]
#[archive(check_bytes)]
pub enum TokenId {
    /// 1-based position in the linear word sequence.
    Normal(u32),
    /// Inclusive word range, `start < end`.
    Group { start: u32, end: u32 },
    /// Empty node placed after word `head` (0 = before the first word).
    Enhanced { head: u32, sub: u32 },
}

impl TokenId {
    pub const fn normal(id: u32) -> Self {
        Self::Normal(id)
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Normal(_) => TokenKind::Normal,
            Self::Group { .. } => TokenKind::Group,
            Self::Enhanced { .. } => TokenKind::Enhanced,
        }
    }

    /// The word position for normal IDs, `None` otherwise.
    pub fn as_normal(&self) -> Option<u32> {
        match self {
            Self::Normal(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<u32> for TokenId {
    fn from(id: u32) -> Self {
        Self::Normal(id)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(id) => write!(f, "{}", id),
            Self::Group { start, end } => write!(f, "{}-{}", start, end),
            Self::Enhanced { head, sub } => write!(f, "{}.{}", head, sub),
        }
    }
}

/// Rejected token ID text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    pub input: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid token ID: '{}'", self.input)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IdParseError {}

fn number(part: &str) -> Option<u32> {
    // u32::from_str accepts a leading '+', CoNLL-U does not
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl FromStr for TokenId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = if let Some((start, end)) = s.split_once('-') {
            match (number(start), number(end)) {
                (Some(start), Some(end)) if start >= 1 && start < end => {
                    Some(Self::Group { start, end })
                }
                _ => None,
            }
        } else if let Some((head, sub)) = s.split_once('.') {
            match (number(head), number(sub)) {
                (Some(head), Some(sub)) if sub >= 1 => Some(Self::Enhanced { head, sub }),
                _ => None,
            }
        } else {
            number(s).filter(|id| *id >= 1).map(Self::Normal)
        };

        parsed.ok_or_else(|| IdParseError {
            input: s.to_string(),
        })
    }
}

impl From<TokenId> for String {
    fn from(id: TokenId) -> String {
        id.to_string()
    }
}

impl TryFrom<String> for TokenId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
