use core::fmt;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use rkyv::{Archive, Deserialize, Serialize};

use crate::ids::{TokenId, TokenKind};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Placeholder CoNLL-U uses for an unset column.
pub const UNSET: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Field {
    pub key: String,
    pub value: String,
}

/// Insertion-ordered string map used for FEATS, DEPS, MISC and sentence metadata.
///
/// Lists are short (a handful of entries per token), so lookups are linear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(
    feature = "serde",
    derive(SerdeDeserialize, SerdeSerialize),
    serde(transparent)
)]
#[archive(check_bytes)]
pub struct FieldMap {
    entries: Vec<Field>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.value.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|field| field.key == key)
    }

    /// Sets `key`, keeping its position when it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|field| field.key == key) {
            Some(field) => Some(core::mem::replace(&mut field.value, value)),
            None => {
                self.entries.push(Field { key, value });
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|field| field.key == key)?;
        Some(self.entries.remove(index).value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries
            .iter()
            .map(|field| (field.key.as_str(), field.value.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|field| field.key.as_str())
    }

    /// Rewrites every entry through `f`; entries mapped to `None` are dropped.
    pub fn rewrite_keys(&mut self, mut f: impl FnMut(&str) -> Option<String>) {
        let entries = core::mem::take(&mut self.entries);
        for field in entries {
            if let Some(key) = f(&field.key) {
                self.insert(key, field.value);
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Sentence-level `# key = value` comments, order preserved for export.
pub type SentenceMeta = FieldMap;

/// One CoNLL-U line: a word, a multiword group or an enhanced empty node.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Token {
    pub id: TokenId,
    pub form: String,
    pub lemma: String,
    pub upos: String,
    pub xpos: String,
    pub feats: FieldMap,
    /// `None` = unattached, `Some(0)` = root.
    pub head: Option<u32>,
    pub deprel: String,
    /// Enhanced edges keyed by head reference (`"4"`, `"7.1"`), value = relation.
    pub deps: FieldMap,
    pub misc: FieldMap,
}

impl Token {
    pub fn empty(id: TokenId) -> Self {
        Self {
            id,
            form: UNSET.to_string(),
            lemma: UNSET.to_string(),
            upos: UNSET.to_string(),
            xpos: UNSET.to_string(),
            feats: FieldMap::new(),
            head: None,
            deprel: UNSET.to_string(),
            deps: FieldMap::new(),
            misc: FieldMap::new(),
        }
    }

    pub fn with_form(id: TokenId, form: impl Into<String>) -> Self {
        Self {
            form: form.into(),
            ..Self::empty(id)
        }
    }

    /// Clears every annotation column, keeping ID and FORM.
    pub fn reset_analysis(&mut self) {
        let form = core::mem::take(&mut self.form);
        *self = Self::with_form(self.id, form);
    }
}

/// Structural invariant broken while assembling a [`SentenceTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Normal IDs must run `1..=N` in order.
    NonContiguous { expected: u32, found: TokenId },
    WrongKind { id: TokenId, expected: TokenKind },
    /// Group range outside the existing words.
    GroupOutOfRange { id: TokenId, words: u32 },
    /// Enhanced node attached after a word that does not exist.
    EnhancedOutOfRange { id: TokenId, words: u32 },
    Duplicate { id: TokenId },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::NonContiguous { expected, found } => {
                write!(f, "expected token {}, found {}", expected, found)
            }
            TreeError::WrongKind { id, expected } => {
                write!(f, "token {} is not a {:?} token", id, expected)
            }
            TreeError::GroupOutOfRange { id, words } => {
                write!(f, "multiword token {} exceeds the {} words of the sentence", id, words)
            }
            TreeError::EnhancedOutOfRange { id, words } => {
                write!(f, "empty node {} follows a word beyond the {} words of the sentence", id, words)
            }
            TreeError::Duplicate { id } => write!(f, "duplicate token {}", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TreeError {}

/// The dependency tree of one sentence.
///
/// Invariants (checked by [`SentenceTree::from_parts`]):
/// 1. `nodes[i].id == Normal(i + 1)`, so word IDs are always `1..=N`.
/// 2. `groups` are sorted, unique and satisfy `1 <= start < end <= N`.
/// 3. `enhanced_nodes` are sorted, unique and satisfy `head <= N`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(
    feature = "serde",
    derive(SerdeDeserialize, SerdeSerialize),
    serde(try_from = "TreeParts")
)]
#[archive(check_bytes)]
pub struct SentenceTree {
    nodes: Vec<Token>,
    groups: Vec<Token>,
    enhanced_nodes: Vec<Token>,
}

/// Unchecked form of a [`SentenceTree`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct TreeParts {
    pub nodes: Vec<Token>,
    pub groups: Vec<Token>,
    pub enhanced_nodes: Vec<Token>,
}

impl SentenceTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: TreeParts) -> Result<Self, TreeError> {
        let TreeParts {
            nodes,
            mut groups,
            mut enhanced_nodes,
        } = parts;

        for (index, token) in nodes.iter().enumerate() {
            let expected = index as u32 + 1;
            match token.id {
                TokenId::Normal(id) if id == expected => {}
                TokenId::Normal(_) => {
                    return Err(TreeError::NonContiguous {
                        expected,
                        found: token.id,
                    })
                }
                id => {
                    return Err(TreeError::WrongKind {
                        id,
                        expected: TokenKind::Normal,
                    })
                }
            }
        }

        let words = nodes.len() as u32;
        for token in &groups {
            match token.id {
                TokenId::Group { start, end } if start >= 1 && start < end && end <= words => {}
                id @ TokenId::Group { .. } => return Err(TreeError::GroupOutOfRange { id, words }),
                id => {
                    return Err(TreeError::WrongKind {
                        id,
                        expected: TokenKind::Group,
                    })
                }
            }
        }
        for token in &enhanced_nodes {
            match token.id {
                TokenId::Enhanced { head, .. } if head <= words => {}
                id @ TokenId::Enhanced { .. } => {
                    return Err(TreeError::EnhancedOutOfRange { id, words })
                }
                id => {
                    return Err(TreeError::WrongKind {
                        id,
                        expected: TokenKind::Enhanced,
                    })
                }
            }
        }

        groups.sort_by_key(|token| token.id);
        enhanced_nodes.sort_by_key(|token| token.id);
        for sorted in [&groups, &enhanced_nodes] {
            if let Some(pair) = sorted.windows(2).find(|pair| pair[0].id == pair[1].id) {
                return Err(TreeError::Duplicate { id: pair[0].id });
            }
        }

        Ok(Self {
            nodes,
            groups,
            enhanced_nodes,
        })
    }

    pub fn into_parts(self) -> TreeParts {
        TreeParts {
            nodes: self.nodes,
            groups: self.groups,
            enhanced_nodes: self.enhanced_nodes,
        }
    }

    /// Number of words; also the highest normal ID.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_normal_id(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn nodes(&self) -> &[Token] {
        &self.nodes
    }

    pub fn groups(&self) -> &[Token] {
        &self.groups
    }

    pub fn enhanced_nodes(&self) -> &[Token] {
        &self.enhanced_nodes
    }

    /// Every line of the tree: words, then groups, then enhanced nodes.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> + '_ {
        self.nodes
            .iter()
            .chain(self.groups.iter())
            .chain(self.enhanced_nodes.iter())
    }

    pub fn node(&self, id: u32) -> Option<&Token> {
        let index = (id as usize).checked_sub(1)?;
        self.nodes.get(index)
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        match id {
            TokenId::Normal(id) => self.node(id),
            TokenId::Group { .. } => self.groups.iter().find(|token| token.id == id),
            TokenId::Enhanced { .. } => self.enhanced_nodes.iter().find(|token| token.id == id),
        }
    }

    fn get_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        match id {
            TokenId::Normal(id) => {
                let index = (id as usize).checked_sub(1)?;
                self.nodes.get_mut(index)
            }
            TokenId::Group { .. } => self.groups.iter_mut().find(|token| token.id == id),
            TokenId::Enhanced { .. } => self.enhanced_nodes.iter_mut().find(|token| token.id == id),
        }
    }

    /// Edits the record at `id` in place. The ID itself cannot be changed.
    ///
    /// Returns `false` when no record exists at `id`.
    pub fn update<F: FnOnce(&mut Token)>(&mut self, id: TokenId, f: F) -> bool {
        match self.get_mut(id) {
            Some(token) => {
                f(token);
                token.id = id;
                true
            }
            None => false,
        }
    }

    /// Applies `f` to every record of the tree.
    pub fn update_all<F: FnMut(&mut Token)>(&mut self, mut f: F) {
        for token in self
            .nodes
            .iter_mut()
            .chain(self.groups.iter_mut())
            .chain(self.enhanced_nodes.iter_mut())
        {
            let id = token.id;
            f(token);
            token.id = id;
        }
    }

    /// Appends a word after the last one and returns its ID.
    pub fn push_node(&mut self, mut token: Token) -> TokenId {
        let id = TokenId::Normal(self.max_normal_id() + 1);
        token.id = id;
        self.nodes.push(token);
        id
    }
}

impl TryFrom<TreeParts> for SentenceTree {
    type Error = TreeError;

    fn try_from(parts: TreeParts) -> Result<Self, Self::Error> {
        Self::from_parts(parts)
    }
}

/// Everything the editor snapshots: the tree and its metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct SentenceState {
    pub tree: SentenceTree,
    pub meta: SentenceMeta,
}
