use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use arbor_protocol::{SentenceMeta, SentenceState, SentenceTree, Token, TokenId};

use crate::config::SentenceConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
use crate::error::SentenceError;
use crate::memento::SentenceMemento;
use crate::observer::Observer;

/// MISC value written when a boolean feature is switched on.
pub const FEATURE_ON: &str = "Yes";

/// The one sentence being edited, plus the views watching it.
///
/// Every mutating method builds the next state aside, swaps it in and then
/// notifies each observer once. A failed edit leaves the state untouched and
/// notifies nobody.
pub struct ReactiveSentence {
    state: SentenceState,
    observers: Vec<Rc<dyn Observer>>,
    diagnostics: Diagnostics,
}

impl Default for ReactiveSentence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReactiveSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveSentence")
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

fn same_observer(a: &Rc<dyn Observer>, b: &Rc<dyn Observer>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

impl ReactiveSentence {
    pub fn new() -> Self {
        Self::with_config(SentenceConfig::default())
    }

    pub fn with_config(config: SentenceConfig) -> Self {
        Self {
            state: SentenceState::default(),
            observers: Vec::new(),
            diagnostics: Diagnostics::new(config.verbose),
        }
    }

    /// Routes verbose-mode diagnostics to `sink` instead of `tracing`.
    #[must_use]
    pub fn with_sink(mut self, sink: Rc<dyn DiagnosticSink>) -> Self {
        self.diagnostics.set_sink(sink);
        self
    }

    pub fn state(&self) -> &SentenceState {
        &self.state
    }

    pub fn tree(&self) -> &SentenceTree {
        &self.state.tree
    }

    pub fn meta(&self) -> &SentenceMeta {
        &self.state.meta
    }

    // ====================================================================
    // Subscription
    // ====================================================================

    /// Subscribes `observer`. Attaching the same observer twice is a no-op.
    pub fn attach(&mut self, observer: Rc<dyn Observer>) {
        if self.observers.iter().any(|o| same_observer(o, &observer)) {
            self.diagnostics.emit(Diagnostic::ObserverAlreadyAttached);
            return;
        }
        self.observers.push(observer);
        self.diagnostics.emit(Diagnostic::ObserverAttached {
            observers: self.observers.len(),
        });
    }

    /// Unsubscribes `observer`; returns `false` if it was not attached.
    pub fn detach(&mut self, observer: &Rc<dyn Observer>) -> bool {
        let Some(index) = self.observers.iter().position(|o| same_observer(o, observer)) else {
            self.diagnostics.emit(Diagnostic::ObserverNotAttached);
            return false;
        };
        self.observers.remove(index);
        self.diagnostics.emit(Diagnostic::ObserverDetached {
            observers: self.observers.len(),
        });
        true
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Calls every observer in attach order, stopping at the first failure.
    pub fn notify(&self) -> Result<(), SentenceError> {
        self.diagnostics.emit(Diagnostic::Notifying {
            observers: self.observers.len(),
        });
        for observer in &self.observers {
            observer.update(self).map_err(SentenceError::Observer)?;
        }
        Ok(())
    }

    fn replace_state(&mut self, state: SentenceState) -> Result<(), SentenceError> {
        self.state = state;
        self.notify()
    }

    fn replace_tree(&mut self, tree: SentenceTree) -> Result<(), SentenceError> {
        self.state.tree = tree;
        self.notify()
    }

    // ====================================================================
    // Snapshots
    // ====================================================================

    pub fn save(&self) -> Result<SentenceMemento, SentenceError> {
        SentenceMemento::capture(&self.state)
    }

    pub fn restore(&mut self, memento: &SentenceMemento) -> Result<(), SentenceError> {
        let state = memento.state()?;
        self.replace_state(state)
    }

    // ====================================================================
    // Whole-sentence replacement
    // ====================================================================

    /// Loads a CoNLL-U sentence. On a parse error the current state is kept.
    pub fn from_text(&mut self, text: &str) -> Result<(), SentenceError> {
        let state = arbor_conllu::parse(text)?;
        self.replace_state(state)
    }

    pub fn from_state(&mut self, state: &SentenceState) -> Result<(), SentenceError> {
        self.replace_state(state.clone())
    }

    pub fn update_sentence(&mut self, state: &SentenceState) -> Result<(), SentenceError> {
        self.replace_state(state.clone())
    }

    pub fn update_tree(&mut self, tree: &SentenceTree) -> Result<(), SentenceError> {
        self.replace_tree(tree.clone())
    }

    // ====================================================================
    // Token edits
    // ====================================================================

    /// Overwrites the record at `token.id` (word, group or empty node).
    ///
    /// Fails with [`SentenceError::NotFound`] when no such record exists;
    /// records are never created here.
    pub fn update_token(&mut self, token: Token) -> Result<(), SentenceError> {
        self.modify_token(token.id, |slot| *slot = token)
    }

    /// Read-modify-write on the record at `id`, with a single notification.
    pub fn modify_token<F>(&mut self, id: TokenId, f: F) -> Result<(), SentenceError>
    where
        F: FnOnce(&mut Token),
    {
        let mut tree = self.state.tree.clone();
        if !tree.update(id, f) {
            return Err(SentenceError::NotFound(id));
        }
        self.replace_tree(tree)
    }

    /// Flips the MISC flag `feature` on word `id`; returns whether it is now set.
    pub fn toggle_boolean_feature(&mut self, id: u32, feature: &str) -> Result<bool, SentenceError> {
        let mut active = true;
        self.modify_token(TokenId::Normal(id), |token| {
            if token.misc.remove(feature).is_some() {
                active = false;
            } else {
                token.misc.insert(feature, FEATURE_ON);
            }
        })?;
        Ok(active)
    }

    pub fn remove_token(&mut self, id: u32) -> Result<(), SentenceError> {
        let tree = arbor_edit::remove_token(&self.state.tree, id)?;
        self.replace_tree(tree)
    }

    /// Splits word `id` into an empty word followed by the original one.
    pub fn split_token_before(&mut self, id: u32) -> Result<(), SentenceError> {
        let tree = arbor_edit::split_token_before(&self.state.tree, id)?;
        self.replace_tree(tree)
    }

    /// Splits word `id` into the original word followed by an empty one.
    pub fn split_token_after(&mut self, id: u32) -> Result<(), SentenceError> {
        let tree = arbor_edit::split_token_after(&self.state.tree, id)?;
        self.replace_tree(tree)
    }

    /// Adds a word with FORM `_` after the last one and returns its ID.
    pub fn append_empty_token(&mut self) -> Result<TokenId, SentenceError> {
        let (tree, id) = arbor_edit::append_empty_token(&self.state.tree);
        self.replace_tree(tree)?;
        Ok(id)
    }

    // ====================================================================
    // Read-only views
    // ====================================================================

    pub fn export_text(&self) -> String {
        arbor_conllu::serialize(&self.state.tree, &self.state.meta)
    }

    /// Exports with `overrides` merged over the sentence metadata.
    ///
    /// Overridden keys come first in `overrides` order, followed by the
    /// remaining original entries.
    pub fn export_text_with_meta(&self, overrides: &SentenceMeta) -> String {
        let mut meta = overrides.clone();
        for (key, value) in self.state.meta.iter() {
            if !meta.contains_key(key) {
                meta.insert(key, value);
            }
        }
        arbor_conllu::serialize(&self.state.tree, &meta)
    }

    pub fn plain_text(&self) -> String {
        arbor_conllu::surface_text(&self.state.tree)
    }

    /// Word forms joined by `_`, e.g. `The___cats` for "The", "_", "cats".
    pub fn underscored_text(&self) -> String {
        self.state
            .tree
            .nodes()
            .iter()
            .map(|token| token.form.as_str())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// `FORM`, `LEMMA`, `UPOS`, `XPOS`, then every `FEATS.<name>` and
    /// `MISC.<name>` seen on a word, in first-seen order.
    pub fn feature_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = ["FORM", "LEMMA", "UPOS", "XPOS"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut seen: HashSet<String> = keys.iter().cloned().collect();

        for token in self.state.tree.nodes() {
            let feats = token.feats.keys().map(|name| format!("FEATS.{}", name));
            let misc = token.misc.keys().map(|name| format!("MISC.{}", name));
            for key in feats.chain(misc) {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}
