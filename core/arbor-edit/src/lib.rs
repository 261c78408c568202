#![no_std]

#[cfg_attr(test, macro_use)]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use arbor_protocol::{SentenceTree, Token, TokenId, TreeError, TreeParts, UNSET};

use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    EmptyRange,
    NonContiguous { ids: Vec<u32> },
    OutOfRange { id: u32, words: u32 },
    Tree(TreeError),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::EmptyRange => write!(f, "no token selected for replacement"),
            EditError::NonContiguous { ids } => {
                write!(f, "tokens {:?} do not form a contiguous range", ids)
            }
            EditError::OutOfRange { id, words } => {
                write!(f, "token {} is outside the sentence (1..={})", id, words)
            }
            EditError::Tree(err) => write!(f, "edit produced an invalid tree: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EditError {}

/// How word positions move when `first..=last` is replaced by `inserted` words.
///
/// `kept` is the offset, among the inserted words, of the one standing for the
/// original word; empty nodes that followed a replaced word follow it.
#[derive(Debug, Clone, Copy)]
struct Shift {
    first: u32,
    last: u32,
    inserted: u32,
    kept: u32,
    preserve: bool,
}

impl Shift {
    fn removed(&self) -> u32 {
        self.last - self.first + 1
    }

    fn contains(&self, id: u32) -> bool {
        (self.first..=self.last).contains(&id)
    }

    /// New ID of word `id`; `None` if the word disappeared.
    fn word(&self, id: u32) -> Option<u32> {
        if id < self.first {
            Some(id)
        } else if id > self.last {
            Some(id - self.removed() + self.inserted)
        } else if self.preserve && self.inserted > 0 {
            Some(self.first)
        } else {
            None
        }
    }

    /// New position of a boundary that sits after word `id` (group ends, empty-node heads).
    fn anchor(&self, id: u32) -> u32 {
        if id < self.first {
            id
        } else if id > self.last {
            id - self.removed() + self.inserted
        } else {
            self.first + self.inserted - 1
        }
    }

    /// New anchor of an empty node that followed word `id`.
    fn empty_node_anchor(&self, id: u32) -> u32 {
        if self.contains(id) && self.inserted > 0 {
            self.first + self.kept
        } else {
            self.anchor(id)
        }
    }

    fn head(&self, head: Option<u32>) -> Option<u32> {
        match head? {
            0 => Some(0),
            id => self.word(id),
        }
    }

    fn deps_key(&self, key: &str, renamed: &[(TokenId, TokenId)]) -> Option<String> {
        match key.parse::<TokenId>() {
            Ok(TokenId::Normal(id)) => self.word(id).map(|id| id.to_string()),
            Ok(id @ TokenId::Enhanced { .. }) => Some(
                renamed
                    .iter()
                    .find(|(old, _)| *old == id)
                    .map_or_else(|| key.to_string(), |(_, new)| new.to_string()),
            ),
            // root "0", group references and free text stay as they are
            _ => Some(key.to_string()),
        }
    }

    fn relink(&self, token: &mut Token, renamed: &[(TokenId, TokenId)]) {
        token.head = self.head(token.head);
        token.deps.rewrite_keys(|key| self.deps_key(key, renamed));
    }
}

/// Moves empty nodes along with their anchor word.
///
/// Nodes whose anchors collapse onto the same word get their `sub` numbers
/// reassigned in order when they would otherwise clash.
fn shift_enhanced(nodes: Vec<Token>, shift: &Shift) -> (Vec<Token>, Vec<(TokenId, TokenId)>) {
    let mut placed: Vec<(u32, u32, Token)> = nodes
        .into_iter()
        .filter_map(|token| {
            let TokenId::Enhanced { head, sub } = token.id else {
                return None;
            };
            Some((shift.empty_node_anchor(head), sub, token))
        })
        .collect();

    let mut start = 0;
    while start < placed.len() {
        let head = placed[start].0;
        let end = start + placed[start..].iter().take_while(|(h, ..)| *h == head).count();
        let run = &mut placed[start..end];
        let clash = run
            .iter()
            .enumerate()
            .any(|(i, (_, sub, _))| run[..i].iter().any(|(_, other, _)| other == sub));
        if clash {
            for (offset, (_, sub, _)) in run.iter_mut().enumerate() {
                *sub = offset as u32 + 1;
            }
        }
        start = end;
    }

    let mut renamed = Vec::with_capacity(placed.len());
    let nodes = placed
        .into_iter()
        .map(|(head, sub, mut token)| {
            let id = TokenId::Enhanced { head, sub };
            if token.id != id {
                renamed.push((token.id, id));
            }
            token.id = id;
            token
        })
        .collect();
    (nodes, renamed)
}

/// Replaces the words `ids_to_remove` with one new word per entry of `new_forms`.
///
/// Every later word is renumbered by `new_forms.len() - ids_to_remove.len()`, as are
/// HEAD and DEPS references to them, multiword ranges and empty-node anchors.
/// References to removed words are dropped, unless `preserve_analysis` is set and
/// something is inserted: then the new words start as copies of the first removed
/// word and references to the removed words point at the first new one.
pub fn replace_range<S: AsRef<str>>(
    tree: &SentenceTree,
    ids_to_remove: &[u32],
    new_forms: &[S],
    preserve_analysis: bool,
) -> Result<SentenceTree, EditError> {
    let kept = (new_forms.len() as u32).saturating_sub(1);
    replace_words(tree, ids_to_remove, new_forms, preserve_analysis, kept)
}

/// [`replace_range`] with empty nodes of the replaced words anchored after
/// inserted word number `kept` (0-based).
fn replace_words<S: AsRef<str>>(
    tree: &SentenceTree,
    ids_to_remove: &[u32],
    new_forms: &[S],
    preserve_analysis: bool,
    kept: u32,
) -> Result<SentenceTree, EditError> {
    let words = tree.max_normal_id();
    let (first, last) = match (ids_to_remove.first(), ids_to_remove.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Err(EditError::EmptyRange),
    };
    if let Some(&id) = ids_to_remove.iter().find(|&&id| id == 0 || id > words) {
        return Err(EditError::OutOfRange { id, words });
    }
    if ids_to_remove.windows(2).any(|pair| pair[1] != pair[0] + 1) {
        return Err(EditError::NonContiguous {
            ids: ids_to_remove.to_vec(),
        });
    }

    let shift = Shift {
        first,
        last,
        inserted: new_forms.len() as u32,
        kept,
        preserve: preserve_analysis,
    };
    let TreeParts {
        nodes,
        groups,
        enhanced_nodes,
    } = tree.clone().into_parts();

    let (mut enhanced_nodes, renamed) = shift_enhanced(enhanced_nodes, &shift);
    for token in &mut enhanced_nodes {
        shift.relink(token, &renamed);
    }

    let template = nodes[first as usize - 1].clone();
    let mut rebuilt = Vec::with_capacity(nodes.len() + new_forms.len());
    let mut rest = nodes.into_iter();

    for mut token in rest.by_ref().take(first as usize - 1) {
        shift.relink(&mut token, &renamed);
        rebuilt.push(token);
    }
    rest.by_ref().take(shift.removed() as usize).for_each(drop);

    for (offset, form) in new_forms.iter().enumerate() {
        let id = TokenId::Normal(first + offset as u32);
        let mut token = if preserve_analysis {
            let mut token = template.clone();
            shift.relink(&mut token, &renamed);
            token.id = id;
            token
        } else {
            Token::empty(id)
        };
        token.form = form.as_ref().to_string();
        rebuilt.push(token);
    }

    for mut token in rest {
        shift.relink(&mut token, &renamed);
        token.id = TokenId::Normal(rebuilt.len() as u32 + 1);
        rebuilt.push(token);
    }

    let groups = groups
        .into_iter()
        .filter_map(|mut token| {
            let TokenId::Group { start, end } = token.id else {
                return None;
            };
            let start = if shift.contains(start) {
                first
            } else {
                shift.anchor(start)
            };
            let end = shift.anchor(end);
            (start < end).then(|| {
                token.id = TokenId::Group { start, end };
                shift.relink(&mut token, &renamed);
                token
            })
        })
        .collect();

    SentenceTree::from_parts(TreeParts {
        nodes: rebuilt,
        groups,
        enhanced_nodes,
    })
    .map_err(EditError::Tree)
}

fn form_of(tree: &SentenceTree, id: u32) -> Result<String, EditError> {
    tree.node(id)
        .map(|token| token.form.clone())
        .ok_or(EditError::OutOfRange {
            id,
            words: tree.max_normal_id(),
        })
}

/// Deletes word `id`; dependents of it become unattached.
pub fn remove_token(tree: &SentenceTree, id: u32) -> Result<SentenceTree, EditError> {
    replace_range::<&str>(tree, &[id], &[], false)
}

/// Inserts an empty word in front of `id`; the original word keeps its analysis
/// and its dependents.
pub fn split_token_before(tree: &SentenceTree, id: u32) -> Result<SentenceTree, EditError> {
    let form = form_of(tree, id)?;
    let mut next = replace_range(tree, &[id], &[UNSET, form.as_str()], true)?;
    next.update(TokenId::Normal(id), Token::reset_analysis);
    retarget_heads(&mut next, id, id + 1);
    Ok(next)
}

/// Inserts an empty word right after `id`; the original word is untouched apart
/// from renumbering.
pub fn split_token_after(tree: &SentenceTree, id: u32) -> Result<SentenceTree, EditError> {
    let form = form_of(tree, id)?;
    let mut next = replace_words(tree, &[id], &[form.as_str(), UNSET], true, 0)?;
    next.update(TokenId::Normal(id + 1), Token::reset_analysis);
    Ok(next)
}

/// Appends an empty word after the last one. Nothing is renumbered.
pub fn append_empty_token(tree: &SentenceTree) -> (SentenceTree, TokenId) {
    let mut next = tree.clone();
    let id = next.push_node(Token::empty(TokenId::Normal(0)));
    (next, id)
}

/// Points every HEAD and DEPS reference to word `from` at word `to` instead.
pub fn retarget_heads(tree: &mut SentenceTree, from: u32, to: u32) {
    let from_key = from.to_string();
    let to_key = to.to_string();
    tree.update_all(|token| {
        if token.id == TokenId::Normal(to) {
            return;
        }
        if token.head == Some(from) {
            token.head = Some(to);
        }
        token.deps.rewrite_keys(|key| {
            Some(if key == from_key {
                to_key.clone()
            } else {
                key.to_string()
            })
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_protocol::FieldMap;
    use proptest::prelude::*;

    fn word(id: u32, form: &str, head: Option<u32>) -> Token {
        let mut token = Token::with_form(TokenId::Normal(id), form);
        token.lemma = form.to_lowercase();
        token.head = head;
        token
    }

    fn tree(nodes: Vec<Token>, groups: Vec<Token>, enhanced_nodes: Vec<Token>) -> SentenceTree {
        SentenceTree::from_parts(TreeParts {
            nodes,
            groups,
            enhanced_nodes,
        })
        .expect("valid test tree")
    }

    fn flat(forms: &[&str]) -> SentenceTree {
        let nodes = forms
            .iter()
            .enumerate()
            .map(|(i, form)| word(i as u32 + 1, form, None))
            .collect();
        tree(nodes, vec![], vec![])
    }

    fn forms(tree: &SentenceTree) -> Vec<&str> {
        tree.nodes().iter().map(|token| token.form.as_str()).collect()
    }

    fn ids(tree: &SentenceTree) -> Vec<TokenId> {
        tree.nodes().iter().map(|token| token.id).collect()
    }

    /// "The cats sleep": The <-det- cats <-nsubj- sleep (root)
    fn cats_sleep() -> SentenceTree {
        let mut the = word(1, "The", Some(2));
        the.upos = "DET".to_string();
        the.deprel = "det".to_string();
        let mut cats = word(2, "cats", Some(3));
        cats.upos = "NOUN".to_string();
        cats.feats.insert("Number", "Plur");
        cats.deps.insert("3", "nsubj");
        let sleep = word(3, "sleep", Some(0));
        tree(vec![the, cats, sleep], vec![], vec![])
    }

    #[test]
    fn test_remove_renumbers_trailing_tokens() {
        let next = remove_token(&flat(&["a", "b", "c"]), 2).unwrap();
        assert_eq!(forms(&next), ["a", "c"]);
        assert_eq!(ids(&next), [TokenId::Normal(1), TokenId::Normal(2)]);
    }

    #[test]
    fn test_remove_detaches_dependents() {
        let next = remove_token(&cats_sleep(), 2).unwrap();
        assert_eq!(forms(&next), ["The", "sleep"]);
        assert_eq!(next.node(1).unwrap().head, None);
        assert_eq!(next.node(2).unwrap().head, Some(0));
    }

    #[test]
    fn test_split_after_inserts_blank_successor() {
        let next = split_token_after(&flat(&["The", "cats"]), 1).unwrap();
        assert_eq!(forms(&next), ["The", "_", "cats"]);
        assert_eq!(next.node(1).unwrap().lemma, "the");
        assert_eq!(next.node(2).unwrap(), &Token::empty(TokenId::Normal(2)));
    }

    #[test]
    fn test_split_before_keeps_analysis_on_successor() {
        let original = cats_sleep();
        let next = split_token_before(&original, 2).unwrap();
        assert_eq!(forms(&next), ["The", "_", "cats", "sleep"]);

        assert_eq!(next.node(2).unwrap(), &Token::empty(TokenId::Normal(2)));

        let cats = next.node(3).unwrap();
        assert_eq!(cats.lemma, "cats");
        assert_eq!(cats.upos, "NOUN");
        assert_eq!(cats.feats.get("Number"), Some("Plur"));
        assert_eq!(cats.head, Some(4));
        assert_eq!(cats.deps.get("4"), Some("nsubj"));

        // "The" followed its head to the new position
        assert_eq!(next.node(1).unwrap().head, Some(3));
        assert_eq!(next.node(4).unwrap().head, Some(0));
    }

    #[test]
    fn test_split_after_keeps_dependents_on_original() {
        let next = split_token_after(&cats_sleep(), 2).unwrap();
        assert_eq!(forms(&next), ["The", "cats", "_", "sleep"]);
        assert_eq!(next.node(1).unwrap().head, Some(2));
        assert_eq!(next.node(2).unwrap().head, Some(4));
        assert_eq!(next.node(3).unwrap().head, None);
    }

    #[test]
    fn test_replace_rejects_bad_ranges() {
        let t = flat(&["a", "b", "c"]);
        assert_eq!(
            replace_range::<&str>(&t, &[], &[], false),
            Err(EditError::EmptyRange)
        );
        assert_eq!(
            replace_range(&t, &[1, 3], &["x"], false),
            Err(EditError::NonContiguous { ids: vec![1, 3] })
        );
        assert_eq!(
            replace_range::<&str>(&t, &[0], &[], false),
            Err(EditError::OutOfRange { id: 0, words: 3 })
        );
        assert_eq!(
            split_token_after(&t, 4),
            Err(EditError::OutOfRange { id: 4, words: 3 })
        );
    }

    #[test]
    fn test_replace_many_by_one() {
        let next = replace_range(&flat(&["a", "b", "c", "d"]), &[2, 3], &["bc"], false).unwrap();
        assert_eq!(forms(&next), ["a", "bc", "d"]);
        assert_eq!(next.node(2).unwrap().lemma, "_");
    }

    #[test]
    fn test_groups_follow_edits() {
        let group = Token::with_form(TokenId::Group { start: 2, end: 3 }, "du");
        let t = tree(
            vec![
                word(1, "a", None),
                word(2, "de", None),
                word(3, "le", None),
                word(4, "b", None),
            ],
            vec![group],
            vec![],
        );

        let split = split_token_after(&t, 3).unwrap();
        assert_eq!(split.groups()[0].id, TokenId::Group { start: 2, end: 4 });

        let shifted = split_token_before(&t, 1).unwrap();
        assert_eq!(shifted.groups()[0].id, TokenId::Group { start: 3, end: 4 });

        let collapsed = remove_token(&t, 2).unwrap();
        assert!(collapsed.groups().is_empty());
    }

    #[test]
    fn test_enhanced_nodes_follow_anchor() {
        let empty = Token::with_form(TokenId::Enhanced { head: 2, sub: 1 }, "_");
        let mut c = word(3, "c", None);
        c.deps = [("2.1", "conj"), ("2", "nsubj")].into_iter().collect::<FieldMap>();
        let t = tree(
            vec![word(1, "a", None), word(2, "b", None), c],
            vec![],
            vec![empty],
        );

        let next = remove_token(&t, 1).unwrap();
        assert_eq!(
            next.enhanced_nodes()[0].id,
            TokenId::Enhanced { head: 1, sub: 1 }
        );
        let deps: Vec<_> = next.node(2).unwrap().deps.iter().collect();
        assert_eq!(deps, [("1.1", "conj"), ("1", "nsubj")]);
    }

    #[test]
    fn test_empty_node_stays_with_original_word_on_split() {
        let t = tree(
            vec![word(1, "a", None), word(2, "b", None)],
            vec![],
            vec![Token::with_form(TokenId::Enhanced { head: 1, sub: 1 }, "x")],
        );

        let after = split_token_after(&t, 1).unwrap();
        assert_eq!(forms(&after), ["a", "_", "b"]);
        assert_eq!(
            after.enhanced_nodes()[0].id,
            TokenId::Enhanced { head: 1, sub: 1 }
        );

        let before = split_token_before(&t, 1).unwrap();
        assert_eq!(forms(&before), ["_", "a", "b"]);
        assert_eq!(
            before.enhanced_nodes()[0].id,
            TokenId::Enhanced { head: 2, sub: 1 }
        );
    }

    #[test]
    fn test_enhanced_nodes_renumbered_on_clash() {
        let t = tree(
            vec![word(1, "a", None), word(2, "b", None)],
            vec![],
            vec![
                Token::with_form(TokenId::Enhanced { head: 1, sub: 1 }, "x"),
                Token::with_form(TokenId::Enhanced { head: 2, sub: 1 }, "y"),
            ],
        );
        let next = remove_token(&t, 2).unwrap();
        let ids: Vec<_> = next
            .enhanced_nodes()
            .iter()
            .map(|token| (token.id, token.form.as_str()))
            .collect();
        assert_eq!(
            ids,
            [
                (TokenId::Enhanced { head: 1, sub: 1 }, "x"),
                (TokenId::Enhanced { head: 1, sub: 2 }, "y"),
            ]
        );
    }

    #[test]
    fn test_append_on_empty_tree() {
        let (next, id) = append_empty_token(&SentenceTree::new());
        assert_eq!(id, TokenId::Normal(1));
        assert_eq!(forms(&next), ["_"]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Remove(u32),
        SplitBefore(u32),
        SplitAfter(u32),
        Append,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<u32>().prop_map(Op::Remove),
            any::<u32>().prop_map(Op::SplitBefore),
            any::<u32>().prop_map(Op::SplitAfter),
            Just(Op::Append),
        ]
    }

    proptest! {
        #[test]
        fn test_ids_stay_contiguous(
            initial in prop::collection::vec("[a-z]{1,5}", 0..8),
            ops in prop::collection::vec(op_strategy(), 0..24),
        ) {
            let initial: Vec<&str> = initial.iter().map(String::as_str).collect();
            let mut current = flat(&initial);
            let mut model: Vec<String> = initial.iter().map(|form| form.to_string()).collect();

            for op in ops {
                let len = model.len() as u32;
                let pick = |raw: u32| raw % len + 1;
                current = match op {
                    Op::Append => {
                        model.push(UNSET.to_string());
                        append_empty_token(&current).0
                    }
                    _ if len == 0 => continue,
                    Op::Remove(raw) => {
                        model.remove(pick(raw) as usize - 1);
                        remove_token(&current, pick(raw)).unwrap()
                    }
                    Op::SplitBefore(raw) => {
                        model.insert(pick(raw) as usize - 1, UNSET.to_string());
                        split_token_before(&current, pick(raw)).unwrap()
                    }
                    Op::SplitAfter(raw) => {
                        model.insert(pick(raw) as usize, UNSET.to_string());
                        split_token_after(&current, pick(raw)).unwrap()
                    }
                };

                let expected: Vec<TokenId> = (1..=model.len() as u32).map(TokenId::Normal).collect();
                prop_assert_eq!(ids(&current), expected);
                prop_assert_eq!(forms(&current), model.iter().map(String::as_str).collect::<Vec<_>>());
            }
        }
    }
}
