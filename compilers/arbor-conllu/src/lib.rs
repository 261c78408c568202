pub mod error;
pub mod parser;
pub mod text;
pub mod writer;

pub use error::ParseError;
pub use parser::parse;
pub use text::surface_text;
pub use writer::{serialize, Conllu};

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_protocol::{
        FieldMap, SentenceMeta, SentenceState, SentenceTree, Token, TokenId, TreeParts,
    };
    use proptest::prelude::*;

    const SENTENCE: &str = "\
# sent_id = fr-1
# text = Il parle au chat.
# newpar
1\tIl\til\tPRON\t_\tNumber=Sing|Person=3\t2\tnsubj\t2:nsubj\t_
2\tparle\tparler\tVERB\t_\tMood=Ind\t0\troot\t0:root\t_
3-4\tau\t_\t_\t_\t_\t_\t_\t_\t_
3\tà\tà\tADP\t_\t_\t5\tcase\t5:case\t_
4\tle\tle\tDET\t_\tDefinite=Def\t5\tdet\t5:det\t_
5\tchat\tchat\tNOUN\t_\tGender=Masc\t2\tobl\t2:obl:à\tSpaceAfter=No
5.1\tparle\tparler\tVERB\t_\t_\t_\t_\t2:conj\tCopyOf=2
6\t.\t.\tPUNCT\t_\t_\t2\tpunct\t2:punct\t_
";

    #[test]
    fn test_round_trip() {
        let state = parse(SENTENCE).expect("well-formed sentence");
        assert_eq!(serialize(&state.tree, &state.meta), SENTENCE);
    }

    #[test]
    fn test_parse_columns() {
        let state = parse(SENTENCE).unwrap();
        let tree = &state.tree;
        assert_eq!(tree.len(), 6);
        assert_eq!(state.meta.get("sent_id"), Some("fr-1"));
        assert_eq!(state.meta.get("newpar"), Some(""));

        let il = tree.node(1).unwrap();
        assert_eq!(il.feats.get("Person"), Some("3"));
        assert_eq!(il.head, Some(2));

        let chat = tree.node(5).unwrap();
        assert_eq!(chat.deps.get("2"), Some("obl:à"));
        assert_eq!(chat.misc.get("SpaceAfter"), Some("No"));

        assert_eq!(tree.groups()[0].id, TokenId::Group { start: 3, end: 4 });
        assert_eq!(tree.groups()[0].head, None);
        assert_eq!(
            tree.enhanced_nodes()[0].id,
            TokenId::Enhanced { head: 5, sub: 1 }
        );
    }

    #[test]
    fn test_surface_text_uses_groups_and_spacing() {
        let state = parse(SENTENCE).unwrap();
        assert_eq!(surface_text(&state.tree), "Il parle au chat.");
    }

    #[test]
    fn test_crlf_and_terminator() {
        let text = "1\ta\t_\t_\t_\t_\t0\troot\t_\t_\r\n\r\n\r\n";
        let state = parse(text).unwrap();
        assert_eq!(state.tree.node(1).unwrap().form, "a");
    }

    #[test]
    fn test_empty_input_is_empty_sentence() {
        let state = parse("").unwrap();
        assert!(state.tree.is_empty());
        assert_eq!(serialize(&state.tree, &state.meta), "");
    }

    #[test]
    fn test_empty_values_are_written_bare() {
        let text = "# note = \n1\ta\t_\t_\t_\tTypo=\t0\troot\t_\tBold=|Gloss=x\n";
        let state = parse(text).unwrap();
        assert_eq!(state.tree.node(1).unwrap().feats.get("Typo"), Some(""));
        assert_eq!(
            serialize(&state.tree, &state.meta),
            "# note\n1\ta\t_\t_\t_\tTypo\t0\troot\t_\tBold|Gloss=x\n"
        );
    }

    #[test]
    fn test_comments_between_tokens_join_the_header() {
        let text = "\
# newpar
1\ta\t_\t_\t_\t_\t0\troot\t_\t_
# newpar
# sent_id = late
2\tb\t_\t_\t_\t_\t1\tdep\t_\t_
";
        let state = parse(text).unwrap();
        assert_eq!(state.meta.len(), 2);
        assert_eq!(
            serialize(&state.tree, &state.meta),
            "\
# newpar
# sent_id = late
1\ta\t_\t_\t_\t_\t0\troot\t_\t_
2\tb\t_\t_\t_\t_\t1\tdep\t_\t_
"
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse("1\ta\t_\n"),
            Err(ParseError::ColumnCount { line: 1, found: 3 })
        );
        assert!(matches!(
            parse("x\ta\t_\t_\t_\t_\t0\troot\t_\t_\n"),
            Err(ParseError::InvalidId { line: 1, .. })
        ));
        assert!(matches!(
            parse("1\ta\t_\t_\t_\t_\t-1\troot\t_\t_\n"),
            Err(ParseError::InvalidHead { line: 1, .. })
        ));
        assert!(matches!(
            parse("1\ta\t_\t_\t_\t|\t0\troot\t_\t_\n"),
            Err(ParseError::InvalidField {
                line: 1,
                column: "FEATS",
                ..
            })
        ));
        assert_eq!(
            parse("1\ta\t_\t_\t_\t_\t0\troot\t_\t_\n3\tb\t_\t_\t_\t_\t1\tdep\t_\t_\n"),
            Err(ParseError::NonContiguous {
                line: 2,
                expected: 2,
                found: TokenId::Normal(3)
            })
        );
        assert_eq!(
            parse("1\ta\t_\t_\t_\t_\t0\troot\t_\t_\n\n1\tb\t_\t_\t_\t_\t0\troot\t_\t_\n"),
            Err(ParseError::TrailingContent { line: 3 })
        );
        assert!(matches!(
            parse("1-2\tau\t_\t_\t_\t_\t_\t_\t_\t_\n1\ta\t_\t_\t_\t_\t0\troot\t_\t_\n"),
            Err(ParseError::Structure(_))
        ));
    }

    fn word_strategy() -> impl Strategy<Value = (String, String, Vec<(String, String)>, Vec<(String, String)>)> {
        (
            "[A-Za-z]{1,6}",
            prop::sample::select(vec!["_", "NOUN", "VERB", "DET"]).prop_map(str::to_string),
            prop::collection::vec(("[A-Z][a-z]{1,5}", "[A-Z][a-z]{1,4}"), 0..3),
            prop::collection::vec(("[A-Z][a-z]{1,5}", prop::option::of("[A-Za-z]{1,4}")), 0..3)
                .prop_map(|items| {
                    items
                        .into_iter()
                        .map(|(key, value)| (key, value.unwrap_or_default()))
                        .collect()
                }),
        )
    }

    fn state_strategy() -> impl Strategy<Value = SentenceState> {
        (
            prop::collection::vec(word_strategy(), 0..6),
            prop::collection::vec(("[a-z_]{1,8}", "[A-Za-z ]{0,10}"), 0..3),
            any::<u32>(),
        )
            .prop_map(|(words, meta, seed)| {
                let count = words.len() as u32;
                let nodes = words
                    .into_iter()
                    .enumerate()
                    .map(|(index, (form, upos, feats, misc))| {
                        let mut token = Token::with_form(TokenId::Normal(index as u32 + 1), form);
                        token.upos = upos;
                        token.feats = feats.into_iter().collect::<FieldMap>();
                        token.misc = misc.into_iter().collect::<FieldMap>();
                        token.head = seed.checked_rem(count + 1).map(|head| (head + index as u32) % (count + 1));
                        token
                    })
                    .collect();
                let groups = if count >= 2 {
                    vec![Token::with_form(TokenId::Group { start: 1, end: 2 }, "xy")]
                } else {
                    vec![]
                };
                let tree = SentenceTree::from_parts(TreeParts {
                    nodes,
                    groups,
                    enhanced_nodes: vec![Token::empty(TokenId::Enhanced { head: count, sub: 1 })],
                })
                .expect("generated tree is valid");
                let meta = meta.into_iter().collect::<SentenceMeta>();
                SentenceState { tree, meta }
            })
    }

    proptest! {
        #[test]
        fn test_serialize_then_parse_is_identity(state in state_strategy()) {
            let text = serialize(&state.tree, &state.meta);
            let reparsed = parse(&text).unwrap();
            prop_assert_eq!(&reparsed, &state);
            prop_assert_eq!(serialize(&reparsed.tree, &reparsed.meta), text);
        }
    }
}
