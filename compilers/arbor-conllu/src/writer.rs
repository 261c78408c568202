use std::fmt;

use arbor_protocol::{FieldMap, SentenceMeta, SentenceTree, Token, TokenId, UNSET};

/// Lazily formats a sentence as CoNLL-U; every line ends with `\n`.
///
/// Groups are written right before their first word and empty nodes right
/// after the word they follow, so parsing the output yields the same tree.
pub struct Conllu<'a> {
    tree: &'a SentenceTree,
    meta: &'a SentenceMeta,
}

impl<'a> Conllu<'a> {
    pub fn new(tree: &'a SentenceTree, meta: &'a SentenceMeta) -> Self {
        Self { tree, meta }
    }
}

struct Fields<'a>(&'a FieldMap, char);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Fields(map, sep) = self;
        if map.is_empty() {
            return f.write_str(UNSET);
        }
        for (index, (key, value)) in map.iter().enumerate() {
            if index > 0 {
                f.write_str("|")?;
            }
            f.write_str(key)?;
            if !value.is_empty() {
                write!(f, "{}{}", sep, value)?;
            }
        }
        Ok(())
    }
}

fn write_token(f: &mut fmt::Formatter<'_>, token: &Token) -> fmt::Result {
    write!(
        f,
        "{}\t{}\t{}\t{}\t{}\t{}\t",
        token.id,
        token.form,
        token.lemma,
        token.upos,
        token.xpos,
        Fields(&token.feats, '='),
    )?;
    match token.head {
        Some(head) => write!(f, "{}", head)?,
        None => f.write_str(UNSET)?,
    }
    writeln!(
        f,
        "\t{}\t{}\t{}",
        token.deprel,
        Fields(&token.deps, ':'),
        Fields(&token.misc, '='),
    )
}

impl fmt::Display for Conllu<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.meta.iter() {
            if value.is_empty() {
                writeln!(f, "# {}", key)?;
            } else {
                writeln!(f, "# {} = {}", key, value)?;
            }
        }

        let mut groups = self.tree.groups().iter().peekable();
        let mut enhanced = self.tree.enhanced_nodes().iter().peekable();
        let mut empty_nodes_after = |f: &mut fmt::Formatter<'_>, word: u32| -> fmt::Result {
            while let Some(node) = enhanced
                .next_if(|node| matches!(node.id, TokenId::Enhanced { head, .. } if head == word))
            {
                write_token(f, node)?;
            }
            Ok(())
        };

        empty_nodes_after(f, 0)?;
        for token in self.tree.nodes() {
            let word = token.id.as_normal().unwrap_or_default();
            while let Some(group) = groups
                .next_if(|group| matches!(group.id, TokenId::Group { start, .. } if start == word))
            {
                write_token(f, group)?;
            }
            write_token(f, token)?;
            empty_nodes_after(f, word)?;
        }
        Ok(())
    }
}

/// Renders a sentence as CoNLL-U text.
pub fn serialize(tree: &SentenceTree, meta: &SentenceMeta) -> String {
    Conllu::new(tree, meta).to_string()
}
