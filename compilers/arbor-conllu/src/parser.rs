use arbor_protocol::{
    FieldMap, SentenceMeta, SentenceState, SentenceTree, Token, TokenId, TokenKind, TreeParts,
    UNSET,
};
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_till1},
    character::complete::{char, u32 as decimal},
    combinator::{all_consuming, map, opt, value},
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

use crate::error::ParseError;

/// `key<sep>value`, the value running up to the next `|`. A bare `key` has an empty value,
/// and so does `key<sep>`; both are written back as the bare `key`.
fn field(input: &str, sep: char) -> IResult<&str, (&str, &str)> {
    let (input, key) = take_till1(|c| c == sep || c == '|')(input)?;
    let (input, value) = opt(preceded(char(sep), take_till(|c| c == '|')))(input)?;
    Ok((input, (key, value.unwrap_or(""))))
}

fn field_list(input: &str, sep: char) -> IResult<&str, Vec<(&str, &str)>> {
    separated_list1(char('|'), |i| field(i, sep))(input)
}

fn head(input: &str) -> IResult<&str, Option<u32>> {
    alt((value(None, char('_')), map(decimal, Some)))(input)
}

/// `# key = value`, or `# comment` stored as a key without value.
fn meta_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (rest, _) = preceded(char('#'), opt(char(' ')))(input)?;
    let entry = match rest.split_once(" = ") {
        Some((key, value)) => (key.trim(), value),
        None => (rest.trim(), ""),
    };
    Ok(("", entry))
}

fn fields(
    column: &str,
    sep: char,
    name: &'static str,
    line: usize,
) -> Result<FieldMap, ParseError> {
    if column == UNSET {
        return Ok(FieldMap::new());
    }
    all_consuming(|i| field_list(i, sep))(column)
        .map(|(_, entries)| entries.into_iter().collect())
        .map_err(|_| ParseError::InvalidField {
            line,
            column: name,
            value: column.to_string(),
        })
}

fn token_line(text: &str, line: usize) -> Result<Token, ParseError> {
    let columns: Vec<&str> = text.split('\t').collect();
    let &[id, form, lemma, upos, xpos, feats, head_col, deprel, deps, misc] = columns.as_slice()
    else {
        return Err(ParseError::ColumnCount {
            line,
            found: columns.len(),
        });
    };

    let id = id.parse::<TokenId>().map_err(|_| ParseError::InvalidId {
        line,
        value: id.to_string(),
    })?;
    let (_, head) = all_consuming(head)(head_col).map_err(|_| ParseError::InvalidHead {
        line,
        value: head_col.to_string(),
    })?;

    Ok(Token {
        id,
        form: form.to_string(),
        lemma: lemma.to_string(),
        upos: upos.to_string(),
        xpos: xpos.to_string(),
        feats: fields(feats, '=', "FEATS", line)?,
        head,
        deprel: deprel.to_string(),
        deps: fields(deps, ':', "DEPS", line)?,
        misc: fields(misc, '=', "MISC", line)?,
    })
}

/// Reads one CoNLL-U sentence. Both `\n` and `\r\n` line ends are accepted.
///
/// Metadata is keyed: `#` lines found between token lines join the header,
/// and a repeated key keeps its first position with the last value.
pub fn parse(text: &str) -> Result<SentenceState, ParseError> {
    let mut meta = SentenceMeta::new();
    let mut parts = TreeParts::default();
    let mut terminated = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() {
            terminated = true;
            continue;
        }
        if terminated {
            return Err(ParseError::TrailingContent { line });
        }

        if raw.starts_with('#') {
            if let Ok((_, (key, value))) = meta_line(raw) {
                meta.insert(key, value);
            }
            continue;
        }

        let token = token_line(raw, line)?;
        match token.id.kind() {
            TokenKind::Normal => {
                let expected = parts.nodes.len() as u32 + 1;
                if token.id != TokenId::Normal(expected) {
                    return Err(ParseError::NonContiguous {
                        line,
                        expected,
                        found: token.id,
                    });
                }
                parts.nodes.push(token);
            }
            TokenKind::Group => parts.groups.push(token),
            TokenKind::Enhanced => parts.enhanced_nodes.push(token),
        }
    }

    let tree = SentenceTree::from_parts(parts).map_err(ParseError::Structure)?;
    Ok(SentenceState { tree, meta })
}
