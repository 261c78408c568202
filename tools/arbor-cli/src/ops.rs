use std::fmt;
use std::str::FromStr;

use arbor_state::{ReactiveSentence, SentenceHistory};

/// One editing step given on the command line with `--op`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Remove(u32),
    SplitBefore(u32),
    SplitAfter(u32),
    Append,
    Toggle { id: u32, feature: String },
    Undo,
    Redo,
}

impl Op {
    /// Whether the step changes the sentence and so deserves a snapshot.
    pub fn is_edit(&self) -> bool {
        !matches!(self, Op::Undo | Op::Redo)
    }

    pub fn apply(
        &self,
        sentence: &mut ReactiveSentence,
        history: &mut SentenceHistory,
    ) -> anyhow::Result<()> {
        match self {
            Op::Remove(id) => sentence.remove_token(*id)?,
            Op::SplitBefore(id) => sentence.split_token_before(*id)?,
            Op::SplitAfter(id) => sentence.split_token_after(*id)?,
            Op::Append => {
                let id = sentence.append_empty_token()?;
                tracing::debug!(%id, "appended word");
            }
            Op::Toggle { id, feature } => {
                let active = sentence.toggle_boolean_feature(*id, feature)?;
                tracing::debug!(id, feature = %feature, active, "toggled feature");
            }
            Op::Undo => {
                if !history.undo(sentence)? {
                    tracing::warn!("nothing to undo");
                }
            }
            Op::Redo => {
                if !history.redo(sentence)? {
                    tracing::warn!("nothing to redo");
                }
            }
        }
        if self.is_edit() {
            history.backup(sentence)?;
        }
        Ok(())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Remove(id) => write!(f, "remove:{}", id),
            Op::SplitBefore(id) => write!(f, "split-before:{}", id),
            Op::SplitAfter(id) => write!(f, "split-after:{}", id),
            Op::Append => write!(f, "append"),
            Op::Toggle { id, feature } => write!(f, "toggle:{}:{}", id, feature),
            Op::Undo => write!(f, "undo"),
            Op::Redo => write!(f, "redo"),
        }
    }
}

fn word_id(op: &str, arg: Option<&str>) -> Result<u32, String> {
    let arg = arg.ok_or_else(|| format!("`{}` needs a word ID, e.g. `{}:3`", op, op))?;
    arg.parse()
        .map_err(|_| format!("`{}` is not a word ID", arg))
}

impl FromStr for Op {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let name = parts.next().unwrap_or_default();
        let id = parts.next();
        let op = match name {
            "remove" => Op::Remove(word_id(name, id)?),
            "split-before" => Op::SplitBefore(word_id(name, id)?),
            "split-after" => Op::SplitAfter(word_id(name, id)?),
            "toggle" => {
                let id = word_id(name, id)?;
                let feature = parts
                    .next()
                    .filter(|feature| !feature.is_empty())
                    .ok_or_else(|| "`toggle` needs a feature, e.g. `toggle:3:Bold`".to_string())?;
                return Ok(Op::Toggle {
                    id,
                    feature: feature.to_string(),
                });
            }
            "append" => Op::Append,
            "undo" => Op::Undo,
            "redo" => Op::Redo,
            _ => return Err(format!("unknown operation `{}`", s)),
        };
        match (&op, id, parts.next()) {
            (Op::Append | Op::Undo | Op::Redo, None, _) => Ok(op),
            (Op::Remove(_) | Op::SplitBefore(_) | Op::SplitAfter(_), _, None) => Ok(op),
            _ => Err(format!("unexpected argument in `{}`", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &str = "\
1\tThe\tthe\tDET\t_\t_\t2\tdet\t_\t_
2\tcats\tcat\tNOUN\t_\t_\t0\troot\t_\t_
";

    #[test]
    fn test_parse_ops() {
        assert_eq!("remove:2".parse::<Op>(), Ok(Op::Remove(2)));
        assert_eq!("split-before:1".parse::<Op>(), Ok(Op::SplitBefore(1)));
        assert_eq!("split-after:3".parse::<Op>(), Ok(Op::SplitAfter(3)));
        assert_eq!("append".parse::<Op>(), Ok(Op::Append));
        assert_eq!(
            "toggle:4:Bold".parse::<Op>(),
            Ok(Op::Toggle {
                id: 4,
                feature: "Bold".to_string()
            })
        );
        assert_eq!("undo".parse::<Op>(), Ok(Op::Undo));
        assert_eq!("redo".parse::<Op>(), Ok(Op::Redo));
    }

    #[test]
    fn test_reject_malformed_ops() {
        for bad in ["", "remove", "remove:x", "remove:1:2", "append:1", "toggle:1", "toggle:1:", "merge:1"] {
            assert!(bad.parse::<Op>().is_err(), "{:?} should not parse", bad);
        }
    }

    #[test]
    fn test_display_parses_back() {
        for text in ["remove:2", "split-before:1", "append", "toggle:4:Bold", "undo"] {
            assert_eq!(text.parse::<Op>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_apply_backs_up_edits_only() {
        let mut sentence = ReactiveSentence::new();
        sentence.from_text(SENTENCE).unwrap();
        let mut history = SentenceHistory::new();
        history.backup(&sentence).unwrap();

        Op::SplitAfter(1).apply(&mut sentence, &mut history).unwrap();
        assert_eq!(sentence.underscored_text(), "The___cats");
        assert_eq!(history.len(), 2);

        Op::Undo.apply(&mut sentence, &mut history).unwrap();
        assert_eq!(sentence.export_text(), SENTENCE);
        Op::Undo.apply(&mut sentence, &mut history).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.current_index(), Some(0));

        Op::Redo.apply(&mut sentence, &mut history).unwrap();
        assert_eq!(sentence.tree().len(), 3);
    }

    #[test]
    fn test_failed_edit_is_not_recorded() {
        let mut sentence = ReactiveSentence::new();
        sentence.from_text(SENTENCE).unwrap();
        let mut history = SentenceHistory::new();
        history.backup(&sentence).unwrap();

        assert!(Op::Remove(7).apply(&mut sentence, &mut history).is_err());
        assert_eq!(history.len(), 1);
    }
}
