mod logging;
mod ops;

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use anyhow::Context;
use arbor_state::protocol::SentenceState;
use arbor_state::{HistoryConfig, ReactiveSentence, SentenceConfig, SentenceHistory};
use clap::Parser;
use serde::Serialize;

use crate::logging::{init_logging, LogConfig};
use crate::ops::Op;

#[derive(Parser)]
#[command(author, version, about = "Edits a CoNLL-U sentence with undo/redo")]
struct Cli {
    /// CoNLL-U sentence to load, `-` for stdin
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// remove:ID, split-before:ID, split-after:ID, append, toggle:ID:FEAT, undo, redo
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<Op>,

    /// Print the final state as JSON instead of CoNLL-U
    #[arg(long)]
    json: bool,

    /// Keep at most N snapshots
    #[arg(long, value_name = "N")]
    history_limit: Option<usize>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct Report<'a> {
    state: &'a SentenceState,
    text: String,
    history_index: Option<usize>,
    snapshots: Vec<String>,
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        return io::read_to_string(io::stdin()).context("reading stdin");
    }
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_ansi(io::stderr().is_terminal()))?;

    let verbose = cli.verbose > 0;
    let mut sentence = ReactiveSentence::with_config(SentenceConfig::default().with_verbose(verbose));
    let mut history_config = HistoryConfig::default().with_verbose(verbose);
    if let Some(limit) = cli.history_limit {
        history_config = history_config.with_max_snapshots(limit);
    }
    let mut history = SentenceHistory::with_config(history_config);

    let text = read_input(&cli.input)?;
    sentence
        .from_text(&text)
        .with_context(|| format!("parsing {}", cli.input.display()))?;
    history.backup(&sentence)?;
    tracing::info!(words = sentence.tree().len(), "loaded sentence");

    for op in &cli.ops {
        let _span = tracing::info_span!("op", %op).entered();
        op.apply(&mut sentence, &mut history)
            .with_context(|| format!("applying `{}`", op))?;
        tracing::debug!(words = sentence.tree().len(), index = ?history.current_index(), "applied");
    }

    if cli.json {
        let report = Report {
            state: sentence.state(),
            text: sentence.plain_text(),
            history_index: history.current_index(),
            snapshots: (0..history.len())
                .filter_map(|index| history.get(index))
                .map(|memento| memento.name())
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", sentence.export_text());
    }
    Ok(())
}
