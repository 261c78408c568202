use std::fmt;
use std::rc::Rc;

/// Benign conditions worth reporting in verbose mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    ObserverAttached { observers: usize },
    ObserverAlreadyAttached,
    ObserverDetached { observers: usize },
    ObserverNotAttached,
    Notifying { observers: usize },
    UndoAtStart,
    RedoAtEnd,
    SnapshotEvicted { retained: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ObserverAttached { observers } => {
                write!(f, "attached an observer ({} subscribed)", observers)
            }
            Diagnostic::ObserverAlreadyAttached => write!(f, "observer has been attached already"),
            Diagnostic::ObserverDetached { observers } => {
                write!(f, "detached an observer ({} subscribed)", observers)
            }
            Diagnostic::ObserverNotAttached => write!(f, "observer is not attached"),
            Diagnostic::Notifying { observers } => {
                write!(f, "sentence changed, notifying {} observers", observers)
            }
            Diagnostic::UndoAtStart => write!(f, "nothing to undo, already at the oldest snapshot"),
            Diagnostic::RedoAtEnd => write!(f, "nothing to redo, already at the newest snapshot"),
            Diagnostic::SnapshotEvicted { retained } => {
                write!(f, "evicted the oldest snapshot ({} retained)", retained)
            }
        }
    }
}

/// Where verbose-mode diagnostics go.
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: &Diagnostic);
}

impl<F: Fn(&Diagnostic)> DiagnosticSink for F {
    fn emit(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Default sink: forwards to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        tracing::debug!(target: "arbor_state", %diagnostic);
    }
}

/// Verbosity switch plus sink, shared by the sentence and its history.
#[derive(Clone)]
pub(crate) struct Diagnostics {
    verbose: bool,
    sink: Rc<dyn DiagnosticSink>,
}

impl Diagnostics {
    pub(crate) fn new(verbose: bool) -> Self {
        Self {
            verbose,
            sink: Rc::new(TracingSink),
        }
    }

    pub(crate) fn set_sink(&mut self, sink: Rc<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    pub(crate) fn emit(&self, diagnostic: Diagnostic) {
        if self.verbose {
            self.sink.emit(&diagnostic);
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
