use std::fmt;

use crate::types::Span;

/// Category of a diagnostic or error. Mirrors the kind table UniCC itself
/// keeps in `p_error.h`, trimmed to what this core actually reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
  UndefinedSymbol,
  UnusedNonTerminal,
  UselessProduction,
  AmbiguousReduceReduce,
  AmbiguousShiftReduce,
  RedefinedSymbol,
  EmptyGoal,
  ScannerClassIntersection,
}

/// A non-fatal situation surfaced during preparation, table construction or
/// the scannerless rewrite. Diagnostics never abort construction; they
/// accumulate on the [`Grammar`](crate::types::Grammar) or a caller-supplied
/// sink.
#[derive(Debug, Clone)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub msg: String,
  pub span: Option<Span>,
}

impl Diagnostic {
  pub fn new(kind: DiagnosticKind, msg: impl Into<String>) -> Self {
    Self { kind, msg: msg.into(), span: None }
  }

  pub fn at(kind: DiagnosticKind, msg: impl Into<String>, span: Span) -> Self {
    Self { kind, msg: msg.into(), span: Some(span) }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}: {}", self.kind, self.msg)
  }
}

/// Fatal conditions that stop construction or table compilation outright.
#[derive(Debug, Clone)]
pub enum CoreError {
  UnknownSymbol { id: u32 },
  UnknownProduction { id: u32 },
  GrammarFrozen,
  NoGoalSymbol,
  InvalidPattern { pattern: String, reason: String },
  ScannerClassConflict { a: String, b: String },
}

impl fmt::Display for CoreError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CoreError::UnknownSymbol { id } => write!(f, "no symbol with index {id}"),
      CoreError::UnknownProduction { id } => write!(f, "no production with index {id}"),
      CoreError::GrammarFrozen => write!(f, "grammar is frozen and cannot be mutated"),
      CoreError::NoGoalSymbol => write!(f, "grammar has no goal symbol set"),
      CoreError::InvalidPattern { pattern, reason } => write!(f, "invalid pattern `{pattern}`: {reason}"),
      CoreError::ScannerClassConflict { a, b } => {
        write!(f, "terminal classes `{a}` and `{b}` intersect in scanner mode")
      }
    }
  }
}

impl std::error::Error for CoreError {}

pub type UniccResult<T> = Result<T, CoreError>;
