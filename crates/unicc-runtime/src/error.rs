use std::fmt;

use unicc_core::types::{SymbolId, Span};

/// A non-recoverable parse error: an action-table miss with no default
/// reduction to fall back on (spec.md §7). The driver transitions to
/// `ERROR` and exposes this so the caller can render "Parse Error on <sym>
/// at <span>" plus the set of symbols that would have been accepted.
#[derive(Debug, Clone)]
pub struct RuntimeError {
  pub found: SymbolId,
  pub span: Span,
  pub expected: Vec<SymbolId>,
}

impl fmt::Display for RuntimeError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Parse Error on symbol {} at [{}, {})", self.found.0, self.span.start, self.span.end)
  }
}

impl std::error::Error for RuntimeError {}
