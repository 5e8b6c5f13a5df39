use unicc_core::types::{SymbolId, Span};

/// A single lexical unit fed into [`crate::driver::ParserCtx::next`].
///
/// spec.md §3/§6 describe this as `{ symbol: &Symbol, start: &str, end: &str,
/// len: usize }` — two raw pointers into the source plus a borrowed symbol.
/// Rust has no use for pointer-pair spans: a byte-offset [`Span`] into the
/// original `&str` plus the matched slice itself carries the same
/// information without tying the type to the Grammar's lifetime, so that's
/// what this struct stores (see DESIGN.md's note on this Token redesign).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
  pub symbol: SymbolId,
  pub text: &'a str,
  pub span: Span,
}

impl<'a> Token<'a> {
  pub fn new(symbol: SymbolId, text: &'a str, span: Span) -> Self {
    Self { symbol, text, span }
  }

  pub fn len(&self) -> usize {
    self.text.len()
  }

  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }
}
