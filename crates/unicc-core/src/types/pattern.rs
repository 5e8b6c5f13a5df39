/// The form a terminal symbol's pattern takes, independent of how it is
/// eventually compiled into the auto-lexer's DFA (see `lexer::compile`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
  /// A terminal with no textual form of its own (end-of-input, error).
  Nameless,
  /// A fixed string, matched verbatim: `'+'`, `'hello'`.
  Literal(String),
  /// A single-character class such as `[0-9a-f]` or `[^ \t]`.
  CharClass(String),
  /// A general regular expression, stored in source form until compiled:
  /// `/[0-9]+/`.
  Regex(String),
}

impl Pattern {
  pub fn source_text(&self) -> Option<&str> {
    match self {
      Pattern::Nameless => None,
      Pattern::Literal(s) | Pattern::CharClass(s) | Pattern::Regex(s) => Some(s),
    }
  }

  pub fn is_fixed_string(&self) -> bool {
    matches!(self, Pattern::Literal(_))
  }
}
