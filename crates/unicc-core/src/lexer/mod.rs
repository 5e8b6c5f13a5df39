//! C8: the auto-lexer builder. Unions every non-special terminal's pattern
//! into one DFA keyed by terminal index and offers the scan-next-token
//! primitive the push driver (C9, in `unicc-runtime`) drives token-by-token.

mod charset;
mod dfa;
mod nfa;
mod regex;

pub use charset::CharSet;
pub use dfa::{Dfa, DfaState};
pub use nfa::{Edge, Nfa, NfaState};
pub use regex::ReNode;

use crate::error::{CoreError, UniccResult};
use crate::types::{Grammar, SymbolId};

/// Longest-match (greedy) when the grammar declares a whitespace terminal,
/// otherwise lazy (skip-until-match).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
  Greedy,
  Lazy,
}

#[derive(Debug, Clone)]
pub struct AutoLexer {
  pub dfa: Dfa,
  pub mode: LexMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexMatch {
  pub symbol: SymbolId,
  /// Byte offset, relative to the scan's starting position, where the
  /// matched token begins (nonzero only in [`LexMode::Lazy`], where
  /// unrecognized characters ahead of the match are skipped).
  pub skipped: usize,
  /// Length of the match in bytes.
  pub len: usize,
}

impl AutoLexer {
  /// `lr_build`'s lexer counterpart: compiles every non-special terminal's
  /// pattern into one DFA. Errors in scanner mode if two terminals' classes
  /// intersect; in scannerless mode (`g.flags.scannerless`) the overlap is
  /// tolerated, the lower-index terminal winning ties.
  pub fn build(g: &Grammar) -> UniccResult<AutoLexer> {
    let mut nfa = Nfa::new();
    let mut any_whitespace = false;
    for sym in &g.symbols {
      if sym.flags.special || !sym.is_terminal() {
        continue;
      }
      any_whitespace |= sym.flags.whitespace;
      let Some(pattern) = &sym.pattern else { continue };
      nfa.merge_pattern(sym.id, pattern)?;
    }

    let (dfa, overlaps) = dfa::build_dfa(&nfa);

    if !g.flags.scannerless {
      if let Some((a, b)) = overlaps.first() {
        let name = |id: SymbolId| g.symbol(id).map(|s| s.name.clone()).unwrap_or_default();
        return Err(CoreError::ScannerClassConflict { a: name(*a), b: name(*b) });
      }
    }

    let mode = if any_whitespace { LexMode::Greedy } else { LexMode::Lazy };
    Ok(AutoLexer { dfa, mode })
  }

  /// Scans one token starting at byte offset `pos` in `input`. Returns
  /// `None` at end of input or when lazy mode exhausts the remainder
  /// without ever matching.
  pub fn next_match(&self, input: &str, pos: usize) -> Option<LexMatch> {
    match self.mode {
      LexMode::Greedy => self.longest_match(input, pos).map(|(sym, len)| LexMatch { symbol: sym, skipped: 0, len }),
      LexMode::Lazy => self.skip_until_match(input, pos),
    }
  }

  /// Longest-match scan from `pos`: walk the DFA one char at a time,
  /// remembering the furthest position at which an accept state was seen.
  fn longest_match(&self, input: &str, pos: usize) -> Option<(SymbolId, usize)> {
    let mut state = self.dfa.start;
    let mut best: Option<(SymbolId, usize)> = None;
    let mut offset = 0usize;
    if let Some(sym) = self.dfa.states[state].accept {
      best = Some((sym, 0));
    }
    for c in input[pos..].chars() {
      let Some(next) = self.dfa.states[state].step(c as u32) else { break };
      state = next;
      offset += c.len_utf8();
      if let Some(sym) = self.dfa.states[state].accept {
        best = Some((sym, offset));
      }
    }
    best
  }

  /// Lazy scan: try a match at `pos`; if none, advance one character and
  /// retry, per spec.md §4.8's lazy-mode definition. The terminal with the
  /// lower index still wins ties inside a single `longest_match` call; this
  /// only controls how far the scan start is allowed to drift forward.
  fn skip_until_match(&self, input: &str, pos: usize) -> Option<LexMatch> {
    let mut cursor = pos;
    let mut skipped = 0usize;
    let mut chars = input[pos..].char_indices();
    loop {
      if let Some((sym, len)) = self.longest_match(input, cursor) {
        if len > 0 {
          return Some(LexMatch { symbol: sym, skipped, len });
        }
      }
      match chars.next() {
        Some((_, c)) => {
          let adv = c.len_utf8();
          cursor += adv;
          skipped += adv;
        }
        None => return None,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{Pattern, SymbolKind};

  fn single_terminal_grammar(pattern: Pattern) -> Grammar {
    let mut g = Grammar::new();
    let t = g.sym_create(Some("t"), SymbolKind::Terminal, Some(pattern)).unwrap();
    let goal = g.sym_create(Some("goal"), SymbolKind::NonTerminal, None).unwrap();
    let p = g.prod_create(goal).unwrap();
    g.prod_append(p, t).unwrap();
    g.set_goal(goal).unwrap();
    g.gram_prepare().unwrap();
    g
  }

  #[test]
  fn matches_digit_run_greedily_by_default_when_lazy() {
    let g = single_terminal_grammar(Pattern::Regex("[0-9]+".into()));
    let lexer = AutoLexer::build(&g).unwrap();
    let m = lexer.next_match("123abc", 0).unwrap();
    assert_eq!(m.len, 3);
  }

  #[test]
  fn lazy_mode_skips_unrecognized_prefix() {
    let g = single_terminal_grammar(Pattern::Literal("+".into()));
    let lexer = AutoLexer::build(&g).unwrap();
    assert_eq!(lexer.mode, LexMode::Lazy);
    let m = lexer.next_match("ab+", 0).unwrap();
    assert_eq!(m.skipped, 2);
    assert_eq!(m.len, 1);
  }

  #[test]
  fn char_class_matches_single_char() {
    let g = single_terminal_grammar(Pattern::CharClass("a-z".into()));
    let lexer = AutoLexer::build(&g).unwrap();
    let m = lexer.next_match("q", 0).unwrap();
    assert_eq!(m.len, 1);
  }
}
