//! `unicc`: the facade crate that ties `unicc-core`'s grammar/table
//! compilation to `unicc-runtime`'s push driver into the one-call surface
//! spec.md §1 describes — build a [`Parser`] from a prepared
//! [`Grammar`](unicc_core::types::Grammar), then feed it source text.
//!
//! Front-end BNF parsing and target-language code generation stay out of
//! scope here too (spec.md §1's Non-goals); this crate only owns the
//! tokenization loop that glues `unicc-core`'s `AutoLexer` to
//! `unicc-runtime`'s `ParserCtx`.

pub mod config;

pub use config::BuildOptions;
pub use unicc_core as core;
pub use unicc_core::{CoreError, Diagnostic, DiagnosticKind, UniccResult};
pub use unicc_rust_runtime as runtime;
pub use unicc_rust_runtime::{AstNode, AstValue, RuntimeError};

use std::fmt::Write as _;

use unicc_core::types::{Grammar, Span, SymbolId};
use unicc_core::CompiledTables;
use unicc_rust_runtime::{ParserCtx, StepResult, Token};

/// A compiled parser: a frozen grammar plus its [`CompiledTables`]. Built
/// once via [`par_create`]/[`Parser::build`], then driven as many times as
/// needed via [`par_parse`]/[`Parser::parse`] (spec.md §5: a `Parser` is
/// immutable and reusable across parses, only a fresh [`ParserCtx`] is
/// needed per run).
pub struct Parser {
  grammar: Grammar,
  tables: CompiledTables,
}

/// Builds a [`Parser`] from `grammar`, running the full C3-C8 pipeline
/// (`gram_prepare`, optional scannerless rewrite, LALR table construction,
/// auto-lexer compilation) and freezing the grammar against further
/// mutation, per spec.md §4.1's `par_create`.
pub fn par_create(grammar: Grammar, opts: BuildOptions) -> UniccResult<Parser> {
  Parser::build(grammar, opts)
}

fn grammar_with_options(grammar: &mut Grammar, opts: BuildOptions) -> UniccResult<()> {
  grammar.flags.preventlrec = opts.preventlrec;
  grammar.flags.debug = opts.debug;
  if opts.scannerless {
    grammar.gram_transform_to_scannerless()?;
  }
  Ok(())
}

/// Parses `input` against `parser`, returning the built [`AstNode`] or the
/// [`RuntimeError`] the driver stopped on, per spec.md §4.1's `par_parse`.
pub fn par_parse(parser: &Parser, input: &str) -> Result<AstNode, RuntimeError> {
  parser.parse(input)
}

impl Parser {
  /// Takes ownership of `grammar`, compiles it per `opts`, and freezes it.
  pub fn build(mut grammar: Grammar, opts: BuildOptions) -> UniccResult<Parser> {
    grammar_with_options(&mut grammar, opts)?;
    let tables = unicc_core::compile(&mut grammar, opts.optimize, opts.resolve)?;
    grammar.freeze();
    Ok(Parser { grammar, tables })
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  pub fn tables(&self) -> &CompiledTables {
    &self.tables
  }

  /// Diagnostics accumulated on the grammar (undefined symbols, unused
  /// nonterminals, redefinitions, ...) plus every shift/reduce and
  /// reduce/reduce conflict recorded while building the LALR automaton,
  /// rendered as display strings for an embedder to print or log.
  pub fn diagnostics(&self) -> Vec<String> {
    let mut out: Vec<String> = self.grammar.diagnostics().iter().map(|d| d.to_string()).collect();
    for c in &self.tables.automaton.conflicts {
      let sym = self.grammar.symbol(c.symbol).map(|s| s.name.clone()).unwrap_or_default();
      out.push(format!("{:?} on `{}` in state {}: {}", c.kind, sym, c.state, c.resolution));
    }
    out
  }

  /// Drives the push parser to completion over `input`: tokenizes via the
  /// compiled [`unicc_core::lexer::AutoLexer`], silently dropping
  /// whitespace-flagged tokens, and resupplies the same token to
  /// [`ParserCtx::next`] whenever [`ParserCtx::consumed_last`] says the
  /// previous call performed a bare reduce (spec.md §4.9's push-driver
  /// contract).
  pub fn parse(&self, input: &str) -> Result<AstNode, RuntimeError> {
    let mut ctx = ParserCtx::new(&self.grammar, &self.tables.table);
    let mut pos = 0usize;
    let mut current = self.next_token(input, &mut pos)?;
    loop {
      match ctx.next(current) {
        StepResult::Done => return Ok(ctx.ast.take().expect("Done implies an ast was produced")),
        StepResult::Error => return Err(ctx.error.take().expect("Error implies an error was recorded")),
        StepResult::Next => {
          if ctx.consumed_last() {
            current = self.next_token(input, &mut pos)?;
          }
        }
      }
    }
  }

  /// Scans the next non-whitespace token starting at `*pos`, advancing
  /// `*pos` past it (and past any whitespace skipped ahead of it). Returns
  /// the eof token, repeatably, once `*pos` reaches the end of `input`.
  fn next_token<'a>(&self, input: &'a str, pos: &mut usize) -> Result<Token<'a>, RuntimeError> {
    loop {
      if *pos >= input.len() {
        let at = *pos as u32;
        return Ok(Token::new(self.grammar.eof, "", Span::new(at, at)));
      }
      match self.tables.lexer.next_match(input, *pos) {
        Some(m) => {
          let start = *pos + m.skipped;
          let end = start + m.len;
          let sym = m.symbol;
          *pos = end;
          let is_whitespace = self.grammar.symbol(sym).map(|s| s.flags.whitespace).unwrap_or(false);
          if is_whitespace {
            continue;
          }
          return Ok(Token::new(sym, &input[start..end], Span::new(start as u32, end as u32)));
        }
        None => {
          return Err(RuntimeError {
            found: SymbolId::UNDEFINED,
            span: Span::new(*pos as u32, input.len() as u32),
            expected: Vec::new(),
          })
        }
      }
    }
  }

  /// A JSON dump of the compiled parser: the grammar (as
  /// [`Grammar::to_json`]), the packed action/goto table (one array of
  /// `{symbol, action, target}` entries per state), and the lexer's DFA
  /// transition table — the `{"grammar":…, "states":[...], "lexers":[...]}`
  /// shape spec.md §6 describes for tooling that inspects a built parser
  /// without relinking against this crate.
  pub fn to_json(&self) -> String {
    let mut out = String::from("{\n  \"grammar\": ");
    out.push_str(self.grammar.to_json().trim_end());
    out.push_str(",\n  \"states\": [\n");
    for (i, row) in self.tables.table.rows.iter().enumerate() {
      let _ = write!(out, "    {{\"state\":{},\"reduce-default\":", i);
      match row.default_reduction() {
        Some(p) => {
          let _ = write!(out, "{}", p.0);
        }
        None => out.push_str("null"),
      }
      out.push_str(",\"transitions\":[");
      for (j, (sym, flags, target)) in row.entries().enumerate() {
        if j > 0 {
          out.push(',');
        }
        let action = match (flags & unicc_core::lalr::LR_SHIFT != 0, flags & unicc_core::lalr::LR_REDUCE != 0) {
          (true, true) => "shift-reduce",
          (true, false) => "shift",
          (false, true) => "reduce",
          (false, false) => "goto-or-error",
        };
        let _ = write!(out, "{{\"symbol\":{},\"action\":\"{}\",\"target\":{}}}", sym - 1, action, target);
      }
      out.push_str("]}");
      if i + 1 != self.tables.table.rows.len() {
        out.push(',');
      }
      out.push('\n');
    }
    out.push_str("  ],\n  \"lexers\": [\n    [\n");
    for (i, state) in self.tables.lexer.dfa.states.iter().enumerate() {
      let accept = match state.accept {
        Some(s) => s.0.to_string(),
        None => "null".to_string(),
      };
      let _ = write!(out, "      {{\"state\":{i},\"accept\":{accept},\"transitions\":[");
      for (j, (set, target)) in state.transitions.iter().enumerate() {
        if j > 0 {
          out.push(',');
        }
        for (k, (lo, hi)) in set.ranges.iter().enumerate() {
          if k > 0 {
            out.push(',');
          }
          let _ = write!(out, "{{\"character-from\":{lo},\"character-until\":{hi},\"goto-state\":{target}}}");
        }
      }
      out.push_str("]}");
      if i + 1 != self.tables.lexer.dfa.states.len() {
        out.push(',');
      }
      out.push('\n');
    }
    out.push_str("    ]\n  ]\n}\n");
    out
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use unicc_core::types::{Pattern, SymbolKind};

  /// spec.md §8 scenario 1, driven end to end: `"1+2*3"` parses without
  /// error and the addition node's right operand is the multiplication,
  /// confirming `*` binds tighter than `+`.
  fn arithmetic_grammar() -> Grammar {
    let mut g = Grammar::new();
    let plus = g.sym_create(Some("+"), SymbolKind::Terminal, Some(Pattern::Literal("+".into()))).unwrap();
    let star = g.sym_create(Some("*"), SymbolKind::Terminal, Some(Pattern::Literal("*".into()))).unwrap();
    let int = g.sym_create(Some("int"), SymbolKind::Terminal, Some(Pattern::Regex("[0-9]+".into()))).unwrap();
    let expr = g.sym_create(Some("expr"), SymbolKind::NonTerminal, None).unwrap();

    g.symbol_mut(plus).unwrap().precedence = 1;
    g.symbol_mut(plus).unwrap().assoc = unicc_core::types::Assoc::Left;
    g.symbol_mut(star).unwrap().precedence = 2;
    g.symbol_mut(star).unwrap().assoc = unicc_core::types::Assoc::Left;
    g.symbol_mut(int).unwrap().emit = Some("int".into());
    g.symbol_mut(expr).unwrap().emit = Some("expr".into());

    let add = g.prod_create(expr).unwrap();
    g.prod_append(add, expr).unwrap();
    g.prod_append(add, plus).unwrap();
    g.prod_append(add, expr).unwrap();
    g.production_mut(add).unwrap().precedence = 1;
    g.production_mut(add).unwrap().assoc = unicc_core::types::Assoc::Left;
    g.production_mut(add).unwrap().emit = Some("add".into());

    let mul = g.prod_create(expr).unwrap();
    g.prod_append(mul, expr).unwrap();
    g.prod_append(mul, star).unwrap();
    g.prod_append(mul, expr).unwrap();
    g.production_mut(mul).unwrap().precedence = 2;
    g.production_mut(mul).unwrap().assoc = unicc_core::types::Assoc::Left;
    g.production_mut(mul).unwrap().emit = Some("mul".into());

    let leaf = g.prod_create(expr).unwrap();
    g.prod_append(leaf, int).unwrap();

    g.set_goal(expr).unwrap();
    g
  }

  #[test]
  fn parses_arithmetic_with_correct_precedence() {
    let g = arithmetic_grammar();
    let parser = Parser::build(g, BuildOptions::default()).unwrap();
    let ast = parser.parse("1+2*3").unwrap();
    assert_eq!(ast.emit.as_deref(), Some("add"));
    let rhs = &ast.children[1];
    assert_eq!(rhs.emit.as_deref(), Some("mul"));
  }

  #[test]
  fn reports_runtime_error_on_unexpected_token() {
    let g = arithmetic_grammar();
    let parser = Parser::build(g, BuildOptions::default()).unwrap();
    let err = parser.parse("1+*2").unwrap_err();
    assert!(!err.expected.is_empty());
  }

  #[test]
  fn to_json_embeds_grammar_states_and_lexer_sections() {
    let g = arithmetic_grammar();
    let parser = Parser::build(g, BuildOptions::default()).unwrap();
    let json = parser.to_json();
    assert!(json.contains("\"grammar\""));
    assert!(json.contains("\"states\""));
    assert!(json.contains("\"lexers\""));
  }
}
