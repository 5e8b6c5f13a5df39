//! `unicc-core`: the grammar data model, grammar preparation, LALR(1) table
//! construction and the auto-lexer builder — components C1-C8 of the
//! pipeline described in spec.md. This crate never performs I/O; diagnostics
//! are returned as values (`Diagnostic`, `CoreError`) for a caller to
//! format and print, per spec.md §5.
//!
//! Front-end BNF parsing, target-language code emitters and CLI plumbing are
//! out of scope (spec.md §1): this crate only consumes an already-built
//! [`Grammar`](types::Grammar) and produces compiled tables for a runtime
//! driver, which lives in the sibling `unicc-runtime` crate.

pub mod error;
pub mod item;
pub mod lalr;
pub mod lexer;
pub mod types;

mod derive;
mod prepare;
mod scannerless;

pub use error::{CoreError, Diagnostic, DiagnosticKind, UniccResult};
pub use item::{Item, ItemSet};
pub use prepare::PreparationReport;
pub use scannerless::RewriteLog;
pub use types::*;

use lalr::{lr_build, EncodedTable, LrAutomaton, TableStats};
use lexer::AutoLexer;

/// The compiled artifact of spec.md's "deterministic parse automaton": the
/// packed action/goto tables (C7) and the bundled lexical DFA (C8), built
/// together from one prepared [`Grammar`]. `unicc-runtime`'s `Parser`
/// freezes a `Grammar`, builds one of these, and drives it.
#[derive(Debug, Clone)]
pub struct CompiledTables {
  pub table: EncodedTable,
  pub stats: TableStats,
  pub automaton: LrAutomaton,
  pub lexer: AutoLexer,
}

/// Runs the whole core pipeline (C3 through C8) over `g`: preparation, LALR
/// state construction with conflict resolution, table encoding, and
/// auto-lexer compilation. `g` must already have a goal symbol set and must
/// not yet be finalized twice redundantly (re-running is harmless: `gram_prepare`
/// is idempotent per spec.md §4.3).
pub fn compile(g: &mut Grammar, optimize: bool, resolve: bool) -> UniccResult<CompiledTables> {
  g.gram_prepare()?;
  let automaton = lalr::build_states_with(g, optimize, resolve)?;
  let (table, stats) = lr_build(&automaton);
  let lexer = AutoLexer::build(g)?;
  Ok(CompiledTables { table, stats, automaton, lexer })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::{Assoc, SymbolKind};

  /// spec.md §8 scenario 2: an empty production / nullable chain.
  /// `@s : a ; @a : 'x' a | ;`
  #[test]
  fn nullable_chain_first_and_nullable_flags() {
    let mut g = Grammar::new();
    let x = g.sym_create(Some("x"), SymbolKind::Terminal, Some(Pattern::Literal("x".into()))).unwrap();
    let a = g.sym_create(Some("a"), SymbolKind::NonTerminal, None).unwrap();
    let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();

    let rec = g.prod_create(a).unwrap();
    g.prod_append(rec, x).unwrap();
    g.prod_append(rec, a).unwrap();
    g.prod_create(a).unwrap(); // a -> epsilon

    let sp = g.prod_create(s).unwrap();
    g.prod_append(sp, a).unwrap();

    g.set_goal(s).unwrap();
    g.gram_prepare().unwrap();

    assert!(g.symbol(a).unwrap().flags.nullable);
    assert!(g.symbol(s).unwrap().flags.nullable);
    assert_eq!(g.symbol(a).unwrap().first, std::collections::BTreeSet::from([x]));
  }

  /// spec.md §8 scenario 4: left recursion marking on `@l : l 'a' | 'a'`.
  #[test]
  fn left_recursive_production_is_flagged() {
    let mut g = Grammar::new();
    let a = g.sym_create(Some("a"), SymbolKind::Terminal, Some(Pattern::Literal("a".into()))).unwrap();
    let l = g.sym_create(Some("l"), SymbolKind::NonTerminal, None).unwrap();

    let rec = g.prod_create(l).unwrap();
    g.prod_append(rec, l).unwrap();
    g.prod_append(rec, a).unwrap();
    let base = g.prod_create(l).unwrap();
    g.prod_append(base, a).unwrap();

    g.set_goal(l).unwrap();
    g.gram_prepare().unwrap();

    assert!(g.production(rec).unwrap().leftrec);
    assert!(g.symbol(l).unwrap().flags.leftrec);
    assert!(!g.production(base).unwrap().leftrec);
  }

  /// spec.md §8: `sym_mod_positive` called twice returns the same symbol
  /// and the total production count only grows by two, not four.
  #[test]
  fn positive_closure_is_idempotent() {
    let mut g = Grammar::new();
    let x = g.sym_create(Some("x"), SymbolKind::Terminal, Some(Pattern::Literal("x".into()))).unwrap();
    let before = g.productions.len();
    let first = g.sym_mod_positive(x).unwrap();
    let second = g.sym_mod_positive(x).unwrap();
    assert_eq!(first, second);
    assert_eq!(g.productions.len() - before, 2);
  }

  /// spec.md §8 scenario 1 (precedence half): arithmetic grammar builds a
  /// table with no unresolved conflicts once precedence/associativity is
  /// declared on `+` and `*`.
  #[test]
  fn precedence_resolves_expr_conflicts() {
    let mut g = Grammar::new();
    let plus = g.sym_create(Some("+"), SymbolKind::Terminal, Some(Pattern::Literal("+".into()))).unwrap();
    let star = g.sym_create(Some("*"), SymbolKind::Terminal, Some(Pattern::Literal("*".into()))).unwrap();
    let lparen = g.sym_create(Some("("), SymbolKind::Terminal, Some(Pattern::Literal("(".into()))).unwrap();
    let rparen = g.sym_create(Some(")"), SymbolKind::Terminal, Some(Pattern::Literal(")".into()))).unwrap();
    let int = g.sym_create(Some("int"), SymbolKind::Terminal, Some(Pattern::Regex("[0-9]+".into()))).unwrap();
    let expr = g.sym_create(Some("expr"), SymbolKind::NonTerminal, None).unwrap();

    g.symbol_mut(plus).unwrap().precedence = 1;
    g.symbol_mut(plus).unwrap().assoc = Assoc::Left;
    g.symbol_mut(star).unwrap().precedence = 2;
    g.symbol_mut(star).unwrap().assoc = Assoc::Left;

    let add = g.prod_create(expr).unwrap();
    g.prod_append(add, expr).unwrap();
    g.prod_append(add, plus).unwrap();
    g.prod_append(add, expr).unwrap();
    g.production_mut(add).unwrap().precedence = 1;
    g.production_mut(add).unwrap().assoc = Assoc::Left;

    let mul = g.prod_create(expr).unwrap();
    g.prod_append(mul, expr).unwrap();
    g.prod_append(mul, star).unwrap();
    g.prod_append(mul, expr).unwrap();
    g.production_mut(mul).unwrap().precedence = 2;
    g.production_mut(mul).unwrap().assoc = Assoc::Left;

    let paren = g.prod_create(expr).unwrap();
    g.prod_append(paren, lparen).unwrap();
    g.prod_append(paren, expr).unwrap();
    g.prod_append(paren, rparen).unwrap();

    let leaf = g.prod_create(expr).unwrap();
    g.prod_append(leaf, int).unwrap();

    g.set_goal(expr).unwrap();
    let automaton = compile(&mut g, true, true).unwrap().automaton;

    for state in &automaton.states {
      for action in state.actions.values() {
        assert!(!matches!(action, lalr::Action::Error), "unresolved conflict left an explicit error entry");
      }
    }
  }

  /// spec.md §4.3 step 6: a production with no explicit precedence inherits
  /// the max precedence declared on its own rhs symbols, never the
  /// precedence of a sibling production sharing its lhs. `mul`'s production
  /// must end up with `*`'s precedence (2), not `+`'s (1), even though
  /// `expr '+' expr` is prepared first and shares the `expr` rhs symbol.
  #[test]
  fn production_precedence_inherits_from_rhs_symbols_only() {
    let mut g = Grammar::new();
    let plus = g.sym_create(Some("+"), SymbolKind::Terminal, Some(Pattern::Literal("+".into()))).unwrap();
    let star = g.sym_create(Some("*"), SymbolKind::Terminal, Some(Pattern::Literal("*".into()))).unwrap();
    let int = g.sym_create(Some("int"), SymbolKind::Terminal, Some(Pattern::Regex("[0-9]+".into()))).unwrap();
    let expr = g.sym_create(Some("expr"), SymbolKind::NonTerminal, None).unwrap();

    g.symbol_mut(plus).unwrap().precedence = 1;
    g.symbol_mut(star).unwrap().precedence = 2;

    let add = g.prod_create(expr).unwrap();
    g.prod_append(add, expr).unwrap();
    g.prod_append(add, plus).unwrap();
    g.prod_append(add, expr).unwrap();

    let mul = g.prod_create(expr).unwrap();
    g.prod_append(mul, expr).unwrap();
    g.prod_append(mul, star).unwrap();
    g.prod_append(mul, expr).unwrap();

    let leaf = g.prod_create(expr).unwrap();
    g.prod_append(leaf, int).unwrap();

    g.set_goal(expr).unwrap();
    g.gram_prepare().unwrap();

    assert_eq!(g.production(add).unwrap().precedence, 1);
    assert_eq!(g.production(mul).unwrap().precedence, 2);
  }
}
