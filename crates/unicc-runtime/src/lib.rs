//! `unicc-runtime`: the push-mode LR driver (C9) and the AST it builds
//! (C10) — the pieces spec.md §1 describes as "the push-style runtime that
//! consumes those tables". This crate depends on `unicc-core` only for the
//! frozen [`Grammar`](unicc_core::types::Grammar) and the
//! [`EncodedTable`](unicc_core::lalr::EncodedTable)/auto-lexer it compiles;
//! it never mutates a grammar and performs no I/O of its own, matching
//! spec.md §5's single-threaded, no-I/O core.

pub mod ast;
pub mod driver;
pub mod error;
pub mod token;

pub use ast::{AstNode, AstValue, VisitEvent};
pub use driver::{ParserCtx, StepResult};
pub use error::RuntimeError;
pub use token::Token;

#[cfg(test)]
mod tests {
  use super::*;
  use unicc_core::lalr::lr_build;
  use unicc_core::types::{Pattern, Span, SymbolKind};
  use unicc_core::Grammar;

  /// spec.md §8 scenario 2 driven end to end through the push driver:
  /// `@s : a ; @a : 'x' a | ;` over input `"xxx"` and `""`.
  fn build_nullable_chain() -> (Grammar, unicc_core::lalr::EncodedTable) {
    let mut g = Grammar::new();
    let x = g.sym_create(Some("x"), SymbolKind::Terminal, Some(Pattern::Literal("x".into()))).unwrap();
    let a = g.sym_create(Some("a"), SymbolKind::NonTerminal, None).unwrap();
    let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();
    g.symbol_mut(a).unwrap().emit = Some("a".into());
    g.symbol_mut(s).unwrap().emit = Some("s".into());

    let rec = g.prod_create(a).unwrap();
    g.prod_append(rec, x).unwrap();
    g.prod_append(rec, a).unwrap();
    g.prod_create(a).unwrap();

    let sp = g.prod_create(s).unwrap();
    g.prod_append(sp, a).unwrap();

    g.set_goal(s).unwrap();
    g.gram_prepare().unwrap();
    let automaton = unicc_core::lalr::build_states(&g).unwrap();
    let (table, _) = lr_build(&automaton);
    (g, table)
  }

  #[test]
  fn parses_empty_input_via_epsilon_reduction() {
    let (g, table) = build_nullable_chain();
    let eof = g.eof;
    let mut ctx = ParserCtx::new(&g, &table);
    loop {
      let tok = Token::new(eof, "", Span::new(0, 0));
      match ctx.next(tok) {
        StepResult::Done => break,
        StepResult::Next => continue,
        StepResult::Error => panic!("unexpected parse error: {:?}", ctx.error),
      }
    }
    assert!(ctx.ast.is_some());
  }

  #[test]
  fn parses_repeated_x_and_builds_left_nested_ast() {
    let (g, table) = build_nullable_chain();
    let x = g.sym_by_name("x").unwrap();
    let eof = g.eof;
    let mut ctx = ParserCtx::new(&g, &table);

    let mut tokens = vec![
      Token::new(x, "x", Span::new(0, 1)),
      Token::new(x, "x", Span::new(1, 2)),
      Token::new(x, "x", Span::new(2, 3)),
      Token::new(eof, "", Span::new(3, 3)),
    ]
    .into_iter();
    let mut current = tokens.next().unwrap();
    loop {
      match ctx.next(current) {
        StepResult::Done => break,
        StepResult::Next => {
          if ctx.consumed_last() {
            current = tokens.next().unwrap_or(current);
          }
        }
        StepResult::Error => panic!("unexpected parse error: {:?}", ctx.error),
      }
    }
    let ast = ctx.ast.unwrap();
    assert_eq!(ast.span, Span::new(0, 3));
  }
}
