//! spec.md §8 scenario 6: a grammar with a `%skip`-style whitespace
//! terminal and goal `@s : 'a' 'b'` accepts `" a   b "` once
//! `gram_transform_to_scannerless` has wrapped every terminal in a
//! trailing-whitespace-absorbing production.

use unicc::{par_create, BuildOptions};
use unicc_core::types::{Grammar, Pattern, SymbolKind};

fn build_grammar() -> Grammar {
  let mut g = Grammar::new();
  let a = g.sym_create(Some("a"), SymbolKind::Terminal, Some(Pattern::Literal("a".into()))).unwrap();
  let b = g.sym_create(Some("b"), SymbolKind::Terminal, Some(Pattern::Literal("b".into()))).unwrap();
  let ws = g.sym_create(Some("ws"), SymbolKind::Terminal, Some(Pattern::CharClass(" \t\n".into()))).unwrap();
  g.set_whitespace_symbol(ws).unwrap();
  let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();
  let p = g.prod_create(s).unwrap();
  g.prod_append(p, a).unwrap();
  g.prod_append(p, b).unwrap();
  g.production_mut(p).unwrap().emit = Some("s".into());
  g.set_goal(s).unwrap();
  g
}

#[test]
fn transform_wraps_every_non_whitespace_terminal_and_the_goal() {
  let mut g = build_grammar();
  let log = g.gram_transform_to_scannerless().unwrap();
  // `a`, `b` each get a wrapper, plus the goal itself is rewrapped.
  assert_eq!(log.wrapper_symbols_created, 2);
  assert_eq!(log.rewritten_productions.len(), 1);
  assert!(g.flags.scannerless);
}

#[test]
fn transform_is_idempotent_on_a_second_call() {
  let mut g = build_grammar();
  g.gram_transform_to_scannerless().unwrap();
  let second = g.gram_transform_to_scannerless().unwrap();
  assert_eq!(second.wrapper_symbols_created, 0);
  assert!(second.rewritten_productions.is_empty());
}

#[test]
fn accepts_padded_whitespace_after_scannerless_transform() {
  let g = build_grammar();
  let parser = par_create(g, BuildOptions::new().with_scannerless(true)).unwrap();
  let ast = parser.parse(" a   b ").unwrap();
  assert_eq!(ast.emit.as_deref(), Some("s"));
}

#[test]
fn rejects_input_missing_the_second_token() {
  let g = build_grammar();
  let parser = par_create(g, BuildOptions::new().with_scannerless(true)).unwrap();
  assert!(parser.parse(" a ").is_err());
}
