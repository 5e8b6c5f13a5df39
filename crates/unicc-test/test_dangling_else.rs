//! spec.md §8 scenario 3: the classic dangling-else shift/reduce conflict.
//! `stmt : 'if' cond 'then' stmt | 'if' cond 'then' stmt 'else' stmt | atom`
//! without precedence records exactly one shift/reduce warning and resolves
//! it by keeping the shift (so `else` attaches to the nearest `if`);
//! declaring `else` with higher precedence than both productions removes
//! the warning entirely while keeping the same attachment.

use unicc::{par_create, par_parse, BuildOptions};
use unicc_core::lalr::{build_states_with, ConflictKind};
use unicc_core::types::{Assoc, Grammar, Pattern, SymbolId, SymbolKind};

fn build_grammar() -> (Grammar, SymbolId) {
  let mut g = Grammar::new();
  let if_kw = g.sym_create(Some("if"), SymbolKind::Terminal, Some(Pattern::Literal("if".into()))).unwrap();
  let cond = g.sym_create(Some("cond"), SymbolKind::Terminal, Some(Pattern::CharClass("ab".into()))).unwrap();
  let then_kw = g.sym_create(Some("then"), SymbolKind::Terminal, Some(Pattern::Literal("then".into()))).unwrap();
  let else_kw = g.sym_create(Some("else"), SymbolKind::Terminal, Some(Pattern::Literal("else".into()))).unwrap();
  let atom = g.sym_create(Some("atom"), SymbolKind::Terminal, Some(Pattern::CharClass("cd".into()))).unwrap();
  let stmt = g.sym_create(Some("stmt"), SymbolKind::NonTerminal, None).unwrap();

  let with_else = g.prod_create(stmt).unwrap();
  g.prod_append(with_else, if_kw).unwrap();
  g.prod_append(with_else, cond).unwrap();
  g.prod_append(with_else, then_kw).unwrap();
  g.prod_append(with_else, stmt).unwrap();
  g.prod_append(with_else, else_kw).unwrap();
  g.prod_append(with_else, stmt).unwrap();
  g.production_mut(with_else).unwrap().emit = Some("ite".into());

  let without_else = g.prod_create(stmt).unwrap();
  g.prod_append(without_else, if_kw).unwrap();
  g.prod_append(without_else, cond).unwrap();
  g.prod_append(without_else, then_kw).unwrap();
  g.prod_append(without_else, stmt).unwrap();
  g.production_mut(without_else).unwrap().emit = Some("it".into());

  let leaf = g.prod_create(stmt).unwrap();
  g.prod_append(leaf, atom).unwrap();
  g.production_mut(leaf).unwrap().emit = Some("atom".into());

  g.set_goal(stmt).unwrap();
  (g, else_kw)
}

#[test]
fn without_precedence_records_exactly_one_shift_reduce_conflict() {
  let (mut g, _) = build_grammar();
  g.gram_prepare().unwrap();
  let automaton = build_states_with(&g, true, true).unwrap();
  let sr_conflicts = automaton.conflicts.iter().filter(|c| c.kind == ConflictKind::ShiftReduce).count();
  assert_eq!(sr_conflicts, 1);
}

#[test]
fn else_precedence_removes_the_warning() {
  let (mut g, else_kw) = build_grammar();
  g.symbol_mut(else_kw).unwrap().precedence = 2;
  g.symbol_mut(else_kw).unwrap().assoc = Assoc::Right;
  // Both productions that end in a pending reduce on `else` need a
  // declared precedence too, or resolve_shift_reduce falls back to the
  // warn-and-shift default (spec.md §4.6: "if both ... carry nonzero
  // precedence").
  for pid in g.symbol(g.sym_by_name("stmt").unwrap()).unwrap().productions.clone() {
    g.production_mut(pid).unwrap().precedence = 1;
  }
  g.gram_prepare().unwrap();
  let automaton = build_states_with(&g, true, true).unwrap();
  let sr_conflicts = automaton.conflicts.iter().filter(|c| c.kind == ConflictKind::ShiftReduce).count();
  assert_eq!(sr_conflicts, 0);
}

#[test]
fn else_attaches_to_the_nearest_if() {
  let (g, _) = build_grammar();
  let parser = par_create(g, BuildOptions::default()).unwrap();
  let ast = par_parse(&parser, "if a then if b then c else d").unwrap();

  assert_eq!(ast.emit.as_deref(), Some("it"));
  assert_eq!(ast.children.len(), 1);
  let inner = &ast.children[0];
  assert_eq!(inner.emit.as_deref(), Some("ite"));
  assert_eq!(inner.children.len(), 2);
  assert_eq!(inner.children[0].emit.as_deref(), Some("atom"));
  assert_eq!(inner.children[1].emit.as_deref(), Some("atom"));
}
