use std::collections::BTreeSet;

use crate::item::{Item, ItemSet};
use crate::types::{Grammar, SymbolId};

/// FIRST of a symbol sequence, unioned with `trailing` if the whole
/// sequence is nullable. This is the lookahead computation from the LALR(1)
/// closure step: `FIRST(beta) ∪ (outer lookahead if beta =>* epsilon)`.
pub fn first_of_sequence(g: &Grammar, seq: &[SymbolId], trailing: &BTreeSet<SymbolId>) -> BTreeSet<SymbolId> {
  let mut out = BTreeSet::new();
  let mut all_nullable = true;
  for sym_id in seq {
    let sym = match g.symbol(*sym_id) {
      Ok(s) => s,
      Err(_) => continue,
    };
    out.extend(sym.first.iter().copied());
    if !sym.flags.nullable {
      all_nullable = false;
      break;
    }
  }
  if all_nullable {
    out.extend(trailing.iter().copied());
  }
  out
}

/// Closes an item set under production expansion: for every item with the
/// dot before a nonterminal, add that nonterminal's productions at dot 0,
/// with lookahead `FIRST(beta ++ outer lookahead)`.
pub fn closure(g: &Grammar, seed: ItemSet) -> ItemSet {
  let mut set = seed;
  loop {
    let mut to_add: Vec<Item> = Vec::new();
    for item in &set.items {
      let Some(dot_sym) = item.dot_symbol(g) else { continue };
      let Ok(sym) = g.symbol(dot_sym) else { continue };
      if !sym.is_nonterminal() {
        continue;
      }
      let beta = item.beta(g);
      let beta_tail = if beta.is_empty() { &[][..] } else { &beta[1..] };
      let lookahead = first_of_sequence(g, beta_tail, &item.lookahead);
      for prod_id in &sym.productions {
        to_add.push(Item { production: *prod_id, dot: 0, lookahead: lookahead.clone() });
      }
    }
    let mut changed = false;
    for item in to_add {
      changed |= set.insert(item);
    }
    if !changed {
      break;
    }
  }
  set
}
