//! LR(0) item core plus the LALR(1) lookahead attached to it.

use std::collections::BTreeSet;

use crate::types::{Grammar, ProductionId, SymbolId};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Item {
  pub production: ProductionId,
  pub dot: usize,
  pub lookahead: BTreeSet<SymbolId>,
}

impl Item {
  pub fn new(production: ProductionId) -> Self {
    Self { production, dot: 0, lookahead: BTreeSet::new() }
  }

  /// Two items share a kernel when their production and dot position
  /// match, irrespective of lookahead. LALR(1) state merging keys on this.
  pub fn kernel_eq(&self, other: &Item) -> bool {
    self.production == other.production && self.dot == other.dot
  }

  pub fn dot_symbol(&self, g: &Grammar) -> Option<SymbolId> {
    g.production(self.production).ok().and_then(|p| p.rhs.get(self.dot).copied())
  }

  pub fn is_complete(&self, g: &Grammar) -> bool {
    g.production(self.production).map(|p| self.dot >= p.rhs.len()).unwrap_or(true)
  }

  pub fn advanced(&self) -> Item {
    Item { production: self.production, dot: self.dot + 1, lookahead: self.lookahead.clone() }
  }

  /// The symbols following the dot, i.e. `beta` in `A -> alpha . X beta`.
  pub fn beta(&self, g: &Grammar) -> Vec<SymbolId> {
    g.production(self.production).map(|p| p.rhs[self.dot.min(p.rhs.len())..].to_vec()).unwrap_or_default()
  }
}

/// An unordered set of items keyed by kernel, used while building closures
/// and states. Lookaheads of kernel-equal items are unioned on insert.
#[derive(Debug, Clone, Default)]
pub struct ItemSet {
  pub items: Vec<Item>,
}

impl ItemSet {
  pub fn new() -> Self {
    Self { items: Vec::new() }
  }

  /// Inserts `item`, merging its lookahead into an existing kernel-equal
  /// item if present. Returns true if the set's lookahead content grew.
  pub fn insert(&mut self, item: Item) -> bool {
    if let Some(existing) = self.items.iter_mut().find(|i| i.kernel_eq(&item)) {
      let before = existing.lookahead.len();
      existing.lookahead.extend(item.lookahead);
      existing.lookahead.len() != before
    } else {
      self.items.push(item);
      true
    }
  }

  /// The kernel (production, dot) pairs, sorted, used as the identity for
  /// state deduplication.
  pub fn kernel_signature(&self) -> Vec<(ProductionId, usize)> {
    let mut sig: Vec<(ProductionId, usize)> = self.items.iter().map(|i| (i.production, i.dot)).collect();
    sig.sort();
    sig.dedup();
    sig
  }
}
