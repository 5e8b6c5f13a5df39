use super::{Assoc, Grammar, ProductionId, SymbolId};

#[derive(Debug, Clone)]
pub struct Production {
  pub id: ProductionId,
  pub lhs: SymbolId,
  pub rhs: Vec<SymbolId>,
  pub precedence: i32,
  pub assoc: Assoc,
  pub emit: Option<String>,
  pub leftrec: bool,
  pub nullable: bool,
  /// True once this production's emit tag was assigned by the grammar
  /// (inherited from its last non-nullable rhs symbol) rather than given
  /// explicitly in source. Mirrors the owned/borrowed emit distinction
  /// UniCC tracks as `freeemit`.
  pub freeemit: bool,
  /// Set by `sym_drop`'s cascade once this production's lhs symbol is
  /// dropped: the slot stays in the dense `productions` Vec (so no other
  /// `ProductionId` needs to shift) but is excluded from every pass that
  /// walks `Grammar::productions` directly.
  pub dropped: bool,
}

impl Production {
  pub fn new(id: ProductionId, lhs: SymbolId) -> Self {
    Self { id, lhs, rhs: Vec::new(), precedence: 0, assoc: Assoc::None, emit: None, leftrec: false, nullable: false, freeemit: true, dropped: false }
  }

  pub fn len(&self) -> usize {
    self.rhs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rhs.is_empty()
  }

  /// `prod_to_str`: renders this production's rhs as source-like BNF text
  /// (`'+' expr` rather than raw symbol indices), resolving each rhs symbol's
  /// name against `g`. An empty rhs renders as the empty string, matching
  /// `Grammar::gram_to_bnf`'s epsilon-production rendering.
  pub fn to_bnf_string(&self, g: &Grammar) -> String {
    self.rhs.iter().filter_map(|s| g.symbol(*s).ok()).map(|s| s.to_string()).collect::<Vec<_>>().join(" ")
  }
}
