use crate::types::{Assoc, Grammar, ProductionId, SymbolId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
  ShiftReduce,
  ReduceReduce,
}

#[derive(Debug, Clone)]
pub struct ConflictRecord {
  pub kind: ConflictKind,
  pub state: usize,
  pub symbol: SymbolId,
  pub resolution: String,
}

/// What to do when a shift and a reduce both apply to the same lookahead
/// symbol in the same state.
pub enum ShiftReduceResolution {
  Shift,
  Reduce,
  /// Both sides declared `nonassoc` at equal precedence: neither wins, an
  /// explicit parse error is installed instead.
  Error,
}

/// Outcome of resolving a shift/reduce conflict, plus whether the decision
/// was a "real" disambiguation (both sides carried a declared precedence)
/// or just the yacc-style default of keeping the shift. Only the latter is
/// worth a diagnostic: per spec.md §4.6, a conflict resolved by a declared
/// precedence/associativity is silent, and only "without precedences, keep
/// the shift and warn" produces a warning.
pub struct ShiftReduceOutcome {
  pub resolution: ShiftReduceResolution,
  pub by_default: bool,
}

/// Resolves a shift/reduce conflict on `sym` between a pending shift and a
/// reduction by `prod`, using precedence and associativity. Ties with no
/// precedence information default to shift, matching the classic yacc
/// convention UniCC itself follows.
pub fn resolve_shift_reduce(g: &Grammar, sym: SymbolId, prod: ProductionId) -> ShiftReduceOutcome {
  let sym_prec = g.symbol(sym).map(|s| s.precedence).unwrap_or(0);
  let sym_assoc = g.symbol(sym).map(|s| s.assoc).unwrap_or(Assoc::None);
  let prod_prec = g.production(prod).map(|p| p.precedence).unwrap_or(0);
  let prod_assoc = g.production(prod).map(|p| p.assoc).unwrap_or(Assoc::None);

  if sym_prec == 0 || prod_prec == 0 {
    return ShiftReduceOutcome { resolution: ShiftReduceResolution::Shift, by_default: true };
  }
  let resolution = if sym_prec > prod_prec {
    ShiftReduceResolution::Shift
  } else if sym_prec < prod_prec {
    ShiftReduceResolution::Reduce
  } else {
    match (sym_assoc, prod_assoc) {
      (Assoc::Left, _) | (_, Assoc::Left) => ShiftReduceResolution::Reduce,
      (Assoc::Right, _) | (_, Assoc::Right) => ShiftReduceResolution::Shift,
      _ => ShiftReduceResolution::Error,
    }
  };
  ShiftReduceOutcome { resolution, by_default: false }
}

/// Resolves a reduce/reduce conflict: the production defined earlier in
/// the grammar wins, unless `nonassoc` removes both (in which case the
/// caller installs an explicit error entry and the warning is suppressed
/// entirely for synthetic/whitespace left-hand sides).
pub fn resolve_reduce_reduce(a: ProductionId, b: ProductionId) -> ProductionId {
  if a.0 <= b.0 {
    a
  } else {
    b
  }
}

pub fn is_synthetic_lhs(g: &Grammar, prod: ProductionId) -> bool {
  g.production(prod)
    .ok()
    .and_then(|p| g.symbol(p.lhs).ok())
    .map(|s| s.flags.generated || s.flags.whitespace)
    .unwrap_or(false)
}
