use std::collections::{BTreeMap, VecDeque};

use crate::error::{CoreError, UniccResult};
use crate::item::{Item, ItemSet};
use crate::types::{Grammar, ProductionId, SymbolId};

use super::closure::closure;
use super::conflict::{is_synthetic_lhs, resolve_reduce_reduce, resolve_shift_reduce, ConflictKind, ConflictRecord, ShiftReduceResolution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  Reduce(ProductionId),
  /// The target state's closure reduced to a single, already-complete
  /// item: rather than allocate a one-item state just to reduce out of
  /// it, the shift and the reduce are folded into one table entry.
  ShiftReduce(ProductionId),
  Error,
}

#[derive(Debug, Clone)]
pub struct LrState {
  pub id: usize,
  pub kernel: ItemSet,
  pub actions: BTreeMap<SymbolId, Action>,
  pub gotos: BTreeMap<SymbolId, usize>,
}

impl LrState {
  fn new(id: usize, kernel: ItemSet) -> Self {
    Self { id, kernel, actions: BTreeMap::new(), gotos: BTreeMap::new() }
  }
}

pub struct LrAutomaton {
  pub states: Vec<LrState>,
  pub conflicts: Vec<ConflictRecord>,
}

/// Builds the full LALR(1) state machine for `g`, which must already have
/// gone through `gram_prepare` (FIRST sets and nullability populated).
/// `optimize` enables the shift-reduce folding of single-item complete
/// closures; `resolve` enables precedence/associativity-based conflict
/// resolution (when disabled, the first-installed action always wins and
/// every conflict is merely recorded).
pub fn build_states(g: &Grammar) -> UniccResult<LrAutomaton> {
  build_states_with(g, true, true)
}

pub fn build_states_with(g: &Grammar, optimize: bool, resolve: bool) -> UniccResult<LrAutomaton> {
  let goal = g.goal.ok_or(CoreError::NoGoalSymbol)?;
  let goal_sym = g.symbol(goal)?;

  let mut seed = ItemSet::new();
  for prod_id in &goal_sym.productions {
    seed.insert(Item { production: *prod_id, dot: 0, lookahead: std::iter::once(g.eof).collect() });
  }

  let mut states: Vec<LrState> = vec![LrState::new(0, seed)];
  let mut signature_index: BTreeMap<Vec<(ProductionId, usize)>, usize> = BTreeMap::new();
  signature_index.insert(states[0].kernel.kernel_signature(), 0);

  let mut worklist: VecDeque<usize> = VecDeque::from([0]);
  let mut conflicts = Vec::new();

  while let Some(state_idx) = worklist.pop_front() {
    let kernel = states[state_idx].kernel.clone();
    let closed = closure(g, kernel);

    // Partition items by the symbol following the dot.
    let mut by_symbol: BTreeMap<SymbolId, ItemSet> = BTreeMap::new();
    for item in &closed.items {
      if let Some(sym) = item.dot_symbol(g) {
        by_symbol.entry(sym).or_default().insert(item.advanced());
      }
    }

    for (sym, new_kernel) in by_symbol {
      let target_closure = closure(g, new_kernel.clone());
      if optimize && target_closure.items.len() == 1 && target_closure.items[0].is_complete(g) {
        let prod = target_closure.items[0].production;
        install_action(&mut states[state_idx], sym, Action::ShiftReduce(prod), g, &mut conflicts, state_idx, resolve);
        continue;
      }

      let sig = new_kernel.kernel_signature();
      let target_idx = match signature_index.get(&sig) {
        Some(&idx) => {
          let grew = merge_lookaheads(&mut states[idx].kernel, &new_kernel);
          if grew {
            worklist.push_back(idx);
          }
          idx
        }
        None => {
          let idx = states.len();
          states.push(LrState::new(idx, new_kernel));
          signature_index.insert(sig, idx);
          worklist.push_back(idx);
          idx
        }
      };

      if g.symbol(sym)?.is_terminal() {
        install_action(&mut states[state_idx], sym, Action::Shift(target_idx), g, &mut conflicts, state_idx, resolve);
      } else {
        states[state_idx].gotos.insert(sym, target_idx);
      }
    }

    // Reductions: every completed item contributes a Reduce action for
    // each symbol in its lookahead set.
    for item in closed.items.iter().filter(|i| i.is_complete(g)) {
      for &la in &item.lookahead {
        install_action(&mut states[state_idx], la, Action::Reduce(item.production), g, &mut conflicts, state_idx, resolve);
      }
    }
  }

  Ok(LrAutomaton { states, conflicts })
}

fn merge_lookaheads(kernel: &mut ItemSet, other: &ItemSet) -> bool {
  let mut grew = false;
  for item in &other.items {
    grew |= kernel.insert(item.clone());
  }
  grew
}

fn install_action(
  state: &mut LrState,
  sym: SymbolId,
  action: Action,
  g: &Grammar,
  conflicts: &mut Vec<ConflictRecord>,
  state_idx: usize,
  resolve: bool,
) {
  match state.actions.get(&sym).cloned() {
    None => {
      state.actions.insert(sym, action);
    }
    Some(existing) => {
      let resolved = resolve_existing(existing, action, g, conflicts, state_idx, sym, resolve);
      state.actions.insert(sym, resolved);
    }
  }
}

fn resolve_existing(
  existing: Action,
  incoming: Action,
  g: &Grammar,
  conflicts: &mut Vec<ConflictRecord>,
  state_idx: usize,
  sym: SymbolId,
  resolve: bool,
) -> Action {
  use Action::*;
  match (existing, incoming) {
    (Shift(s), Reduce(p)) | (Reduce(p), Shift(s)) => {
      if !resolve {
        if !is_synthetic_lhs(g, p) {
          conflicts.push(ConflictRecord {
            kind: ConflictKind::ShiftReduce,
            state: state_idx,
            symbol: sym,
            resolution: "kept shift (resolution disabled)".into(),
          });
        }
        return Shift(s);
      }
      let outcome = resolve_shift_reduce(g, sym, p);
      if outcome.by_default && !is_synthetic_lhs(g, p) {
        conflicts.push(ConflictRecord {
          kind: ConflictKind::ShiftReduce,
          state: state_idx,
          symbol: sym,
          resolution: "no declared precedence, kept shift".into(),
        });
      }
      match outcome.resolution {
        ShiftReduceResolution::Shift => Shift(s),
        ShiftReduceResolution::Reduce => Reduce(p),
        ShiftReduceResolution::Error => Error,
      }
    }
    (ShiftReduce(sp), Reduce(p)) | (Reduce(p), ShiftReduce(sp)) => {
      if !resolve {
        if !is_synthetic_lhs(g, p) {
          conflicts.push(ConflictRecord {
            kind: ConflictKind::ShiftReduce,
            state: state_idx,
            symbol: sym,
            resolution: "kept shift (resolution disabled)".into(),
          });
        }
        return ShiftReduce(sp);
      }
      let outcome = resolve_shift_reduce(g, sym, p);
      if outcome.by_default && !is_synthetic_lhs(g, p) {
        conflicts.push(ConflictRecord {
          kind: ConflictKind::ShiftReduce,
          state: state_idx,
          symbol: sym,
          resolution: "no declared precedence, kept shift".into(),
        });
      }
      match outcome.resolution {
        ShiftReduceResolution::Shift => ShiftReduce(sp),
        ShiftReduceResolution::Reduce => Reduce(p),
        ShiftReduceResolution::Error => Error,
      }
    }
    (Reduce(a), Reduce(b)) => {
      if !is_synthetic_lhs(g, a) && !is_synthetic_lhs(g, b) {
        conflicts.push(ConflictRecord {
          kind: ConflictKind::ReduceReduce,
          state: state_idx,
          symbol: sym,
          resolution: if resolve { format!("kept production {}", resolve_reduce_reduce(a, b)) } else { "kept first-installed production".into() },
        });
      }
      if !resolve {
        return Reduce(a);
      }
      Reduce(resolve_reduce_reduce(a, b))
    }
    (a, _b) => a,
  }
}
