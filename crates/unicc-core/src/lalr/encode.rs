//! `lr_build`: flattens a built [`LrAutomaton`](super::states::LrAutomaton)
//! into the packed row format a generated/embedded driver actually reads at
//! runtime.

use std::collections::BTreeMap;

use crate::types::ProductionId;

use super::states::{Action, LrAutomaton, LrState};

/// Bit set on a packed action/goto triple's flags slot when the entry
/// shifts to a new state.
pub const LR_SHIFT: u32 = 0b01;
/// Bit set when the entry reduces by a production. Both bits set together
/// mean the combined shift/reduce entry from the shift-reduce optimization.
pub const LR_REDUCE: u32 = 0b10;

/// One state's packed row: `[total_len, default_reduce_prod_or_0, (sym_idx+1,
/// flags, target){n}]`. Index 0 in the symbol slot is reserved to mean
/// "absent", so every real symbol index is stored `+1`.
#[derive(Debug, Clone, Default)]
pub struct EncodedRow(pub Vec<u32>);

impl EncodedRow {
  pub fn total_len(&self) -> u32 {
    self.0.first().copied().unwrap_or(0)
  }

  pub fn default_reduction(&self) -> Option<ProductionId> {
    match self.0.get(1) {
      Some(0) | None => None,
      Some(v) => Some(ProductionId::from(v - 1)),
    }
  }

  /// Iterates the `(symbol_index, flags, target)` triples after the
  /// 2-word header.
  pub fn entries(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
    self.0[2..].chunks_exact(3).map(|c| (c[0], c[1], c[2]))
  }
}

#[derive(Debug, Clone, Default)]
pub struct EncodedTable {
  pub rows: Vec<EncodedRow>,
}

/// Summary stats over an [`EncodedTable`], useful for tests and for an
/// embedder sizing its generated tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableStats {
  pub state_count: usize,
  pub total_entries: usize,
  pub default_reduction_states: usize,
}

impl TableStats {
  pub fn average_row_len(&self) -> f64 {
    if self.state_count == 0 {
      0.0
    } else {
      self.total_entries as f64 / self.state_count as f64
    }
  }
}

/// The most frequent pure-`Reduce` target in a state's action row becomes
/// its default reduction. A target shared by only one symbol is not worth
/// defaulting: it would not shrink the row.
fn default_reduction_for(state: &LrState) -> Option<ProductionId> {
  let mut counts: BTreeMap<ProductionId, usize> = BTreeMap::new();
  for action in state.actions.values() {
    if let Action::Reduce(p) = action {
      *counts.entry(*p).or_insert(0) += 1;
    }
  }
  counts.into_iter().filter(|&(_, c)| c > 1).max_by_key(|&(_, c)| c).map(|(p, _)| p)
}

fn encode_state(state: &LrState) -> EncodedRow {
  let default = default_reduction_for(state);

  let mut entries: Vec<(u32, u32, u32)> = Vec::new();
  for (&sym, action) in &state.actions {
    match action {
      Action::Shift(target) => entries.push((sym.0 + 1, LR_SHIFT, *target as u32)),
      Action::ShiftReduce(prod) => entries.push((sym.0 + 1, LR_SHIFT | LR_REDUCE, prod.0)),
      Action::Reduce(prod) => {
        if Some(*prod) == default {
          continue;
        }
        entries.push((sym.0 + 1, LR_REDUCE, prod.0));
      }
      Action::Error => entries.push((sym.0 + 1, 0, 0)),
    }
  }
  for (&sym, &target) in &state.gotos {
    entries.push((sym.0 + 1, 0, target as u32));
  }

  let mut row = vec![0u32; 2 + entries.len() * 3];
  row[0] = row.len() as u32;
  row[1] = default.map(|p| p.0 + 1).unwrap_or(0);
  for (i, (a, b, c)) in entries.into_iter().enumerate() {
    row[2 + i * 3] = a;
    row[2 + i * 3 + 1] = b;
    row[2 + i * 3 + 2] = c;
  }
  EncodedRow(row)
}

/// `lr_build`: walks every state in `automaton` and produces the packed
/// table plus summary stats.
pub fn lr_build(automaton: &LrAutomaton) -> (EncodedTable, TableStats) {
  let rows: Vec<EncodedRow> = automaton.states.iter().map(encode_state).collect();

  let total_entries: usize = rows.iter().map(|r| r.entries().count()).sum();
  let default_reduction_states = automaton.states.iter().filter(|s| default_reduction_for(s).is_some()).count();

  let stats = TableStats { state_count: rows.len(), total_entries, default_reduction_states };
  (EncodedTable { rows }, stats)
}
