//! Subset construction: turns the union [`Nfa`] built by [`super::nfa`] into
//! a deterministic automaton keyed by terminal index at each accept state,
//! the "single DFA" spec.md §4.8 asks the auto-lexer builder to produce.
//!
//! Each DFA state's transitions are built by partitioning the codepoint
//! space into the minimal set of intervals that behave uniformly for every
//! NFA state in that DFA state's subset (the standard adaptive-alphabet
//! technique for regex-derived DFAs), rather than enumerating every
//! codepoint.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::SymbolId;

use super::charset::CharSet;
use super::nfa::{epsilon_closure, Edge, Nfa};

#[derive(Debug, Clone, Default)]
pub struct DfaState {
  pub transitions: Vec<(CharSet, usize)>,
  /// The lowest-index terminal accepting in this state, per spec.md §5's
  /// "on tie, the terminal with the lower index wins" rule.
  pub accept: Option<SymbolId>,
}

impl DfaState {
  pub fn step(&self, c: u32) -> Option<usize> {
    self.transitions.iter().find(|(set, _)| set.contains(c)).map(|(_, to)| *to)
  }
}

#[derive(Debug, Clone, Default)]
pub struct Dfa {
  pub states: Vec<DfaState>,
  pub start: usize,
}

/// Builds the DFA for the union automaton `nfa`. Returns, alongside the
/// automaton, every pair of terminals whose patterns accept in a common DFA
/// state — the class-intersection spec.md §9 says is an error in scanner
/// mode and a clone-and-resolve opportunity in scannerless mode.
pub fn build_dfa(nfa: &Nfa) -> (Dfa, Vec<(SymbolId, SymbolId)>) {
  let start_set = epsilon_closure(nfa, &[nfa.start]);

  let mut dfa = Dfa { states: Vec::new(), start: 0 };
  let mut set_to_id: BTreeMap<BTreeSet<usize>, usize> = BTreeMap::new();
  let mut worklist: Vec<BTreeSet<usize>> = Vec::new();
  let mut overlaps = Vec::new();

  set_to_id.insert(start_set.clone(), 0);
  dfa.states.push(DfaState::default());
  worklist.push(start_set);

  while let Some(set) = worklist.pop() {
    let id = set_to_id[&set];

    let mut accepting: Vec<SymbolId> = set.iter().filter_map(|s| nfa.accepts.get(s).copied()).collect();
    accepting.sort_by_key(|s| s.0);
    accepting.dedup();
    if accepting.len() > 1 {
      for w in accepting.windows(2) {
        overlaps.push((w[0], w[1]));
      }
    }
    dfa.states[id].accept = accepting.first().copied();

    let mut boundaries: BTreeSet<u32> = BTreeSet::new();
    for &s in &set {
      for (edge, _) in &nfa.states[s].edges {
        if let Edge::Match(cs) = edge {
          for &(lo, hi) in &cs.ranges {
            boundaries.insert(lo);
            boundaries.insert(hi.saturating_add(1));
          }
        }
      }
    }
    let bvec: Vec<u32> = boundaries.into_iter().collect();
    if bvec.is_empty() {
      continue;
    }

    let mut transitions = Vec::new();
    for window in bvec.windows(2) {
      let (lo, next_lo) = (window[0], window[1]);
      if lo >= next_lo {
        continue;
      }
      let hi = next_lo - 1;
      let mut target: BTreeSet<usize> = BTreeSet::new();
      for &s in &set {
        for (edge, to) in &nfa.states[s].edges {
          if let Edge::Match(cs) = edge {
            if cs.contains(lo) {
              target.insert(*to);
            }
          }
        }
      }
      if target.is_empty() {
        continue;
      }
      let target = epsilon_closure(nfa, &target.into_iter().collect::<Vec<_>>());
      let target_id = *set_to_id.entry(target.clone()).or_insert_with(|| {
        let new_id = dfa.states.len();
        dfa.states.push(DfaState::default());
        worklist.push(target.clone());
        new_id
      });
      transitions.push((CharSet { ranges: vec![(lo, hi)] }, target_id));
    }
    dfa.states[id].transitions = merge_adjacent(transitions);
  }

  overlaps.sort();
  overlaps.dedup();
  (dfa, overlaps)
}

/// Coalesces consecutive `(range, target)` pairs that share a target into
/// one wider range, purely to keep the encoded table (spec.md §6's lexer
/// JSON dump, `{character-from, character-until, goto-state}`) compact.
fn merge_adjacent(mut transitions: Vec<(CharSet, usize)>) -> Vec<(CharSet, usize)> {
  transitions.sort_by_key(|(cs, _)| cs.ranges.first().copied().unwrap_or((0, 0)));
  let mut merged: Vec<(CharSet, usize)> = Vec::with_capacity(transitions.len());
  for (cs, target) in transitions {
    let (lo, hi) = cs.ranges[0];
    if let Some((last_cs, last_target)) = merged.last_mut() {
      if *last_target == target {
        let (_, last_hi) = last_cs.ranges[0];
        if lo == last_hi.saturating_add(1) {
          last_cs.ranges[0].1 = hi;
          continue;
        }
      }
    }
    merged.push((CharSet { ranges: vec![(lo, hi)] }, target));
  }
  merged
}
