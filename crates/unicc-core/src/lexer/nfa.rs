//! Thompson construction: turns a [`ReNode`] or a [`Pattern`](crate::types::Pattern)
//! into a fragment of a shared [`Nfa`], and keeps a accept-state -> terminal
//! map so many terminals' patterns can be merged into one automaton (the
//! "compile to NFA mergeable with other NFAs" interface spec.md §1 asks the
//! pattern compiler to expose).

use std::collections::BTreeMap;

use crate::error::{CoreError, UniccResult};
use crate::types::{Pattern, SymbolId};

use super::charset::CharSet;
use super::regex::{self, ReNode};

#[derive(Debug, Clone)]
pub enum Edge {
  Epsilon,
  Match(CharSet),
}

#[derive(Debug, Clone, Default)]
pub struct NfaState {
  pub edges: Vec<(Edge, usize)>,
}

#[derive(Debug, Clone, Default)]
pub struct Nfa {
  pub states: Vec<NfaState>,
  pub start: usize,
  /// NFA accept state -> the terminal symbol whose pattern produced it.
  pub accepts: BTreeMap<usize, SymbolId>,
}

impl Nfa {
  pub fn new() -> Self {
    let mut nfa = Self { states: Vec::new(), start: 0, accepts: BTreeMap::new() };
    nfa.start = nfa.new_state();
    nfa
  }

  pub fn new_state(&mut self) -> usize {
    self.states.push(NfaState::default());
    self.states.len() - 1
  }

  fn edge(&mut self, from: usize, edge: Edge, to: usize) {
    self.states[from].edges.push((edge, to));
  }

  /// Compiles `pattern` as one more alternative of the union automaton,
  /// tagging its accept state with `symbol`. Patterns are merged by
  /// epsilon-joining each one's fragment from the shared start state,
  /// exactly the "mergeable NFA" contract spec.md §1 describes.
  pub fn merge_pattern(&mut self, symbol: SymbolId, pattern: &Pattern) -> UniccResult<()> {
    let node = pattern_to_node(pattern)?;
    let (frag_start, frag_end) = self.compile(&node);
    self.edge(self.start, Edge::Epsilon, frag_start);
    self.accepts.insert(frag_end, symbol);
    Ok(())
  }

  /// Builds one fragment `(start, end)` with no outgoing edges from `end`
  /// yet; the caller decides whether `end` becomes an accept state.
  fn compile(&mut self, node: &ReNode) -> (usize, usize) {
    match node {
      ReNode::Char(c) => self.compile(&ReNode::Class(CharSet::single(*c))),
      ReNode::Class(set) => {
        let s = self.new_state();
        let e = self.new_state();
        self.edge(s, Edge::Match(set.clone()), e);
        (s, e)
      }
      ReNode::Concat(parts) => {
        if parts.is_empty() {
          let s = self.new_state();
          return (s, s);
        }
        let mut iter = parts.iter();
        let (start, mut prev_end) = self.compile(iter.next().unwrap());
        for part in iter {
          let (s, e) = self.compile(part);
          self.edge(prev_end, Edge::Epsilon, s);
          prev_end = e;
        }
        (start, prev_end)
      }
      ReNode::Alt(branches) => {
        let s = self.new_state();
        let e = self.new_state();
        for b in branches {
          let (bs, be) = self.compile(b);
          self.edge(s, Edge::Epsilon, bs);
          self.edge(be, Edge::Epsilon, e);
        }
        (s, e)
      }
      ReNode::Star(inner) => {
        let s = self.new_state();
        let e = self.new_state();
        let (is, ie) = self.compile(inner);
        self.edge(s, Edge::Epsilon, is);
        self.edge(s, Edge::Epsilon, e);
        self.edge(ie, Edge::Epsilon, is);
        self.edge(ie, Edge::Epsilon, e);
        (s, e)
      }
      ReNode::Plus(inner) => {
        let (is, ie) = self.compile(inner);
        let e = self.new_state();
        self.edge(ie, Edge::Epsilon, is);
        self.edge(ie, Edge::Epsilon, e);
        (is, e)
      }
      ReNode::Opt(inner) => {
        let s = self.new_state();
        let e = self.new_state();
        let (is, ie) = self.compile(inner);
        self.edge(s, Edge::Epsilon, is);
        self.edge(s, Edge::Epsilon, e);
        self.edge(ie, Edge::Epsilon, e);
        (s, e)
      }
    }
  }
}

fn pattern_to_node(pattern: &Pattern) -> UniccResult<ReNode> {
  match pattern {
    Pattern::Nameless => Err(CoreError::InvalidPattern {
      pattern: String::new(),
      reason: "a nameless terminal has no pattern to compile".into(),
    }),
    Pattern::Literal(s) => Ok(ReNode::Concat(s.chars().map(ReNode::Char).collect())),
    Pattern::CharClass(body) => regex::parse_charclass_body(body).map(ReNode::Class),
    Pattern::Regex(source) => regex::parse(source),
  }
}

pub fn epsilon_closure(nfa: &Nfa, seed: &[usize]) -> std::collections::BTreeSet<usize> {
  let mut closure: std::collections::BTreeSet<usize> = seed.iter().copied().collect();
  let mut stack: Vec<usize> = seed.to_vec();
  while let Some(s) = stack.pop() {
    for (edge, to) in &nfa.states[s].edges {
      if matches!(edge, Edge::Epsilon) && closure.insert(*to) {
        stack.push(*to);
      }
    }
  }
  closure
}
