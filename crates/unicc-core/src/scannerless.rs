//! `gram_transform_to_scannerless`: rewrites a grammar that declares a
//! whitespace/skip terminal so that every terminal occurrence absorbs
//! trailing (and, at the goal, leading) whitespace, removing the need for a
//! separate tokenizing pass ahead of the parser.

use std::collections::BTreeMap;

use crate::error::UniccResult;
use crate::types::{Grammar, ProductionId, SymbolId, SymbolKind};

/// Which productions a call to `gram_transform_to_scannerless` actually
/// rewrote. A second call against an unchanged grammar produces an empty
/// log: the transform is idempotent.
#[derive(Debug, Clone, Default)]
pub struct RewriteLog {
  pub rewritten_productions: Vec<ProductionId>,
  pub wrapper_symbols_created: usize,
}

impl Grammar {
  /// Marks `ws` as the whitespace/skip terminal. Must be called before
  /// `gram_transform_to_scannerless`.
  pub fn set_whitespace_symbol(&mut self, ws: SymbolId) -> UniccResult<()> {
    self.symbol_mut(ws)?.flags.whitespace = true;
    Ok(())
  }

  pub fn whitespace_symbol(&self) -> Option<SymbolId> {
    self.symbols.iter().find(|s| s.flags.whitespace).map(|s| s.id)
  }

  /// Rewrites every reachable production, replacing references to a
  /// lexeme/terminal symbol `x` (other than the whitespace terminal
  /// itself) with a wrapper `x' : x ws*`, and wraps the goal so leading
  /// whitespace before the first token is also consumed.
  pub fn gram_transform_to_scannerless(&mut self) -> UniccResult<RewriteLog> {
    let Some(ws) = self.whitespace_symbol() else {
      return Ok(RewriteLog::default());
    };
    let ws_star = self.sym_mod_kleene(ws)?;

    let mut log = RewriteLog::default();
    let mut wrapper_cache: BTreeMap<SymbolId, SymbolId> = BTreeMap::new();

    let terminal_ids: Vec<SymbolId> =
      self.symbols.iter().filter(|s| s.is_terminal() && !s.flags.whitespace && s.id != ws_star).map(|s| s.id).collect();

    for term in terminal_ids {
      if self.already_wrapped(term, ws_star) {
        continue;
      }
      let wrapper_name = format!("{}_ws", self.symbol(term)?.name);
      let wrapper = self.sym_create(Some(&wrapper_name), SymbolKind::NonTerminal, None)?;
      if self.symbol(wrapper)?.productions.is_empty() {
        let p = self.prod_create(wrapper)?;
        self.prod_append(p, term)?;
        self.prod_append(p, ws_star)?;
        self.symbol_mut(wrapper)?.flags.generated = true;
        log.wrapper_symbols_created += 1;
      }
      wrapper_cache.insert(term, wrapper);
    }

    let production_ids: Vec<ProductionId> = self.productions.iter().map(|p| p.id).collect();
    for pid in production_ids {
      if wrapper_cache.values().any(|w| *w == self.production(pid)?.lhs) {
        // Don't rewrite the wrapper productions we just created.
        continue;
      }
      let mut changed = false;
      let rhs = self.production(pid)?.rhs.clone();
      let mut new_rhs = Vec::with_capacity(rhs.len());
      for sym in rhs {
        if let Some(&wrapper) = wrapper_cache.get(&sym) {
          new_rhs.push(wrapper);
          changed = true;
        } else {
          new_rhs.push(sym);
        }
      }
      if changed {
        self.production_mut(pid)?.rhs = new_rhs;
        log.rewritten_productions.push(pid);
      }
    }

    if let Some(goal) = self.goal {
      if !self.goal_already_wrapped(goal, ws_star) {
        let wrapped_goal = self.sym_create(Some(&format!("{}_scanned", self.symbol(goal)?.name)), SymbolKind::NonTerminal, None)?;
        let p = self.prod_create(wrapped_goal)?;
        self.prod_append(p, ws_star)?;
        self.prod_append(p, goal)?;
        self.symbol_mut(wrapped_goal)?.flags.generated = true;
        self.set_goal(wrapped_goal)?;
      }
    }

    self.flags.scannerless = true;
    Ok(log)
  }

  fn already_wrapped(&self, term: SymbolId, ws_star: SymbolId) -> bool {
    self.symbols.iter().any(|s| {
      s.is_nonterminal()
        && s.productions.len() == 1
        && self
          .productions
          .get(s.productions[0].index())
          .map(|p| p.rhs == [term, ws_star])
          .unwrap_or(false)
    })
  }

  /// True if `goal` is already the wrapper this transform itself would
  /// produce (a single `generated` production `ws_star goal'`), so a
  /// second call leaves the goal alone instead of wrapping it again.
  fn goal_already_wrapped(&self, goal: SymbolId, ws_star: SymbolId) -> bool {
    let Ok(sym) = self.symbol(goal) else { return false };
    sym.flags.generated
      && sym.productions.len() == 1
      && self.production(sym.productions[0]).map(|p| p.rhs.first() == Some(&ws_star)).unwrap_or(false)
  }
}
