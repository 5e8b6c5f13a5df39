//! `gram_prepare`: symbol banding, FIRST/nullable fixpoint, left-recursion
//! marking, lexeme pull-through and precedence/emit inheritance. Run once,
//! before the grammar is handed to the LALR engine; idempotent if rerun.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Diagnostic, DiagnosticKind, UniccResult};
use crate::types::{Grammar, Pattern, ProductionId, SymbolId, SymbolKind};

/// Bookkeeping returned from `gram_prepare`, useful for tests and for an
/// embedder that wants a one-line summary of what preparation found.
#[derive(Debug, Clone, Default)]
pub struct PreparationReport {
  pub symbol_count: usize,
  pub production_count: usize,
  pub leftrec_productions: usize,
  pub nullable_nonterminals: usize,
}

impl Grammar {
  pub fn gram_prepare(&mut self) -> UniccResult<PreparationReport> {
    self.band_symbols()?;
    self.compute_first_and_nullable();
    if !self.flags.preventlrec {
      self.mark_left_recursion();
    }
    self.propagate_lexeme_flag();
    self.inherit_precedence_and_emit();
    self.detect_diagnostics();
    self.flags.finalized = true;

    let leftrec_productions = self.productions.iter().filter(|p| p.leftrec).count();
    let nullable_nonterminals = self.symbols.iter().filter(|s| s.is_nonterminal() && s.flags.nullable).count();
    Ok(PreparationReport {
      symbol_count: self.symbols.len(),
      production_count: self.productions.len(),
      leftrec_productions,
      nullable_nonterminals,
    })
  }

  /// Reorders symbols into bands: specials, character-class terminals,
  /// literal-string terminals, regex terminals, nonterminals. Order within
  /// a band is stable (creation order preserved).
  fn band_symbols(&mut self) -> UniccResult<()> {
    fn band(g: &Grammar, id: SymbolId) -> u8 {
      let sym = &g.symbols[id.index()];
      if sym.flags.special {
        return 0;
      }
      match sym.kind {
        SymbolKind::Terminal => match &sym.pattern {
          Some(Pattern::CharClass(_)) => 1,
          Some(Pattern::Literal(_)) | None => 2,
          Some(Pattern::Regex(_)) => 3,
          Some(Pattern::Nameless) => 1,
        },
        SymbolKind::NonTerminal => 4,
      }
    }

    let mut order: Vec<SymbolId> = self.symbols.iter().map(|s| s.id).collect();
    order.sort_by_key(|id| (band(self, *id), id.0));

    let mut old_to_new = vec![SymbolId::UNDEFINED; self.symbols.len()];
    for (new_idx, old_id) in order.iter().enumerate() {
      old_to_new[old_id.index()] = SymbolId::from(new_idx);
    }

    let remap = |id: SymbolId| -> SymbolId { old_to_new[id.index()] };

    let mut new_symbols = vec![None; self.symbols.len()];
    for old_sym in std::mem::take(&mut self.symbols) {
      let old_id = old_sym.id;
      let mut sym = old_sym;
      sym.id = remap(old_id);
      if let Some(origin) = sym.origin {
        sym.origin = Some(remap(origin));
      }
      sym.first = sym.first.iter().map(|s| remap(*s)).collect();
      new_symbols[sym.id.index()] = Some(sym);
    }
    self.symbols = new_symbols.into_iter().map(|s| s.expect("every slot filled by a permutation")).collect();

    for prod in &mut self.productions {
      prod.lhs = remap(prod.lhs);
      for sym in &mut prod.rhs {
        *sym = remap(*sym);
      }
    }

    self.eof = remap(self.eof);
    if let Some(goal) = self.goal {
      self.goal = Some(remap(goal));
    }
    let old_cache = std::mem::take(&mut self.derived_cache);
    self.derived_cache = old_cache.into_iter().map(|((origin, kind), target)| ((remap(origin), kind), remap(target))).collect();
    self.remap_name_index(remap);

    Ok(())
  }

  fn compute_first_and_nullable(&mut self) {
    for sym in &mut self.symbols {
      if sym.is_terminal() {
        sym.first = BTreeSet::from([sym.id]);
        sym.flags.nullable = false;
      } else {
        sym.first.clear();
        sym.flags.nullable = false;
      }
    }

    let mut changed = true;
    while changed {
      changed = false;
      for prod_idx in 0..self.productions.len() {
        if self.productions[prod_idx].dropped {
          continue;
        }
        let (lhs, rhs) = {
          let p = &self.productions[prod_idx];
          (p.lhs, p.rhs.clone())
        };
        if rhs.is_empty() {
          let lhs_sym = &mut self.symbols[lhs.index()];
          if !lhs_sym.flags.nullable {
            lhs_sym.flags.nullable = true;
            changed = true;
          }
          continue;
        }
        let mut all_nullable = true;
        let mut additions: BTreeSet<SymbolId> = BTreeSet::new();
        for sym_id in &rhs {
          let sym = &self.symbols[sym_id.index()];
          additions.extend(sym.first.iter().copied());
          if !sym.flags.nullable {
            all_nullable = false;
            break;
          }
        }
        let lhs_sym = &mut self.symbols[lhs.index()];
        let before = lhs_sym.first.len();
        lhs_sym.first.extend(additions);
        if lhs_sym.first.len() != before {
          changed = true;
        }
        if all_nullable && !lhs_sym.flags.nullable {
          lhs_sym.flags.nullable = true;
          changed = true;
        }
      }
    }
  }

  /// Builds the "leads" relation (L -> set of nonterminals that can appear
  /// as the leftmost non-nullable-skipped symbol of one of L's
  /// productions), then flags any production/symbol on a cycle through
  /// that relation as left-recursive.
  fn mark_left_recursion(&mut self) {
    let mut prod_leading: Vec<BTreeSet<SymbolId>> = vec![BTreeSet::new(); self.productions.len()];
    let mut leads: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();

    for (i, prod) in self.productions.iter().enumerate() {
      if prod.dropped {
        continue;
      }
      let mut set = BTreeSet::new();
      for sym_id in &prod.rhs {
        let sym = &self.symbols[sym_id.index()];
        if sym.is_nonterminal() {
          set.insert(*sym_id);
        }
        if !sym.flags.nullable {
          break;
        }
      }
      prod_leading[i] = set.clone();
      leads.entry(prod.lhs).or_default().extend(set);
    }

    let nonterminals: Vec<SymbolId> = self.symbols.iter().filter(|s| s.is_nonterminal()).map(|s| s.id).collect();
    let mut reachable: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();
    for &nt in &nonterminals {
      let mut seen = BTreeSet::new();
      let mut stack: Vec<SymbolId> = leads.get(&nt).cloned().unwrap_or_default().into_iter().collect();
      while let Some(n) = stack.pop() {
        if seen.insert(n) {
          stack.extend(leads.get(&n).cloned().unwrap_or_default());
        }
      }
      reachable.insert(nt, seen);
    }

    for (i, prod) in self.productions.iter_mut().enumerate() {
      let lhs = prod.lhs;
      let is_leftrec = prod_leading[i].contains(&lhs)
        || prod_leading[i].iter().any(|n| reachable.get(n).map(|r| r.contains(&lhs)).unwrap_or(false));
      prod.leftrec = is_leftrec;
    }
    let leftrec_lhs: BTreeSet<SymbolId> = self.productions.iter().filter(|p| p.leftrec).map(|p| p.lhs).collect();
    for sym in &mut self.symbols {
      if leftrec_lhs.contains(&sym.id) {
        sym.flags.leftrec = true;
      }
    }
  }

  /// A nonterminal is a "lexeme" production if every one of its rules is
  /// built only from symbols already known to be lexemes. Marking it lets
  /// callers treat a whole sub-grammar as a single token the way a
  /// `%skip`/char-class terminal is treated.
  fn propagate_lexeme_flag(&mut self) {
    for sym in &mut self.symbols {
      if sym.is_terminal() && !sym.flags.whitespace {
        sym.flags.lexeme = true;
      }
    }
    let mut changed = true;
    while changed {
      changed = false;
      for i in 0..self.symbols.len() {
        if self.symbols[i].is_terminal() || self.symbols[i].flags.lexeme {
          continue;
        }
        let id = self.symbols[i].id;
        let prods: Vec<ProductionId> = self.symbols[i].productions.clone();
        if prods.is_empty() {
          continue;
        }
        let all_lexeme = prods.iter().all(|pid| {
          self.productions[pid.index()].rhs.iter().all(|s| self.symbols[s.index()].flags.lexeme)
        });
        if all_lexeme {
          self.symbols[id.index()].flags.lexeme = true;
          changed = true;
        }
      }
    }
  }

  /// Productions without an explicit precedence inherit the maximum
  /// precedence declared directly on an rhs symbol (rightmost wins ties);
  /// productions without an explicit emit tag inherit one from their
  /// rightmost symbol that has one, following chains through nonterminals
  /// until a fixpoint is reached.
  fn inherit_precedence_and_emit(&mut self) {
    self.inherit_production_precedence();

    let mut changed = true;
    let mut guard = 0;
    while changed && guard <= self.productions.len() + 1 {
      changed = false;
      guard += 1;
      for i in 0..self.productions.len() {
        if self.productions[i].emit.is_none() {
          let rhs = self.productions[i].rhs.clone();
          for sym_id in rhs.iter().rev() {
            if let Some(e) = self.effective_emit(*sym_id) {
              self.productions[i].emit = Some(e);
              self.productions[i].freeemit = true;
              changed = true;
              break;
            }
          }
        }
      }
    }

    // A symbol inherits `emits` from its own explicit emit or from any of
    // its productions' emits.
    let mut changed = true;
    while changed {
      changed = false;
      for i in 0..self.symbols.len() {
        if self.symbols[i].flags.emits {
          continue;
        }
        let has_own_emit = self.symbols[i].emit.is_some();
        let has_prod_emit = self.symbols[i].productions.iter().any(|p| self.productions[p.index()].emit.is_some());
        if has_own_emit || has_prod_emit {
          self.symbols[i].flags.emits = true;
          changed = true;
        }
      }
    }
  }

  /// spec.md §4.3 step 6: "a production inherits the maximum precedence
  /// among its rhs symbols (rightmost wins on ties)" — the max is taken
  /// over each rhs symbol's own declared precedence only. Matches
  /// `grammar.c`'s `sym->prec` max-over-rhs and `rewrite.c`'s
  /// rightmost-terminal rule; neither ever descends into a nonterminal's
  /// own productions, so a production's precedence never depends on
  /// another production sharing its lhs (avoids e.g. `expr '*' expr`
  /// picking up `expr '+' expr`'s precedence through the shared `expr`
  /// rhs symbol).
  fn inherit_production_precedence(&mut self) {
    for i in 0..self.productions.len() {
      if self.productions[i].precedence != 0 {
        continue;
      }
      let mut best = 0;
      for sym_id in &self.productions[i].rhs {
        let p = self.symbols[sym_id.index()].precedence;
        if p != 0 && p >= best {
          best = p;
        }
      }
      self.productions[i].precedence = best;
    }
  }

  /// spec.md §6/§7 preparation diagnostics, kind set taken from `p_error.h`
  /// (see SPEC_FULL.md). Non-fatal: every check here only pushes onto
  /// `Grammar::diagnostics`, never returns `Err`.
  fn detect_diagnostics(&mut self) {
    self.detect_undefined_symbols();
    self.detect_unused_nonterminals();
    self.detect_useless_productions();
  }

  /// A nonterminal that was created (and so can be referenced from an rhs)
  /// but never given a single production is undefined: nothing tells the
  /// grammar what it expands to.
  fn detect_undefined_symbols(&mut self) {
    let mut diags = Vec::new();
    for sym in &self.symbols {
      if sym.is_nonterminal() && sym.productions.is_empty() {
        diags.push(Diagnostic::new(DiagnosticKind::UndefinedSymbol, format!("nonterminal `{}` has no production", sym.name)));
      }
    }
    for d in diags {
      self.push_diagnostic(d);
    }
  }

  /// A nonterminal that was defined but never appears on any rhs, and is
  /// not the goal symbol, contributes nothing to the grammar.
  fn detect_unused_nonterminals(&mut self) {
    let goal = self.goal;
    let mut diags = Vec::new();
    for sym in &self.symbols {
      if sym.is_nonterminal() && sym.usage == 0 && Some(sym.id) != goal {
        diags.push(Diagnostic::new(DiagnosticKind::UnusedNonTerminal, format!("nonterminal `{}` is never used", sym.name)));
      }
    }
    for d in diags {
      self.push_diagnostic(d);
    }
  }

  /// A production whose lhs can never derive a terminal string (empty FIRST
  /// set and not nullable, after the §4.3 fixpoint) can never be reduced by
  /// any parse and is useless.
  fn detect_useless_productions(&mut self) {
    let mut diags = Vec::new();
    for prod in &self.productions {
      if prod.dropped {
        continue;
      }
      let lhs = &self.symbols[prod.lhs.index()];
      if lhs.first.is_empty() && !lhs.flags.nullable {
        diags.push(Diagnostic::new(
          DiagnosticKind::UselessProduction,
          format!("production for `{}` can never derive a terminal string", lhs.name),
        ));
      }
    }
    for d in diags {
      self.push_diagnostic(d);
    }
  }

  fn effective_emit(&self, id: SymbolId) -> Option<String> {
    let sym = &self.symbols[id.index()];
    if let Some(e) = &sym.emit {
      return Some(e.clone());
    }
    if sym.is_nonterminal() {
      return sym.productions.iter().find_map(|p| self.productions[p.index()].emit.clone());
    }
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// spec.md §7: a nonterminal created but never given a production is
  /// flagged `UndefinedSymbol`; one created but never referenced on any rhs
  /// (and not the goal) is flagged `UnusedNonTerminal`.
  #[test]
  fn gram_prepare_flags_undefined_and_unused_nonterminals() {
    let mut g = Grammar::new();
    let a = g.sym_create(Some("a"), SymbolKind::Terminal, Some(Pattern::Literal("a".into()))).unwrap();
    let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();
    let unused = g.sym_create(Some("unused"), SymbolKind::NonTerminal, None).unwrap();
    let undefined = g.sym_create(Some("undefined"), SymbolKind::NonTerminal, None).unwrap();

    let sp = g.prod_create(s).unwrap();
    g.prod_append(sp, a).unwrap();

    // give `unused` a production so it isn't also flagged undefined
    let up = g.prod_create(unused).unwrap();
    g.prod_append(up, a).unwrap();

    g.set_goal(s).unwrap();
    g.gram_prepare().unwrap();

    let kinds: Vec<_> = g.diagnostics().iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DiagnosticKind::UndefinedSymbol), "expected undefined-symbol diagnostic for `{undefined:?}`");
    assert!(kinds.contains(&DiagnosticKind::UnusedNonTerminal), "expected unused-nonterminal diagnostic for `{unused:?}`");
  }

  /// spec.md §7: a production whose lhs can never derive a terminal string
  /// (no base case breaks its recursion) is flagged `UselessProduction`.
  #[test]
  fn gram_prepare_flags_useless_production() {
    let mut g = Grammar::new();
    let a = g.sym_create(Some("a"), SymbolKind::Terminal, Some(Pattern::Literal("a".into()))).unwrap();
    let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();
    let dead = g.sym_create(Some("dead"), SymbolKind::NonTerminal, None).unwrap();

    let sp = g.prod_create(s).unwrap();
    g.prod_append(sp, a).unwrap();

    // dead : dead 'a' — only ever recurses, never bottoms out
    let dp = g.prod_create(dead).unwrap();
    g.prod_append(dp, dead).unwrap();
    g.prod_append(dp, a).unwrap();

    g.set_goal(s).unwrap();
    g.gram_prepare().unwrap();

    assert!(g.diagnostics().iter().any(|d| d.kind == DiagnosticKind::UselessProduction));
  }
}
