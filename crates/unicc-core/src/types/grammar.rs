use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{CoreError, Diagnostic, DiagnosticKind, UniccResult};

use super::{Pattern, Production, ProductionId, Symbol, SymbolId, SymbolKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct GrammarFlags {
  pub finalized: bool,
  pub frozen: bool,
  pub debug: bool,
  pub preventlrec: bool,
  /// Set by `gram_transform_to_scannerless` once the rewrite has run.
  /// The auto-lexer builder relaxes its scanner-mode class-intersection
  /// check when this is set.
  pub scannerless: bool,
}

/// Owns every [`Symbol`] and [`Production`] that make up a grammar, plus the
/// bookkeeping `gram_prepare` and the scannerless rewrite need.
#[derive(Debug, Clone)]
pub struct Grammar {
  pub symbols: Vec<Symbol>,
  pub productions: Vec<Production>,
  name_to_symbol: BTreeMap<String, SymbolId>,
  pub goal: Option<SymbolId>,
  pub eof: SymbolId,
  pub flags: GrammarFlags,
  diagnostics: Vec<Diagnostic>,
  /// Cache of derived symbols: `(origin, kind)` already materialized by
  /// `sym_mod_positive`/`sym_mod_optional`/`sym_mod_kleene`, so repeated
  /// calls for the same origin return the same symbol instead of growing
  /// the grammar.
  pub(crate) derived_cache: BTreeMap<(SymbolId, super::OriginKind), SymbolId>,
}

impl Default for Grammar {
  fn default() -> Self {
    Self::new()
  }
}

impl Grammar {
  pub fn new() -> Self {
    let mut g = Self {
      symbols: Vec::new(),
      productions: Vec::new(),
      name_to_symbol: BTreeMap::new(),
      goal: None,
      eof: SymbolId::UNDEFINED,
      flags: GrammarFlags::default(),
      diagnostics: Vec::new(),
      derived_cache: BTreeMap::new(),
    };
    let eof_id = SymbolId::from(0u32);
    let mut eof = Symbol::new(eof_id, "$eof", SymbolKind::Terminal);
    eof.flags.special = true;
    eof.flags.nameless = true;
    g.symbols.push(eof);
    g.eof = eof_id;
    g
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  /// Read-only view over every symbol slot, including dropped ones (mirrors
  /// `Grammar::productions` in that respect; check `Symbol::flags` or
  /// `sym_by_name` for liveness).
  pub fn symbols(&self) -> &[Symbol] {
    &self.symbols
  }

  /// Read-only view over every production slot. Tombstoned productions
  /// (`Production::dropped`) stay in place so `ProductionId`s never shift;
  /// filter on `dropped` when liveness matters.
  pub fn productions(&self) -> &[Production] {
    &self.productions
  }

  pub(crate) fn push_diagnostic(&mut self, d: Diagnostic) {
    self.diagnostics.push(d);
  }

  pub fn symbol(&self, id: SymbolId) -> UniccResult<&Symbol> {
    self.symbols.get(id.index()).ok_or(CoreError::UnknownSymbol { id: id.0 })
  }

  pub fn symbol_mut(&mut self, id: SymbolId) -> UniccResult<&mut Symbol> {
    self.symbols.get_mut(id.index()).ok_or(CoreError::UnknownSymbol { id: id.0 })
  }

  pub fn production(&self, id: ProductionId) -> UniccResult<&Production> {
    self.productions.get(id.index()).ok_or(CoreError::UnknownProduction { id: id.0 })
  }

  pub fn production_mut(&mut self, id: ProductionId) -> UniccResult<&mut Production> {
    self.productions.get_mut(id.index()).ok_or(CoreError::UnknownProduction { id: id.0 })
  }

  fn check_mutable(&self) -> UniccResult<()> {
    if self.flags.frozen {
      return Err(CoreError::GrammarFrozen);
    }
    Ok(())
  }

  /// Creates a new symbol. `name` is `None` for anonymous/derived symbols;
  /// a repeated `Some(name)` for an existing nonterminal returns the
  /// existing id instead of creating a duplicate.
  pub fn sym_create(&mut self, name: Option<&str>, kind: SymbolKind, pattern: Option<Pattern>) -> UniccResult<SymbolId> {
    self.check_mutable()?;
    if let Some(name) = name {
      if let Some(&existing) = self.name_to_symbol.get(name) {
        self.push_diagnostic(Diagnostic::new(
          DiagnosticKind::RedefinedSymbol,
          format!("symbol `{name}` redefined; keeping the first declaration"),
        ));
        return Ok(existing);
      }
    }
    let id = SymbolId::from(self.symbols.len());
    let display_name = name.map(str::to_string).unwrap_or_else(|| format!("__anon_{}", id.0));
    let mut sym = Symbol::new(id, display_name.clone(), kind);
    sym.pattern = pattern;
    sym.flags.nameless = name.is_none();
    sym.flags.generated = name.is_none();
    sym.flags.defined = name.is_some();
    if let Some(name) = name {
      self.name_to_symbol.insert(name.to_string(), id);
    }
    self.symbols.push(sym);
    Ok(id)
  }

  /// Removes `id` and cascades per spec.md §4.1: every production whose
  /// `lhs` is `id` is freed (its rhs symbols' usage counts decremented,
  /// and it is detached from the grammar's live production set), and every
  /// remaining rhs occurrence of `id` elsewhere is erased in place.
  pub fn sym_drop(&mut self, id: SymbolId) -> UniccResult<()> {
    self.check_mutable()?;
    self.symbol(id)?;

    let own_prods: Vec<ProductionId> = self.symbol(id)?.productions.clone();
    for pid in own_prods {
      self.drop_production(pid)?;
    }

    let occurrences: Vec<ProductionId> =
      self.productions.iter().filter(|p| !p.dropped && p.rhs.contains(&id)).map(|p| p.id).collect();
    for pid in occurrences {
      while self.production(pid)?.rhs.contains(&id) {
        self.prod_remove(pid, id)?;
      }
    }

    self.name_to_symbol.retain(|_, v| *v != id);
    self.flags.finalized = false;
    Ok(())
  }

  /// Tombstones a whole production: clears its rhs (decrementing usage on
  /// every symbol it referenced), marks it `dropped`, and detaches it from
  /// its lhs symbol's production list. The slot itself stays in
  /// `self.productions` so no other `ProductionId` needs to shift.
  fn drop_production(&mut self, pid: ProductionId) -> UniccResult<()> {
    let lhs = self.production(pid)?.lhs;
    let rhs = self.production(pid)?.rhs.clone();
    for s in rhs {
      if let Ok(sym) = self.symbol_mut(s) {
        sym.usage = sym.usage.saturating_sub(1);
      }
    }
    let p = self.production_mut(pid)?;
    p.rhs.clear();
    p.dropped = true;
    if let Ok(sym) = self.symbol_mut(lhs) {
      sym.productions.retain(|x| *x != pid);
    }
    Ok(())
  }

  pub fn sym_by_name(&self, name: &str) -> Option<SymbolId> {
    self.name_to_symbol.get(name).copied()
  }

  /// Rewrites every id in the name index through `remap`. Used by
  /// `gram_prepare`'s symbol banding pass, which permutes symbol indices.
  pub(crate) fn remap_name_index(&mut self, remap: impl Fn(SymbolId) -> SymbolId) {
    for id in self.name_to_symbol.values_mut() {
      *id = remap(*id);
    }
  }

  pub fn prod_create(&mut self, lhs: SymbolId) -> UniccResult<ProductionId> {
    self.check_mutable()?;
    self.symbol(lhs)?;
    let id = ProductionId::from(self.productions.len());
    self.productions.push(Production::new(id, lhs));
    self.symbol_mut(lhs)?.productions.push(id);
    Ok(id)
  }

  pub fn prod_append(&mut self, prod: ProductionId, sym: SymbolId) -> UniccResult<()> {
    self.check_mutable()?;
    self.symbol(sym)?;
    self.production_mut(prod)?.rhs.push(sym);
    self.symbol_mut(sym)?.usage += 1;
    Ok(())
  }

  /// Erases the first occurrence of `sym` from `prod`'s rhs, decrementing
  /// `sym.usage` and invalidating `finalized`, per spec.md §4.1. A no-op if
  /// `sym` does not occur in `prod`'s rhs.
  pub fn prod_remove(&mut self, prod: ProductionId, sym: SymbolId) -> UniccResult<()> {
    self.check_mutable()?;
    self.symbol(sym)?;
    let removed = {
      let p = self.production_mut(prod)?;
      match p.rhs.iter().position(|s| *s == sym) {
        Some(pos) => {
          p.rhs.remove(pos);
          true
        }
        None => false,
      }
    };
    if removed {
      if let Ok(s) = self.symbol_mut(sym) {
        s.usage = s.usage.saturating_sub(1);
      }
      self.flags.finalized = false;
    }
    Ok(())
  }

  pub fn set_goal(&mut self, sym: SymbolId) -> UniccResult<()> {
    self.check_mutable()?;
    self.symbol(sym)?;
    self.goal = Some(sym);
    Ok(())
  }

  pub fn freeze(&mut self) {
    self.flags.frozen = true;
  }

  /// Renders the grammar back to BNF-like source text. Not a faithful
  /// round-trip of original formatting (comments, whitespace) but a
  /// semantically equivalent reconstruction, per the textual-dump redesign
  /// this core exposes in place of the original's XML writer.
  pub fn gram_to_bnf(&self) -> String {
    let mut out = String::new();
    for sym in &self.symbols {
      if sym.is_nonterminal() {
        let rules: Vec<String> =
          sym.productions.iter().filter_map(|pid| self.production(*pid).ok()).map(|p| p.to_bnf_string(self)).collect();
        let _ = writeln!(out, "@{} : {} ;", sym.name, rules.join(" | "));
      }
    }
    out
  }

  /// JSON dump following the `{symbols, productions}` schema.
  pub fn to_json(&self) -> String {
    let mut out = String::from("{\n  \"symbols\": [\n");
    for (i, sym) in self.symbols.iter().enumerate() {
      let ty = if sym.is_terminal() { "terminal" } else { "nonterminal" };
      let regexp = match &sym.pattern {
        Some(Pattern::Regex(r)) => format!(",\"regexp\":\"{}\"", escape_json(r)),
        _ => String::new(),
      };
      let emit = match &sym.emit {
        Some(e) => format!(",\"emit\":\"{}\"", escape_json(e)),
        None => String::new(),
      };
      let _ = write!(
        out,
        "    {{\"symbol\":{},\"type\":\"{}\",\"name\":\"{}\"{}{}}}",
        sym.id.0,
        ty,
        escape_json(&sym.name),
        emit,
        regexp
      );
      if i + 1 != self.symbols.len() {
        out.push(',');
      }
      out.push('\n');
    }
    out.push_str("  ],\n  \"productions\": [\n");
    let live: Vec<&super::Production> = self.productions.iter().filter(|p| !p.dropped).collect();
    for (i, prod) in live.iter().enumerate() {
      let emit = match &prod.emit {
        Some(e) => format!(",\"emit\":\"{}\"", escape_json(e)),
        None => String::new(),
      };
      let rhs: Vec<String> = prod.rhs.iter().map(|s| s.0.to_string()).collect();
      let _ = write!(out, "    {{\"production\":{},\"lhs\":{}{},\"rhs\":[{}]}}", prod.id.0, prod.lhs.0, emit, rhs.join(","));
      if i + 1 != live.len() {
        out.push(',');
      }
      out.push('\n');
    }
    out.push_str("  ]\n}\n");
    out
  }
}

fn escape_json(s: &str) -> String {
  s.chars().flat_map(|c| match c {
    '"' => vec!['\\', '"'],
    '\\' => vec!['\\', '\\'],
    '\n' => vec!['\\', 'n'],
    c => vec![c],
  }).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::SymbolKind;

  /// spec.md §4.1: `prod_remove(p, s)` erases one rhs occurrence and
  /// decrements the removed symbol's usage count.
  #[test]
  fn prod_remove_erases_one_occurrence_and_decrements_usage() {
    let mut g = Grammar::new();
    let a = g.sym_create(Some("a"), SymbolKind::Terminal, Some(Pattern::Literal("a".into()))).unwrap();
    let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();
    let p = g.prod_create(s).unwrap();
    g.prod_append(p, a).unwrap();
    g.prod_append(p, a).unwrap();
    assert_eq!(g.symbol(a).unwrap().usage, 2);

    g.prod_remove(p, a).unwrap();
    assert_eq!(g.production(p).unwrap().rhs, vec![a]);
    assert_eq!(g.symbol(a).unwrap().usage, 1);
  }

  /// spec.md §4.1: `sym_drop` cascades — every production with the dropped
  /// symbol as lhs is freed, and every remaining rhs occurrence elsewhere
  /// is erased.
  #[test]
  fn sym_drop_cascades_owned_productions_and_rhs_occurrences() {
    let mut g = Grammar::new();
    let a = g.sym_create(Some("a"), SymbolKind::Terminal, Some(Pattern::Literal("a".into()))).unwrap();
    let b = g.sym_create(Some("b"), SymbolKind::NonTerminal, None).unwrap();
    let s = g.sym_create(Some("s"), SymbolKind::NonTerminal, None).unwrap();

    let bp = g.prod_create(b).unwrap();
    g.prod_append(bp, a).unwrap();

    let sp = g.prod_create(s).unwrap();
    g.prod_append(sp, b).unwrap();
    g.prod_append(sp, a).unwrap();

    g.sym_drop(b).unwrap();

    assert!(g.production(bp).unwrap().dropped);
    assert!(g.production(bp).unwrap().rhs.is_empty());
    assert_eq!(g.symbol(a).unwrap().usage, 1);
    assert_eq!(g.production(sp).unwrap().rhs, vec![a]);
    assert!(g.sym_by_name("b").is_none());
  }

  /// spec.md §6's `prod_to_str` rendering, plus the `symbols()`/
  /// `productions()` read-only accessors.
  #[test]
  fn production_renders_bnf_and_accessors_see_every_slot() {
    let mut g = Grammar::new();
    let plus = g.sym_create(Some("+"), SymbolKind::Terminal, Some(Pattern::Literal("+".into()))).unwrap();
    let expr = g.sym_create(Some("expr"), SymbolKind::NonTerminal, None).unwrap();
    let p = g.prod_create(expr).unwrap();
    g.prod_append(p, expr).unwrap();
    g.prod_append(p, plus).unwrap();
    g.prod_append(p, expr).unwrap();

    assert_eq!(g.production(p).unwrap().to_bnf_string(&g), "expr '+' expr");
    assert_eq!(g.symbols().len(), g.symbols.len());
    assert_eq!(g.productions().len(), g.productions.len());
  }

  /// spec.md §7: redeclaring a symbol name keeps the first declaration and
  /// records a `RedefinedSymbol` diagnostic instead of silently duplicating.
  #[test]
  fn sym_create_duplicate_name_pushes_redefined_diagnostic() {
    let mut g = Grammar::new();
    let first = g.sym_create(Some("x"), SymbolKind::Terminal, Some(Pattern::Literal("x".into()))).unwrap();
    let second = g.sym_create(Some("x"), SymbolKind::Terminal, Some(Pattern::Literal("y".into()))).unwrap();
    assert_eq!(first, second);
    assert!(g.diagnostics().iter().any(|d| d.kind == crate::error::DiagnosticKind::RedefinedSymbol));
  }
}
