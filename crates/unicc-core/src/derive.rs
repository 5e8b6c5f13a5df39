//! Derivation helpers: the `+`, `?` and `*` EBNF modifiers, desugared into
//! plain BNF productions over a synthetic symbol.

use crate::error::UniccResult;
use crate::types::{Grammar, OriginKind, SymbolId, SymbolKind};

impl Grammar {
  fn derived_name(&self, origin: SymbolId, prefix: &str) -> UniccResult<String> {
    let base = &self.symbol(origin)?.name;
    let mut name = format!("{prefix}_{base}");
    let mut n = 1;
    while self.sym_by_name(&name).is_some() {
      name = format!("{prefix}_{base}_{n}");
      n += 1;
    }
    Ok(name)
  }

  fn obtain_derivative(&mut self, origin: SymbolId, kind: OriginKind, prefix: &str) -> UniccResult<SymbolId> {
    if let Some(&existing) = self.derived_cache.get(&(origin, kind)) {
      return Ok(existing);
    }
    let name = self.derived_name(origin, prefix)?;
    let id = self.sym_create(Some(&name), SymbolKind::NonTerminal, None)?;
    {
      let sym = self.symbol_mut(id)?;
      sym.origin = Some(origin);
      sym.origin_kind = kind;
      sym.flags.generated = true;
    }
    self.derived_cache.insert((origin, kind), id);
    Ok(id)
  }

  /// `x+` : one or more repetitions. Produces `pos_x : pos_x x | x`, or,
  /// when `flags.preventlrec` is set, the right-recursive `pos_x : x pos_x
  /// | x` instead (`grammar.c:365-368`).
  pub fn sym_mod_positive(&mut self, origin: SymbolId) -> UniccResult<SymbolId> {
    if let Some(&existing) = self.derived_cache.get(&(origin, OriginKind::Positive)) {
      return Ok(existing);
    }
    let id = self.obtain_derivative(origin, OriginKind::Positive, "pos")?;
    let rec = self.prod_create(id)?;
    if self.flags.preventlrec {
      self.prod_append(rec, origin)?;
      self.prod_append(rec, id)?;
    } else {
      self.prod_append(rec, id)?;
      self.prod_append(rec, origin)?;
    }
    let base = self.prod_create(id)?;
    self.prod_append(base, origin)?;
    Ok(id)
  }

  /// `x?` : zero or one. Produces `opt_x : x | ;`.
  pub fn sym_mod_optional(&mut self, origin: SymbolId) -> UniccResult<SymbolId> {
    if let Some(&existing) = self.derived_cache.get(&(origin, OriginKind::Optional)) {
      return Ok(existing);
    }
    let id = self.obtain_derivative(origin, OriginKind::Optional, "opt")?;
    let some = self.prod_create(id)?;
    self.prod_append(some, origin)?;
    self.prod_create(id)?;
    Ok(id)
  }

  /// `x*` : zero or more. Produces `kle_x : kle_x x | ;`, or, when
  /// `flags.preventlrec` is set, the right-recursive `kle_x : x kle_x | ;`
  /// instead (`grammar.c:365-368`).
  pub fn sym_mod_kleene(&mut self, origin: SymbolId) -> UniccResult<SymbolId> {
    if let Some(&existing) = self.derived_cache.get(&(origin, OriginKind::Kleene)) {
      return Ok(existing);
    }
    let id = self.obtain_derivative(origin, OriginKind::Kleene, "kle")?;
    let rec = self.prod_create(id)?;
    if self.flags.preventlrec {
      self.prod_append(rec, origin)?;
      self.prod_append(rec, id)?;
    } else {
      self.prod_append(rec, id)?;
      self.prod_append(rec, origin)?;
    }
    self.prod_create(id)?;
    Ok(id)
  }
}
