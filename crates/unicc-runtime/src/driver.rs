//! C9: the push-mode LR driver. Consumes one [`Token`] at a time, performs
//! shifts/reductions against an [`EncodedTable`] produced by `unicc-core`,
//! and builds an [`AstNode`] tree — exactly the "C9 orchestrates C7+C8 at
//! runtime to produce C10" control flow from spec.md §2.

use unicc_core::lalr::{EncodedTable, LR_REDUCE, LR_SHIFT};
use unicc_core::types::{Grammar, ProductionId, Span, SymbolId};

use crate::ast::AstNode;
use crate::error::RuntimeError;
use crate::token::Token;

/// The three outcomes spec.md §4.9 names for `parctx_next`. A `Next` result
/// does not by itself say whether the just-supplied token was consumed —
/// see [`ParserCtx::consumed_last`], which `par_parse`'s tokenization loop
/// checks to decide whether to fetch a fresh token or resupply the same
/// one (spec.md §9's push-driver design note discusses this same-token
/// resupply need, there in the context of whitespace bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
  Next,
  Done,
  Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseStatus {
  Running,
  Done,
  Error,
}

struct Frame {
  state: usize,
  span: Span,
  node: Option<AstNode>,
}

enum DecodedAction {
  Shift(usize),
  Reduce(ProductionId),
  ShiftReduce(ProductionId),
  Error,
}

/// Reduction semantic hook: invoked immediately before a production's
/// frames are popped, with the production's index and its children's AST
/// nodes so far (in rhs order). Returning `Some` attaches an
/// [`crate::ast::AstValue`] to the produced node.
pub type ReduceFn<'p> = dyn FnMut(ProductionId, &[AstNode]) -> Option<crate::ast::AstValue> + 'p;

pub struct ParserCtx<'p> {
  grammar: &'p Grammar,
  table: &'p EncodedTable,
  stack: Vec<Frame>,
  /// Last state entered by a non-whitespace shift, used instead of the
  /// live top-of-stack state when building expected-symbol diagnostics, so
  /// a parse error inside a run of (grammar-level) whitespace tokens still
  /// names the symbols expected at the last meaningful position. Mirrors
  /// the legacy driver's `dstate` field (spec.md §9).
  dstate: usize,
  pending_reduce: Option<ProductionId>,
  consumed: bool,
  status: ParseStatus,
  pub ast: Option<AstNode>,
  pub error: Option<RuntimeError>,
  pub reduce_fn: Option<Box<ReduceFn<'p>>>,
}

impl<'p> ParserCtx<'p> {
  pub fn new(grammar: &'p Grammar, table: &'p EncodedTable) -> Self {
    let initial = Frame { state: 0, span: Span::default(), node: None };
    Self {
      grammar,
      table,
      stack: vec![initial],
      dstate: 0,
      pending_reduce: None,
      consumed: false,
      status: ParseStatus::Running,
      ast: None,
      error: None,
      reduce_fn: None,
    }
  }

  /// Releases the stack and any partially built AST, readying this context
  /// to parse another input from scratch (spec.md §5).
  pub fn reset(&mut self) {
    self.stack = vec![Frame { state: 0, span: Span::default(), node: None }];
    self.dstate = 0;
    self.pending_reduce = None;
    self.consumed = false;
    self.status = ParseStatus::Running;
    self.ast = None;
    self.error = None;
  }

  /// Whether the token passed to the most recent [`ParserCtx::next`] call
  /// was actually consumed (shifted). `par_parse` uses this to know
  /// whether to fetch a new token or resupply the same one: a `Next`
  /// result that performed a bare reduce does not consume input, matching
  /// spec.md §4.9's reduce-phase/action-phase split.
  pub fn consumed_last(&self) -> bool {
    self.consumed
  }

  pub fn is_done(&self) -> bool {
    self.status == ParseStatus::Done
  }

  /// Advances the parse by exactly one primitive step: either the single
  /// reduction queued by a previous call, or one action-phase decision for
  /// `token` (a shift, a shift-reduce, queuing a reduce, or an error).
  pub fn next(&mut self, token: Token<'_>) -> StepResult {
    self.consumed = false;

    if let Some(prod) = self.pending_reduce.take() {
      return self.perform_reduce(prod);
    }

    let top_state = self.stack.last().expect("stack always has at least the sentinel frame").state;
    match self.decode_action(top_state, token.symbol) {
      DecodedAction::Shift(target) => {
        self.push_shift(token, target);
        StepResult::Next
      }
      DecodedAction::ShiftReduce(prod) => {
        // The combined action's "target" is a production, not a state:
        // the shifted token's virtual state is never looked up again
        // before the paired reduce pops it back off.
        self.push_shift(token, top_state);
        self.pending_reduce = Some(prod);
        StepResult::Next
      }
      DecodedAction::Reduce(prod) => {
        self.pending_reduce = Some(prod);
        StepResult::Next
      }
      DecodedAction::Error => {
        let expected = self.expected_symbols();
        self.error = Some(RuntimeError { found: token.symbol, span: token.span, expected });
        self.status = ParseStatus::Error;
        StepResult::Error
      }
    }
  }

  fn push_shift(&mut self, token: Token<'_>, target: usize) {
    let is_whitespace = self.grammar.symbol(token.symbol).map(|s| s.flags.whitespace).unwrap_or(false);
    let node = self.grammar.symbol(token.symbol).ok().filter(|s| s.emit.is_some()).map(|s| {
      let mut n = AstNode::leaf(token.symbol, token.span);
      n.emit = s.emit.clone().or_else(|| Some(s.name.clone()));
      n
    });
    self.stack.push(Frame { state: target, span: token.span, node });
    self.consumed = true;
    if !is_whitespace {
      self.dstate = target;
    }
  }

  fn perform_reduce(&mut self, prod_id: ProductionId) -> StepResult {
    let Ok(prod) = self.grammar.production(prod_id) else {
      self.status = ParseStatus::Error;
      return StepResult::Error;
    };
    let arity = prod.rhs.len();
    let lhs = prod.lhs;
    let pop_from = self.stack.len().saturating_sub(arity);
    let popped: Vec<Frame> = self.stack.split_off(pop_from);

    let span = popped.iter().fold(None::<Span>, |acc, f| {
      Some(match acc {
        None => f.span,
        Some(s) => Span::new(s.start.min(f.span.start), s.end.max(f.span.end)),
      })
    }).unwrap_or_default();

    let children: Vec<AstNode> = popped.into_iter().filter_map(|f| f.node).collect();

    let value = self.reduce_fn.as_mut().and_then(|f| f(prod_id, &children));

    let lhs_sym = self.grammar.symbol(lhs).ok();
    let emits = prod.emit.is_some() || lhs_sym.map(|s| s.flags.emits).unwrap_or(false);
    let node = if emits {
      let emit = prod.emit.clone().or_else(|| lhs_sym.and_then(|s| s.emit.clone()));
      let mut n = AstNode::new(emit, lhs, Some(prod_id), span);
      n.children = children;
      n.value = value;
      Some(n)
    } else {
      None
    };

    if self.stack.len() == 1 && Some(lhs) == self.grammar.goal {
      self.ast = node;
      self.status = ParseStatus::Done;
      return StepResult::Done;
    }

    let post_state = self.stack.last().expect("sentinel frame always present").state;
    let target = self.lookup_goto(post_state, lhs).unwrap_or(post_state);
    self.stack.push(Frame { state: target, span, node });
    self.dstate = target;
    StepResult::Next
  }

  fn decode_action(&self, state: usize, symbol: SymbolId) -> DecodedAction {
    let Some(row) = self.table.rows.get(state) else { return DecodedAction::Error };
    for (sym_idx, flags, target) in row.entries() {
      if sym_idx == symbol.0 + 1 {
        return match (flags & LR_SHIFT != 0, flags & LR_REDUCE != 0) {
          (true, true) => DecodedAction::ShiftReduce(ProductionId::from(target)),
          (true, false) => DecodedAction::Shift(target as usize),
          (false, true) => DecodedAction::Reduce(ProductionId::from(target)),
          (false, false) => DecodedAction::Error,
        };
      }
    }
    match row.default_reduction() {
      Some(p) => DecodedAction::Reduce(p),
      None => DecodedAction::Error,
    }
  }

  fn lookup_goto(&self, state: usize, symbol: SymbolId) -> Option<usize> {
    let row = self.table.rows.get(state)?;
    row.entries().find(|(s, _, _)| *s == symbol.0 + 1).map(|(_, _, t)| t as usize)
  }

  /// The terminals with a non-error action at `self.dstate`, for the
  /// "expected" list in a [`RuntimeError`].
  fn expected_symbols(&self) -> Vec<SymbolId> {
    let Some(row) = self.table.rows.get(self.dstate) else { return Vec::new() };
    row
      .entries()
      .filter(|(_, flags, _)| *flags & (LR_SHIFT | LR_REDUCE) != 0)
      .map(|(sym_idx, _, _)| SymbolId::from(sym_idx - 1))
      .filter(|id| self.grammar.symbol(*id).map(|s| s.is_terminal()).unwrap_or(false))
      .collect()
  }
}
