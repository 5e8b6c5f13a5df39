//! C10: the AST produced by the push driver's reduce phase.
//!
//! spec.md §3 describes nodes linked by `prev`/`next` sibling pointers; this
//! reimplementation instead stores each node's children as an owned `Vec`,
//! the idiomatic-Rust counterpart of an arena of sibling-linked nodes (see
//! DESIGN.md's note on this redesign, consistent with spec.md §9's general
//! preference for index/vector-owned structures over pointer chains).
//! Sibling traversal, nth-emit lookup and sibling-chain length are all still
//! exposed exactly as spec.md §4.10 names them, just as slice operations.

use std::fmt::Write as _;

use unicc_core::types::{ProductionId, Span, SymbolId};

/// An embedder-attached scalar, optionally carried by an [`AstNode`] (spec.md
/// §3's "optional value"). Kept as a small closed enum rather than
/// `Box<dyn Any>`: UniCC's own embedders only ever attach literal scalars
/// through `reducefn`, never arbitrary types.
#[derive(Debug, Clone, PartialEq)]
pub enum AstValue {
  Str(String),
  Int(i64),
  Float(f64),
  Bool(bool),
}

#[derive(Debug, Clone)]
pub struct AstNode {
  pub emit: Option<String>,
  pub symbol: SymbolId,
  pub production: Option<ProductionId>,
  pub span: Span,
  pub children: Vec<AstNode>,
  pub value: Option<AstValue>,
}

/// The three points at which [`AstNode::visit`] invokes its callback,
/// matching spec.md §4.10's depth-first visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitEvent {
  TopDown,
  /// Fired once between each pair of consecutive children, i.e. `n-1`
  /// times for `n` children.
  PassOver,
  BottomUp,
}

impl AstNode {
  pub fn new(emit: Option<String>, symbol: SymbolId, production: Option<ProductionId>, span: Span) -> Self {
    Self { emit, symbol, production, span, children: Vec::new(), value: None }
  }

  pub fn leaf(symbol: SymbolId, span: Span) -> Self {
    Self::new(None, symbol, None, span)
  }

  pub fn is_leaf(&self) -> bool {
    self.production.is_none()
  }

  /// Length of this node's sibling chain, i.e. its number of children.
  pub fn child_count(&self) -> usize {
    self.children.len()
  }

  /// The `n`-th child (0-indexed) whose `emit` equals `label`.
  pub fn nth_emit(&self, label: &str, n: usize) -> Option<&AstNode> {
    self.children.iter().filter(|c| c.emit.as_deref() == Some(label)).nth(n)
  }

  pub fn visit(&self, depth: usize, f: &mut impl FnMut(&AstNode, VisitEvent, usize)) {
    f(self, VisitEvent::TopDown, depth);
    for (i, child) in self.children.iter().enumerate() {
      if i > 0 {
        f(self, VisitEvent::PassOver, depth);
      }
      child.visit(depth + 1, f);
    }
    f(self, VisitEvent::BottomUp, depth);
  }

  fn label(&self) -> String {
    self.emit.clone().unwrap_or_else(|| format!("sym{}", self.symbol.0))
  }

  /// One line per node, indented by depth, no spans or values.
  pub fn dump_indented_short(&self) -> String {
    let mut out = String::new();
    self.visit(0, &mut |node, event, depth| {
      if event == VisitEvent::TopDown {
        let _ = writeln!(out, "{}{}", "  ".repeat(depth), node.label());
      }
    });
    out
  }

  /// One line per node, indented, with symbol index, span and value.
  pub fn dump_indented_detailed(&self) -> String {
    let mut out = String::new();
    self.visit(0, &mut |node, event, depth| {
      if event == VisitEvent::TopDown {
        let value = node.value.as_ref().map(|v| format!(" = {v:?}")).unwrap_or_default();
        let _ = writeln!(out, "{}{} [sym={}, span={}..{}]{}", "  ".repeat(depth), node.label(), node.symbol.0, node.span.start, node.span.end, value);
      }
    });
    out
  }

  /// A compact YAML-flavored dump. Not meant to round-trip through a YAML
  /// parser, just a human/diff-friendly nesting format.
  pub fn dump_yaml(&self) -> String {
    let mut out = String::new();
    self.write_yaml(&mut out, 0);
    out
  }

  fn write_yaml(&self, out: &mut String, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}- node: {}", self.label());
    let _ = writeln!(out, "{indent}  span: [{}, {}]", self.span.start, self.span.end);
    if !self.children.is_empty() {
      let _ = writeln!(out, "{indent}  children:");
      for child in &self.children {
        child.write_yaml(out, depth + 2);
      }
    }
  }

  pub fn dump_json(&self) -> String {
    let mut out = String::new();
    self.write_json(&mut out);
    out
  }

  fn write_json(&self, out: &mut String) {
    let _ = write!(out, "{{\"node\":\"{}\",\"symbol\":{},\"span\":[{},{}]", escape_json(&self.label()), self.symbol.0, self.span.start, self.span.end);
    if let Some(value) = &self.value {
      let _ = write!(out, ",\"value\":{}", value_to_json(value));
    }
    if !self.children.is_empty() {
      out.push_str(",\"children\":[");
      for (i, child) in self.children.iter().enumerate() {
        if i > 0 {
          out.push(',');
        }
        child.write_json(out);
      }
      out.push(']');
    }
    out.push('}');
  }
}

fn value_to_json(v: &AstValue) -> String {
  match v {
    AstValue::Str(s) => format!("\"{}\"", escape_json(s)),
    AstValue::Int(i) => i.to_string(),
    AstValue::Float(f) => f.to_string(),
    AstValue::Bool(b) => b.to_string(),
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
  use unicc_core::types::SymbolId;

  fn leaf(sym: u32) -> AstNode {
    AstNode::leaf(SymbolId::from(sym), Span::new(0, 1))
  }

  #[test]
  fn visit_emits_passover_between_children_only() {
    let mut root = AstNode::new(Some("expr".into()), SymbolId::from(0), None, Span::new(0, 3));
    root.children = vec![leaf(1), leaf(2), leaf(3)];

    let mut passovers = 0;
    let mut topdowns = 0;
    root.visit(0, &mut |_, event, _| match event {
      VisitEvent::PassOver => passovers += 1,
      VisitEvent::TopDown => topdowns += 1,
      VisitEvent::BottomUp => {}
    });
    assert_eq!(passovers, 2);
    assert_eq!(topdowns, 4);
  }

  #[test]
  fn nth_emit_filters_by_label() {
    let mut root = AstNode::new(Some("list".into()), SymbolId::from(0), None, Span::new(0, 3));
    let mut a = leaf(1);
    a.emit = Some("item".into());
    let mut b = leaf(2);
    b.emit = Some("item".into());
    root.children = vec![a, b];
    assert!(root.nth_emit("item", 1).is_some());
    assert!(root.nth_emit("item", 2).is_none());
  }
}
