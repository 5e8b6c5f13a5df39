//! A small regex parser covering the subset spec.md §9 asks for: literal
//! characters, `.`, `[...]`/`[^...]` classes with ranges, grouping,
//! alternation and the `* + ?` postfix quantifiers. This is the "opaque
//! pattern compiler" spec.md §1 treats as an external collaborator's
//! concern elsewhere in the UniCC ecosystem; here it is hand-rolled to keep
//! the core dependency-free, matching the teacher's own choice not to pull
//! in a regex crate for `radlr-core`.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::CoreError;

use super::charset::CharSet;

#[derive(Debug, Clone)]
pub enum ReNode {
  Char(char),
  Class(CharSet),
  Concat(Vec<ReNode>),
  Alt(Vec<ReNode>),
  Star(Box<ReNode>),
  Plus(Box<ReNode>),
  Opt(Box<ReNode>),
}

pub fn parse(source: &str) -> Result<ReNode, CoreError> {
  let mut p = Parser { chars: source.chars().peekable(), source };
  let node = p.parse_alt()?;
  if p.chars.peek().is_some() {
    return Err(p.err("trailing characters after a complete pattern"));
  }
  Ok(node)
}

/// Parses the body of a `[...]` class, i.e. the text between the brackets
/// with any leading `^` already consumed by the caller. Shared between the
/// regex grammar's own `[...]` atoms and the [`Pattern::CharClass`]
/// terminal form, which stores exactly this body.
pub fn parse_charclass_body(body: &str) -> Result<CharSet, CoreError> {
  let mut p = Parser { chars: body.chars().peekable(), source: body };
  p.parse_class_body()
}

struct Parser<'a> {
  chars: Peekable<Chars<'a>>,
  source: &'a str,
}

impl<'a> Parser<'a> {
  fn err(&self, reason: &str) -> CoreError {
    CoreError::InvalidPattern { pattern: self.source.to_string(), reason: reason.to_string() }
  }

  fn parse_alt(&mut self) -> Result<ReNode, CoreError> {
    let mut branches = vec![self.parse_concat()?];
    while self.chars.peek() == Some(&'|') {
      self.chars.next();
      branches.push(self.parse_concat()?);
    }
    Ok(if branches.len() == 1 { branches.pop().unwrap() } else { ReNode::Alt(branches) })
  }

  fn parse_concat(&mut self) -> Result<ReNode, CoreError> {
    let mut parts = Vec::new();
    while matches!(self.chars.peek(), Some(c) if *c != '|' && *c != ')') {
      parts.push(self.parse_postfix()?);
    }
    Ok(match parts.len() {
      0 => ReNode::Concat(Vec::new()),
      1 => parts.pop().unwrap(),
      _ => ReNode::Concat(parts),
    })
  }

  fn parse_postfix(&mut self) -> Result<ReNode, CoreError> {
    let atom = self.parse_atom()?;
    Ok(match self.chars.peek() {
      Some('*') => {
        self.chars.next();
        ReNode::Star(Box::new(atom))
      }
      Some('+') => {
        self.chars.next();
        ReNode::Plus(Box::new(atom))
      }
      Some('?') => {
        self.chars.next();
        ReNode::Opt(Box::new(atom))
      }
      _ => atom,
    })
  }

  fn parse_atom(&mut self) -> Result<ReNode, CoreError> {
    match self.chars.next() {
      Some('(') => {
        let inner = self.parse_alt()?;
        match self.chars.next() {
          Some(')') => Ok(inner),
          _ => Err(self.err("unterminated group, expected `)`")),
        }
      }
      Some('.') => Ok(ReNode::Class(CharSet::any_but_newline())),
      Some('[') => {
        let negated = self.chars.peek() == Some(&'^');
        if negated {
          self.chars.next();
        }
        let mut set = self.parse_class_body()?;
        if negated {
          set = set.complement();
        }
        Ok(ReNode::Class(set))
      }
      Some('\\') => match self.chars.next() {
        Some(c) => Ok(ReNode::Char(unescape(c))),
        None => Err(self.err("dangling `\\` at end of pattern")),
      },
      Some(c) => Ok(ReNode::Char(c)),
      None => Err(self.err("expected an atom, found end of pattern")),
    }
  }

  /// Parses `a-z0-9_` style class contents up to (but not consuming) a
  /// closing `]`, if one is present; used both for the regex grammar's
  /// `[...]` atoms (which expect a `]`) and for a bare [`Pattern::CharClass`]
  /// body (which does not have one, since its brackets were stripped by the
  /// front-end).
  fn parse_class_body(&mut self) -> Result<CharSet, CoreError> {
    let mut set = CharSet::empty();
    let mut any = false;
    loop {
      let Some(&c) = self.chars.peek() else { break };
      if c == ']' {
        self.chars.next();
        break;
      }
      self.chars.next();
      let lo = if c == '\\' {
        match self.chars.next() {
          Some(e) => unescape(e),
          None => return Err(self.err("dangling `\\` inside character class")),
        }
      } else {
        c
      };
      any = true;
      if self.chars.peek() == Some(&'-') {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        if let Some(&hi_candidate) = lookahead.peek() {
          if hi_candidate != ']' {
            self.chars.next();
            let hi_raw = self.chars.next().unwrap();
            let hi = if hi_raw == '\\' {
              match self.chars.next() {
                Some(e) => unescape(e),
                None => return Err(self.err("dangling `\\` inside character class")),
              }
            } else {
              hi_raw
            };
            if hi < lo {
              return Err(self.err("character class range is reversed"));
            }
            set = set.union(CharSet::range(lo, hi));
            continue;
          }
        }
      }
      set = set.union(CharSet::single(lo));
    }
    if !any {
      return Err(self.err("empty character class"));
    }
    Ok(set)
  }
}

fn unescape(c: char) -> char {
  match c {
    'n' => '\n',
    't' => '\t',
    'r' => '\r',
    '0' => '\0',
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_digit_plus() {
    let node = parse("[0-9]+").unwrap();
    assert!(matches!(node, ReNode::Plus(_)));
  }

  #[test]
  fn parses_alternation_and_grouping() {
    let node = parse("(a|b)c").unwrap();
    assert!(matches!(node, ReNode::Concat(_)));
  }

  #[test]
  fn rejects_reversed_range() {
    assert!(parse("[z-a]").is_err());
  }
}
