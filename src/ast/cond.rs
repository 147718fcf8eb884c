//! Conditional expression trees for `[[ ... ]]`
//!
//! A small binary tree. Evaluation belongs to the executor; this module only
//! builds nodes and checks their shape.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::word::Word;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CondKind {
    And = 1,
    Or = 2,
    Unary = 3,
    Binary = 4,
    Term = 5,
    Expr = 6,
}

impl fmt::Display for CondKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CondKind::And => "AND",
            CondKind::Or => "OR",
            CondKind::Unary => "UNARY",
            CondKind::Binary => "BINARY",
            CondKind::Term => "TERM",
            CondKind::Expr => "EXPR",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed {kind} node: {reason}")]
pub struct CondError {
    pub kind: CondKind,
    pub reason: &'static str,
}

/// One node of a conditional expression.
///
/// Child rules: `TERM` has none, `UNARY` has only `right`, `BINARY`, `AND`
/// and `OR` have both, `EXPR` groups a single `left` child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondExpr {
    pub kind: CondKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<Word>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<CondExpr>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<CondExpr>>,
}

impl CondExpr {
    pub fn term(word: Word) -> Self {
        Self {
            kind: CondKind::Term,
            op: Some(word),
            left: None,
            right: None,
        }
    }

    pub fn unary(op: Word, operand: CondExpr) -> Self {
        Self {
            kind: CondKind::Unary,
            op: Some(op),
            left: None,
            right: Some(Box::new(operand)),
        }
    }

    pub fn binary(op: Word, left: CondExpr, right: CondExpr) -> Self {
        Self {
            kind: CondKind::Binary,
            op: Some(op),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn and(left: CondExpr, right: CondExpr) -> Self {
        Self::connective(CondKind::And, left, right)
    }

    pub fn or(left: CondExpr, right: CondExpr) -> Self {
        Self::connective(CondKind::Or, left, right)
    }

    fn connective(kind: CondKind, left: CondExpr, right: CondExpr) -> Self {
        Self {
            kind,
            op: None,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Parenthesised group.
    pub fn expr(inner: CondExpr) -> Self {
        Self {
            kind: CondKind::Expr,
            op: None,
            left: Some(Box::new(inner)),
            right: None,
        }
    }

    /// Check the child-count rule for this node and every node below it.
    pub fn validate(&self) -> Result<(), CondError> {
        let (has_left, has_right) = (self.left.is_some(), self.right.is_some());
        let reason = match self.kind {
            CondKind::Term if has_left || has_right => Some("a term has no children"),
            CondKind::Unary if has_left || !has_right => {
                Some("a unary test has exactly one operand, on the right")
            }
            CondKind::Binary | CondKind::And | CondKind::Or if !(has_left && has_right) => {
                Some("needs both a left and a right child")
            }
            CondKind::Expr if !has_left || has_right => Some("a group wraps exactly one child"),
            _ => None,
        };
        if let Some(reason) = reason {
            debug!("conditional node {} rejected: {}", self.kind, reason);
            return Err(CondError {
                kind: self.kind,
                reason,
            });
        }
        if let Some(left) = &self.left {
            left.validate()?;
        }
        if let Some(right) = &self.right {
            right.validate()?;
        }
        Ok(())
    }

    /// Compact prefix form, e.g. `(AND (UNARY "-f" (TERM "x")) (TERM "y"))`.
    pub fn render(&self) -> String {
        let mut out = format!("({}", self.kind);
        if let Some(op) = &self.op {
            out.push(' ');
            out.push_str(&op.render());
        }
        for child in [&self.left, &self.right].into_iter().flatten() {
            out.push(' ');
            out.push_str(&child.render());
        }
        out.push(')');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(s: &str) -> CondExpr {
        CondExpr::term(Word::new(s))
    }

    #[test]
    fn test_well_formed_tree_validates() {
        let tree = CondExpr::or(
            CondExpr::and(
                CondExpr::unary(Word::new("-f"), term("file")),
                CondExpr::binary(Word::new("=="), term("$a"), term("b")),
            ),
            CondExpr::expr(term("x")),
        );
        assert_eq!(tree.validate(), Ok(()));
    }

    #[test]
    fn test_term_with_left_child_is_rejected() {
        let mut bad = term("x");
        bad.left = Some(Box::new(term("y")));
        let err = bad.validate().unwrap_err();
        assert_eq!(err.kind, CondKind::Term);
    }

    #[test]
    fn test_unary_operand_must_be_on_the_right() {
        let bad = CondExpr {
            kind: CondKind::Unary,
            op: Some(Word::new("-n")),
            left: Some(Box::new(term("x"))),
            right: None,
        };
        assert_eq!(bad.validate().unwrap_err().kind, CondKind::Unary);
    }

    #[test]
    fn test_binary_missing_child() {
        let mut bad = CondExpr::binary(Word::new("-eq"), term("1"), term("2"));
        bad.right = None;
        assert_eq!(bad.validate().unwrap_err().kind, CondKind::Binary);
    }

    #[test]
    fn test_violation_deep_in_tree_is_found() {
        let mut inner = CondExpr::expr(term("x"));
        inner.right = Some(Box::new(term("y")));
        let tree = CondExpr::and(term("a"), inner);
        assert_eq!(tree.validate().unwrap_err().kind, CondKind::Expr);
    }

    #[test]
    fn test_render() {
        let tree = CondExpr::and(CondExpr::unary(Word::new("-f"), term("x")), term("y"));
        assert_eq!(tree.render(), "(AND (UNARY \"-f\" (TERM \"x\")) (TERM \"y\"))");
    }
}
