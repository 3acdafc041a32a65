use crate::value::Value;
use std::ops::{BitAnd, BitOr, Not};

///
/// Predicate AST
///
/// Pure, schema-agnostic representation of listing restrictions. This layer
/// carries no evaluation semantics; the remote listing service interprets
/// the tree. The engine only validates field references and combines trees.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComparePredicate {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl ComparePredicate {
    fn new(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
    IsNull { field: String },
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub const fn or(preds: Vec<Self>) -> Self {
        Self::Or(preds)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(pred: Self) -> Self {
        Self::Not(Box::new(pred))
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Eq, value))
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Ne, value))
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Lt, value))
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Lte, value))
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Gt, value))
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Gte, value))
    }

    #[must_use]
    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::Contains, value))
    }

    #[must_use]
    pub fn starts_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, CompareOp::StartsWith, value))
    }

    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    /// Combine with another predicate via AND, flattening the left side.
    #[must_use]
    pub fn and_with(self, other: Self) -> Self {
        match self {
            Self::And(mut preds) => {
                preds.push(other);
                Self::And(preds)
            }
            existing => Self::And(vec![existing, other]),
        }
    }

    /// Every field name referenced anywhere in the tree, in encounter order.
    #[must_use]
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::And(preds) | Self::Or(preds) => {
                for pred in preds {
                    pred.collect_fields(out);
                }
            }
            Self::Not(pred) => pred.collect_fields(out),
            Self::Compare(cmp) => out.push(&cmp.field),
            Self::IsNull { field } => out.push(field),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and_with(rhs)
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        match self {
            Self::Or(mut preds) => {
                preds.push(rhs);
                Self::Or(preds)
            }
            existing => Self::Or(vec![existing, rhs]),
        }
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_with_flattens_left_conjunction() {
        let combined = Predicate::eq("subject", "a")
            .and_with(Predicate::gt("size", 10))
            .and_with(Predicate::is_null("categories"));

        match combined {
            Predicate::And(preds) => assert_eq!(preds.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn referenced_fields_walks_the_whole_tree() {
        let pred = (Predicate::eq("subject", "a") | Predicate::contains("body", "b"))
            & !Predicate::is_null("received");

        assert_eq!(pred.referenced_fields(), vec!["subject", "body", "received"]);
    }

    #[test]
    fn operator_sugar_matches_constructors() {
        let via_ops = Predicate::eq("subject", "a") & Predicate::eq("size", 1);
        let via_ctor = Predicate::eq("subject", "a").and_with(Predicate::eq("size", 1));
        assert_eq!(via_ops, via_ctor);
    }
}
