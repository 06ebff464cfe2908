//! Condition trees for key conditions, filters and conditional writes.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

use crate::expression::path::Path;
use crate::marshal::{AttributeKind, Value};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// A boolean condition over item attributes.
///
/// Build leaves with the [`Path`] shorthands and combine them with `&`, `|`
/// and `!`. Chained `&` (or `|`) collapse into one n-ary node:
///
/// ```
/// use dynamodel_core::expression::{Condition, Path};
///
/// let c = Path::new("a").equals(1) & Path::new("b").exists() & Path::new("c").not_exists();
/// assert!(matches!(c, Condition::And(ref children) if children.len() == 3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `path op value`
    Compare {
        /// Attribute compared.
        path: Path,
        /// Operator.
        op: CompareOp,
        /// Right-hand value.
        value: Value,
    },
    /// `path BETWEEN low AND high`, inclusive.
    Between {
        /// Attribute tested.
        path: Path,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
    },
    /// `begins_with(path, prefix)`
    BeginsWith {
        /// Attribute tested.
        path: Path,
        /// String or binary prefix.
        prefix: Value,
    },
    /// `attribute_exists(path)`
    Exists(Path),
    /// `attribute_not_exists(path)`
    NotExists(Path),
    /// `path IN (values...)`
    In {
        /// Attribute tested.
        path: Path,
        /// Candidates.
        values: Vec<Value>,
    },
    /// `contains(path, value)`: substring or set membership.
    Contains {
        /// Attribute tested.
        path: Path,
        /// Substring or element.
        value: Value,
    },
    /// `size(path) op value`
    Size {
        /// Attribute measured.
        path: Path,
        /// Operator.
        op: CompareOp,
        /// Numeric right-hand value.
        value: Value,
    },
    /// `attribute_type(path, kind)`
    AttributeType {
        /// Attribute tested.
        path: Path,
        /// Expected kind.
        kind: AttributeKind,
    },
    /// All children hold.
    And(Vec<Condition>),
    /// Any child holds.
    Or(Vec<Condition>),
    /// The child does not hold.
    Not(Box<Condition>),
}

impl Condition {
    /// Conjunction of all `conditions`. An empty input yields an empty tree.
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        conditions
            .into_iter()
            .fold(Self::And(Vec::new()), |acc, c| acc & c)
    }

    /// Disjunction of all `conditions`. An empty input yields an empty tree.
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        conditions
            .into_iter()
            .fold(Self::Or(Vec::new()), |acc, c| acc | c)
    }

    /// Returns `true` if the tree holds no leaf condition.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.iter().all(Self::is_empty),
            Self::Not(child) => child.is_empty(),
            _ => false,
        }
    }

    /// The path a leaf condition tests. `None` for combinators.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Compare { path, .. }
            | Self::Between { path, .. }
            | Self::BeginsWith { path, .. }
            | Self::Exists(path)
            | Self::NotExists(path)
            | Self::In { path, .. }
            | Self::Contains { path, .. }
            | Self::Size { path, .. }
            | Self::AttributeType { path, .. } => Some(path),
            Self::And(_) | Self::Or(_) | Self::Not(_) => None,
        }
    }

    /// Returns `true` if any leaf in the tree tests the top-level field `name`.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.iter().any(|c| c.references(name))
            }
            Self::Not(child) => child.references(name),
            leaf => leaf.path().is_some_and(|p| p.root() == name),
        }
    }
}

impl BitAnd for Condition {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        let mut children = match self {
            Self::And(children) => children,
            other => vec![other],
        };
        match rhs {
            Self::And(more) => children.extend(more),
            other => children.push(other),
        }
        Self::And(children)
    }
}

impl BitOr for Condition {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        let mut children = match self {
            Self::Or(children) => children,
            other => vec![other],
        };
        match rhs {
            Self::Or(more) => children.extend(more),
            other => children.push(other),
        }
        Self::Or(children)
    }
}

impl Not for Condition {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_flatten_same_combinators() {
        let a = Path::new("a").exists();
        let b = Path::new("b").exists();
        let c = Path::new("c").exists();
        let d = Path::new("d").exists();

        let and = (a.clone() & b.clone()) & (c.clone() & d.clone());
        assert_eq!(
            and,
            Condition::And(vec![a.clone(), b.clone(), c.clone(), d.clone()])
        );

        let mixed = (a.clone() | b.clone()) & c.clone();
        assert_eq!(
            mixed,
            Condition::And(vec![Condition::Or(vec![a, b]), c])
        );
    }

    #[test]
    fn test_should_detect_empty_tree() {
        assert!(Condition::all(Vec::new()).is_empty());
        assert!(Condition::And(vec![Condition::Or(Vec::new())]).is_empty());
        assert!(!Condition::all([Path::new("a").exists()]).is_empty());
    }

    #[test]
    fn test_should_find_references() {
        let cond = Path::new("status").equals("open") & !Path::new("address").field("zip").exists();
        assert!(cond.references("status"));
        assert!(cond.references("address"));
        assert!(!cond.references("zip"));
    }
}
