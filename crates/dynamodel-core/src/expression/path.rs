//! Document paths.

use std::fmt;

use crate::expression::condition::{CompareOp, Condition};
use crate::expression::update::UpdateAction;
use crate::marshal::{AttributeKind, Value};

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A map key or top-level attribute.
    Field(String),
    /// A list position.
    Index(usize),
}

/// An immutable document path such as `address.lines[0]`.
///
/// The first segment is always a field. It is a logical field name and is
/// translated to its wire name through the schema when compiled; later
/// segments are used as written. Paths are never parsed from text:
/// `Path::from("a.b")` is one attribute whose name contains a dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// A path to the top-level field `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    /// Extend with a nested map key.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Field(name.into()));
        self
    }

    /// Extend with a list index.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// All segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The logical name of the top-level field.
    #[must_use]
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Field(name)) => name,
            _ => "",
        }
    }

    /// Returns `true` if the path names a top-level attribute only.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// Returns `true` if one path is a prefix of the other, so updating both
    /// would touch the same part of a document.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let shared = self.segments.len().min(other.segments.len());
        self.segments[..shared] == other.segments[..shared]
    }

    // -----------------------------------------------------------------------
    // Condition shorthands
    // -----------------------------------------------------------------------

    /// `path = value`
    pub fn equals(self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Eq, value)
    }

    /// `path <> value`
    pub fn not_equals(self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Ne, value)
    }

    /// `path < value`
    pub fn less_than(self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Lt, value)
    }

    /// `path <= value`
    pub fn less_or_equal(self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Le, value)
    }

    /// `path > value`
    pub fn greater_than(self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Gt, value)
    }

    /// `path >= value`
    pub fn greater_or_equal(self, value: impl Into<Value>) -> Condition {
        self.compare(CompareOp::Ge, value)
    }

    /// Comparison with an explicit operator.
    pub fn compare(self, op: CompareOp, value: impl Into<Value>) -> Condition {
        Condition::Compare {
            path: self,
            op,
            value: value.into(),
        }
    }

    /// `path BETWEEN low AND high`
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Condition {
        Condition::Between {
            path: self,
            low: low.into(),
            high: high.into(),
        }
    }

    /// `begins_with(path, prefix)`
    pub fn begins_with(self, prefix: impl Into<Value>) -> Condition {
        Condition::BeginsWith {
            path: self,
            prefix: prefix.into(),
        }
    }

    /// `attribute_exists(path)`
    #[must_use]
    pub fn exists(self) -> Condition {
        Condition::Exists(self)
    }

    /// `attribute_not_exists(path)`
    #[must_use]
    pub fn not_exists(self) -> Condition {
        Condition::NotExists(self)
    }

    /// `path IN (values...)`
    pub fn is_in<I, V>(self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Condition::In {
            path: self,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `contains(path, value)`
    pub fn contains(self, value: impl Into<Value>) -> Condition {
        Condition::Contains {
            path: self,
            value: value.into(),
        }
    }

    /// `size(path) op value`
    pub fn size(self, op: CompareOp, value: impl Into<Value>) -> Condition {
        Condition::Size {
            path: self,
            op,
            value: value.into(),
        }
    }

    /// `attribute_type(path, kind)`
    #[must_use]
    pub fn is_type(self, kind: AttributeKind) -> Condition {
        Condition::AttributeType { path: self, kind }
    }

    // -----------------------------------------------------------------------
    // Update shorthands
    // -----------------------------------------------------------------------

    /// `SET path = value`
    pub fn set(self, value: impl Into<Value>) -> UpdateAction {
        UpdateAction::Set {
            path: self,
            value: value.into(),
        }
    }

    /// `SET path = if_not_exists(path, value)`
    pub fn set_if_not_exists(self, value: impl Into<Value>) -> UpdateAction {
        UpdateAction::SetIfNotExists {
            path: self,
            value: value.into(),
        }
    }

    /// `SET path = list_append(path, values)`
    pub fn append<I, V>(self, values: I) -> UpdateAction
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        UpdateAction::AppendToList {
            path: self,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// `REMOVE path`
    #[must_use]
    pub fn remove(self) -> UpdateAction {
        UpdateAction::Remove(self)
    }

    /// `ADD path value` on a number.
    pub fn add_number(self, value: impl Into<Value>) -> UpdateAction {
        UpdateAction::AddNumeric {
            path: self,
            value: value.into(),
        }
    }

    /// `ADD path value` on a set.
    #[must_use]
    pub fn add_to_set(self, value: Value) -> UpdateAction {
        UpdateAction::AddToSet { path: self, value }
    }

    /// `DELETE path value` on a set.
    #[must_use]
    pub fn delete_from_set(self, value: Value) -> UpdateAction {
        UpdateAction::DeleteFromSet { path: self, value }
    }
}

impl From<&str> for Path {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Path {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i > 0 => write!(f, ".{name}")?,
                PathSegment::Field(name) => f.write_str(name)?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}
