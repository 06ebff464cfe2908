//! Native values and their conversion to and from wire attribute values.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use bytes::Bytes;
use dynamodel_model::AttributeValue;

use crate::error::{MapperError, MapperResult};
use crate::marshal::number::Number;

/// A native value as application code sees it.
///
/// Maps are ordered and sets are ordered and duplicate-free, so two values
/// holding the same data are always equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// UTF-8 string.
    String(String),
    /// Exact decimal number.
    Number(Number),
    /// Raw bytes.
    Binary(Bytes),
    /// Boolean.
    Bool(bool),
    /// Explicit null.
    Null,
    /// Ordered list of values of any kind.
    List(Vec<Value>),
    /// Nested document.
    Map(BTreeMap<String, Value>),
    /// Set of strings.
    StringSet(BTreeSet<String>),
    /// Set of numbers.
    NumberSet(BTreeSet<Number>),
    /// Set of byte strings.
    BinarySet(BTreeSet<Bytes>),
}

/// The declared kind of a schema field, or the inferred kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// String.
    String,
    /// Any number.
    Number,
    /// A number that fits `i64` and has no fraction.
    Integer,
    /// A number exactly representable as `f64`.
    Float,
    /// Bytes.
    Binary,
    /// Boolean.
    Bool,
    /// Null.
    Null,
    /// List.
    List,
    /// Map.
    Map,
    /// String set.
    StringSet,
    /// Number set.
    NumberSet,
    /// Binary set.
    BinarySet,
}

impl AttributeKind {
    /// Returns `true` for kinds usable as a table or index key.
    #[must_use]
    pub fn is_key_scalar(self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::Integer | Self::Binary
        )
    }

    /// Returns `true` for the numeric kinds.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer | Self::Float)
    }

    /// Returns `true` for the set kinds.
    #[must_use]
    pub fn is_set(self) -> bool {
        matches!(self, Self::StringSet | Self::NumberSet | Self::BinarySet)
    }

    /// Wire tag this kind travels as.
    #[must_use]
    pub fn wire_tag(self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number | Self::Integer | Self::Float => "N",
            Self::Binary => "B",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::List => "L",
            Self::Map => "M",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Binary => "Binary",
            Self::Bool => "Bool",
            Self::Null => "Null",
            Self::List => "List",
            Self::Map => "Map",
            Self::StringSet => "StringSet",
            Self::NumberSet => "NumberSet",
            Self::BinarySet => "BinarySet",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Returns the string if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the number if this is a [`Value::Number`].
    #[must_use]
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Build a string set.
    pub fn string_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StringSet(items.into_iter().map(Into::into).collect())
    }

    /// Build a number set.
    pub fn number_set<I, N>(items: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Number>,
    {
        Self::NumberSet(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Self::Number(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Self::Binary(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

macro_rules! impl_value_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Self::Number(Number::from(v))
            }
        }
    )*};
}

impl_value_from_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// ---------------------------------------------------------------------------
// Native to wire
// ---------------------------------------------------------------------------

/// Returns the kind a value naturally carries. Numbers report
/// [`AttributeKind::Number`].
#[must_use]
pub fn kind_of(value: &Value) -> AttributeKind {
    match value {
        Value::String(_) => AttributeKind::String,
        Value::Number(_) => AttributeKind::Number,
        Value::Binary(_) => AttributeKind::Binary,
        Value::Bool(_) => AttributeKind::Bool,
        Value::Null => AttributeKind::Null,
        Value::List(_) => AttributeKind::List,
        Value::Map(_) => AttributeKind::Map,
        Value::StringSet(_) => AttributeKind::StringSet,
        Value::NumberSet(_) => AttributeKind::NumberSet,
        Value::BinarySet(_) => AttributeKind::BinarySet,
    }
}

/// Convert a native value to its wire form.
///
/// Fails with [`MapperError::TypeMismatch`] on an empty set, at any depth.
pub fn to_wire(value: &Value) -> MapperResult<AttributeValue> {
    Ok(match value {
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::Binary(b) => AttributeValue::B(b.clone()),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Null => AttributeValue::Null,
        Value::List(items) => AttributeValue::L(items.iter().map(to_wire).collect::<Result<_, _>>()?),
        Value::Map(entries) => AttributeValue::M(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_wire(v)?)))
                .collect::<MapperResult<HashMap<_, _>>>()?,
        ),
        Value::StringSet(set) => {
            non_empty(set.len(), AttributeKind::StringSet)?;
            AttributeValue::Ss(set.iter().cloned().collect())
        }
        Value::NumberSet(set) => {
            non_empty(set.len(), AttributeKind::NumberSet)?;
            AttributeValue::Ns(set.iter().map(ToString::to_string).collect())
        }
        Value::BinarySet(set) => {
            non_empty(set.len(), AttributeKind::BinarySet)?;
            AttributeValue::Bs(set.iter().cloned().collect())
        }
    })
}

fn non_empty(len: usize, kind: AttributeKind) -> MapperResult<()> {
    if len == 0 {
        return Err(MapperError::type_mismatch(
            format!("non-empty {kind}"),
            format!("empty {kind}"),
        ));
    }
    Ok(())
}

/// Check `value` against a declared kind, then convert it to its wire form.
pub fn to_wire_as(value: &Value, kind: AttributeKind) -> MapperResult<AttributeValue> {
    check_kind(value, kind)?;
    to_wire(value)
}

/// Fails unless `value` has the shape `kind` requires.
pub fn check_kind(value: &Value, kind: AttributeKind) -> MapperResult<()> {
    let found = kind_of(value);
    match (kind, value) {
        (AttributeKind::Integer, Value::Number(n)) => n.to_i64().map(drop),
        (AttributeKind::Float, Value::Number(n)) => n.to_f64().map(drop),
        _ if found == kind => Ok(()),
        _ => Err(MapperError::type_mismatch(kind.to_string(), found.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Wire to native
// ---------------------------------------------------------------------------

/// Convert a wire value to a native value of the given kind.
pub fn from_wire(value: &AttributeValue, kind: AttributeKind) -> MapperResult<Value> {
    match (kind, value) {
        (AttributeKind::String, AttributeValue::S(s)) => Ok(Value::String(s.clone())),
        (AttributeKind::Number, AttributeValue::N(n)) => Ok(Value::Number(Number::parse(n)?)),
        (AttributeKind::Integer, AttributeValue::N(n)) => {
            let number = Number::parse(n)?;
            number.to_i64()?;
            Ok(Value::Number(number))
        }
        (AttributeKind::Float, AttributeValue::N(n)) => {
            let number = Number::parse(n)?;
            number.to_f64()?;
            Ok(Value::Number(number))
        }
        (AttributeKind::Binary, AttributeValue::B(b)) => Ok(Value::Binary(b.clone())),
        (AttributeKind::Bool, AttributeValue::Bool(b)) => Ok(Value::Bool(*b)),
        (AttributeKind::Null, AttributeValue::Null) => Ok(Value::Null),
        (AttributeKind::List, AttributeValue::L(_))
        | (AttributeKind::Map, AttributeValue::M(_))
        | (AttributeKind::StringSet, AttributeValue::Ss(_))
        | (AttributeKind::NumberSet, AttributeValue::Ns(_))
        | (AttributeKind::BinarySet, AttributeValue::Bs(_)) => from_wire_inferred(value),
        _ => Err(MapperError::type_mismatch(
            kind.to_string(),
            value.type_descriptor(),
        )),
    }
}

/// Convert a wire value to a native value by its own tag.
pub fn from_wire_inferred(value: &AttributeValue) -> MapperResult<Value> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(Number::parse(n)?),
        AttributeValue::B(b) => Value::Binary(b.clone()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null => Value::Null,
        AttributeValue::L(items) => {
            Value::List(items.iter().map(from_wire_inferred).collect::<Result<_, _>>()?)
        }
        AttributeValue::M(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| Ok((k.clone(), from_wire_inferred(v)?)))
                .collect::<MapperResult<_>>()?,
        ),
        AttributeValue::Ss(items) => Value::StringSet(items.iter().cloned().collect()),
        AttributeValue::Ns(items) => Value::NumberSet(
            items
                .iter()
                .map(|n| Number::parse(n))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(items) => Value::BinarySet(items.iter().cloned().collect()),
    })
}
