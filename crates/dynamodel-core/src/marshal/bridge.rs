//! Conversion between `serde` types and native records.
//!
//! Values pass through `serde_json::Value`. JSON has no sets or binaries, so
//! arrays and strings are coerced using the declared kind of the field they
//! land in: an array becomes a set under a set kind, and an array of bytes or
//! a base64 string becomes binary under [`AttributeKind::Binary`].

use std::collections::{BTreeMap, BTreeSet};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use crate::error::{MapperError, MapperResult};
use crate::marshal::number::Number;
use crate::marshal::record::Record;
use crate::marshal::value::{AttributeKind, Value};
use crate::schema::TableSchema;

/// Serialize `value` into a record, coercing fields by their declared kinds.
///
/// `None` fields serialize as `null` and are dropped, so optional fields
/// follow the schema's absent-field rules when marshaled.
pub fn to_record<T: Serialize>(schema: &TableSchema, value: &T) -> MapperResult<Record> {
    let Json::Object(object) = serde_json::to_value(value)? else {
        return Err(MapperError::type_mismatch("Map", "a non-object value"));
    };
    object
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(name, json)| {
            let kind = schema.declared_kind(&name);
            Ok((name, json_to_value(json, kind)?))
        })
        .collect()
}

/// Deserialize a record into `T`.
pub fn from_record<T: DeserializeOwned>(record: Record) -> MapperResult<T> {
    let object = record
        .into_iter()
        .map(|(name, value)| Ok((name, value_to_json(value)?)))
        .collect::<MapperResult<serde_json::Map<_, _>>>()?;
    Ok(serde_json::from_value(Json::Object(object))?)
}

fn json_to_value(json: Json, kind: Option<AttributeKind>) -> MapperResult<Value> {
    Ok(match (json, kind) {
        (Json::Null, _) => Value::Null,
        (Json::Bool(b), _) => Value::Bool(b),
        (Json::Number(n), _) => Value::Number(json_number(&n)?),
        (Json::String(s), Some(AttributeKind::Binary)) => Value::Binary(
            STANDARD
                .decode(&s)
                .map(Bytes::from)
                .map_err(|_| MapperError::type_mismatch("base64 Binary", "String"))?,
        ),
        (Json::String(s), Some(k)) if k.is_numeric() => Value::Number(Number::parse(&s)?),
        (Json::String(s), _) => Value::String(s),
        (Json::Array(items), Some(AttributeKind::Binary)) => Value::Binary(json_bytes(&items)?),
        (Json::Array(items), Some(AttributeKind::StringSet)) => Value::StringSet(
            items
                .into_iter()
                .map(|item| match item {
                    Json::String(s) => Ok(s),
                    other => Err(MapperError::type_mismatch("String", json_kind(&other))),
                })
                .collect::<MapperResult<BTreeSet<_>>>()?,
        ),
        (Json::Array(items), Some(AttributeKind::NumberSet)) => Value::NumberSet(
            items
                .into_iter()
                .map(|item| match item {
                    Json::Number(n) => json_number(&n),
                    Json::String(s) => Number::parse(&s),
                    other => Err(MapperError::type_mismatch("Number", json_kind(&other))),
                })
                .collect::<MapperResult<BTreeSet<_>>>()?,
        ),
        (Json::Array(items), Some(AttributeKind::BinarySet)) => Value::BinarySet(
            items
                .into_iter()
                .map(|item| match item {
                    Json::Array(bytes) => json_bytes(&bytes),
                    other => Err(MapperError::type_mismatch("Binary", json_kind(&other))),
                })
                .collect::<MapperResult<BTreeSet<_>>>()?,
        ),
        (Json::Array(items), _) => Value::List(
            items
                .into_iter()
                .map(|item| json_to_value(item, None))
                .collect::<MapperResult<_>>()?,
        ),
        (Json::Object(entries), _) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, json_to_value(v, None)?)))
                .collect::<MapperResult<BTreeMap<_, _>>>()?,
        ),
    })
}

fn json_number(n: &serde_json::Number) -> MapperResult<Number> {
    if let Some(i) = n.as_i64() {
        Ok(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::from(u))
    } else {
        n.as_f64()
            .ok_or_else(|| MapperError::type_mismatch("Number", n.to_string()))
            .and_then(Number::try_from)
    }
}

fn json_bytes(items: &[Json]) -> MapperResult<Bytes> {
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| MapperError::type_mismatch("byte", json_kind(item)))
        })
        .collect::<MapperResult<Vec<u8>>>()
        .map(Bytes::from)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn value_to_json(value: Value) -> MapperResult<Json> {
    Ok(match value {
        Value::String(s) => Json::String(s),
        Value::Number(n) => number_to_json(&n)?,
        Value::Binary(b) => bytes_to_json(&b),
        Value::Bool(b) => Json::Bool(b),
        Value::Null => Json::Null,
        Value::List(items) => Json::Array(
            items
                .into_iter()
                .map(value_to_json)
                .collect::<MapperResult<_>>()?,
        ),
        Value::Map(entries) => Json::Object(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, value_to_json(v)?)))
                .collect::<MapperResult<_>>()?,
        ),
        Value::StringSet(set) => Json::Array(set.into_iter().map(Json::String).collect()),
        Value::NumberSet(set) => Json::Array(
            set.iter()
                .map(number_to_json)
                .collect::<MapperResult<_>>()?,
        ),
        Value::BinarySet(set) => Json::Array(set.iter().map(bytes_to_json).collect()),
    })
}

fn number_to_json(n: &Number) -> MapperResult<Json> {
    if n.is_integer() {
        if let Ok(i) = n.to_i64() {
            return Ok(Json::from(i));
        }
        if let Ok(u) = n.to_string().parse::<u64>() {
            return Ok(Json::from(u));
        }
    }
    let float = n.to_f64()?;
    serde_json::Number::from_f64(float)
        .map(Json::Number)
        .ok_or_else(|| MapperError::precision_loss(n.to_string(), "Float"))
}

fn bytes_to_json(bytes: &Bytes) -> Json {
    Json::Array(bytes.iter().map(|b| Json::from(*b)).collect())
}
