//! Compiles conditions, updates and projections into expression text.
//!
//! Names and values never appear literally in the output. Every field
//! segment becomes a `#n` placeholder and every operand a `:v` placeholder,
//! both recorded in the builder's [`PlaceholderTable`]. One builder is used
//! per request, so all expressions of that request share one table.

use std::fmt::Write;

use dynamodel_model::AttributeValue;

use crate::error::{MapperError, MapperResult};
use crate::expression::condition::Condition;
use crate::expression::path::{Path, PathSegment};
use crate::expression::placeholder::PlaceholderTable;
use crate::expression::update::{UpdateAction, UpdateClause};
use crate::marshal::{AttributeKind, Value, kind_of, to_wire, to_wire_as};
use crate::schema::TableSchema;

/// Maximum number of operands in an `IN` condition.
pub const MAX_IN_OPERANDS: usize = 100;

/// Stateful compiler for the expressions of one request.
#[derive(Debug, Default)]
pub struct ExpressionBuilder<'s> {
    schema: Option<&'s TableSchema>,
    placeholders: PlaceholderTable,
}

impl<'s> ExpressionBuilder<'s> {
    /// A builder with no schema: paths are used as written and operands are
    /// marshaled by their own shape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder that resolves root segments to wire names and checks
    /// top-level operands against declared field kinds.
    #[must_use]
    pub fn with_schema(schema: &'s TableSchema) -> Self {
        Self {
            schema: Some(schema),
            placeholders: PlaceholderTable::new(),
        }
    }

    /// Compile a condition that must not be empty.
    pub fn condition(&mut self, condition: &Condition) -> MapperResult<String> {
        if condition.is_empty() {
            return Err(MapperError::invalid_expression("condition is empty"));
        }
        self.render(condition, false)
    }

    /// Compile a filter. An empty tree means "no filter".
    pub fn filter(&mut self, condition: &Condition) -> MapperResult<Option<String>> {
        if condition.is_empty() {
            return Ok(None);
        }
        self.render(condition, false).map(Some)
    }

    /// Compile update actions into `SET ... REMOVE ... ADD ... DELETE ...`.
    pub fn update(&mut self, actions: &[UpdateAction]) -> MapperResult<String> {
        if actions.is_empty() {
            return Err(MapperError::invalid_expression("update has no actions"));
        }
        for (i, action) in actions.iter().enumerate() {
            for other in &actions[i + 1..] {
                if action.path().overlaps(other.path()) {
                    return Err(MapperError::invalid_expression(format!(
                        "update paths {} and {} overlap",
                        action.path(),
                        other.path()
                    )));
                }
            }
        }

        let mut text = String::new();
        for clause in [
            UpdateClause::Set,
            UpdateClause::Remove,
            UpdateClause::Add,
            UpdateClause::Delete,
        ] {
            let mut rendered = Vec::new();
            for action in actions.iter().filter(|a| a.clause() == clause) {
                rendered.push(self.render_action(action)?);
            }
            if rendered.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            let _ = write!(text, "{} {}", clause.keyword(), rendered.join(", "));
        }
        Ok(text)
    }

    /// Compile a projection list.
    pub fn projection(&mut self, paths: &[Path]) -> MapperResult<String> {
        if paths.is_empty() {
            return Err(MapperError::invalid_expression("projection is empty"));
        }
        let rendered = paths
            .iter()
            .map(|p| self.path(p))
            .collect::<MapperResult<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }

    /// Placeholders allocated so far.
    #[must_use]
    pub fn placeholders(&self) -> &PlaceholderTable {
        &self.placeholders
    }

    /// Finish compiling and hand over the placeholders.
    #[must_use]
    pub fn finish(self) -> PlaceholderTable {
        self.placeholders
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn render(&mut self, condition: &Condition, nested: bool) -> MapperResult<String> {
        match condition {
            Condition::Compare { path, op, value } => {
                let p = self.path(path)?;
                let v = self.operand(path, value)?;
                Ok(format!("{p} {op} {v}"))
            }
            Condition::Between { path, low, high } => {
                let p = self.path(path)?;
                let low = self.marshal_operand(path, low)?;
                let high = self.marshal_operand(path, high)?;
                if !low.same_kind(&high) {
                    return Err(MapperError::type_mismatch(
                        low.type_descriptor(),
                        high.type_descriptor(),
                    ));
                }
                let lo = self.placeholders.value(low);
                let hi = self.placeholders.value(high);
                Ok(format!("{p} BETWEEN {lo} AND {hi}"))
            }
            Condition::BeginsWith { path, prefix } => {
                if !matches!(prefix, Value::String(_) | Value::Binary(_)) {
                    return Err(MapperError::type_mismatch(
                        "String or Binary prefix",
                        kind_of(prefix).to_string(),
                    ));
                }
                let p = self.path(path)?;
                let v = self.free_operand(prefix)?;
                Ok(format!("begins_with({p}, {v})"))
            }
            Condition::Exists(path) => Ok(format!("attribute_exists({})", self.path(path)?)),
            Condition::NotExists(path) => {
                Ok(format!("attribute_not_exists({})", self.path(path)?))
            }
            Condition::In { path, values } => {
                if values.is_empty() || values.len() > MAX_IN_OPERANDS {
                    return Err(MapperError::invalid_expression(format!(
                        "IN requires between 1 and {MAX_IN_OPERANDS} operands, got {}",
                        values.len()
                    )));
                }
                let p = self.path(path)?;
                let operands = values
                    .iter()
                    .map(|v| self.operand(path, v))
                    .collect::<MapperResult<Vec<_>>>()?;
                Ok(format!("{p} IN ({})", operands.join(", ")))
            }
            Condition::Contains { path, value } => {
                let p = self.path(path)?;
                let v = self.free_operand(value)?;
                Ok(format!("contains({p}, {v})"))
            }
            Condition::Size { path, op, value } => {
                if !matches!(value, Value::Number(_)) {
                    return Err(MapperError::type_mismatch(
                        "Number",
                        kind_of(value).to_string(),
                    ));
                }
                let p = self.path(path)?;
                let v = self.free_operand(value)?;
                Ok(format!("size({p}) {op} {v}"))
            }
            Condition::AttributeType { path, kind } => {
                let p = self.path(path)?;
                let v = self
                    .placeholders
                    .value(AttributeValue::S(kind.wire_tag().to_owned()));
                Ok(format!("attribute_type({p}, {v})"))
            }
            Condition::And(children) => self.render_combinator(children, "AND", nested),
            Condition::Or(children) => self.render_combinator(children, "OR", nested),
            Condition::Not(child) => {
                if child.is_empty() {
                    return Err(MapperError::invalid_expression("NOT of an empty condition"));
                }
                Ok(format!("(NOT {})", self.render(child, true)?))
            }
        }
    }

    fn render_combinator(
        &mut self,
        children: &[Condition],
        keyword: &str,
        nested: bool,
    ) -> MapperResult<String> {
        let parts = children
            .iter()
            .filter(|c| !c.is_empty())
            .map(|c| self.render(c, true))
            .collect::<MapperResult<Vec<_>>>()?;
        match parts.len() {
            0 => Err(MapperError::invalid_expression("condition is empty")),
            1 => Ok(parts.into_iter().next().unwrap_or_default()),
            _ => {
                let joined = parts.join(&format!(" {keyword} "));
                Ok(if nested { format!("({joined})") } else { joined })
            }
        }
    }

    fn render_action(&mut self, action: &UpdateAction) -> MapperResult<String> {
        match action {
            UpdateAction::Set { path, value } => {
                let p = self.path(path)?;
                let v = self.operand(path, value)?;
                Ok(format!("{p} = {v}"))
            }
            UpdateAction::SetIfNotExists { path, value } => {
                let p = self.path(path)?;
                let v = self.operand(path, value)?;
                Ok(format!("{p} = if_not_exists({p}, {v})"))
            }
            UpdateAction::AppendToList { path, values } => {
                let p = self.path(path)?;
                let v = self.free_operand(&Value::List(values.clone()))?;
                Ok(format!("{p} = list_append({p}, {v})"))
            }
            UpdateAction::Remove(path) => self.path(path),
            UpdateAction::AddNumeric { path, value } => {
                if !matches!(value, Value::Number(_)) {
                    return Err(MapperError::type_mismatch(
                        "Number",
                        kind_of(value).to_string(),
                    ));
                }
                let p = self.path(path)?;
                let v = self.free_operand(value)?;
                Ok(format!("{p} {v}"))
            }
            UpdateAction::AddToSet { path, value } | UpdateAction::DeleteFromSet { path, value } => {
                let kind = kind_of(value);
                if !kind.is_set() {
                    return Err(MapperError::type_mismatch("a set", kind.to_string()));
                }
                let p = self.path(path)?;
                let v = self.free_operand(value)?;
                Ok(format!("{p} {v}"))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Paths and operands
    // -----------------------------------------------------------------------

    fn path(&mut self, path: &Path) -> MapperResult<String> {
        let mut out = String::new();
        for (i, segment) in path.segments().iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if name.is_empty() {
                        return Err(MapperError::invalid_expression(format!(
                            "path {path} has an empty field name"
                        )));
                    }
                    let name = match (i, self.schema) {
                        (0, Some(schema)) => schema.attribute_name(name),
                        _ => name.as_str(),
                    };
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(&self.placeholders.name(name));
                }
                PathSegment::Index(idx) => {
                    if i == 0 {
                        return Err(MapperError::invalid_expression(
                            "path must start with a field name",
                        ));
                    }
                    let _ = write!(out, "[{idx}]");
                }
            }
        }
        if out.is_empty() {
            return Err(MapperError::invalid_expression("path is empty"));
        }
        Ok(out)
    }

    /// Placeholder for a value compared against `path`.
    fn operand(&mut self, path: &Path, value: &Value) -> MapperResult<String> {
        let wire = self.marshal_operand(path, value)?;
        Ok(self.placeholders.value(wire))
    }

    /// Placeholder for a value whose kind is unrelated to the path's kind.
    fn free_operand(&mut self, value: &Value) -> MapperResult<String> {
        let wire = to_wire(value)?;
        Ok(self.placeholders.value(wire))
    }

    fn marshal_operand(&self, path: &Path, value: &Value) -> MapperResult<AttributeValue> {
        match self.declared_kind(path) {
            Some(kind) if !value.is_null() => to_wire_as(value, kind),
            _ => to_wire(value),
        }
    }

    fn declared_kind(&self, path: &Path) -> Option<AttributeKind> {
        if !path.is_top_level() {
            return None;
        }
        self.schema?.declared_kind(path.root())
    }
}
