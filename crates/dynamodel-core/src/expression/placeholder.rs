//! Placeholder allocation for one compiled request.

use std::collections::HashMap;

use dynamodel_model::AttributeValue;

/// Name and value placeholders allocated while compiling one request.
///
/// A name gets one placeholder (`#n0`, `#n1`, ...) however often it is
/// referenced. Every value operand gets a fresh placeholder (`:v0`, `:v1`,
/// ...). A table is owned by a single compile; nothing is shared between
/// requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceholderTable {
    names: HashMap<String, String>,
    placeholder_by_name: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
}

impl PlaceholderTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for an attribute or map key name.
    pub fn name(&mut self, name: &str) -> String {
        if let Some(existing) = self.placeholder_by_name.get(name) {
            return existing.clone();
        }
        let placeholder = format!("#n{}", self.names.len());
        self.names.insert(placeholder.clone(), name.to_owned());
        self.placeholder_by_name
            .insert(name.to_owned(), placeholder.clone());
        placeholder
    }

    /// Placeholder for a value operand.
    pub fn value(&mut self, value: AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    /// Real name behind a name placeholder.
    #[must_use]
    pub fn resolve_name(&self, placeholder: &str) -> Option<&str> {
        self.names.get(placeholder).map(String::as_str)
    }

    /// Value behind a value placeholder.
    #[must_use]
    pub fn resolve_value(&self, placeholder: &str) -> Option<&AttributeValue> {
        self.values.get(placeholder)
    }

    /// Name placeholder to real name.
    #[must_use]
    pub fn names(&self) -> &HashMap<String, String> {
        &self.names
    }

    /// Value placeholder to value.
    #[must_use]
    pub fn values(&self) -> &HashMap<String, AttributeValue> {
        &self.values
    }

    /// Returns `true` if nothing has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }

    /// Split into the name and value maps a request carries.
    #[must_use]
    pub fn into_parts(self) -> (HashMap<String, String>, HashMap<String, AttributeValue>) {
        (self.names, self.values)
    }
}
