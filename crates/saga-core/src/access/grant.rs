//! Decision result and field-level attribute filter.
//!
//! Filter entries are globs: `*` admits every field, `name` admits one field
//! and `!name` excludes one field (exclusion always wins).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SagaError};

/// Which fields of a resource a granted action may touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeFilter {
    entries: Vec<String>,
}

impl AttributeFilter {
    /// Every field.
    pub fn all() -> Self {
        Self { entries: vec!["*".to_string()] }
    }

    /// No field at all (used by denied grants).
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { entries: entries.into_iter().map(Into::into).collect() }
    }

    /// Parse the comma separated form used in config (`*,!password_hash`).
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            let name = part.strip_prefix('!').unwrap_or(part);
            if name.is_empty() || (name == "*" && part.starts_with('!')) {
                return Err(SagaError::BadRequest(format!("invalid attribute entry: {part:?}")));
            }
            entries.push(part.to_string());
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn allows(&self, field: &str) -> bool {
        let mut included = false;
        for e in &self.entries {
            match e.strip_prefix('!') {
                Some(excluded) if excluded == field => return false,
                Some(_) => {}
                None => included |= e == "*" || e == field,
            }
        }
        included
    }

    /// Keep only the allowed keys of a JSON object. Arrays are filtered
    /// element-wise; scalars pass through.
    pub fn filter(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let kept: Map<String, Value> = map
                    .iter()
                    .filter(|(k, _)| self.allows(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Value::Object(kept)
            }
            Value::Array(items) => Value::Array(items.iter().map(|v| self.filter(v)).collect()),
            other => other.clone(),
        }
    }

    /// Keys of a write payload the filter does not admit.
    pub fn disallowed<'a, I>(&self, keys: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter().filter(|k| !self.allows(k)).collect()
    }
}

/// Outcome of one access decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    pub granted: bool,
    pub attributes: AttributeFilter,
}

impl Grant {
    pub fn denied() -> Self {
        Self { granted: false, attributes: AttributeFilter::none() }
    }

    pub fn allowed(attributes: AttributeFilter) -> Self {
        Self { granted: true, attributes }
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }

    /// Apply the attribute filter to a value about to be returned.
    pub fn filter(&self, value: &Value) -> Value {
        self.attributes.filter(value)
    }
}
