use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use saga_core::access::{Grant, ResourceKind, Role};

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub image: Option<String>,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A campaign world.
#[derive(Debug, Clone, Serialize)]
pub struct Universe {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Universe {
    /// `id`, `owner_id` and timestamps are always present; the filter
    /// narrows the descriptive fields.
    pub fn view(&self, grant: &Grant) -> Value {
        match to_value(self) {
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .filter(|(k, _)| UNIVERSE_ENVELOPE.contains(&k.as_str()) || grant.attributes.allows(k))
                    .collect(),
            ),
            other => other,
        }
    }
}

const UNIVERSE_ENVELOPE: &[&str] = &["id", "owner_id", "created_at", "updated_at"];

/// Any universe-scoped object (character, story, species, ...). Kind-specific
/// content lives in `fields`.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub id: String,
    pub universe_id: String,
    pub kind: ResourceKind,
    pub owner_id: String,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// The record as the grant holder may see it. Identity, ownership and
    /// timestamps are always present; the filter only narrows `fields`.
    pub fn view(&self, grant: &Grant) -> Value {
        let mut v = to_value(self);
        if let Some(fields) = v.get_mut("fields") {
            *fields = grant.filter(fields);
        }
        v
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub invited_by: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Serialize for the filter step; these types only hold JSON-safe data.
pub fn to_value<T: Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}
