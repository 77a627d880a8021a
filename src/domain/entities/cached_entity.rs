use crate::domain::value_objects::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An opaque business record cached for offline reads. Replaced wholesale
/// on each successful refresh; the cache layer never patches fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedEntity {
    pub id: EntityId,
    pub data: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CachedEntity {
    pub fn new(id: EntityId, data: Value, fetched_at: DateTime<Utc>) -> Self {
        Self {
            id,
            data,
            fetched_at,
        }
    }

    /// Builds a cached record from a raw remote document, reading the `id`
    /// field the way the remote API serializes it.
    pub fn from_remote(data: Value, fetched_at: DateTime<Utc>) -> Result<Self, String> {
        let id = data
            .get("id")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| "Remote document is missing an id".to_string())?;
        Ok(Self {
            id: EntityId::new(id)?,
            data,
            fetched_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_remote_reads_string_id() {
        let entity = CachedEntity::from_remote(
            serde_json::json!({"id": "o1", "name": "Alice"}),
            Utc::now(),
        )
        .expect("entity");
        assert_eq!(entity.id.as_str(), "o1");
    }

    #[test]
    fn from_remote_reads_numeric_id() {
        let entity =
            CachedEntity::from_remote(serde_json::json!({"id": 7, "name": "Bob"}), Utc::now())
                .expect("entity");
        assert_eq!(entity.id.as_str(), "7");
    }

    #[test]
    fn from_remote_rejects_missing_id() {
        assert!(CachedEntity::from_remote(serde_json::json!({"name": "x"}), Utc::now()).is_err());
    }
}
