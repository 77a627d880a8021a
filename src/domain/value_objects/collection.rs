use serde::{Deserialize, Serialize};
use std::fmt;

/// A named category of business entities sharing one remote endpoint and
/// one local cache partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Owners,
    Projects,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Owners, Collection::Projects];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Owners => "owners",
            Collection::Projects => "projects",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "owners" => Ok(Collection::Owners),
            "projects" => Ok(Collection::Projects),
            other => Err(format!("Unknown collection: {other}")),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for collection in Collection::ALL {
            assert_eq!(Collection::parse(collection.as_str()), Ok(collection));
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(Collection::parse("tasks").is_err());
    }
}
