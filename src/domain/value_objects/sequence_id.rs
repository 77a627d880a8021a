use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue position assigned at enqueue time. Strictly increasing, never
/// reused, even across process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SequenceId(i64);

impl SequenceId {
    pub fn new(value: i64) -> Result<Self, String> {
        if value <= 0 {
            return Err("Sequence ID must be positive".to_string());
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
