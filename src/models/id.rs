use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-issued identifier of a stored entity.
///
/// The client never creates ids; they always come back from a create call or a
/// list read. The backend serializes them as `_id` (MongoDB style).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the id can be spliced into a URL path as one segment.
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self
                .0
                .chars()
                .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '\0'))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_plain_string() {
        let id: Id = serde_json::from_str("\"65a1f0c2e4b0a1b2c3d4e5f6\"").unwrap();
        assert_eq!(id.as_str(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn path_safety() {
        assert!(Id::from("65a1f0c2").is_path_safe());
        assert!(!Id::from("").is_path_safe());
        assert!(!Id::from("..").is_path_safe());
        assert!(!Id::from("a/b").is_path_safe());
        assert!(!Id::from("a?b=1").is_path_safe());
    }
}
