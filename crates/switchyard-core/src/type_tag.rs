//! Canonical type names used as routing keys.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical, separator-normalized name of a payload or aggregate type.
///
/// `Accounts.UserRegistered`, `accounts::UserRegistered` style paths and
/// backslash- or slash-separated names all normalize to dotted segments, so
/// aliases of one name resolve to the same routing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeTag(String);

impl TypeTag {
    /// Creates a tag from any spelling of a type name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let normalized = name.trim().replace("::", ".").replace(['\\', '/'], ".");
        let segments: Vec<&str> = normalized
            .split('.')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();
        Self(segments.join("."))
    }

    /// Returns the dotted name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last segment, e.g. `UserRegistered`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        Self::new(&name)
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalize_to_the_same_tag() {
        let dotted = TypeTag::new("Accounts.Domain.UserRegistered");
        assert_eq!(TypeTag::new("Accounts::Domain::UserRegistered"), dotted);
        assert_eq!(TypeTag::new("\\Accounts\\Domain\\UserRegistered"), dotted);
        assert_eq!(TypeTag::new("Accounts/Domain/UserRegistered"), dotted);
        assert_eq!(TypeTag::new(" Accounts..Domain.UserRegistered "), dotted);
    }

    #[test]
    fn test_short_name_is_last_segment() {
        assert_eq!(TypeTag::new("Accounts.UserRegistered").short_name(), "UserRegistered");
        assert_eq!(TypeTag::new("Standalone").short_name(), "Standalone");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let tag = TypeTag::new("Accounts::RegisterUser");
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"Accounts.RegisterUser\"");
        let back: TypeTag = serde_json::from_str("\"Accounts\\\\RegisterUser\"").unwrap();
        assert_eq!(back, tag);
    }
}
