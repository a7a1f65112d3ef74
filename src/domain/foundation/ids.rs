//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier of a client record.
///
/// Client ids are derived from the client's name at creation time
/// (`maria-lopez-1a2b3c4d`). The random suffix keeps two distinct clients
/// with the same name apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Creates a ClientId, validating it is not blank.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::empty_field("client_id"));
        }
        Ok(Self(id))
    }

    /// Derives a fresh id from a client's name.
    pub fn from_name(first_name: &str, last_name: &str) -> Self {
        let slug = slugify(&format!("{} {}", first_name, last_name));
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        if slug.is_empty() {
            Self(format!("client-{}", suffix))
        } else {
            Self(format!("{}-{}", slug, suffix))
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClientId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_dash = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Identifier of one document within a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchItemId(Uuid);

impl BatchItemId {
    /// Creates a new random BatchItemId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BatchItemId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BatchItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_from_name_is_slugged_with_suffix() {
        let id = ClientId::from_name("Maria", "Lopez");
        assert!(id.as_str().starts_with("maria-lopez-"));
        assert_eq!(id.as_str().len(), "maria-lopez-".len() + 8);
    }

    #[test]
    fn client_id_from_name_collapses_punctuation() {
        let id = ClientId::from_name("  Anne-Marie ", "O'Neil");
        assert!(id.as_str().starts_with("anne-marie-o-neil-"));
    }

    #[test]
    fn client_id_from_same_name_is_unique() {
        assert_ne!(
            ClientId::from_name("Amy", "Brown"),
            ClientId::from_name("Amy", "Brown")
        );
    }

    #[test]
    fn client_id_from_blank_name_falls_back() {
        let id = ClientId::from_name("", "");
        assert!(id.as_str().starts_with("client-"));
    }

    #[test]
    fn client_id_rejects_blank() {
        assert!(ClientId::new("   ").is_err());
        assert!("abc".parse::<ClientId>().is_ok());
    }

    #[test]
    fn batch_item_id_round_trips_through_string() {
        let id = BatchItemId::new();
        let parsed: BatchItemId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
