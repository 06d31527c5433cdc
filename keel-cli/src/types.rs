//! Common types used across CLI modules

use uuid::Uuid;

/// Identifier that can be either a full UUID or an unambiguous prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdOrPrefix {
    Full(Uuid),
    /// Lowercased prefix that should uniquely identify a resource
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse as a full UUID first, otherwise treat the input as a prefix
    pub fn parse(input: &str) -> Self {
        match Uuid::parse_str(input) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.trim().to_lowercase()),
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            IdOrPrefix::Full(uuid) => Some(*uuid),
            IdOrPrefix::Prefix(_) => None,
        }
    }

    pub fn matches(&self, id: &Uuid) -> bool {
        match self {
            IdOrPrefix::Full(uuid) => uuid == id,
            IdOrPrefix::Prefix(prefix) => id.to_string().starts_with(prefix.as_str()),
        }
    }
}

impl std::fmt::Display for IdOrPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrPrefix::Full(uuid) => write!(f, "{}", uuid),
            IdOrPrefix::Prefix(prefix) => write!(f, "{}", prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(IdOrPrefix::parse(&id.to_string()), IdOrPrefix::Full(id));
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let id = Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap();
        let prefix = IdOrPrefix::parse("3F2A");
        assert_eq!(prefix, IdOrPrefix::Prefix("3f2a".to_string()));
        assert!(prefix.matches(&id));
        assert!(!IdOrPrefix::parse("3f2b").matches(&id));
    }
}
