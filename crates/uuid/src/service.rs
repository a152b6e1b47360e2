use std::fmt;

use uuid::Uuid;

/// A freshly minted version 4 identifier, displayed in simple (unhyphenated) form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UuidService(Uuid);

impl Default for UuidService {
    fn default() -> Self {
        Self::new()
    }
}

impl UuidService {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for UuidService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_as_32_lowercase_hex() {
        let id = UuidService::new().to_string();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
    }

    #[test]
    fn test_new_generates_distinct_values() {
        assert_ne!(UuidService::new(), UuidService::new());
        assert_ne!(UuidService::new().to_string(), UuidService::new().to_string());
    }
}
