//! Secure types for handling sensitive values.
//!
//! Secret material fetched from a backend passes through caching, logging,
//! and metrics code. [`SecretValue`] makes accidental exposure on any of
//! those paths a compile-time impossibility: reading the actual bytes
//! requires an explicit [`expose`](SecretValue::expose) call.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and
/// serialization, and zeroes its memory when dropped.
///
/// - Debug output is `SecretValue([REDACTED])`, Display is `[REDACTED]`
/// - Serialization always emits `"[REDACTED]"`, never the value
/// - Deserialization accepts real values (e.g. from config files)
/// - The backing memory is overwritten with zeros on drop
///
/// # Example
///
/// ```rust
/// use keystash::SecretValue;
///
/// let value = SecretValue::new("s3cr3t");
/// assert_eq!(format!("{value}"), "[REDACTED]");
/// assert_eq!(value.expose(), "s3cr3t");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the underlying value. Never log or print the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    ///
    /// Prefer [`expose`](Self::expose) when a reference suffices; the
    /// wrapper's own memory is still zeroed on drop.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Length of the secret without exposing it.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretValue(value))
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretValue {}

impl From<String> for SecretValue {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretValue {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Default for SecretValue {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redact() {
        let value = SecretValue::new("super-secret");

        assert_eq!(format!("{:?}", value), "SecretValue([REDACTED])");
        assert_eq!(format!("{}", value), "[REDACTED]");
    }

    #[test]
    fn test_expose_and_into_inner() {
        let value = SecretValue::new("my-secret");
        assert_eq!(value.expose(), "my-secret");
        assert_eq!(value.into_inner(), "my-secret");
    }

    #[test]
    fn test_serialization_redacts() {
        let value = SecretValue::new("super-secret");
        let json = serde_json::to_string(&value).unwrap();

        assert_eq!(json, "\"[REDACTED]\"");
        assert!(!json.contains("super-secret"));
    }

    #[test]
    fn test_deserialization_accepts_values() {
        let value: SecretValue = serde_json::from_str("\"real-value\"").unwrap();
        assert_eq!(value.expose(), "real-value");
    }

    #[test]
    fn test_redacted_inside_struct_json() {
        #[derive(Serialize)]
        struct Wrapper {
            name: String,
            token: SecretValue,
        }

        let wrapper =
            Wrapper { name: "visible".to_string(), token: SecretValue::new("hidden-token") };
        let json = serde_json::to_string(&wrapper).unwrap();

        assert!(json.contains("visible"));
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("hidden-token"));
    }

    #[test]
    fn test_equality_and_length() {
        let a = SecretValue::new("same");
        let b = SecretValue::new("same");
        let c = SecretValue::new("different");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 4);
        assert!(!a.is_empty());
        assert!(SecretValue::default().is_empty());
    }

    #[test]
    fn test_from_conversions() {
        let from_string: SecretValue = "token".to_string().into();
        let from_str: SecretValue = "token".into();
        assert_eq!(from_string, from_str);
    }
}
