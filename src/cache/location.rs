//! # Cache Location Addressing
//!
//! A [`CacheLocation`] names one value in the shared backend: a hash key plus
//! the field under that key. Keys group values that invalidate together;
//! fields separate parameter variants of the same resource. Deleting a key
//! therefore drops every variant at once.
//!
//! The physical key written to the backend may carry a deployment-wide
//! prefix (joined with a hyphen) so that unrelated deployments can share one
//! backend without colliding. The prefix is owned by the store and applied
//! through [`physical_key`]; logical keys everywhere else stay unprefixed.

use crate::constants::cache::{DEFAULT_FIELD, INVALIDATION_KEY_PREFIX};

/// Address of a single cached value: hash key plus field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheLocation {
    key: String,
    field: String,
}

impl CacheLocation {
    /// Creates a location from a key and a field.
    pub fn new(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
        }
    }

    /// Location of the invalidation marker for `key`.
    ///
    /// Markers live at `invalidation:<key>` under the empty field and hold
    /// the epoch-millisecond timestamp of the most recent deletion. Readers
    /// compare it against their own start time to discard stale writes.
    pub fn invalidation_marker(key: &str) -> Self {
        Self::new(
            format!("{INVALIDATION_KEY_PREFIX}{key}"),
            DEFAULT_FIELD,
        )
    }

    /// The invalidation marker protecting this location's key.
    pub fn marker(&self) -> Self {
        Self::invalidation_marker(&self.key)
    }

    /// Hash key (unprefixed, logical form).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Field within the hash. Empty for single-value keys.
    pub fn field(&self) -> &str {
        &self.field
    }
}

/// Joins the deployment prefix onto a logical key.
///
/// All key kinds go through here: hash keys, counter keys, and invalidation
/// markers. Fields are never prefixed.
pub fn physical_key(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}-{key}"),
        _ => key.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_location_wire_format() {
        let marker = CacheLocation::invalidation_marker("1_balances_0xabc");
        assert_eq!(marker.key(), "invalidation:1_balances_0xabc");
        assert_eq!(marker.field(), "");
    }

    #[test]
    fn test_marker_of_location_uses_its_key() {
        let location = CacheLocation::new("137_chain", "");
        assert_eq!(location.marker().key(), "invalidation:137_chain");
    }

    #[test]
    fn test_physical_key_with_prefix() {
        assert_eq!(physical_key(Some("staging"), "chains"), "staging-chains");
    }

    #[test]
    fn test_physical_key_without_prefix() {
        assert_eq!(physical_key(None, "chains"), "chains");
        assert_eq!(physical_key(Some(""), "chains"), "chains");
    }

    #[test]
    fn test_marker_keys_receive_prefix_like_any_other() {
        let marker = CacheLocation::invalidation_marker("chains");
        assert_eq!(
            physical_key(Some("prod"), marker.key()),
            "prod-invalidation:chains"
        );
    }
}
