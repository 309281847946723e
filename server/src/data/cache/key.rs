//! Cache key builders

/// Cache key builder
///
/// Keys are plain strings shared with other processes reading the same
/// Redis instance, so their format is part of the external contract.
pub struct CacheKey;

impl CacheKey {
    /// Cache key for a user snapshot: `user-<id>`
    pub fn user(id: i64) -> String {
        format!("user-{}", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_format() {
        assert_eq!(CacheKey::user(42), "user-42");
        assert_eq!(CacheKey::user(-1), "user--1");
    }

    #[test]
    fn test_user_keys_are_unique_per_id() {
        assert_ne!(CacheKey::user(1), CacheKey::user(11));
    }
}
