//! Cryptographic helpers

use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks
///
/// Length mismatch returns early; only content is compared in constant time.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
