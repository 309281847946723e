//! Authorization header parsing

/// Split an `Authorization` value into `<scheme> <credentials>`.
///
/// The value must be exactly two parts separated by a single space, and the
/// scheme must match exactly (case-sensitive). Returns the credentials part.
pub fn credentials_for_scheme<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let mut parts = value.split(' ');
    let (found, credentials) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || found != scheme {
        return None;
    }
    Some(credentials)
}
