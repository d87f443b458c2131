//! Person name derivation from email addresses
//!
//! New users are created with a display name guessed from their address:
//! `john.doe@example.com` becomes "John" / "Doe", `jane@example.com` becomes
//! "Jane" with an empty family name.

/// Given and family name of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonName {
    pub given: String,
    pub family: String,
}

impl PersonName {
    /// Derive a name from the local part of `email`.
    ///
    /// The local part is everything before the first `@`. It is split on `.`;
    /// the first segment is the given name and the second, if any, the family
    /// name. Further segments are ignored. Both are capitalized: first
    /// character upper case, the rest lower case.
    pub fn from_email(email: &str) -> Self {
        let local = email.split('@').next().unwrap_or_default();
        let mut parts = local.split('.');

        Self {
            given: capitalize(parts.next().unwrap_or_default()),
            family: capitalize(parts.next().unwrap_or_default()),
        }
    }
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
