//! Default credential generator.
//!
//! Used for access tokens, refresh tokens and authorization codes whenever
//! the model does not supply its own generator.

/// Generate a random 256-bit hex token from two v4 UUIDs.
#[must_use]
pub fn random_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}
