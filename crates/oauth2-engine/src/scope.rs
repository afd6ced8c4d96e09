//! Scope values: space-delimited permission identifiers.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::OAuthError;
use crate::grammar;

/// An ordered, validated set of scope tokens.
///
/// Parsing enforces the RFC 6749 scope grammar (space-delimited NQCHAR
/// tokens) before any value reaches the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope(Vec<String>);

impl Scope {
    /// Parse and validate a scope string.
    ///
    /// # Errors
    ///
    /// `InvalidScope` when the string is empty or contains characters outside
    /// the scope-token grammar.
    pub fn parse(value: &str) -> Result<Self, OAuthError> {
        if value.is_empty() || !grammar::is_nqschar(value) {
            return Err(OAuthError::invalid_scope("Invalid parameter: `scope`"));
        }

        let tokens: Vec<String> = value.split(' ').filter(|t| !t.is_empty()).map(String::from).collect();
        if tokens.is_empty() {
            return Err(OAuthError::invalid_scope("Invalid parameter: `scope`"));
        }

        Ok(Self(tokens))
    }

    /// The individual scope tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Whether this scope contains the given token.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    /// Whether every token of this scope also appears in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.0.iter().all(|t| other.contains(t))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl FromStr for Scope {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Scope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}
