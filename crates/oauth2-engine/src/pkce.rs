//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Implements S256 and plain code challenge verification per RFC 7636.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::types::CodeChallengeMethod;

/// Verify a PKCE code verifier against the stored challenge.
///
/// For S256, computes `BASE64URL(SHA256(code_verifier))` and compares to the
/// stored challenge; for plain, compares the verifier directly.
#[must_use]
pub fn verify(method: CodeChallengeMethod, code_verifier: &str, code_challenge: &str) -> bool {
    match method {
        CodeChallengeMethod::S256 => {
            let hash = Sha256::digest(code_verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(hash) == code_challenge
        }
        CodeChallengeMethod::Plain => code_verifier == code_challenge,
    }
}
