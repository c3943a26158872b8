//! PKCE verifier/challenge and CSRF state generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A PKCE verifier together with its S256 challenge.
pub struct PkcePair {
    /// The code verifier sent on token exchange.
    pub verifier: String,
    /// URL-safe base64 (no padding) of SHA-256(verifier).
    pub challenge: String,
}

/// Generate a fresh PKCE pair from 32 random bytes.
pub fn generate_pkce() -> PkcePair {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);

    let digest = Sha256::digest(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(digest);

    PkcePair { verifier, challenge }
}

/// Generate the CSRF state nonce (16 random bytes, hex-encoded).
pub fn generate_state_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_shapes() {
        let pair = generate_pkce();
        // 32 bytes -> 43 unpadded base64 chars, same for the SHA-256 digest
        assert_eq!(pair.verifier.len(), 43);
        assert_eq!(pair.challenge.len(), 43);
        assert!(!pair.verifier.contains('='));
        assert!(!pair.challenge.contains('='));
    }

    #[test]
    fn test_challenge_matches_verifier_digest() {
        let pair = generate_pkce();
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(pair.verifier.as_bytes()));
        assert_eq!(pair.challenge, expected);
    }

    #[test]
    fn test_state_nonce_is_hex() {
        let state = generate_state_nonce();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, generate_state_nonce());
    }
}
