use sha2::{Digest, Sha256};

/// Credential for a route whose marker file holds `secret`:
/// lowercase hex SHA-256 of the trimmed secret.
pub fn hash_token(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.trim().as_bytes()))
}

/// Whether `credential` unlocks a route whose marker file contains `marker`.
pub fn verify_token(credential: &str, marker: &str) -> bool {
    hash_token(marker) == credential
}
