//! Token signatures.
//!
//! Two-field tokens carry an HMAC-SHA256 over the message. Three-field tokens
//! carry the tail of a SHA-256 hash chain seeded with the message and the
//! secret, so brute-forcing a weak secret costs `rounds` hashes per guess.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Keyed signature: `hex(HMAC-SHA256(secret, message))`.
pub fn sign_keyed(message: &str, secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Iterated signature over `message || secret`.
///
/// The seed is hashed once and each digest is then hashed again until
/// `rounds` hashes have been applied. A round count of zero still applies one
/// hash so the secret never appears in the output.
pub fn sign_rounds(message: &str, secret: &[u8], rounds: u64) -> String {
    let mut seed = Zeroizing::new(Vec::with_capacity(message.len() + secret.len()));
    seed.extend_from_slice(message.as_bytes());
    seed.extend_from_slice(secret);

    let mut digest = Sha256::digest(seed.as_slice());
    for _ in 1..rounds.max(1) {
        digest = Sha256::digest(digest.as_slice());
    }
    hex::encode(digest)
}
