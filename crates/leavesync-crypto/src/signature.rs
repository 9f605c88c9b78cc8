use sha1::{Digest, Sha1};

/// Signs `[token, timestamp, nonce, ciphertext]` sorted lexicographically,
/// concatenated, and SHA-1 hashed, rendered as lowercase hex.
pub fn signature(token: &str, timestamp: &str, nonce: &str, ciphertext: &str) -> String {
    let mut parts = [token, timestamp, nonce, ciphertext];
    parts.sort_unstable();
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Recomputes the signature and compares it to `received` in constant time.
/// Returns `false` on any length mismatch rather than erroring, per §4.1.
pub fn verify(received: &str, token: &str, timestamp: &str, nonce: &str, ciphertext: &str) -> bool {
    let expected = signature(token, timestamp, nonce, ciphertext);
    constant_time_eq(received.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_signature() {
        let sig = signature("tok", "12345", "abcde", "ciphertext");
        assert!(verify(&sig, "tok", "12345", "abcde", "ciphertext"));
    }

    #[test]
    fn verify_rejects_single_bit_flip_in_any_field() {
        let sig = signature("tok", "12345", "abcde", "ciphertext");
        assert!(!verify(&sig, "tok", "12345", "abcde", "ciphertexu"));
        assert!(!verify(&sig, "tok", "12346", "abcde", "ciphertext"));
        assert!(!verify(&sig, "tok", "12345", "abcdf", "ciphertext"));
    }
}
