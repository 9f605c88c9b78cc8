use thiserror::Error;

/// All crypto-codec failures collapse to one error type at the handler
/// boundary — §4.1 of the callback protocol treats every subcode the same
/// way (ignore the event), but we keep them distinct here for logging.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("encoding key must decode to 32 bytes, got {0}")]
    BadKeyLength(usize),

    #[error("ciphertext is not a multiple of the block size")]
    Misaligned,

    #[error("invalid PKCS#7 padding")]
    BadPadding,

    #[error("decrypted payload shorter than the fixed-field prefix")]
    Truncated,

    #[error("recipient mismatch: expected {expected}, got {actual}")]
    InvalidRecipient { expected: String, actual: String },

    #[error("base64 decode failed: {0}")]
    Base64(String),

    #[error("cipher error: {0}")]
    Cipher(String),
}

impl From<CryptoError> for leavesync_core::SyncError {
    fn from(e: CryptoError) -> Self {
        leavesync_core::SyncError::CryptoError(e.to_string())
    }
}
