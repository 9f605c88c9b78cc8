use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::CryptoError;

/// The AES key material derived from the configured 43-character encoding
/// key. The IV is the key's own first 16 bytes, matching the upstream
/// platform's convention (no separate IV is transmitted).
pub struct CallbackKey {
    pub aes_key: [u8; 32],
    pub iv: [u8; 16],
}

impl CallbackKey {
    /// `encoding_aes_key` is the 43-character value with no trailing `=`;
    /// appending one pads it to valid standard base64 for a 32-byte key.
    pub fn from_encoding_key(encoding_aes_key: &str) -> Result<Self, CryptoError> {
        let padded = format!("{encoding_aes_key}=");
        let bytes = STANDARD
            .decode(padded.as_bytes())
            .map_err(|e| CryptoError::Base64(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(CryptoError::BadKeyLength(bytes.len()));
        }
        let mut aes_key = [0u8; 32];
        aes_key.copy_from_slice(&bytes);
        let mut iv = [0u8; 16];
        iv.copy_from_slice(&bytes[..16]);
        Ok(Self { aes_key, iv })
    }
}
