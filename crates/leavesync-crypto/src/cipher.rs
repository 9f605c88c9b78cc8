use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use leavesync_core::constants::{MESSAGE_LEN_FIELD_LEN, PKCS7_BLOCK_SIZE, RANDOM_PREFIX_LEN};

use crate::error::CryptoError;
use crate::key::CallbackKey;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Pads `data` to a multiple of `block` bytes with PKCS#7, using the
/// non-standard 32-byte block size the upstream platform uses instead of
/// AES's native 16.
fn pkcs7_pad(data: &[u8], block: usize) -> Vec<u8> {
    let pad_len = block - (data.len() % block);
    let pad_len = if pad_len == 0 { block } else { pad_len };
    let mut out = Vec::with_capacity(data.len() + pad_len);
    out.extend_from_slice(data);
    out.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    out
}

fn pkcs7_unpad(data: &[u8], block: usize) -> Result<&[u8], CryptoError> {
    let pad = *data.last().ok_or(CryptoError::BadPadding)?;
    let pad = pad as usize;
    if pad == 0 || pad > block || pad > data.len() {
        return Err(CryptoError::BadPadding);
    }
    let (body, tail) = data.split_at(data.len() - pad);
    if tail.iter().any(|&b| b as usize != pad) {
        return Err(CryptoError::BadPadding);
    }
    Ok(body)
}

/// Decrypts a base64 callback payload: AES-256-CBC with no library-level
/// padding, followed by manual PKCS#7 removal at the 32-byte block size,
/// then unpacks `random16 | len4_BE | msg | recipient` and checks the
/// trailing recipient identifier.
pub fn decrypt(payload_b64: &str, key: &CallbackKey, expected_recipient: &str) -> Result<String, CryptoError> {
    let mut buf = STANDARD
        .decode(payload_b64)
        .map_err(|e| CryptoError::Base64(e.to_string()))?;
    if buf.is_empty() || buf.len() % 16 != 0 {
        return Err(CryptoError::Misaligned);
    }
    let decryptor = Aes256CbcDec::new(&key.aes_key.into(), &key.iv.into());
    let plain_len = decryptor
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map_err(|e| CryptoError::Cipher(e.to_string()))?
        .len();
    buf.truncate(plain_len);
    let unpadded = pkcs7_unpad(&buf, PKCS7_BLOCK_SIZE)?;

    if unpadded.len() < RANDOM_PREFIX_LEN + MESSAGE_LEN_FIELD_LEN {
        return Err(CryptoError::Truncated);
    }
    let rest = &unpadded[RANDOM_PREFIX_LEN..];
    let (len_bytes, rest) = rest.split_at(MESSAGE_LEN_FIELD_LEN);
    let msg_len = u32::from_be_bytes(len_bytes.try_into().unwrap()) as usize;
    if rest.len() < msg_len {
        return Err(CryptoError::Truncated);
    }
    let (msg, recipient) = rest.split_at(msg_len);
    let recipient = std::str::from_utf8(recipient)
        .map_err(|_| CryptoError::Truncated)?
        .to_string();
    if recipient != expected_recipient {
        return Err(CryptoError::InvalidRecipient {
            expected: expected_recipient.to_string(),
            actual: recipient,
        });
    }
    String::from_utf8(msg.to_vec()).map_err(|_| CryptoError::Truncated)
}

/// Encrypts `plaintext` for the callback wire protocol: packs
/// `random16 | len4_BE | msg | recipient`, pads to a 32-byte multiple with
/// PKCS#7, then AES-256-CBC encrypts and base64-encodes the result.
pub fn encrypt(plaintext: &str, key: &CallbackKey, recipient: &str) -> Result<String, CryptoError> {
    let mut random_prefix = [0u8; RANDOM_PREFIX_LEN];
    rand::thread_rng().fill_bytes(&mut random_prefix);

    let msg = plaintext.as_bytes();
    let mut packed = Vec::with_capacity(
        RANDOM_PREFIX_LEN + MESSAGE_LEN_FIELD_LEN + msg.len() + recipient.len(),
    );
    packed.extend_from_slice(&random_prefix);
    packed.extend_from_slice(&(msg.len() as u32).to_be_bytes());
    packed.extend_from_slice(msg);
    packed.extend_from_slice(recipient.as_bytes());

    let mut buf = pkcs7_pad(&packed, PKCS7_BLOCK_SIZE);
    let encryptor = Aes256CbcEnc::new(&key.aes_key.into(), &key.iv.into());
    let ct_len = buf.len();
    let ct = encryptor
        .encrypt_padded_mut::<NoPadding>(&mut buf, ct_len)
        .map_err(|e| CryptoError::Cipher(e.to_string()))?;
    Ok(STANDARD.encode(ct))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> CallbackKey {
        // 43 chars, decodes (with trailing '=') to exactly 32 bytes.
        CallbackKey::from_encoding_key("AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8").unwrap()
    }

    #[test]
    fn round_trips_short_and_long_messages() {
        let key = test_key();
        for msg in ["", "hello", &"x".repeat(500), &"unicode 测试 🎉".repeat(20)] {
            let enc = encrypt(msg, &key, "recipient-1").unwrap();
            let dec = decrypt(&enc, &key, "recipient-1").unwrap();
            assert_eq!(dec, msg);
        }
    }

    #[test]
    fn decrypt_rejects_wrong_recipient() {
        let key = test_key();
        let enc = encrypt("hello", &key, "recipient-1").unwrap();
        let err = decrypt(&enc, &key, "recipient-2").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidRecipient { .. }));
    }

    #[test]
    fn decrypt_rejects_corrupted_padding() {
        let key = test_key();
        let mut enc_bytes = STANDARD.decode(encrypt("hello", &key, "r").unwrap()).unwrap();
        // Flip a byte in the last block to corrupt the padding after decryption.
        let last = enc_bytes.len() - 1;
        enc_bytes[last] ^= 0xFF;
        let corrupted = STANDARD.encode(&enc_bytes);
        assert!(decrypt(&corrupted, &key, "r").is_err());
    }
}
