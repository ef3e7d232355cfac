//! INTERNAL/CONFIDENTIAL classification: AES-256-CBC directly under the
//! master key, PKCS#7 padded (§4.7). Layout: `salt(16) || iv(16) ||
//! ciphertext`, base64-encoded. The salt carries no cryptographic weight
//! here — it is not used to derive a key, only kept so the wire format
//! lines up with the RESTRICTED path's `salt || iv || ...` shape.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use crate::error::SecretResult;

use super::err_invalid_format;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;

pub fn encrypt(master_key: &[u8; 32], plaintext: &str) -> SecretResult<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let encryptor = Aes256CbcEnc::new(master_key.into(), &iv.into());
    let ciphertext = encryptor.encrypt_padded_vec_mut::<cbc::cipher::block_padding::Pkcs7>(
        plaintext.as_bytes(),
    );

    let mut out = Vec::with_capacity(SALT_LEN + IV_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);

    Ok(B64.encode(out))
}

pub fn decrypt(master_key: &[u8; 32], encoded: &str) -> SecretResult<String> {
    let data = B64.decode(encoded).map_err(|_| err_invalid_format())?;
    if data.len() < SALT_LEN + IV_LEN {
        return Err(err_invalid_format());
    }

    let iv = &data[SALT_LEN..SALT_LEN + IV_LEN];
    let ciphertext = &data[SALT_LEN + IV_LEN..];

    let decryptor = Aes256CbcDec::new(master_key.into(), iv.into());
    let plaintext = decryptor
        .decrypt_padded_vec_mut::<cbc::cipher::block_padding::Pkcs7>(ciphertext)
        .map_err(|e| crate::error::SecretError::DecryptionFailed(e.to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| crate::error::SecretError::DecryptionFailed(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; 32] {
        [3u8; 32]
    }

    #[test]
    fn round_trips() {
        let encrypted = encrypt(&key(), "database-password-123").unwrap();
        let decrypted = decrypt(&key(), &encrypted).unwrap();
        assert_eq!(decrypted, "database-password-123");
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let encrypted = encrypt(&key(), "s3cr3t").unwrap();
        let mut bytes = B64.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = B64.encode(bytes);
        assert!(decrypt(&key(), &tampered).is_err());
    }
}
