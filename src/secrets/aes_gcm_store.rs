//! RESTRICTED classification: AES-256-GCM with a per-value PBKDF2-derived
//! key (§4.7). Layout: `salt(16) || iv(16) || tag(16) || ciphertext`,
//! base64-encoded. Modeled on `database/encryption/aes.rs::AESEncryption`,
//! extended with a PBKDF2 key-derivation step so the GCM key is derived
//! per-value from the master key rather than used directly.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{AesGcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::RngCore;
use sha2::Sha256;

use crate::error::SecretResult;

use super::err_invalid_format;

const SALT_LEN: usize = 16;
const IV_LEN: usize = 16;
const TAG_LEN: usize = 16;
const PBKDF2_ITERATIONS: u32 = 100_000;

/// §4.7 specifies a 16-byte IV, not AES-GCM's default 96-bit nonce — GCM
/// permits other nonce sizes, so the nonce type parameter is spelled out
/// explicitly rather than using the `Aes256Gcm` alias (which fixes `U12`
/// and panics on a 16-byte slice).
type Aes256Gcm16 = AesGcm<aes_gcm::aes::Aes256, U16>;

fn derive_key(master_key: &[u8; 32], salt: &[u8]) -> [u8; 32] {
    let master_hex = hex_encode(master_key);
    let mut key = [0u8; 32];
    pbkdf2::<Hmac<Sha256>>(master_hex.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key)
        .expect("pbkdf2 output length is fixed and valid");
    key
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn encrypt(master_key: &[u8; 32], plaintext: &str) -> SecretResult<String> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let key_bytes = derive_key(master_key, &salt);
    let key = Key::<Aes256Gcm16>::from_slice(&key_bytes);
    let cipher = Aes256Gcm16::new(key);
    let nonce = Nonce::<Aes256Gcm16>::from_slice(&iv);

    let mut sealed = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| crate::error::SecretError::EncryptionFailed(e.to_string()))?;

    // aes-gcm appends the 16-byte tag to the ciphertext; this format wants
    // the tag positioned right after the IV instead.
    let tag_start = sealed.len() - TAG_LEN;
    let tag: Vec<u8> = sealed.drain(tag_start..).collect();
    let ciphertext = sealed;

    let mut out = Vec::with_capacity(SALT_LEN + IV_LEN + TAG_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);
    out.extend_from_slice(&tag);
    out.extend_from_slice(&ciphertext);

    Ok(B64.encode(out))
}

pub fn decrypt(master_key: &[u8; 32], encoded: &str) -> SecretResult<String> {
    let data = B64
        .decode(encoded)
        .map_err(|_| err_invalid_format())?;
    if data.len() < SALT_LEN + IV_LEN + TAG_LEN {
        return Err(err_invalid_format());
    }

    let salt = &data[..SALT_LEN];
    let iv = &data[SALT_LEN..SALT_LEN + IV_LEN];
    let tag = &data[SALT_LEN + IV_LEN..SALT_LEN + IV_LEN + TAG_LEN];
    let ciphertext = &data[SALT_LEN + IV_LEN + TAG_LEN..];

    let key_bytes = derive_key(master_key, salt);
    let key = Key::<Aes256Gcm16>::from_slice(&key_bytes);
    let cipher = Aes256Gcm16::new(key);
    let nonce = Nonce::<Aes256Gcm16>::from_slice(iv);

    // Re-append the tag so aes-gcm sees its expected ciphertext||tag shape.
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);

    let plaintext = cipher
        .decrypt(nonce, combined.as_ref())
        .map_err(|e| crate::error::SecretError::DecryptionFailed(e.to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|e| crate::error::SecretError::DecryptionFailed(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; 32] {
        [7u8; 32]
    }

    #[test]
    fn round_trips() {
        let encrypted = encrypt(&key(), "ssh-private-key-passphrase").unwrap();
        let decrypted = decrypt(&key(), &encrypted).unwrap();
        assert_eq!(decrypted, "ssh-private-key-passphrase");
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let encrypted = encrypt(&key(), "hello world").unwrap();
        let mut bytes = B64.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let tampered = B64.encode(bytes);
        assert!(decrypt(&key(), &tampered).is_err());
    }

    #[test]
    fn empty_payload_is_rejected_as_invalid_format() {
        assert!(decrypt(&key(), "not-base64!!").is_err());
    }
}
