//! Secret Store (C7, §4.7). Symmetric encryption of credential values with
//! a classification tag, a master-key file, SSH-key validation, a local
//! SSH-key vault, and a tamper-resistant audit log.
//!
//! Grounded in `database/encryption/aes.rs` (AES-256-GCM via `aes-gcm`,
//! base64 framing) for the RESTRICTED path; the CBC path for
//! INTERNAL/CONFIDENTIAL is built from the same RustCrypto family
//! (`aes` + `cbc`) as the GCM path.

pub mod aes_cbc;
pub mod aes_gcm_store;
pub mod audit;
pub mod key_store;
pub mod key_validation;
pub mod master_key;

pub use key_validation::{KeyType, SshKeyInfo};
pub use master_key::MasterKey;

use serde::{Deserialize, Serialize};

use crate::error::{SecretError, SecretResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Public,
    Internal,
    Confidential,
    Restricted,
}

/// Top-level secret store: encrypts/decrypts values according to their
/// classification (§4.7), backed by a single master key.
pub struct SecretStore {
    master_key: MasterKey,
    audit: audit::AuditLog,
}

impl SecretStore {
    pub fn open(base_dir: &std::path::Path) -> SecretResult<Self> {
        let master_key = MasterKey::load_or_create(base_dir)?;
        let audit = audit::AuditLog::open(base_dir)?;
        if master_key.freshly_created {
            audit.record("master_key_created", &[("key_bits", "256"), ("salt_bits", "256")]);
        }
        Ok(Self { master_key, audit })
    }

    pub fn encrypt(&self, value: &str, classification: Classification) -> SecretResult<String> {
        if value.is_empty() {
            return Ok(String::new());
        }
        let result = match classification {
            Classification::Restricted => {
                aes_gcm_store::encrypt(self.master_key.as_bytes(), value)
            }
            _ => aes_cbc::encrypt(self.master_key.as_bytes(), value),
        };
        match &result {
            Ok(_) => self.audit.record(
                "data_encrypted",
                &[("classification", classification_name(classification))],
            ),
            Err(e) => self.audit.record(
                "data_encrypted_failed",
                &[("classification", classification_name(classification)), ("error", &e.to_string())],
            ),
        }
        result
    }

    pub fn decrypt(&self, encrypted: &str, classification: Classification) -> SecretResult<String> {
        if encrypted.is_empty() {
            return Ok(String::new());
        }
        let result = match classification {
            Classification::Restricted => {
                aes_gcm_store::decrypt(self.master_key.as_bytes(), encrypted)
            }
            _ => aes_cbc::decrypt(self.master_key.as_bytes(), encrypted),
        };
        if result.is_err() {
            self.audit.record(
                "decryption_failed",
                &[("classification", classification_name(classification))],
            );
        }
        result
    }

    pub fn validate_ssh_key(
        &self,
        content: &str,
        passphrase: Option<&str>,
    ) -> SecretResult<SshKeyInfo> {
        let info = key_validation::validate(content, passphrase)?;
        self.audit.record(
            "ssh_key_validated",
            &[("key_type", &format!("{:?}", info.key_type)), ("bits", &info.bit_size.to_string())],
        );
        Ok(info)
    }

    pub fn audit(&self) -> &audit::AuditLog {
        &self.audit
    }
}

fn classification_name(c: Classification) -> &'static str {
    match c {
        Classification::Public => "public",
        Classification::Internal => "internal",
        Classification::Confidential => "confidential",
        Classification::Restricted => "restricted",
    }
}

pub(crate) fn err_invalid_format() -> SecretError {
    SecretError::InvalidFormat
}
