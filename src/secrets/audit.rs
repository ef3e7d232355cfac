//! Tamper-resistant (append-only) audit log for secret-store events
//! (§4.7): `master_key_created`, `data_encrypted`/`_failed`,
//! `decryption_failed`, `ssh_key_validated`/`_stored`/`_retrieved`/`_deleted`,
//! each with a timestamp and non-secret context. Rendered as a structured
//! `tracing` event plus a dedicated append-only file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;

use crate::error::SecretResult;

pub struct AuditLog {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl AuditLog {
    pub fn open(base_dir: &Path) -> SecretResult<Self> {
        let dir = base_dir.join("logs");
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("security_audit.log");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one JSON line. Never returns an error to callers: an audit
    /// write failure must not block the encryption/decryption operation it
    /// describes, but it is surfaced via a `tracing::warn!`.
    pub fn record(&self, event: &str, context: &[(&str, &str)]) {
        let entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event": event,
            "details": context.iter().cloned().collect::<std::collections::BTreeMap<_, _>>(),
        });

        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize audit log entry");
                return;
            }
        };

        let mut file = match self.file.lock() {
            Ok(f) => f,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{line}") {
            tracing::warn!(error = %e, "failed to append audit log entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_event() {
        let dir = std::env::temp_dir().join(format!("ssc_audit_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let log = AuditLog::open(&dir).unwrap();
        log.record("master_key_created", &[("key_bits", "256")]);
        log.record("data_encrypted", &[("classification", "restricted")]);

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("master_key_created"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
