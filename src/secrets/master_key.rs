//! Master key file: 32 random bytes + 32-byte verification salt, stored at
//! mode 0600 (§4.7). Regenerated in place if the existing file is the wrong
//! length.

use std::io::Write;
use std::path::{Path, PathBuf};

use rand::RngCore;

use crate::error::SecretResult;

const MASTER_KEY_LEN: usize = 32;
const SALT_LEN: usize = 32;
const FILE_LEN: usize = MASTER_KEY_LEN + SALT_LEN;

pub struct MasterKey {
    key: [u8; MASTER_KEY_LEN],
    #[allow(dead_code)]
    salt: [u8; SALT_LEN],
    pub freshly_created: bool,
}

impl MasterKey {
    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.key
    }

    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(".master_key")
    }

    pub fn load_or_create(base_dir: &Path) -> SecretResult<Self> {
        let path = Self::path(base_dir);

        if path.exists() {
            let data = std::fs::read(&path)?;
            if data.len() != FILE_LEN {
                std::fs::remove_file(&path)?;
                return Self::load_or_create(base_dir);
            }
            let mut key = [0u8; MASTER_KEY_LEN];
            let mut salt = [0u8; SALT_LEN];
            key.copy_from_slice(&data[..MASTER_KEY_LEN]);
            salt.copy_from_slice(&data[MASTER_KEY_LEN..]);
            return Ok(Self {
                key,
                salt,
                freshly_created: false,
            });
        }

        let mut key = [0u8; MASTER_KEY_LEN];
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        rand::thread_rng().fill_bytes(&mut salt);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&path)?;
        file.write_all(&key)?;
        file.write_all(&salt)?;
        set_owner_read_write_only(&path)?;

        Ok(Self {
            key,
            salt,
            freshly_created: true,
        })
    }
}

#[cfg(unix)]
fn set_owner_read_write_only(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn set_owner_read_write_only(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_and_reloads_stable_key() {
        let dir = tempdir();
        let k1 = MasterKey::load_or_create(dir.path()).unwrap();
        assert!(k1.freshly_created);
        let k2 = MasterKey::load_or_create(dir.path()).unwrap();
        assert!(!k2.freshly_created);
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn regenerates_corrupt_file() {
        let dir = tempdir();
        let path = MasterKey::path(dir.path());
        std::fs::write(&path, b"too short").unwrap();
        let k = MasterKey::load_or_create(dir.path()).unwrap();
        assert!(k.freshly_created);
        assert_eq!(std::fs::read(&path).unwrap().len(), FILE_LEN);
    }

    fn tempdir() -> TempDir {
        TempDir::new()
    }

    /// Minimal scratch-directory helper; avoids pulling in `tempfile` just
    /// for two tests.
    struct TempDir(PathBuf);
    impl TempDir {
        fn new() -> Self {
            use std::sync::atomic::{AtomicU64, Ordering};
            static COUNTER: AtomicU64 = AtomicU64::new(0);
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let mut p = std::env::temp_dir();
            p.push(format!(
                "schema_sync_core_test_{}_{}",
                std::process::id(),
                n
            ));
            let _ = std::fs::remove_dir_all(&p);
            std::fs::create_dir_all(&p).unwrap();
            Self(p)
        }
        fn path(&self) -> &Path {
            &self.0
        }
    }
    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
