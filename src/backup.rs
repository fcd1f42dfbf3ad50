//! Content-addressed file backups.

use std::fs::File;
use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use sha2::{Digest, Sha256};

/// Create a backup of `path` named `<path>.<first-32-hex-of-sha256>`.
///
/// No-ops when the file does not exist, and when a backup with the same
/// checksum already exists — repeat runs over unchanged content never
/// duplicate backups.
///
/// # Errors
///
/// Returns an error if the file cannot be hashed or copied.
pub fn create_backup(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let checksum = sha256_hex(path).context("calculate checksum")?;
    let backup_path = PathBuf::from(format!("{}.{}", path.display(), &checksum[..32]));

    if backup_path.exists() {
        // Same content already backed up.
        return Ok(Some(backup_path));
    }

    std::fs::copy(path, &backup_path)
        .with_context(|| format!("copy {} to {}", path.display(), backup_path.display()))?;
    Ok(Some(backup_path))
}

/// Stream the file through SHA-256 with a 32 KiB buffer.
fn sha256_hex(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("open {} for hashing", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 32 * 1024];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
