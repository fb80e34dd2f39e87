use crate::error::{ConfigError, CoreError, SecurityError, WalletError};
use crate::security::SecurityUtils;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Plaintext private key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DecryptedKey {
    pub private_key: String,
}

impl fmt::Debug for DecryptedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedKey")
            .field("private_key", &"***REDACTED***")
            .finish()
    }
}

/// Loads key and address files. Lines are trimmed; blanks and `#` comments
/// are skipped.
pub struct WalletManager;

impl WalletManager {
    /// Raw key-file entries with their 1-based line numbers.
    fn read_entries(path: &Path) -> Result<Vec<(usize, String)>, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            msg: e.to_string(),
        })?;

        Ok(content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .map(|(i, line)| (i, line.to_string()))
            .collect())
    }

    /// True if any entry of the key file is an encrypted blob.
    pub fn has_encrypted_keys(path: &Path) -> Result<bool, CoreError> {
        Ok(Self::read_entries(path)?
            .iter()
            .any(|(_, entry)| SecurityUtils::is_encrypted(entry)))
    }

    /// Load private keys, decrypting encrypted entries with `password`.
    pub fn load_keys(path: &Path, password: Option<&str>) -> Result<Vec<DecryptedKey>, CoreError> {
        let entries = Self::read_entries(path)?;
        let mut keys = Vec::with_capacity(entries.len());
        let mut decrypted = 0usize;

        for (line, mut entry) in entries {
            let plaintext = if SecurityUtils::is_encrypted(&entry) {
                let pass = password
                    .filter(|p| !p.is_empty())
                    .ok_or(SecurityError::PasswordRequired)?;
                decrypted += 1;
                SecurityUtils::decrypt_key(&entry, pass).map_err(|e| {
                    WalletError::DecryptionFailed {
                        path: path.display().to_string(),
                        line,
                        reason: e.to_string(),
                    }
                })?
            } else {
                entry.clone()
            };
            entry.zeroize();

            let plaintext = plaintext.trim().to_string();
            if !SecurityUtils::is_hex_key(&plaintext) {
                return Err(WalletError::InvalidKeyFormat { line }.into());
            }

            keys.push(DecryptedKey {
                private_key: plaintext,
            });
        }

        info!(
            "Loaded {} keys from {} ({} decrypted)",
            keys.len(),
            path.display(),
            decrypted
        );
        Ok(keys)
    }

    /// Load destination addresses, one per line.
    pub fn load_addresses(path: &Path) -> Result<Vec<String>, CoreError> {
        let addresses: Vec<String> = Self::read_entries(path)?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect();
        info!(
            "Loaded {} destination addresses from {}",
            addresses.len(),
            path.display()
        );
        Ok(addresses)
    }

    /// Encrypt every plaintext key line of `input` into `output`.
    /// Already-encrypted entries are copied as they are.
    pub fn encrypt_key_file(input: &Path, output: &Path, password: &str) -> Result<usize, CoreError> {
        let entries = Self::read_entries(input)?;
        let mut lines = Vec::with_capacity(entries.len());

        for (line, entry) in entries {
            if SecurityUtils::is_encrypted(&entry) {
                lines.push(entry);
                continue;
            }
            if !SecurityUtils::is_hex_key(&entry) {
                return Err(WalletError::InvalidKeyFormat { line }.into());
            }
            lines.push(SecurityUtils::encrypt_key(&entry, password)?);
        }

        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(output, content).map_err(|e| ConfigError::IoError {
            path: output.display().to_string(),
            msg: e.to_string(),
        })?;

        Ok(lines.len())
    }
}
