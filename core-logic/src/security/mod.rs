use crate::error::SecurityError;
use aes_gcm::{
    aead::{Aead, NewAead}, // NewAead for 0.9/0.4
    Aes256Gcm,
    Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use zeroize::Zeroize;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub struct SecurityUtils;

impl SecurityUtils {
    /// Encrypt a key line into `base64(salt || nonce || ciphertext+tag)`.
    pub fn encrypt_key(plaintext: &str, password: &str) -> Result<String, SecurityError> {
        if password.is_empty() {
            return Err(SecurityError::PasswordRequired);
        }

        let mut rng = rand::thread_rng();
        let mut salt = [0u8; SALT_LEN];
        let mut iv = [0u8; NONCE_LEN];
        rng.fill(&mut salt);
        rng.fill(&mut iv);

        let cipher = Self::cipher(password, &salt)?;
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|e| SecurityError::CryptographyFailed {
                reason: format!("Encryption failed: {}", e),
            })?;

        let mut blob = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    /// Reverse of [`SecurityUtils::encrypt_key`].
    pub fn decrypt_key(encoded: &str, password: &str) -> Result<String, SecurityError> {
        if password.is_empty() {
            return Err(SecurityError::PasswordRequired);
        }

        let blob = STANDARD
            .decode(encoded.trim())
            .map_err(|e| SecurityError::CryptographyFailed {
                reason: format!("Invalid base64: {}", e),
            })?;
        if blob.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
            return Err(SecurityError::CryptographyFailed {
                reason: format!("Encrypted blob too short ({} bytes)", blob.len()),
            });
        }

        let (salt, rest) = blob.split_at(SALT_LEN);
        let (iv, ciphertext) = rest.split_at(NONCE_LEN);

        let cipher = Self::cipher(password, salt)?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| SecurityError::CryptographyFailed {
                reason: "Wrong password or corrupted data".to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|_| SecurityError::CryptographyFailed {
            reason: "Decrypted data is not valid UTF-8".to_string(),
        })
    }

    /// True when the line looks like an encrypted blob rather than a raw key.
    pub fn is_encrypted(entry: &str) -> bool {
        let entry = entry.trim();
        if Self::is_hex_key(entry) {
            return false;
        }
        STANDARD
            .decode(entry)
            .map(|blob| blob.len() >= SALT_LEN + NONCE_LEN + TAG_LEN)
            .unwrap_or(false)
    }

    /// 32-byte hex private key, `0x` prefix optional.
    pub fn is_hex_key(entry: &str) -> bool {
        let hex_part = entry.strip_prefix("0x").unwrap_or(entry);
        hex_part.len() == 64 && hex::decode(hex_part).is_ok()
    }

    fn cipher(password: &str, salt: &[u8]) -> Result<Aes256Gcm, SecurityError> {
        // N=16384, r=8, p=1
        let params =
            scrypt::Params::new(14, 8, 1, 32).map_err(|e| SecurityError::CryptographyFailed {
                reason: format!("Invalid scrypt params: {}", e),
            })?;
        let mut key = [0u8; 32];
        scrypt::scrypt(password.as_bytes(), salt, &params, &mut key).map_err(|e| {
            SecurityError::CryptographyFailed {
                reason: format!("Scrypt failed: {}", e),
            }
        })?;

        let cipher = Aes256Gcm::new(&key.into());
        key.zeroize();
        Ok(cipher)
    }
}
