//! AES-256-GCM sealing of cache payloads.

use crate::error::{CacheError, CacheResult};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

/// Symmetric cipher keyed by the SHA-256 digest of a secret.
///
/// Sealed output is `base64(nonce || ciphertext || tag)` with a fresh random
/// nonce per call.
#[derive(Clone)]
pub struct Cipher {
    key: [u8; 32],
    rng: SystemRandom,
}

impl Cipher {
    pub fn new(secret: &str) -> CacheResult<Self> {
        if secret.is_empty() {
            return Err(CacheError::Config("Encryption key must not be empty".to_string()));
        }

        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);

        Ok(Self {
            key,
            rng: SystemRandom::new(),
        })
    }

    fn aead_key(&self) -> CacheResult<LessSafeKey> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|_| CacheError::Encryption("Invalid key length".to_string()))?;
        Ok(LessSafeKey::new(unbound))
    }

    pub fn seal(&self, plaintext: &[u8]) -> CacheResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| CacheError::Encryption("Failed to generate nonce".to_string()))?;

        let mut in_out = plaintext.to_vec();
        self.aead_key()?
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| CacheError::Encryption("Failed to encrypt payload".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&in_out);
        Ok(STANDARD.encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> CacheResult<Vec<u8>> {
        let raw = STANDARD
            .decode(sealed.trim())
            .map_err(|e| CacheError::Encryption(format!("Invalid payload encoding: {}", e)))?;

        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(CacheError::Encryption("Payload too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| CacheError::Encryption("Invalid nonce".to_string()))?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .aead_key()?
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CacheError::Encryption("Failed to decrypt payload".to_string()))?;

        Ok(plaintext.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let cipher = Cipher::new("clave-secreta").unwrap();
        let sealed = cipher.seal(br#"{"value":1}"#).unwrap();

        assert!(!sealed.contains("value"));
        assert_eq!(cipher.open(&sealed).unwrap(), br#"{"value":1}"#);
    }

    #[test]
    fn test_nonce_is_fresh_per_seal() {
        let cipher = Cipher::new("k").unwrap();
        assert_ne!(cipher.seal(b"same").unwrap(), cipher.seal(b"same").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = Cipher::new("a").unwrap().seal(b"secret").unwrap();
        assert!(Cipher::new("b").unwrap().open(&sealed).is_err());
    }

    #[test]
    fn test_tampered_payload_fails() {
        let cipher = Cipher::new("k").unwrap();
        let mut raw = STANDARD.decode(cipher.seal(b"payload").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        assert!(cipher.open(&STANDARD.encode(raw)).is_err());
        assert!(cipher.open("AAAA").is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(Cipher::new(""), Err(CacheError::Config(_))));
    }
}
