use zeroize::Zeroizing;

use super::keys::ContentCipher;
use super::{AlgorithmSuite, EncryptedDataKey, EncryptionContext, EnvelopeError, Keyring};

const STATIC_PROVIDER_ID: &str = "static";

/// Wraps data keys with an AES-GCM key derived from the keyring name.
pub(crate) struct StaticKeyring {
    name: String,
    cipher: ContentCipher,
}

impl StaticKeyring {
    pub(crate) fn new(name: &str) -> Self {
        let mut wrapping_key = [0u8; 32];
        for (slot, byte) in wrapping_key.iter_mut().zip(name.bytes().cycle()) {
            *slot = byte;
        }
        Self {
            name: name.to_string(),
            cipher: ContentCipher::new(&wrapping_key).expect("32-byte key is valid"),
        }
    }
}

impl Keyring for StaticKeyring {
    fn on_encrypt(
        &self,
        _suite: AlgorithmSuite,
        data_key: &[u8],
        _encryption_context: &EncryptionContext,
    ) -> Result<Vec<EncryptedDataKey>, EnvelopeError> {
        let (mut ciphertext, tag) = self.cipher.seal(&[0u8; 12], &[], data_key, 16)?;
        ciphertext.extend_from_slice(&tag);
        Ok(vec![EncryptedDataKey {
            provider_id: STATIC_PROVIDER_ID.to_string(),
            provider_info: self.name.as_bytes().to_vec(),
            ciphertext,
        }])
    }

    fn on_decrypt(
        &self,
        _suite: AlgorithmSuite,
        encrypted_data_keys: &[EncryptedDataKey],
        _encryption_context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        encrypted_data_keys
            .iter()
            .filter(|key| {
                key.provider_id == STATIC_PROVIDER_ID && key.provider_info == self.name.as_bytes()
            })
            .find_map(|key| {
                let split = key.ciphertext.len().checked_sub(16)?;
                let (ciphertext, tag) = key.ciphertext.split_at(split);
                self.cipher.open(&[0u8; 12], &[], ciphertext, tag)
            })
            .map(Zeroizing::new)
            .ok_or_else(|| EnvelopeError::NoDataKey(format!("no data key for '{}'", self.name)))
    }
}

/// Hands back a fixed plaintext data key for messages produced elsewhere.
pub(crate) struct RawDataKeyring {
    provider_id: &'static str,
    key_name: &'static [u8],
    data_key: Vec<u8>,
}

impl RawDataKeyring {
    pub(crate) fn new(
        provider_id: &'static str,
        key_name: &'static [u8],
        data_key: Vec<u8>,
    ) -> Self {
        Self {
            provider_id,
            key_name,
            data_key,
        }
    }
}

impl Keyring for RawDataKeyring {
    fn on_encrypt(
        &self,
        _suite: AlgorithmSuite,
        _data_key: &[u8],
        _encryption_context: &EncryptionContext,
    ) -> Result<Vec<EncryptedDataKey>, EnvelopeError> {
        Err(EnvelopeError::Keyring("raw data keyring only decrypts".to_string()))
    }

    fn on_decrypt(
        &self,
        _suite: AlgorithmSuite,
        encrypted_data_keys: &[EncryptedDataKey],
        _encryption_context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        encrypted_data_keys
            .iter()
            .find(|key| key.provider_id == self.provider_id && key.provider_info == self.key_name)
            .map(|_| Zeroizing::new(self.data_key.clone()))
            .ok_or_else(|| EnvelopeError::NoDataKey("no raw fixture key matches".to_string()))
    }
}
