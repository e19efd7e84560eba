use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::error::EnvelopeError;
use super::suite::{AlgorithmSuite, KeyDerivation};

const DERIVE_KEY_LABEL: &[u8] = b"DERIVEKEY";
const COMMIT_KEY_LABEL: &[u8] = b"COMMITKEY";
const COMMITMENT_LENGTH: usize = 32;

pub(crate) struct DerivedKeys {
    pub content_key: Zeroizing<Vec<u8>>,
    pub commitment: Option<Vec<u8>>,
}

pub(crate) fn derive_keys(
    suite: AlgorithmSuite,
    data_key: &[u8],
    message_id: &[u8],
) -> Result<DerivedKeys, EnvelopeError> {
    if data_key.len() != suite.data_key_length() {
        return Err(EnvelopeError::Keyring(format!(
            "data key is {} bytes, expected {}",
            data_key.len(),
            suite.data_key_length()
        )));
    }

    let mut content_key = Zeroizing::new(vec![0u8; suite.data_key_length()]);
    match suite.key_derivation() {
        KeyDerivation::Identity => {
            content_key.copy_from_slice(data_key);
            Ok(DerivedKeys {
                content_key,
                commitment: None,
            })
        }
        KeyDerivation::HkdfSha256 => {
            Hkdf::<Sha256>::new(None, data_key)
                .expand(&v1_info(suite, message_id), content_key.as_mut_slice())
                .map_err(|error| derivation_error(&error))?;
            Ok(DerivedKeys {
                content_key,
                commitment: None,
            })
        }
        KeyDerivation::HkdfSha384 => {
            Hkdf::<Sha384>::new(None, data_key)
                .expand(&v1_info(suite, message_id), content_key.as_mut_slice())
                .map_err(|error| derivation_error(&error))?;
            Ok(DerivedKeys {
                content_key,
                commitment: None,
            })
        }
        KeyDerivation::HkdfSha512Commit => {
            let hkdf = Hkdf::<Sha512>::new(Some(message_id), data_key);
            let mut info = suite.id().to_be_bytes().to_vec();
            info.extend_from_slice(DERIVE_KEY_LABEL);
            hkdf.expand(&info, content_key.as_mut_slice())
                .map_err(|error| derivation_error(&error))?;

            let mut commitment = vec![0u8; COMMITMENT_LENGTH];
            hkdf.expand(COMMIT_KEY_LABEL, &mut commitment)
                .map_err(|error| derivation_error(&error))?;
            Ok(DerivedKeys {
                content_key,
                commitment: Some(commitment),
            })
        }
    }
}

fn v1_info(suite: AlgorithmSuite, message_id: &[u8]) -> Vec<u8> {
    let mut info = suite.id().to_be_bytes().to_vec();
    info.extend_from_slice(message_id);
    info
}

fn derivation_error(error: &impl std::fmt::Display) -> EnvelopeError {
    EnvelopeError::Encryption(format!("key derivation failed: {error}"))
}

pub(crate) fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// AES-256-GCM with the tag stored apart from the ciphertext, as the wire format does.
pub(crate) struct ContentCipher {
    cipher: Aes256Gcm,
}

impl ContentCipher {
    pub(crate) fn new(key: &[u8]) -> Result<Self, EnvelopeError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|error| EnvelopeError::Keyring(format!("invalid content key: {error}")))?;
        Ok(Self { cipher })
    }

    pub(crate) fn open(
        &self,
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Option<Vec<u8>> {
        let mut sealed = Vec::with_capacity(ciphertext.len() + tag.len());
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);
        self.cipher
            .decrypt(Nonce::from_slice(iv), Payload { msg: &sealed, aad })
            .ok()
    }

    pub(crate) fn seal(
        &self,
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
        tag_length: usize,
    ) -> Result<(Vec<u8>, Vec<u8>), EnvelopeError> {
        let mut sealed = self
            .cipher
            .encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad })
            .map_err(|error| EnvelopeError::Encryption(format!("AES-GCM seal failed: {error}")))?;
        let tag = sealed.split_off(sealed.len() - tag_length);
        Ok((sealed, tag))
    }
}
