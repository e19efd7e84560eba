//! Envelope message format used by the encryption SDK family.
//!
//! A message is a header (algorithm suite, encryption context, encrypted data
//! keys, header authentication), a framed or single-block AES-GCM body, and
//! for signing suites an ECDSA footer. Data keys are wrapped and unwrapped by a
//! [`Keyring`]; this module never talks to a key service directly.

mod body;
mod client;
mod error;
mod header;
mod keys;
mod signature;
mod suite;
mod wire;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{CommitmentPolicy, DecryptedMessage, EncryptionClient, DEFAULT_FRAME_LENGTH};
pub use error::EnvelopeError;
pub use header::{ContentType, EncryptedDataKey, EncryptionContext, MessageHeader};
pub use signature::PUBLIC_KEY_CONTEXT_KEY;
pub use suite::{AlgorithmSuite, KeyDerivation, MessageFormatVersion};

use zeroize::Zeroizing;

/// Wraps and unwraps per-message data keys.
pub trait Keyring {
    fn on_encrypt(
        &self,
        suite: AlgorithmSuite,
        data_key: &[u8],
        encryption_context: &EncryptionContext,
    ) -> Result<Vec<EncryptedDataKey>, EnvelopeError>;

    /// Returns the first data key this keyring can recover from `encrypted_data_keys`.
    fn on_decrypt(
        &self,
        suite: AlgorithmSuite,
        encrypted_data_keys: &[EncryptedDataKey],
        encryption_context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError>;
}

impl<K: Keyring + ?Sized> Keyring for &K {
    fn on_encrypt(
        &self,
        suite: AlgorithmSuite,
        data_key: &[u8],
        encryption_context: &EncryptionContext,
    ) -> Result<Vec<EncryptedDataKey>, EnvelopeError> {
        (**self).on_encrypt(suite, data_key, encryption_context)
    }

    fn on_decrypt(
        &self,
        suite: AlgorithmSuite,
        encrypted_data_keys: &[EncryptedDataKey],
        encryption_context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        (**self).on_decrypt(suite, encrypted_data_keys, encryption_context)
    }
}
