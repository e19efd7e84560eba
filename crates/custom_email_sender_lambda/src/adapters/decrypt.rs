use custom_email_sender_core::envelope::{
    DecryptedMessage, EncryptionClient, EnvelopeError, Keyring,
};

pub trait CodeDecryptor {
    fn decrypt_code(&self, ciphertext: &[u8]) -> Result<DecryptedMessage, EnvelopeError>;
}

/// An encryption client bound to the keyring configured at process start.
pub struct KeyringCodeDecryptor<K> {
    client: EncryptionClient,
    keyring: K,
}

impl<K: Keyring> KeyringCodeDecryptor<K> {
    pub fn new(client: EncryptionClient, keyring: K) -> Self {
        Self { client, keyring }
    }
}

impl<K: Keyring> CodeDecryptor for KeyringCodeDecryptor<K> {
    fn decrypt_code(&self, ciphertext: &[u8]) -> Result<DecryptedMessage, EnvelopeError> {
        self.client.decrypt(&self.keyring, ciphertext)
    }
}
