use std::collections::HashMap;
use std::sync::Mutex;

use custom_email_sender_core::envelope::EncryptionContext;
use custom_email_sender_core::message::OutgoingEmail;
use zeroize::Zeroizing;

use crate::adapters::kms::{KmsApi, KmsEncryptOutput};
use crate::adapters::mailer::Mailer;

#[derive(Debug)]
struct WrappedKey {
    key_id: String,
    plaintext: Vec<u8>,
    context: EncryptionContext,
}

/// In-memory stand-in for KMS. Ciphertexts are opaque tokens that only
/// unwrap under the same key id and encryption context.
#[derive(Debug, Default)]
pub struct FakeKms {
    wrapped: Mutex<HashMap<Vec<u8>, WrappedKey>>,
    decrypt_calls: Mutex<usize>,
    denial: Mutex<Option<String>>,
}

impl FakeKms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decrypt_calls(&self) -> usize {
        *self.decrypt_calls.lock().expect("poisoned mutex")
    }

    pub fn deny_decrypt(&self, message: &str) {
        *self.denial.lock().expect("poisoned mutex") = Some(message.to_string());
    }
}

impl KmsApi for FakeKms {
    fn encrypt(
        &self,
        key_id: &str,
        plaintext: &[u8],
        context: &EncryptionContext,
    ) -> Result<KmsEncryptOutput, String> {
        let mut wrapped = self.wrapped.lock().expect("poisoned mutex");
        let token = format!("fake-kms-ciphertext-{}", wrapped.len()).into_bytes();
        wrapped.insert(
            token.clone(),
            WrappedKey {
                key_id: key_id.to_string(),
                plaintext: plaintext.to_vec(),
                context: context.clone(),
            },
        );
        Ok(KmsEncryptOutput {
            key_id: key_id.to_string(),
            ciphertext: token,
        })
    }

    fn decrypt(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, String> {
        *self.decrypt_calls.lock().expect("poisoned mutex") += 1;
        if let Some(denial) = self.denial.lock().expect("poisoned mutex").clone() {
            return Err(format!("kms decrypt failed: {denial}"));
        }

        let wrapped = self.wrapped.lock().expect("poisoned mutex");
        match wrapped.get(ciphertext) {
            Some(entry) if entry.key_id == key_id && &entry.context == context => {
                Ok(Zeroizing::new(entry.plaintext.clone()))
            }
            _ => Err("kms decrypt failed: InvalidCiphertextException".to_string()),
        }
    }
}

/// Records every message handed to it; optionally fails every send.
#[derive(Debug, Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Option<String>,
}

impl CapturingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().expect("poisoned mutex").clone()
    }
}

impl Mailer for CapturingMailer {
    fn send(&self, message: &OutgoingEmail) -> Result<(), String> {
        self.sent.lock().expect("poisoned mutex").push(message.clone());
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}
