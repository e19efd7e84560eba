use std::collections::HashMap;

use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use custom_email_sender_core::envelope::{
    AlgorithmSuite, EncryptedDataKey, EncryptionContext, EnvelopeError, Keyring,
};
use tracing::{debug, warn};
use zeroize::Zeroizing;

pub const KMS_PROVIDER_ID: &str = "aws-kms";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsEncryptOutput {
    /// Key ARN reported by KMS, recorded as the provider info.
    pub key_id: String,
    pub ciphertext: Vec<u8>,
}

/// The two KMS operations a keyring needs.
pub trait KmsApi {
    fn encrypt(
        &self,
        key_id: &str,
        plaintext: &[u8],
        context: &EncryptionContext,
    ) -> Result<KmsEncryptOutput, String>;

    fn decrypt(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, String>;
}

impl<T: KmsApi + ?Sized> KmsApi for &T {
    fn encrypt(
        &self,
        key_id: &str,
        plaintext: &[u8],
        context: &EncryptionContext,
    ) -> Result<KmsEncryptOutput, String> {
        (**self).encrypt(key_id, plaintext, context)
    }

    fn decrypt(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, String> {
        (**self).decrypt(key_id, ciphertext, context)
    }
}

#[derive(Debug, Clone)]
pub struct AwsKmsApi {
    client: aws_sdk_kms::Client,
}

impl AwsKmsApi {
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }
}

fn context_map(context: &EncryptionContext) -> Option<HashMap<String, String>> {
    if context.is_empty() {
        return None;
    }
    Some(
        context
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

impl KmsApi for AwsKmsApi {
    fn encrypt(
        &self,
        key_id: &str,
        plaintext: &[u8],
        context: &EncryptionContext,
    ) -> Result<KmsEncryptOutput, String> {
        let client = self.client.clone();
        let requested_key_id = key_id.to_string();
        let plaintext_blob = Blob::new(plaintext.to_vec());
        let encryption_context = context_map(context);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .encrypt()
                    .key_id(requested_key_id)
                    .plaintext(plaintext_blob)
                    .set_encryption_context(encryption_context)
                    .send()
                    .await
                    .map_err(|error| {
                        format!("kms encrypt failed: {}", DisplayErrorContext(&error))
                    })?;

                let ciphertext = output
                    .ciphertext_blob()
                    .ok_or_else(|| "kms encrypt returned no ciphertext".to_string())?
                    .as_ref()
                    .to_vec();
                let key_id = output
                    .key_id()
                    .ok_or_else(|| "kms encrypt returned no key id".to_string())?
                    .to_string();
                Ok::<_, String>(KmsEncryptOutput { key_id, ciphertext })
            })
        })
    }

    fn decrypt(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, String> {
        let client = self.client.clone();
        let requested_key_id = key_id.to_string();
        let ciphertext_blob = Blob::new(ciphertext.to_vec());
        let encryption_context = context_map(context);

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .decrypt()
                    .key_id(requested_key_id.clone())
                    .ciphertext_blob(ciphertext_blob)
                    .set_encryption_context(encryption_context)
                    .send()
                    .await
                    .map_err(|error| {
                        format!("kms decrypt failed: {}", DisplayErrorContext(&error))
                    })?;

                if let Some(reported) = output.key_id() {
                    if reported != requested_key_id {
                        return Err(format!(
                            "kms decrypt used key '{reported}' instead of '{requested_key_id}'"
                        ));
                    }
                }

                let plaintext = output
                    .plaintext()
                    .ok_or_else(|| "kms decrypt returned no plaintext".to_string())?;
                Ok::<_, String>(Zeroizing::new(plaintext.as_ref().to_vec()))
            })
        })
    }
}

/// Keyring whose data keys are wrapped by one or more KMS keys.
#[derive(Debug, Clone)]
pub struct KmsKeyring<A> {
    api: A,
    key_ids: Vec<String>,
}

impl<A: KmsApi> KmsKeyring<A> {
    pub fn new(api: A, key_ids: Vec<String>) -> Result<Self, EnvelopeError> {
        if key_ids.is_empty() {
            return Err(EnvelopeError::Keyring(
                "a KMS keyring needs at least one key id".to_string(),
            ));
        }
        Ok(Self { api, key_ids })
    }

    fn is_configured(&self, key_id: &str) -> bool {
        self.key_ids.iter().any(|configured| configured == key_id)
    }
}

impl<A: KmsApi> Keyring for KmsKeyring<A> {
    fn on_encrypt(
        &self,
        _suite: AlgorithmSuite,
        data_key: &[u8],
        encryption_context: &EncryptionContext,
    ) -> Result<Vec<EncryptedDataKey>, EnvelopeError> {
        self.key_ids
            .iter()
            .map(|key_id| {
                let output = self
                    .api
                    .encrypt(key_id, data_key, encryption_context)
                    .map_err(EnvelopeError::Keyring)?;
                Ok(EncryptedDataKey {
                    provider_id: KMS_PROVIDER_ID.to_string(),
                    provider_info: output.key_id.into_bytes(),
                    ciphertext: output.ciphertext,
                })
            })
            .collect()
    }

    fn on_decrypt(
        &self,
        suite: AlgorithmSuite,
        encrypted_data_keys: &[EncryptedDataKey],
        encryption_context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, EnvelopeError> {
        let mut failures = Vec::new();

        for key in encrypted_data_keys
            .iter()
            .filter(|key| key.provider_id == KMS_PROVIDER_ID)
        {
            let Ok(key_id) = std::str::from_utf8(&key.provider_info) else {
                continue;
            };
            if !self.is_configured(key_id) {
                continue;
            }

            match self.api.decrypt(key_id, &key.ciphertext, encryption_context) {
                Ok(data_key) if data_key.len() == suite.data_key_length() => {
                    debug!(
                        component = "kms_keyring",
                        event = "data_key_decrypted",
                        key_id = %key_id,
                    );
                    return Ok(data_key);
                }
                Ok(data_key) => {
                    failures.push(format!(
                        "{key_id}: data key has {} bytes, expected {}",
                        data_key.len(),
                        suite.data_key_length()
                    ));
                }
                Err(error) => {
                    warn!(
                        component = "kms_keyring",
                        event = "data_key_decrypt_failed",
                        key_id = %key_id,
                        error = %error,
                    );
                    failures.push(format!("{key_id}: {error}"));
                }
            }
        }

        if failures.is_empty() {
            Err(EnvelopeError::NoDataKey(
                "no encrypted data key matches the configured key ids".to_string(),
            ))
        } else {
            Err(EnvelopeError::NoDataKey(failures.join("; ")))
        }
    }
}
