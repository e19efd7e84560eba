use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use super::body::{decrypt_body, encrypt_frames, encrypt_single_block};
use super::error::EnvelopeError;
use super::header::{ContentType, EncryptionContext, MessageHeader};
use super::keys::{constant_time_eq, derive_keys, ContentCipher};
use super::signature::{verify_footer, MessageSigner, PUBLIC_KEY_CONTEXT_KEY};
use super::suite::{AlgorithmSuite, MessageFormatVersion};
use super::wire::{write_prefixed, WireReader};
use super::Keyring;

pub const DEFAULT_FRAME_LENGTH: u32 = 4096;

/// Which algorithm suites may be used for encryption and accepted on decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitmentPolicy {
    ForbidEncryptAllowDecrypt,
    #[default]
    RequireEncryptAllowDecrypt,
    RequireEncryptRequireDecrypt,
}

impl CommitmentPolicy {
    fn permits_encrypt(self, suite: AlgorithmSuite) -> bool {
        match self {
            Self::ForbidEncryptAllowDecrypt => !suite.is_committing(),
            Self::RequireEncryptAllowDecrypt | Self::RequireEncryptRequireDecrypt => {
                suite.is_committing()
            }
        }
    }

    fn permits_decrypt(self, suite: AlgorithmSuite) -> bool {
        match self {
            Self::RequireEncryptRequireDecrypt => suite.is_committing(),
            Self::ForbidEncryptAllowDecrypt | Self::RequireEncryptAllowDecrypt => true,
        }
    }
}

pub struct DecryptedMessage {
    pub plaintext: Zeroizing<Vec<u8>>,
    pub header: MessageHeader,
}

impl std::fmt::Debug for DecryptedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptedMessage")
            .field("plaintext_len", &self.plaintext.len())
            .field("header", &self.header)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct EncryptionClient {
    policy: CommitmentPolicy,
    suite: AlgorithmSuite,
    frame_length: u32,
}

impl EncryptionClient {
    pub fn new(policy: CommitmentPolicy) -> Self {
        let suite = match policy {
            CommitmentPolicy::ForbidEncryptAllowDecrypt => {
                AlgorithmSuite::Aes256GcmHkdfSha384EcdsaP384
            }
            _ => AlgorithmSuite::DEFAULT,
        };
        Self {
            policy,
            suite,
            frame_length: DEFAULT_FRAME_LENGTH,
        }
    }

    pub fn with_algorithm_suite(mut self, suite: AlgorithmSuite) -> Self {
        self.suite = suite;
        self
    }

    /// A frame length of zero writes a single non-framed body.
    pub fn with_frame_length(mut self, frame_length: u32) -> Self {
        self.frame_length = frame_length;
        self
    }

    pub fn decrypt<K: Keyring + ?Sized>(
        &self,
        keyring: &K,
        ciphertext: &[u8],
    ) -> Result<DecryptedMessage, EnvelopeError> {
        let mut reader = WireReader::new(ciphertext);
        let parsed = MessageHeader::parse(&mut reader)?;
        let header = parsed.header;
        let suite = header.suite;
        if !self.policy.permits_decrypt(suite) {
            return Err(EnvelopeError::CommitmentPolicy(suite.id()));
        }

        let data_key = keyring.on_decrypt(
            suite,
            &header.encrypted_data_keys,
            &header.encryption_context,
        )?;
        let derived = derive_keys(suite, &data_key, &header.message_id)?;
        if let Some(commitment) = &derived.commitment {
            if !constant_time_eq(commitment, &header.suite_data) {
                return Err(EnvelopeError::CommitmentMismatch);
            }
        }

        let cipher = ContentCipher::new(&derived.content_key)?;
        cipher
            .open(
                &parsed.authentication.iv,
                &ciphertext[..parsed.body_len],
                &[],
                &parsed.authentication.tag,
            )
            .ok_or(EnvelopeError::HeaderAuthentication)?;

        let plaintext = Zeroizing::new(decrypt_body(&mut reader, &header, &cipher)?);

        if suite.is_signing() {
            let signed_len = reader.position();
            let signature = reader.prefixed("signature")?;
            verify_footer(
                &header.encryption_context,
                &ciphertext[..signed_len],
                signature,
            )?;
        }

        if reader.remaining() != 0 {
            return Err(EnvelopeError::TrailingBytes(reader.remaining()));
        }

        Ok(DecryptedMessage { plaintext, header })
    }

    pub fn encrypt<K: Keyring + ?Sized>(
        &self,
        keyring: &K,
        plaintext: &[u8],
        encryption_context: EncryptionContext,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let suite = self.suite;
        if !self.policy.permits_encrypt(suite) {
            return Err(EnvelopeError::CommitmentPolicy(suite.id()));
        }

        let mut context = encryption_context;
        if context.contains_key(PUBLIC_KEY_CONTEXT_KEY) {
            return Err(EnvelopeError::Encryption(format!(
                "encryption context key '{PUBLIC_KEY_CONTEXT_KEY}' is reserved"
            )));
        }
        let signer = if suite.is_signing() {
            let signer = MessageSigner::generate();
            context.insert(PUBLIC_KEY_CONTEXT_KEY.to_string(), signer.public_key());
            Some(signer)
        } else {
            None
        };

        let mut data_key = Zeroizing::new(vec![0u8; suite.data_key_length()]);
        OsRng.fill_bytes(data_key.as_mut_slice());
        let mut message_id = vec![0u8; suite.message_id_length()];
        OsRng.fill_bytes(&mut message_id);

        let encrypted_data_keys = keyring.on_encrypt(suite, &data_key, &context)?;
        if encrypted_data_keys.is_empty() {
            return Err(EnvelopeError::Keyring(
                "keyring produced no encrypted data keys".to_string(),
            ));
        }

        let derived = derive_keys(suite, &data_key, &message_id)?;
        let (content_type, frame_length) = if self.frame_length == 0 {
            (ContentType::NonFramed, 0)
        } else {
            (ContentType::Framed, self.frame_length)
        };
        let header = MessageHeader {
            suite,
            message_id,
            encryption_context: context,
            encrypted_data_keys,
            content_type,
            frame_length,
            suite_data: derived.commitment.clone().unwrap_or_default(),
        };
        let cipher = ContentCipher::new(&derived.content_key)?;

        let mut out = header.serialize_body()?;
        let header_iv = vec![0u8; suite.iv_length()];
        let (_, header_tag) = cipher.seal(&header_iv, &out, &[], suite.tag_length())?;
        if suite.message_format_version() == MessageFormatVersion::V1 {
            out.extend_from_slice(&header_iv);
        }
        out.extend_from_slice(&header_tag);

        match content_type {
            ContentType::Framed => encrypt_frames(&mut out, &header, &cipher, plaintext)?,
            ContentType::NonFramed => encrypt_single_block(&mut out, &header, &cipher, plaintext)?,
        }

        if let Some(signer) = signer {
            let signature = signer.sign(&out);
            write_prefixed(&mut out, &signature)?;
        }

        Ok(out)
    }
}
