use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use p384::ecdsa::signature::{Signer, Verifier};
use p384::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use super::error::EnvelopeError;
use super::header::EncryptionContext;

/// Encryption context entry holding the compressed, base64 ECDSA public key.
pub const PUBLIC_KEY_CONTEXT_KEY: &str = "aws-crypto-public-key";

pub(crate) fn verify_footer(
    context: &EncryptionContext,
    signed: &[u8],
    signature: &[u8],
) -> Result<(), EnvelopeError> {
    let encoded = context.get(PUBLIC_KEY_CONTEXT_KEY).ok_or_else(|| {
        EnvelopeError::Signature("encryption context carries no public key".to_string())
    })?;
    let public_key = STANDARD
        .decode(encoded)
        .map_err(|error| EnvelopeError::Signature(format!("public key is not base64: {error}")))?;
    let verifying_key = VerifyingKey::from_sec1_bytes(&public_key)
        .map_err(|error| EnvelopeError::Signature(format!("invalid public key: {error}")))?;
    let signature = Signature::from_der(signature)
        .map_err(|error| EnvelopeError::Signature(format!("invalid signature encoding: {error}")))?;

    verifying_key
        .verify(signed, &signature)
        .map_err(|_| EnvelopeError::Signature("signature does not match the message".to_string()))
}

pub(crate) struct MessageSigner {
    key: SigningKey,
}

impl MessageSigner {
    pub(crate) fn generate() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    pub(crate) fn public_key(&self) -> String {
        STANDARD.encode(self.key.verifying_key().to_encoded_point(true).as_bytes())
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Vec<u8> {
        let signature: Signature = self.key.sign(message);
        signature.to_der().as_bytes().to_vec()
    }
}
