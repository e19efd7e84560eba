use std::collections::BTreeMap;

use super::error::EnvelopeError;
use super::suite::{AlgorithmSuite, MessageFormatVersion};
use super::wire::{write_prefixed, WireReader};

/// Non-secret key/value pairs bound to a message as additional authenticated data.
pub type EncryptionContext = BTreeMap<String, String>;

const V1_MESSAGE_TYPE: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedDataKey {
    pub provider_id: String,
    pub provider_info: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    NonFramed,
    Framed,
}

impl ContentType {
    fn from_byte(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::NonFramed),
            0x02 => Some(Self::Framed),
            _ => None,
        }
    }

    fn as_byte(self) -> u8 {
        match self {
            Self::NonFramed => 0x01,
            Self::Framed => 0x02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub suite: AlgorithmSuite,
    pub message_id: Vec<u8>,
    pub encryption_context: EncryptionContext,
    pub encrypted_data_keys: Vec<EncryptedDataKey>,
    pub content_type: ContentType,
    pub frame_length: u32,
    /// Key commitment for committing suites, empty otherwise.
    pub suite_data: Vec<u8>,
}

pub(crate) struct HeaderAuthentication {
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
}

pub(crate) struct ParsedHeader {
    pub header: MessageHeader,
    /// Number of leading message bytes covered by the header auth tag.
    pub body_len: usize,
    pub authentication: HeaderAuthentication,
}

impl MessageHeader {
    pub(crate) fn parse(reader: &mut WireReader<'_>) -> Result<ParsedHeader, EnvelopeError> {
        let version = reader.u8("version")?;
        let format = match version {
            0x01 => MessageFormatVersion::V1,
            0x02 => MessageFormatVersion::V2,
            other => return Err(EnvelopeError::UnsupportedVersion(other)),
        };

        if format == MessageFormatVersion::V1 {
            let message_type = reader.u8("message type")?;
            if message_type != V1_MESSAGE_TYPE {
                return Err(EnvelopeError::MalformedHeader(format!(
                    "unexpected message type {message_type:#04x}"
                )));
            }
        }

        let suite_id = reader.u16("algorithm suite")?;
        let suite =
            AlgorithmSuite::from_id(suite_id).ok_or(EnvelopeError::UnsupportedSuite(suite_id))?;
        if suite.message_format_version() != format {
            return Err(EnvelopeError::MalformedHeader(format!(
                "algorithm suite {suite_id:#06x} cannot appear in a v{version} header"
            )));
        }

        let message_id = reader
            .take(suite.message_id_length(), "message id")?
            .to_vec();
        let encryption_context = parse_encryption_context(reader)?;
        let encrypted_data_keys = parse_encrypted_data_keys(reader)?;

        let content_type_byte = reader.u8("content type")?;
        let content_type = ContentType::from_byte(content_type_byte).ok_or_else(|| {
            EnvelopeError::MalformedHeader(format!(
                "unknown content type {content_type_byte:#04x}"
            ))
        })?;

        if format == MessageFormatVersion::V1 {
            let reserved = reader.take(4, "reserved")?;
            if reserved != [0u8; 4] {
                return Err(EnvelopeError::MalformedHeader(
                    "reserved bytes must be zero".to_string(),
                ));
            }
            let iv_length = reader.u8("iv length")?;
            if usize::from(iv_length) != suite.iv_length() {
                return Err(EnvelopeError::MalformedHeader(format!(
                    "iv length {iv_length} does not match the algorithm suite"
                )));
            }
        }

        let frame_length = reader.u32("frame length")?;
        match content_type {
            ContentType::NonFramed if frame_length != 0 => {
                return Err(EnvelopeError::MalformedHeader(
                    "non-framed content must declare a zero frame length".to_string(),
                ));
            }
            ContentType::Framed if frame_length == 0 => {
                return Err(EnvelopeError::MalformedHeader(
                    "framed content must declare a positive frame length".to_string(),
                ));
            }
            _ => {}
        }

        let suite_data = reader
            .take(suite.suite_data_length(), "algorithm suite data")?
            .to_vec();
        let body_len = reader.position();

        // v2 headers omit the IV; it is always zero.
        let iv = match format {
            MessageFormatVersion::V1 => reader.take(suite.iv_length(), "header iv")?.to_vec(),
            MessageFormatVersion::V2 => vec![0u8; suite.iv_length()],
        };
        let tag = reader
            .take(suite.tag_length(), "header authentication tag")?
            .to_vec();

        Ok(ParsedHeader {
            header: MessageHeader {
                suite,
                message_id,
                encryption_context,
                encrypted_data_keys,
                content_type,
                frame_length,
                suite_data,
            },
            body_len,
            authentication: HeaderAuthentication { iv, tag },
        })
    }

    /// Serializes everything covered by the header authentication tag.
    pub(crate) fn serialize_body(&self) -> Result<Vec<u8>, EnvelopeError> {
        let format = self.suite.message_format_version();
        let mut out = Vec::new();
        out.push(format.as_byte());
        if format == MessageFormatVersion::V1 {
            out.push(V1_MESSAGE_TYPE);
        }
        out.extend_from_slice(&self.suite.id().to_be_bytes());
        out.extend_from_slice(&self.message_id);

        let context = serialize_encryption_context(&self.encryption_context)?;
        write_prefixed(&mut out, &context)?;

        let key_count = u16::try_from(self.encrypted_data_keys.len()).map_err(|_| {
            EnvelopeError::Encryption("too many encrypted data keys".to_string())
        })?;
        out.extend_from_slice(&key_count.to_be_bytes());
        for key in &self.encrypted_data_keys {
            write_prefixed(&mut out, key.provider_id.as_bytes())?;
            write_prefixed(&mut out, &key.provider_info)?;
            write_prefixed(&mut out, &key.ciphertext)?;
        }

        out.push(self.content_type.as_byte());
        if format == MessageFormatVersion::V1 {
            out.extend_from_slice(&[0u8; 4]);
            out.push(self.suite.iv_length() as u8);
        }
        out.extend_from_slice(&self.frame_length.to_be_bytes());
        out.extend_from_slice(&self.suite_data);
        Ok(out)
    }
}

fn parse_encryption_context(
    reader: &mut WireReader<'_>,
) -> Result<EncryptionContext, EnvelopeError> {
    let aad = reader.prefixed("encryption context")?;
    let mut context = EncryptionContext::new();
    if aad.is_empty() {
        return Ok(context);
    }

    let mut pairs = WireReader::new(aad);
    let count = pairs.u16("encryption context pair count")?;
    if count == 0 {
        return Err(EnvelopeError::MalformedHeader(
            "an empty encryption context must be omitted".to_string(),
        ));
    }

    for _ in 0..count {
        let key = utf8(pairs.prefixed("encryption context key")?, "encryption context key")?;
        let value = utf8(
            pairs.prefixed("encryption context value")?,
            "encryption context value",
        )?;
        if context.insert(key.clone(), value).is_some() {
            return Err(EnvelopeError::MalformedHeader(format!(
                "duplicate encryption context key '{key}'"
            )));
        }
    }

    if pairs.remaining() != 0 {
        return Err(EnvelopeError::MalformedHeader(
            "encryption context length does not match its pairs".to_string(),
        ));
    }

    Ok(context)
}

fn parse_encrypted_data_keys(
    reader: &mut WireReader<'_>,
) -> Result<Vec<EncryptedDataKey>, EnvelopeError> {
    let count = reader.u16("encrypted data key count")?;
    if count == 0 {
        return Err(EnvelopeError::MalformedHeader(
            "message carries no encrypted data keys".to_string(),
        ));
    }

    let mut keys = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let provider_id = utf8(reader.prefixed("key provider id")?, "key provider id")?;
        let provider_info = reader.prefixed("key provider info")?.to_vec();
        let ciphertext = reader.prefixed("encrypted data key")?.to_vec();
        keys.push(EncryptedDataKey {
            provider_id,
            provider_info,
            ciphertext,
        });
    }
    Ok(keys)
}

pub(crate) fn serialize_encryption_context(
    context: &EncryptionContext,
) -> Result<Vec<u8>, EnvelopeError> {
    let mut out = Vec::new();
    if context.is_empty() {
        return Ok(out);
    }

    let count = u16::try_from(context.len())
        .map_err(|_| EnvelopeError::Encryption("encryption context is too large".to_string()))?;
    out.extend_from_slice(&count.to_be_bytes());
    for (key, value) in context {
        write_prefixed(&mut out, key.as_bytes())?;
        write_prefixed(&mut out, value.as_bytes())?;
    }
    Ok(out)
}

fn utf8(bytes: &[u8], field: &str) -> Result<String, EnvelopeError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| EnvelopeError::MalformedHeader(format!("{field} is not valid UTF-8")))
}
