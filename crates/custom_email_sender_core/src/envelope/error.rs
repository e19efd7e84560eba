use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("message truncated while reading {0}")]
    Truncated(&'static str),

    #[error("unsupported message format version {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("unsupported algorithm suite {0:#06x}")]
    UnsupportedSuite(u16),

    #[error("algorithm suite {0:#06x} is not allowed by the commitment policy")]
    CommitmentPolicy(u16),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("malformed body: {0}")]
    MalformedBody(String),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("unable to decrypt any data key: {0}")]
    NoDataKey(String),

    #[error("key commitment does not match the message header")]
    CommitmentMismatch,

    #[error("header authentication failed")]
    HeaderAuthentication,

    #[error("body authentication failed for frame {0}")]
    BodyAuthentication(u32),

    #[error("signature verification failed: {0}")]
    Signature(String),

    #[error("{0} unexpected bytes after the end of the message")]
    TrailingBytes(usize),

    #[error("encryption failed: {0}")]
    Encryption(String),
}
