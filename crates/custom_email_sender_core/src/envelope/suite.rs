#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormatVersion {
    V1,
    V2,
}

impl MessageFormatVersion {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::V1 => 0x01,
            Self::V2 => 0x02,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDerivation {
    Identity,
    HkdfSha256,
    HkdfSha384,
    /// Key-committing derivation; also yields the commitment value.
    HkdfSha512Commit,
}

/// The AES-256 algorithm suites this crate can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmSuite {
    Aes256GcmNoKdf,
    Aes256GcmHkdfSha256,
    Aes256GcmHkdfSha384EcdsaP384,
    Aes256GcmHkdfSha512Commit,
    Aes256GcmHkdfSha512CommitEcdsaP384,
}

impl AlgorithmSuite {
    pub const DEFAULT: Self = Self::Aes256GcmHkdfSha512CommitEcdsaP384;

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0x0078 => Some(Self::Aes256GcmNoKdf),
            0x0178 => Some(Self::Aes256GcmHkdfSha256),
            0x0378 => Some(Self::Aes256GcmHkdfSha384EcdsaP384),
            0x0478 => Some(Self::Aes256GcmHkdfSha512Commit),
            0x0578 => Some(Self::Aes256GcmHkdfSha512CommitEcdsaP384),
            _ => None,
        }
    }

    pub fn id(self) -> u16 {
        match self {
            Self::Aes256GcmNoKdf => 0x0078,
            Self::Aes256GcmHkdfSha256 => 0x0178,
            Self::Aes256GcmHkdfSha384EcdsaP384 => 0x0378,
            Self::Aes256GcmHkdfSha512Commit => 0x0478,
            Self::Aes256GcmHkdfSha512CommitEcdsaP384 => 0x0578,
        }
    }

    pub fn message_format_version(self) -> MessageFormatVersion {
        if self.is_committing() {
            MessageFormatVersion::V2
        } else {
            MessageFormatVersion::V1
        }
    }

    pub fn key_derivation(self) -> KeyDerivation {
        match self {
            Self::Aes256GcmNoKdf => KeyDerivation::Identity,
            Self::Aes256GcmHkdfSha256 => KeyDerivation::HkdfSha256,
            Self::Aes256GcmHkdfSha384EcdsaP384 => KeyDerivation::HkdfSha384,
            Self::Aes256GcmHkdfSha512Commit | Self::Aes256GcmHkdfSha512CommitEcdsaP384 => {
                KeyDerivation::HkdfSha512Commit
            }
        }
    }

    pub fn is_committing(self) -> bool {
        matches!(
            self,
            Self::Aes256GcmHkdfSha512Commit | Self::Aes256GcmHkdfSha512CommitEcdsaP384
        )
    }

    pub fn is_signing(self) -> bool {
        matches!(
            self,
            Self::Aes256GcmHkdfSha384EcdsaP384 | Self::Aes256GcmHkdfSha512CommitEcdsaP384
        )
    }

    pub fn data_key_length(self) -> usize {
        32
    }

    pub fn iv_length(self) -> usize {
        12
    }

    pub fn tag_length(self) -> usize {
        16
    }

    pub fn message_id_length(self) -> usize {
        match self.message_format_version() {
            MessageFormatVersion::V1 => 16,
            MessageFormatVersion::V2 => 32,
        }
    }

    /// Length of the suite data carried in a v2 header (the key commitment).
    pub fn suite_data_length(self) -> usize {
        if self.is_committing() {
            32
        } else {
            0
        }
    }
}
