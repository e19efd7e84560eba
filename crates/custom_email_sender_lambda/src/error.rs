use custom_email_sender_core::envelope::EnvelopeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid trigger event: {0}")]
    InvalidEvent(String),

    #[error("request.code is not valid base64: {0}")]
    InvalidCodeEncoding(#[from] base64::DecodeError),

    #[error("failed to decrypt code: {0}")]
    Decryption(#[from] EnvelopeError),

    #[error("no code to send for trigger source '{trigger_source}'")]
    MissingCode { trigger_source: String },

    #[error("request.userAttributes.email is missing")]
    MissingRecipient,

    #[error("email delivery failed: {0}")]
    Delivery(String),
}
