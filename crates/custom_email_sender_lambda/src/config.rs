use custom_email_sender_core::message::DEFAULT_SENDER;

use crate::error::SenderError;

pub const KEY_ID_ENV: &str = "KEY_ID";
pub const SENDGRID_API_KEY_ENV: &str = "SENDGRID_API_KEY";
pub const EMAIL_FROM_ENV: &str = "EMAIL_FROM";

/// Process-wide settings read once at cold start.
#[derive(Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub key_ids: Vec<String>,
    pub sendgrid_api_key: String,
    pub from_address: String,
}

impl SenderConfig {
    pub fn from_env() -> Result<Self, SenderError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SenderError> {
        let key_ids: Vec<String> = lookup(KEY_ID_ENV)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect();
        if key_ids.is_empty() {
            return Err(SenderError::Config(format!("{KEY_ID_ENV} must be configured")));
        }

        let sendgrid_api_key = lookup(SENDGRID_API_KEY_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                SenderError::Config(format!("{SENDGRID_API_KEY_ENV} must be configured"))
            })?;

        let from_address = lookup(EMAIL_FROM_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());

        Ok(Self {
            key_ids,
            sendgrid_api_key,
            from_address,
        })
    }
}

impl std::fmt::Debug for SenderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderConfig")
            .field("key_ids", &self.key_ids)
            .field("sendgrid_api_key", &"<redacted>")
            .field("from_address", &self.from_address)
            .finish()
    }
}
