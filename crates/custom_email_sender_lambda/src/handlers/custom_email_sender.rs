use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use custom_email_sender_core::message::{MessageTemplate, DEFAULT_SENDER};
use custom_email_sender_core::trigger::CustomEmailSenderEvent;
use serde_json::Value;
use tracing::{error, info};
use zeroize::Zeroizing;

use crate::adapters::decrypt::CodeDecryptor;
use crate::adapters::mailer::Mailer;
use crate::error::SenderError;

const COMPONENT: &str = "custom_email_sender";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEmailHandlerConfig {
    pub from_address: String,
}

impl Default for CustomEmailHandlerConfig {
    fn default() -> Self {
        Self {
            from_address: DEFAULT_SENDER.to_string(),
        }
    }
}

pub fn parse_event(payload: Value) -> Result<CustomEmailSenderEvent, SenderError> {
    serde_json::from_value(payload).map_err(|error| SenderError::InvalidEvent(error.to_string()))
}

pub fn handle_custom_email_event(
    event: &CustomEmailSenderEvent,
    config: &CustomEmailHandlerConfig,
    decryptor: &impl CodeDecryptor,
    mailer: &impl Mailer,
) -> Result<(), SenderError> {
    let started_at = Instant::now();
    let trigger_source = event
        .trigger_source
        .as_ref()
        .map(|source| source.as_str().to_string())
        .unwrap_or_default();
    info!(
        component = COMPONENT,
        event = "invocation_started",
        trigger_source = %trigger_source,
        user_pool_id = event.user_pool_id.as_deref().unwrap_or_default(),
        has_code = event.encrypted_code().is_some(),
    );

    let result = send_code(event, config, decryptor, mailer, &trigger_source);
    match &result {
        Ok(()) => info!(
            component = COMPONENT,
            event = "email_sent",
            trigger_source = %trigger_source,
            duration_ms = started_at.elapsed().as_millis() as u64,
        ),
        Err(failure) => error!(
            component = COMPONENT,
            event = "invocation_failed",
            trigger_source = %trigger_source,
            duration_ms = started_at.elapsed().as_millis() as u64,
            error = %failure,
        ),
    }
    result
}

fn send_code(
    event: &CustomEmailSenderEvent,
    config: &CustomEmailHandlerConfig,
    decryptor: &impl CodeDecryptor,
    mailer: &impl Mailer,
    trigger_source: &str,
) -> Result<(), SenderError> {
    let plaintext: Option<Zeroizing<Vec<u8>>> = match event.encrypted_code() {
        Some(encoded) => {
            let ciphertext = STANDARD.decode(encoded.trim())?;
            let decrypted = decryptor.decrypt_code(&ciphertext)?;
            info!(
                component = COMPONENT,
                event = "code_decrypted",
                algorithm_suite = decrypted.header.suite.id(),
                plaintext_len = decrypted.plaintext.len(),
            );
            Some(decrypted.plaintext)
        }
        None => None,
    };

    let Some(plaintext) = plaintext else {
        return Err(SenderError::MissingCode {
            trigger_source: trigger_source.to_string(),
        });
    };
    let recipient = event
        .recipient_email()
        .ok_or(SenderError::MissingRecipient)?;

    let code = Zeroizing::new(String::from_utf8_lossy(&plaintext).into_owned());
    let message = MessageTemplate::for_trigger(event.trigger_source.as_ref()).render(
        recipient,
        &config.from_address,
        &code,
    );

    mailer.send(&message).map_err(SenderError::Delivery)
}
