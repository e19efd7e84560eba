//! AWS-oriented adapters and handler for the custom email sender trigger.
//!
//! This crate owns runtime integration details (Lambda handler, KMS keyring,
//! SendGrid delivery, environment configuration) on top of the event contract
//! and envelope format from `custom_email_sender_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;

#[cfg(test)]
pub(crate) mod test_support;
