//! Shared custom-email-sender domain primitives.
//!
//! This crate owns the trigger-event contract, message templates and the
//! envelope message format used to carry one-time codes. It intentionally
//! excludes AWS SDK, HTTP and Lambda runtime concerns.

pub mod envelope;
pub mod message;
pub mod trigger;
