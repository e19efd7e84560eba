use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity-lifecycle event that caused the identity provider to invoke the sender.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerSource {
    SignUp,
    ResendCode,
    ForgotPassword,
    UpdateUserAttribute,
    VerifyUserAttribute,
    AdminCreateUser,
    AccountTakeOverNotification,
    /// A tag this build does not know; handled like every other source.
    Other(String),
}

impl TriggerSource {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SignUp => "CustomEmailSender_SignUp",
            Self::ResendCode => "CustomEmailSender_ResendCode",
            Self::ForgotPassword => "CustomEmailSender_ForgotPassword",
            Self::UpdateUserAttribute => "CustomEmailSender_UpdateUserAttribute",
            Self::VerifyUserAttribute => "CustomEmailSender_VerifyUserAttribute",
            Self::AdminCreateUser => "CustomEmailSender_AdminCreateUser",
            Self::AccountTakeOverNotification => "CustomEmailSender_AccountTakeOverNotification",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for TriggerSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CustomEmailSender_SignUp" => Self::SignUp,
            "CustomEmailSender_ResendCode" => Self::ResendCode,
            "CustomEmailSender_ForgotPassword" => Self::ForgotPassword,
            "CustomEmailSender_UpdateUserAttribute" => Self::UpdateUserAttribute,
            "CustomEmailSender_VerifyUserAttribute" => Self::VerifyUserAttribute,
            "CustomEmailSender_AdminCreateUser" => Self::AdminCreateUser,
            "CustomEmailSender_AccountTakeOverNotification" => Self::AccountTakeOverNotification,
            _ => Self::Other(value),
        }
    }
}

impl From<TriggerSource> for String {
    fn from(value: TriggerSource) -> Self {
        match value {
            TriggerSource::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    pub aws_sdk_version: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomEmailSenderRequest {
    #[serde(rename = "type")]
    pub request_type: Option<String>,
    /// Base64 envelope-encrypted one-time code.
    pub code: Option<String>,
    pub client_metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub user_attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomEmailSenderEvent {
    pub version: Option<String>,
    pub trigger_source: Option<TriggerSource>,
    pub region: Option<String>,
    pub user_pool_id: Option<String>,
    pub user_name: Option<String>,
    pub caller_context: Option<CallerContext>,
    pub request: CustomEmailSenderRequest,
}

impl CustomEmailSenderEvent {
    /// The encrypted code, treating an empty string the same as an absent one.
    pub fn encrypted_code(&self) -> Option<&str> {
        self.request
            .code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    pub fn recipient_email(&self) -> Option<&str> {
        self.request
            .user_attributes
            .get("email")
            .and_then(Value::as_str)
            .filter(|email| !email.trim().is_empty())
    }
}
