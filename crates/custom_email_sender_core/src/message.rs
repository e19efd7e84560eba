use serde::Serialize;

use crate::trigger::TriggerSource;

pub const DEFAULT_SENDER: &str = "cognito-test@maxivanov.io";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageTemplate {
    pub subject: &'static str,
    pub code_prefix: &'static str,
}

pub const VERIFICATION_CODE_TEMPLATE: MessageTemplate = MessageTemplate {
    subject: "Your Cognito code",
    code_prefix: "Your code: ",
};

impl MessageTemplate {
    /// Single dispatch point from trigger source to template.
    pub fn for_trigger(source: Option<&TriggerSource>) -> &'static MessageTemplate {
        match source {
            Some(
                TriggerSource::SignUp
                | TriggerSource::ResendCode
                | TriggerSource::ForgotPassword
                | TriggerSource::UpdateUserAttribute
                | TriggerSource::VerifyUserAttribute
                | TriggerSource::AdminCreateUser
                | TriggerSource::AccountTakeOverNotification
                | TriggerSource::Other(_),
            )
            | None => &VERIFICATION_CODE_TEMPLATE,
        }
    }

    pub fn render(&self, to: &str, from: &str, code: &str) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            from: from.to_string(),
            subject: self.subject.to_string(),
            text: format!("{}{code}", self.code_prefix),
        }
    }
}

#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

impl std::fmt::Debug for OutgoingEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingEmail")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("subject", &self.subject)
            .field("text_len", &self.text.len())
            .finish()
    }
}
