use custom_email_sender_core::message::OutgoingEmail;

pub trait Mailer {
    fn send(&self, message: &OutgoingEmail) -> Result<(), String>;
}
