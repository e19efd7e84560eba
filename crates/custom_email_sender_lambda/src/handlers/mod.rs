pub mod custom_email_sender;
