pub mod decrypt;
pub mod kms;
pub mod mailer;
pub mod sendgrid;
