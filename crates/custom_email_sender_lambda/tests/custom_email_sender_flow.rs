use std::collections::HashMap;
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use custom_email_sender_core::envelope::{
    AlgorithmSuite, CommitmentPolicy, EncryptionClient, EncryptionContext,
};
use custom_email_sender_core::message::OutgoingEmail;
use custom_email_sender_lambda::adapters::decrypt::KeyringCodeDecryptor;
use custom_email_sender_lambda::adapters::kms::{KmsApi, KmsEncryptOutput, KmsKeyring};
use custom_email_sender_lambda::adapters::mailer::Mailer;
use custom_email_sender_lambda::config::SenderConfig;
use custom_email_sender_lambda::error::SenderError;
use custom_email_sender_lambda::handlers::custom_email_sender::{
    handle_custom_email_event, parse_event, CustomEmailHandlerConfig,
};
use serde_json::json;
use zeroize::Zeroizing;

const KEY_ARN: &str = "arn:aws:kms:eu-west-1:111122223333:key/1234abcd";

#[derive(Debug, Default)]
struct InMemoryKms {
    keys: Mutex<HashMap<Vec<u8>, (String, Vec<u8>)>>,
}

impl KmsApi for InMemoryKms {
    fn encrypt(
        &self,
        key_id: &str,
        plaintext: &[u8],
        _context: &EncryptionContext,
    ) -> Result<KmsEncryptOutput, String> {
        let mut keys = self.keys.lock().expect("poisoned mutex");
        let ciphertext = format!("blob-{}", keys.len()).into_bytes();
        keys.insert(ciphertext.clone(), (key_id.to_string(), plaintext.to_vec()));
        Ok(KmsEncryptOutput {
            key_id: key_id.to_string(),
            ciphertext,
        })
    }

    fn decrypt(
        &self,
        key_id: &str,
        ciphertext: &[u8],
        _context: &EncryptionContext,
    ) -> Result<Zeroizing<Vec<u8>>, String> {
        match self.keys.lock().expect("poisoned mutex").get(ciphertext) {
            Some((owner, plaintext)) if owner == key_id => Ok(Zeroizing::new(plaintext.clone())),
            _ => Err("InvalidCiphertextException".to_string()),
        }
    }
}

#[derive(Default)]
struct OutboxMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
}

impl Mailer for OutboxMailer {
    fn send(&self, message: &OutgoingEmail) -> Result<(), String> {
        self.outbox
            .lock()
            .expect("poisoned mutex")
            .push(message.clone());
        Ok(())
    }
}

fn config_from(pairs: &[(&str, &str)]) -> SenderConfig {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    SenderConfig::from_lookup(|name| values.get(name).cloned()).expect("config should load")
}

fn cognito_payload(code: Option<String>) -> serde_json::Value {
    json!({
        "version": "1",
        "triggerSource": "CustomEmailSender_SignUp",
        "region": "eu-west-1",
        "userPoolId": "eu-west-1_AbCdEf",
        "userName": "5f0c1e7e-user",
        "callerContext": {
            "awsSdkVersion": "aws-sdk-unknown-unknown",
            "clientId": "1example23456789"
        },
        "request": {
            "type": "customEmailSenderRequestV1",
            "code": code,
            "clientMetadata": null,
            "userAttributes": {
                "sub": "5f0c1e7e-user",
                "cognito:user_status": "UNCONFIRMED",
                "email_verified": "false",
                "email": "u@x.com"
            }
        }
    })
}

#[test]
fn delivers_code_encrypted_by_the_user_pool() {
    let config = config_from(&[("KEY_ID", KEY_ARN), ("SENDGRID_API_KEY", "SG.secret")]);
    let kms = InMemoryKms::default();
    let keyring = KmsKeyring::new(&kms, config.key_ids.clone()).expect("keyring builds");

    for suite in [
        AlgorithmSuite::Aes256GcmHkdfSha512CommitEcdsaP384,
        AlgorithmSuite::Aes256GcmHkdfSha384EcdsaP384,
    ] {
        let policy = if suite.is_committing() {
            CommitmentPolicy::RequireEncryptAllowDecrypt
        } else {
            CommitmentPolicy::ForbidEncryptAllowDecrypt
        };
        let ciphertext = EncryptionClient::new(policy)
            .with_algorithm_suite(suite)
            .encrypt(&keyring, b"123456", EncryptionContext::new())
            .expect("encrypt succeeds");

        let event = parse_event(cognito_payload(Some(STANDARD.encode(ciphertext))))
            .expect("event parses");
        let decryptor = KeyringCodeDecryptor::new(
            EncryptionClient::new(CommitmentPolicy::RequireEncryptAllowDecrypt),
            KmsKeyring::new(&kms, config.key_ids.clone()).expect("keyring builds"),
        );
        let mailer = OutboxMailer::default();

        handle_custom_email_event(
            &event,
            &CustomEmailHandlerConfig {
                from_address: config.from_address.clone(),
            },
            &decryptor,
            &mailer,
        )
        .expect("handler succeeds");

        let outbox = mailer.outbox.lock().expect("poisoned mutex");
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "u@x.com");
        assert_eq!(outbox[0].from, "cognito-test@maxivanov.io");
        assert_eq!(outbox[0].subject, "Your Cognito code");
        assert_eq!(outbox[0].text, "Your code: 123456");
    }
}

#[test]
fn null_code_fails_without_sending() {
    let kms = InMemoryKms::default();
    let decryptor = KeyringCodeDecryptor::new(
        EncryptionClient::new(CommitmentPolicy::RequireEncryptAllowDecrypt),
        KmsKeyring::new(&kms, vec![KEY_ARN.to_string()]).expect("keyring builds"),
    );
    let mailer = OutboxMailer::default();
    let event = parse_event(cognito_payload(None)).expect("event parses");

    let error = handle_custom_email_event(
        &event,
        &CustomEmailHandlerConfig::default(),
        &decryptor,
        &mailer,
    )
    .expect_err("null code should fail");

    assert!(matches!(error, SenderError::MissingCode { .. }));
    assert!(mailer.outbox.lock().expect("poisoned mutex").is_empty());
}
