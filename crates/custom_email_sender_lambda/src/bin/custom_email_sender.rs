use custom_email_sender_core::envelope::{CommitmentPolicy, EncryptionClient};
use custom_email_sender_lambda::adapters::decrypt::KeyringCodeDecryptor;
use custom_email_sender_lambda::adapters::kms::{AwsKmsApi, KmsKeyring};
use custom_email_sender_lambda::adapters::sendgrid::SendGridMailer;
use custom_email_sender_lambda::config::SenderConfig;
use custom_email_sender_lambda::handlers::custom_email_sender::{
    handle_custom_email_event, parse_event, CustomEmailHandlerConfig,
};
use custom_email_sender_lambda::logging::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};

struct RuntimeDependencies {
    config: CustomEmailHandlerConfig,
    decryptor: KeyringCodeDecryptor<KmsKeyring<AwsKmsApi>>,
    mailer: SendGridMailer,
}

async fn handle_request(
    event: LambdaEvent<serde_json::Value>,
    dependencies: &RuntimeDependencies,
) -> Result<(), Error> {
    let trigger_event = parse_event(event.payload)?;
    handle_custom_email_event(
        &trigger_event,
        &dependencies.config,
        &dependencies.decryptor,
        &dependencies.mailer,
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let sender_config = SenderConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let keyring = KmsKeyring::new(
        AwsKmsApi::new(aws_sdk_kms::Client::new(&aws_config)),
        sender_config.key_ids.clone(),
    )?;

    let dependencies = RuntimeDependencies {
        config: CustomEmailHandlerConfig {
            from_address: sender_config.from_address.clone(),
        },
        decryptor: KeyringCodeDecryptor::new(
            EncryptionClient::new(CommitmentPolicy::RequireEncryptAllowDecrypt),
            keyring,
        ),
        mailer: SendGridMailer::new(sender_config.sendgrid_api_key.clone()),
    };
    let dependencies = &dependencies;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, dependencies).await
    }))
    .await
}
