use custom_email_sender_core::message::OutgoingEmail;
use serde::Serialize;

use super::mailer::Mailer;

pub const SENDGRID_MAIL_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Serialize, PartialEq)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize, PartialEq)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

fn mail_send_request(message: &OutgoingEmail) -> MailSendRequest<'_> {
    MailSendRequest {
        personalizations: vec![Personalization {
            to: vec![Address {
                email: &message.to,
            }],
        }],
        from: Address {
            email: &message.from,
        },
        subject: &message.subject,
        content: vec![Content {
            content_type: "text/plain",
            value: &message.text,
        }],
    }
}

/// Delivers messages through the SendGrid v3 `mail/send` endpoint.
#[derive(Clone)]
pub struct SendGridMailer {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl SendGridMailer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, SENDGRID_MAIL_SEND_URL)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }
}

impl Mailer for SendGridMailer {
    fn send(&self, message: &OutgoingEmail) -> Result<(), String> {
        let body = serde_json::to_vec(&mail_send_request(message))
            .map_err(|error| format!("failed to serialize sendgrid request: {error}"))?;
        let client = self.http_client.clone();
        let endpoint = self.endpoint.clone();
        let api_key = self.api_key.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let response = client
                    .post(endpoint)
                    .bearer_auth(api_key)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await
                    .map_err(|error| format!("failed to reach sendgrid: {error}"))?;

                let status = response.status();
                if status.is_success() {
                    return Ok(());
                }
                let detail = response.text().await.unwrap_or_default();
                Err(format!(
                    "sendgrid rejected message with status {status}: {}",
                    detail.trim()
                ))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use serde_json::json;

    use super::*;

    fn message() -> OutgoingEmail {
        OutgoingEmail {
            to: "u@x.com".to_string(),
            from: "cognito-test@maxivanov.io".to_string(),
            subject: "Your Cognito code".to_string(),
            text: "Your code: 123456".to_string(),
        }
    }

    /// Answers one request with `status_line` and `body`, returning the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let endpoint = format!(
            "http://{}/v3/mail/send",
            listener.local_addr().expect("listener address")
        );
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept connection");
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let read = stream.read(&mut chunk).expect("read request");
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..read]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            if !name.eq_ignore_ascii_case("content-length") {
                                return None;
                            }
                            value.trim().parse::<usize>().ok()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).expect("write response");
            String::from_utf8_lossy(&request).into_owned()
        });
        (endpoint, handle)
    }

    #[test]
    fn request_body_matches_mail_send_schema() {
        let message = message();
        let body = serde_json::to_value(mail_send_request(&message)).expect("body serializes");
        assert_eq!(
            body,
            json!({
                "personalizations": [{"to": [{"email": "u@x.com"}]}],
                "from": {"email": "cognito-test@maxivanov.io"},
                "subject": "Your Cognito code",
                "content": [{"type": "text/plain", "value": "Your code: 123456"}]
            })
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn accepted_message_posts_json_with_bearer_auth() {
        let (endpoint, server) = serve_once("HTTP/1.1 202 Accepted", "");
        let mailer = SendGridMailer::with_endpoint("SG.secret", endpoint);

        mailer.send(&message()).expect("202 is a successful delivery");

        let request = server.join().expect("server thread");
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /v3/mail/send HTTP/1.1"));
        assert!(lowered.contains("authorization: bearer sg.secret"));
        assert!(lowered.contains("content-type: application/json"));
        assert!(request.contains("\"value\":\"Your code: 123456\""));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_message_reports_status_and_body() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 401 Unauthorized",
            r#"{"errors":[{"message":"The provided authorization grant is invalid"}]}"#,
        );
        let mailer = SendGridMailer::with_endpoint("SG.revoked", endpoint);

        let error = mailer.send(&message()).expect_err("401 should be a delivery failure");
        server.join().expect("server thread");

        assert!(error.contains("401"), "{error}");
        assert!(error.contains("The provided authorization grant is invalid"), "{error}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_endpoint_is_a_delivery_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let endpoint = format!(
            "http://{}/v3/mail/send",
            listener.local_addr().expect("listener address")
        );
        drop(listener);
        let mailer = SendGridMailer::with_endpoint("SG.secret", endpoint);

        let error = mailer.send(&message()).expect_err("closed port should fail");
        assert!(error.contains("failed to reach sendgrid"));
    }
}
