use std::time::Duration;

use async_trait::async_trait;
use herald_common::{Email, outgoing};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{MailError, MailTransport, SmtpConfig, TlsMode};

/// Sends mail through an SMTP relay using a pooled async transport.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        type Transport = AsyncSmtpTransport<Tokio1Executor>;

        let builder = match config.tls {
            TlsMode::Tls => Transport::relay(&config.host)
                .map_err(|err| MailError::Smtp(err.to_string()))?,
            TlsMode::StartTls => Transport::starttls_relay(&config.host)
                .map_err(|err| MailError::Smtp(err.to_string()))?,
            TlsMode::None => Transport::builder_dangerous(&config.host),
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let Some(user) = &config.user {
            builder = builder.credentials(Credentials::new(
                user.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .parse()
        .map_err(|err: lettre::address::AddressError| MailError::InvalidAddress {
            address: address.to_string(),
            reason: err.to_string(),
        })
}

/// `text/plain` becomes `text/plain; charset=utf-8`; explicit parameters are kept.
fn content_type(value: &str) -> Result<ContentType, MailError> {
    let value = if value.contains(';') {
        value.to_string()
    } else {
        format!("{}; charset=utf-8", value.trim())
    };

    ContentType::parse(&value).map_err(|err| MailError::Build(err.to_string()))
}

pub(crate) fn build_message(email: &Email) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(mailbox(&email.from)?)
        .subject(email.subject.clone())
        .header(content_type(&email.content_type)?);

    for recipient in &email.to {
        builder = builder.to(mailbox(recipient)?);
    }

    builder
        .body(email.body.clone())
        .map_err(|err| MailError::Build(err.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let message = build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|err| MailError::Smtp(err.to_string()))?;

        outgoing!(
            level = DEBUG,
            recipients = email.to.len(),
            code = %response.code(),
            "Mail accepted by relay"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Email {
        let mut email = Email::new(
            vec!["a@x.com".into(), "b@y.org".into()],
            "Greetings",
            "<p>Hello</p>",
        )
        .with_content_type("text/html");
        email.prepare("noreply@herald.dev");
        email
    }

    #[test]
    fn message_carries_headers() {
        let message = build_message(&email()).expect("message builds");
        let formatted = String::from_utf8(message.formatted()).expect("utf-8");

        assert!(formatted.contains("From: noreply@herald.dev"));
        assert!(formatted.contains("To: a@x.com, b@y.org"));
        assert!(formatted.contains("Subject: Greetings"));
        assert!(formatted.contains("Content-Type: text/html; charset=utf-8"));
    }

    #[test]
    fn bad_recipient_is_permanent() {
        let mut email = email();
        email.to.push("nope".into());

        let err = build_message(&email).expect_err("address rejected");
        assert!(matches!(err, MailError::InvalidAddress { ref address, .. } if address == "nope"));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn plaintext_transport_builds() {
        let config = SmtpConfig {
            host: "127.0.0.1".into(),
            port: 2525,
            tls: TlsMode::None,
            ..SmtpConfig::default()
        };
        assert!(SmtpMailer::new(&config).is_ok());
    }
}
