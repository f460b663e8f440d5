use digest_core::{DigestError, SmtpConfig, SmtpTls};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Sends the rendered digest as a plain-text email.
#[derive(Debug)]
pub struct DigestMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl DigestMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, DigestError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| DigestError::Config(format!("Invalid from address: {}", e)))?;

        let to: Vec<Mailbox> = config
            .to
            .iter()
            .filter_map(|addr| addr.parse().ok())
            .collect();

        if to.is_empty() {
            return Err(DigestError::Config(
                "No valid DIGEST_EMAIL_TO addresses".to_string(),
            ));
        }

        let mut builder = match config.tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host),
            SmtpTls::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host),
            SmtpTls::None => Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(
                &config.host,
            )),
        }
        .map_err(|e| DigestError::Notification(format!("SMTP transport error: {}", e)))?;

        builder = builder.port(config.port);

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }

    pub async fn send_digest(&self, subject: &str, body: &str) -> Result<(), DigestError> {
        for recipient in &self.to {
            let email = Message::builder()
                .from(self.from.clone())
                .to(recipient.clone())
                .subject(subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body.to_string())
                .map_err(|e| {
                    DigestError::Notification(format!("Failed to build email: {}", e))
                })?;

            self.transport
                .send(email)
                .await
                .map_err(|e| DigestError::Notification(format!("Failed to send email: {}", e)))?;
        }

        tracing::info!("Digest emailed to {} recipient(s)", self.to.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SmtpConfig {
        SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: None,
            password: None,
            from: "digest@example.com".to_string(),
            to: vec!["reader@example.com".to_string()],
            tls: SmtpTls::None,
        }
    }

    #[test]
    fn test_mailer_builds_from_valid_config() {
        assert!(DigestMailer::new(&base_config()).is_ok());
    }

    #[test]
    fn test_invalid_from_address_rejected() {
        let mut config = base_config();
        config.from = "not an address".to_string();
        let err = DigestMailer::new(&config).unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }

    #[test]
    fn test_no_valid_recipients_rejected() {
        let mut config = base_config();
        config.to = vec!["also not an address".to_string()];
        let err = DigestMailer::new(&config).unwrap_err();
        assert!(matches!(err, DigestError::Config(_)));
    }
}
