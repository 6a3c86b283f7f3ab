use async_trait::async_trait;
use common::{
    env_config::SmtpConfig,
    error::{AppError, Res},
};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};

use crate::message::MailMessage;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &MailMessage) -> Res<()>;
}

pub struct SmtpMailer {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Res<Self> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::Mail(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn build(&self, mail: &MailMessage) -> Res<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = mail.to.parse()?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(&mail.subject)
            .multipart(MultiPart::alternative_plain_html(
                mail.text.clone(),
                mail.html.clone(),
            ))?;

        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &MailMessage) -> Res<()> {
        let Some(transport) = &self.transport else {
            log::info!(
                "SMTP disabled, mail not sent to={} subject={}",
                mail.to,
                mail.subject
            );
            return Ok(());
        };

        let message = self.build(mail)?;
        transport.send(message).await?;
        log::info!("Mail sent to={} subject={}", mail.to, mail.subject);
        Ok(())
    }
}
