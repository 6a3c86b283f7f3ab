use std::sync::Mutex;

use async_trait::async_trait;
use common::error::{AppError, Res};
use mailer::{MailMessage, MailTransport, worker::{Delivery, deliver}};
use queue::Envelope;

struct FlakyTransport {
    failures: Mutex<u32>,
    error: fn() -> AppError,
    sent: Mutex<Vec<MailMessage>>,
}

impl FlakyTransport {
    fn failing(times: u32, error: fn() -> AppError) -> Self {
        Self {
            failures: Mutex::new(times),
            error,
            sent: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MailTransport for FlakyTransport {
    async fn send(&self, mail: &MailMessage) -> Res<()> {
        let mut failures = self.failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err((self.error)());
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

fn mail() -> MailMessage {
    MailMessage {
        to: "ana@example.com".to_string(),
        subject: "Your subscription has expired - Streamly".to_string(),
        html: "<p>Hello Ana,</p>".to_string(),
        text: "Hello Ana,".to_string(),
    }
}

fn smtp_down() -> AppError {
    AppError::Mail("connection refused".to_string())
}

#[tokio::test]
async fn sends_on_first_attempt() {
    let transport = FlakyTransport::failing(0, smtp_down);
    let result = deliver(&transport, Envelope::new(mail()), 3).await;
    assert_eq!(result, Delivery::Sent);
    assert_eq!(transport.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn transient_failure_is_retried_until_tries_run_out() {
    let transport = FlakyTransport::failing(10, smtp_down);
    let mut envelope = Envelope::new(mail());
    let id = envelope.id;

    for expected_attempts in 1..3 {
        match deliver(&transport, envelope, 3).await {
            Delivery::Retry(next) => {
                assert_eq!(next.id, id);
                assert_eq!(next.attempts, expected_attempts);
                envelope = next;
            }
            other => panic!("expected retry, got {:?}", other),
        }
    }

    assert_eq!(deliver(&transport, envelope, 3).await, Delivery::Dropped);
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn retried_mail_is_delivered_once_smtp_recovers() {
    let transport = FlakyTransport::failing(1, smtp_down);
    let Delivery::Retry(envelope) = deliver(&transport, Envelope::new(mail()), 3).await else {
        panic!("expected retry");
    };
    assert_eq!(deliver(&transport, envelope, 3).await, Delivery::Sent);
    assert_eq!(transport.sent.lock().unwrap()[0], mail());
}

#[tokio::test]
async fn invalid_recipient_is_dropped_without_retry() {
    let transport = FlakyTransport::failing(1, || {
        AppError::Validation("Invalid e-mail address".to_string())
    });
    assert_eq!(
        deliver(&transport, Envelope::new(mail()), 3).await,
        Delivery::Dropped
    );
}
