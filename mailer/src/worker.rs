use std::{num::NonZeroU32, sync::Arc, time::Duration};

use common::error::AppError;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use queue::{Envelope, RedisQueue};

use crate::{message::MailMessage, smtp::MailTransport};

#[derive(Debug, PartialEq)]
pub enum Delivery {
    Sent,
    /// Failed, with attempts left.
    Retry(Envelope<MailMessage>),
    Dropped,
}

/// One delivery attempt of a queued mail.
///
/// Invalid recipients are dropped at once; other failures are retried until
/// the envelope has been tried `tries` times.
pub async fn deliver(
    transport: &dyn MailTransport,
    envelope: Envelope<MailMessage>,
    tries: u32,
) -> Delivery {
    match transport.send(&envelope.payload).await {
        Ok(()) => Delivery::Sent,
        Err(AppError::Validation(e)) => {
            log::error!(
                "Dropping mail message_id={} to={}: {}",
                envelope.id,
                envelope.payload.to,
                e
            );
            Delivery::Dropped
        }
        Err(e) => {
            let attempt = envelope.attempts + 1;
            if attempt < tries {
                log::warn!(
                    "Mail delivery failed message_id={} attempt={}/{}: {}",
                    envelope.id,
                    attempt,
                    tries,
                    e
                );
                Delivery::Retry(envelope.retried())
            } else {
                log::error!(
                    "Mail delivery failed for good message_id={} to={} attempts={}: {}",
                    envelope.id,
                    envelope.payload.to,
                    attempt,
                    e
                );
                Delivery::Dropped
            }
        }
    }
}

/// Consumes the `emails` queue, throttled to a fixed number of sends per second.
pub struct MailWorker {
    queue: RedisQueue,
    transport: Arc<dyn MailTransport>,
    limiter: DefaultDirectRateLimiter,
    tries: u32,
    poll_seconds: f64,
}

impl MailWorker {
    pub fn new(
        queue: RedisQueue,
        transport: Arc<dyn MailTransport>,
        max_per_second: u32,
        tries: u32,
        poll_seconds: f64,
    ) -> Self {
        let rate = NonZeroU32::new(max_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            queue,
            transport,
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            tries,
            poll_seconds,
        }
    }

    pub async fn run(self) {
        log::info!(
            "Mail worker listening queue={} tries={}",
            self.queue.name(),
            self.tries
        );

        loop {
            let envelope = match self.queue.pop::<MailMessage>(self.poll_seconds).await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(e) => {
                    log::error!("Failed to read queue={}: {}", self.queue.name(), e);
                    tokio::time::sleep(Duration::from_secs_f64(self.poll_seconds)).await;
                    continue;
                }
            };

            self.limiter.until_ready().await;

            if let Delivery::Retry(envelope) =
                deliver(self.transport.as_ref(), envelope, self.tries).await
            {
                if let Err(e) = self.queue.push_envelope(&envelope).await {
                    log::error!(
                        "Failed to requeue mail message_id={}: {}",
                        envelope.id,
                        e
                    );
                }
            }
        }
    }
}
