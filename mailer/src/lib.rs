pub mod message;
pub mod notifier;
pub mod smtp;
pub mod templates;
pub mod worker;

pub use message::{MailMessage, Notification, NotificationKind};
pub use notifier::{Notifier, QueuedNotifier};
pub use smtp::{MailTransport, SmtpMailer};
pub use templates::Branding;
