use chrono::{DateTime, Utc};
use common::env_config::Config;

use crate::message::{MailMessage, Notification, NotificationKind};

/// Application identity used in subjects, signatures and links.
#[derive(Debug, Clone)]
pub struct Branding {
    pub app_name: String,
    pub app_url: String,
}

impl Branding {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_name: config.app_name.clone(),
            app_url: config.app_url.trim_end_matches('/').to_string(),
        }
    }

    fn renew_url(&self) -> String {
        format!("{}/subscriptions/renew", self.app_url)
    }

    fn plans_url(&self) -> String {
        format!("{}/plans", self.app_url)
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn format_amount(amount: f64) -> String {
    format!("R$ {:.2}", amount).replace('.', ",")
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn day_word(days: i64) -> &'static str {
    if days == 1 { "day" } else { "days" }
}

pub fn render(notification: &Notification, branding: &Branding) -> MailMessage {
    let name = &notification.user_name;
    let plan = &notification.plan_name;
    let end = format_date(notification.end_date);

    let (subject, paragraphs, (link_label, link_url)) = match &notification.kind {
        NotificationKind::Expired => (
            format!("Your subscription has expired - {}", branding.app_name),
            vec![
                format!("Your subscription to the {} plan expired on {}.", plan, end),
                "Pick a plan to get your access back.".to_string(),
            ],
            ("See plans".to_string(), branding.plans_url()),
        ),
        NotificationKind::ExpiringSoon { days_left } => (
            format!(
                "Your subscription expires in {} {}",
                days_left,
                day_word(*days_left)
            ),
            vec![
                format!(
                    "Your subscription to the {} plan ends in {} {}, on {}.",
                    plan,
                    days_left,
                    day_word(*days_left),
                    end
                ),
                "Renew now to keep access to every feature.".to_string(),
            ],
            ("Renew subscription".to_string(), branding.renew_url()),
        ),
        NotificationKind::Renewed => (
            format!("Your subscription was renewed - {}", branding.app_name),
            vec![format!(
                "Your subscription to the {} plan was renewed and now runs until {}.",
                plan, end
            )],
            ("Manage subscription".to_string(), branding.plans_url()),
        ),
        NotificationKind::PaymentConfirmed { amount } => (
            format!("Payment confirmed - {}", branding.app_name),
            vec![format!(
                "We received your payment of {} for the {} plan. Your access runs until {}.",
                format_amount(*amount),
                plan,
                end
            )],
            (format!("Open {}", branding.app_name), branding.app_url.clone()),
        ),
    };

    let mut text = format!("Hello {},\n\n", name);
    for paragraph in &paragraphs {
        text.push_str(paragraph);
        text.push_str("\n\n");
    }
    text.push_str(&format!("{}: {}\n\n", link_label, link_url));
    text.push_str(&format!("Regards,\n{}\n", branding.app_name));

    let mut html = format!("<p>Hello {},</p>\n", escape(name));
    for paragraph in &paragraphs {
        html.push_str(&format!("<p>{}</p>\n", escape(paragraph)));
    }
    html.push_str(&format!(
        "<p><a href=\"{}\">{}</a></p>\n",
        escape(&link_url),
        escape(&link_label)
    ));
    html.push_str(&format!("<p>Regards,<br>{}</p>\n", escape(&branding.app_name)));

    MailMessage {
        to: notification.to.clone(),
        subject,
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn branding() -> Branding {
        Branding {
            app_name: "Streamly".to_string(),
            app_url: "https://streamly.test".to_string(),
        }
    }

    fn notification(kind: NotificationKind) -> Notification {
        Notification {
            subscription_id: Uuid::new_v4(),
            to: "ana@example.com".to_string(),
            user_name: "Ana".to_string(),
            plan_name: "Premium".to_string(),
            end_date: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            kind,
        }
    }

    #[test]
    fn expiring_mail_counts_days() {
        let mail = render(
            &notification(NotificationKind::ExpiringSoon { days_left: 3 }),
            &branding(),
        );
        assert_eq!(mail.to, "ana@example.com");
        assert_eq!(mail.subject, "Your subscription expires in 3 days");
        assert!(mail.text.contains("ends in 3 days, on 01/02/2025"));
        assert!(mail.html.contains("https://streamly.test/subscriptions/renew"));

        let mail = render(
            &notification(NotificationKind::ExpiringSoon { days_left: 1 }),
            &branding(),
        );
        assert_eq!(mail.subject, "Your subscription expires in 1 day");
    }

    #[test]
    fn expired_mail_links_to_plans() {
        let mail = render(&notification(NotificationKind::Expired), &branding());
        assert_eq!(mail.subject, "Your subscription has expired - Streamly");
        assert!(mail.text.contains("Premium plan expired on 01/02/2025"));
        assert!(mail.text.contains("https://streamly.test/plans"));
    }

    #[test]
    fn payment_mail_formats_amount() {
        let mail = render(
            &notification(NotificationKind::PaymentConfirmed { amount: 49.9 }),
            &branding(),
        );
        assert!(mail.text.contains("R$ 49,90"));
        assert!(mail.text.contains("Open Streamly: https://streamly.test"));
    }

    #[test]
    fn html_escapes_user_input() {
        let mut n = notification(NotificationKind::Renewed);
        n.user_name = "<b>Ana</b>".to_string();
        let mail = render(&n, &branding());
        assert!(mail.html.contains("&lt;b&gt;Ana&lt;/b&gt;"));
        assert!(mail.text.contains("Hello <b>Ana</b>,"));
    }
}
