//! Guest thank-you emails
//!
//! Registration never sends mail directly. It writes an entry to an outbound
//! queue that an external mailer drains.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::models::{Guest, Settings};

/// Outbound message as picked up by the mailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEntry {
    pub to: Vec<String>,
    #[serde(
        rename = "replyTo",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub reply_to: String,
    pub message: MailMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Write-only outbound mail queue
#[async_trait]
pub trait MailQueue: Send + Sync {
    async fn enqueue(&self, entry: &MailEntry) -> Result<()>;
}

/// Queue that only logs entries. Useful when no mailer is configured.
pub struct LogMailQueue;

#[async_trait]
impl MailQueue for LogMailQueue {
    async fn enqueue(&self, entry: &MailEntry) -> Result<()> {
        info!(to = ?entry.to, subject = %entry.message.subject, "Mail entry (not delivered)");
        Ok(())
    }
}

/// Values substituted into an email template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateValues {
    pub date: String,
    pub time: String,
    pub address: String,
    pub realtor_name: String,
}

impl TemplateValues {
    /// `when` is the local wall-clock time of the registration
    pub fn new(when: NaiveDateTime, address: &str, realtor_name: &str) -> Self {
        Self {
            date: when.format("%B %-d, %Y").to_string(),
            time: when.format("%-I:%M %p").to_string(),
            address: address.to_string(),
            realtor_name: realtor_name.to_string(),
        }
    }
}

pub fn render_template(template: &str, values: &TemplateValues) -> String {
    template
        .replace("[DATE]", &values.date)
        .replace("[TIME]", &values.time)
        .replace("[ADDRESS]", &values.address)
        .replace("[REALTOR_NAME]", &values.realtor_name)
}

/// Escape for HTML and turn line breaks into `<br>`
pub fn text_to_html(text: &str) -> String {
    let mut html = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => html.push_str("&amp;"),
            '<' => html.push_str("&lt;"),
            '>' => html.push_str("&gt;"),
            '"' => html.push_str("&quot;"),
            '\'' => html.push_str("&#39;"),
            '\n' => html.push_str("<br>"),
            '\r' => {}
            _ => html.push(c),
        }
    }
    html
}

/// Thank-you mail for a new guest, or `None` when the realtor has no template
pub fn thank_you_entry(
    guest: &Guest,
    settings: &Settings,
    property_name: &str,
    registered_at: NaiveDateTime,
) -> Option<MailEntry> {
    if settings.email_template.trim().is_empty() {
        return None;
    }

    let address = settings.display_address(property_name);
    let values = TemplateValues::new(registered_at, address, &settings.realtor_name);
    let text = render_template(&settings.email_template, &values);

    Some(MailEntry {
        to: vec![guest.email.clone()],
        reply_to: settings.realtor_email.trim().to_string(),
        message: MailMessage {
            subject: format!("Thank you for visiting {}", address),
            html: text_to_html(&text),
            text,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn afternoon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_render_template() {
        let values = TemplateValues::new(afternoon(), "12 Oak St", "Pat Agent");
        assert_eq!(values.date, "October 18, 2026");
        assert_eq!(values.time, "2:05 PM");

        let rendered = render_template("[DATE] [TIME] at [ADDRESS] - [REALTOR_NAME] [DATE]", &values);
        assert_eq!(
            rendered,
            "October 18, 2026 2:05 PM at 12 Oak St - Pat Agent October 18, 2026"
        );
    }

    #[test]
    fn test_text_to_html() {
        assert_eq!(
            text_to_html("Hi <Jo> & \"friends\"\r\nSee you"),
            "Hi &lt;Jo&gt; &amp; &quot;friends&quot;<br>See you"
        );
    }

    #[test]
    fn test_thank_you_entry() {
        let guest = Guest::new("Jo", "Doe", "jo@x.com", "5551234567");
        let settings = Settings {
            realtor_name: "Pat Agent".into(),
            realtor_email: "pat@realty.com".into(),
            ..Settings::default()
        };

        let entry = thank_you_entry(&guest, &settings, "7 Fallback Rd", afternoon()).unwrap();
        assert_eq!(entry.to, vec!["jo@x.com"]);
        assert_eq!(entry.reply_to, "pat@realty.com");
        assert_eq!(entry.message.subject, "Thank you for visiting 7 Fallback Rd");
        assert!(entry.message.text.contains("Address: 7 Fallback Rd"));
        assert!(entry.message.text.ends_with("Pat Agent"));
        assert!(entry.message.html.contains("<br>Date: October 18, 2026"));

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["replyTo"], "pat@realty.com");
        assert_eq!(json["message"]["subject"], "Thank you for visiting 7 Fallback Rd");
    }

    #[test]
    fn test_no_template_no_mail() {
        let guest = Guest::new("Jo", "Doe", "jo@x.com", "5551234567");
        let settings = Settings {
            email_template: "  ".into(),
            ..Settings::default()
        };
        assert!(thank_you_entry(&guest, &settings, "Anywhere", afternoon()).is_none());
    }

    #[tokio::test]
    async fn test_log_queue_accepts_entries() {
        let guest = Guest::new("Jo", "Doe", "jo@x.com", "5551234567");
        let entry = thank_you_entry(&guest, &Settings::default(), "1 A St", afternoon()).unwrap();
        assert!(entry.reply_to.is_empty());
        assert!(LogMailQueue.enqueue(&entry).await.is_ok());
    }
}
