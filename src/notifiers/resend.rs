use crate::error::NotifyError;
use crate::models::ListingRecord;
use crate::notifiers::listing_url;
use crate::notifiers::traits::Notifier;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Where and how alert e-mails are sent
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub to: String,
    /// Short name of the watched site, used in subjects
    pub site_name: String,
    pub source_url: String,
    pub listing_url_base: String,
}

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub text: String,
}

/// Sends e-mail through the Resend HTTP API.
pub struct ResendNotifier {
    client: Client,
    settings: EmailSettings,
}

impl ResendNotifier {
    pub fn new(settings: EmailSettings) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, settings })
    }

    /// Subject and plain-text body for an alert about `added`.
    pub fn compose(&self, added: &[ListingRecord]) -> EmailMessage {
        let s = &self.settings;
        let host = reqwest::Url::parse(&s.source_url)
            .ok()
            .and_then(|url| url.host_str().map(String::from))
            .unwrap_or_else(|| s.site_name.clone());

        let mut text = format!("{} new listing(s) on {}!\n\n", added.len(), host);
        for record in added {
            text.push_str(&format!("* {}\n", listing_url(&s.listing_url_base, &record.id)));
            let details = describe(record);
            if !details.is_empty() {
                text.push_str(&format!("  {details}\n"));
            }
            text.push('\n');
        }
        text.push_str(&format!("View all: {}\n", s.source_url));
        text.push_str(&format!("Checked at {}\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC")));

        EmailMessage {
            subject: format!("{}: {} New Listing(s)!", s.site_name, added.len()),
            text,
        }
    }

    /// One-off message confirming delivery works end to end.
    pub async fn send_test(&self) -> Result<(), NotifyError> {
        let s = &self.settings;
        let message = EmailMessage {
            subject: format!("{} Monitor - Test Email", s.site_name),
            text: format!(
                "If you receive this, your {} monitor is set up correctly!\n\n{}",
                s.site_name, s.source_url
            ),
        };
        self.send(&message).await
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let s = &self.settings;
        let endpoint = format!("{}/emails", s.api_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&s.api_key)
            .json(&ResendEmail {
                from: &s.from,
                to: &s.to,
                subject: &message.subject,
                text: &message.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        info!(to = %s.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn notify(&self, added: &[ListingRecord]) -> Result<(), NotifyError> {
        let message = self.compose(added);
        self.send(&message).await
    }
}

fn describe(record: &ListingRecord) -> String {
    let mut parts = Vec::new();
    if let Some(title) = &record.title {
        parts.push(title.clone());
    }
    if let Some(city) = &record.city {
        parts.push(city.clone());
    }
    if let Some(price) = record.price {
        parts.push(format!("€{price:.0}/month"));
    }
    if let Some(bedrooms) = record.bedrooms {
        parts.push(format!("{bedrooms} bedroom(s)"));
    }
    if let Some(surface) = record.surface {
        parts.push(format!("{surface:.0} m²"));
    }
    parts.join(" · ")
}
