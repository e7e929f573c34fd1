use crate::error::ConfigError;
use crate::monitor::backoff::{BackoffGrowth, BackoffPolicy};
use crate::notifiers::resend::EmailSettings;
use config::{Config, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// How the source page is acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Render with headless Chrome so client-side listings are present
    Browser,
    /// Plain GET of the server-rendered HTML
    Http,
}

/// Process configuration, read once at startup from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Seconds between cycles
    pub check_interval: u64,
    pub state_file: PathBuf,
    /// Largest added-set that is still alerted on
    pub mass_change_ceiling: usize,
    pub backoff_after_failures: u32,
    pub backoff_step: u64,
    pub backoff_max: u64,
    pub backoff_growth: BackoffGrowth,
    pub source_url: String,
    pub listing_url_base: String,
    pub fetch_mode: FetchMode,
    pub fetch_timeout: u64,
    pub page_settle: u64,
    pub verify_listings: bool,
    pub resend_api_key: Option<String>,
    pub resend_api_url: String,
    pub email_to: Option<String>,
    pub email_from: String,
    /// Short name of the watched site, used in e-mail subjects
    pub site_name: String,
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    /// Load from an explicit set of variables instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<config::Map<String, String>>();
        Self::from_environment(Environment::default().source(Some(map)))
    }

    fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .set_default("check_interval", 120)?
            .set_default("state_file", "/data/roofz_listings.json")?
            .set_default("mass_change_ceiling", 5)?
            .set_default("backoff_after_failures", 3)?
            .set_default("backoff_step", 120)?
            .set_default("backoff_max", 720)?
            .set_default("backoff_growth", "linear")?
            .set_default("source_url", "https://roofz.eu/availability")?
            .set_default("listing_url_base", "https://roofz.eu/listing/")?
            .set_default("fetch_mode", "browser")?
            .set_default("fetch_timeout", 60)?
            .set_default("page_settle", 5)?
            .set_default("verify_listings", true)?
            .set_default("resend_api_url", "https://api.resend.com")?
            .set_default("email_from", "Roofz Monitor <onboarding@resend.dev>")?
            .set_default("site_name", "Roofz")?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.check_interval == 0 {
            return Err(invalid("CHECK_INTERVAL", "must be at least 1 second"));
        }
        if self.mass_change_ceiling == 0 {
            return Err(invalid("MASS_CHANGE_CEILING", "must be at least 1"));
        }
        if self.backoff_after_failures == 0 {
            return Err(invalid("BACKOFF_AFTER_FAILURES", "must be at least 1"));
        }
        if self.backoff_max < self.check_interval {
            return Err(invalid("BACKOFF_MAX", "must not be below CHECK_INTERVAL"));
        }
        if self.fetch_timeout == 0 {
            return Err(invalid("FETCH_TIMEOUT", "must be at least 1 second"));
        }
        for (name, url) in [
            ("SOURCE_URL", &self.source_url),
            ("LISTING_URL_BASE", &self.listing_url_base),
            ("RESEND_API_URL", &self.resend_api_url),
        ] {
            reqwest::Url::parse(url).map_err(|e| invalid(name, e.to_string()))?;
        }
        self.api_key()?;
        self.recipient()?;
        Ok(())
    }

    /// The notifier credential. Absent or blank is fatal.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        required(self.resend_api_key.as_deref(), "RESEND_API_KEY")
    }

    pub fn recipient(&self) -> Result<&str, ConfigError> {
        required(self.email_to.as_deref(), "EMAIL_TO")
    }

    pub fn email_settings(&self) -> Result<EmailSettings, ConfigError> {
        Ok(EmailSettings {
            api_url: self.resend_api_url.clone(),
            api_key: self.api_key()?.to_string(),
            from: self.email_from.clone(),
            to: self.recipient()?.to_string(),
            site_name: self.site_name.clone(),
            source_url: self.source_url.clone(),
            listing_url_base: self.listing_url_base.clone(),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_secs(self.page_settle)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            interval: self.poll_interval(),
            penalty_after: self.backoff_after_failures,
            step: Duration::from_secs(self.backoff_step),
            max_delay: Duration::from_secs(self.backoff_max),
            growth: self.backoff_growth,
        }
    }
}

fn required<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}
