use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "https://httpbin.org";
pub const BASE_URL_ENV: &str = "ECHOCHECK_BASE_URL";
pub const TIMEOUT_ENV: &str = "ECHOCHECK_TIMEOUT_SECS";

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Process-wide settings, fixed before the first request goes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: Url,
    /// `None` keeps the http client's default.
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Explicit values win over the environment, which wins over defaults.
    pub fn resolve(base_url: Option<&str>, timeout_secs: Option<u64>) -> Result<Settings> {
        let env_base_url = std::env::var(BASE_URL_ENV).ok();
        let env_timeout = std::env::var(TIMEOUT_ENV).ok();
        return Settings::from_sources(base_url, timeout_secs, env_base_url.as_deref(), env_timeout.as_deref());
    }

    fn from_sources(
        base_url: Option<&str>,
        timeout_secs: Option<u64>,
        env_base_url: Option<&str>,
        env_timeout: Option<&str>,
    ) -> Result<Settings> {
        let raw_url = base_url.or(env_base_url).unwrap_or(DEFAULT_BASE_URL);
        let base_url = parse_base_url(raw_url)?;

        let timeout_secs = match (timeout_secs, env_timeout) {
            (Some(secs), _) => Some(secs),
            (None, Some(raw)) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} must be a number of seconds, got '{}'", TIMEOUT_ENV, raw))?,
            ),
            (None, None) => None,
        };

        return Ok(Settings { base_url, timeout: timeout_secs.map(Duration::from_secs) });
    }

    /// Installs the settings for the rest of the process. Fails if they were
    /// already installed.
    pub fn install(settings: Settings) -> Result<&'static Settings> {
        SETTINGS
            .set(settings)
            .map_err(|_| anyhow!("settings were already initialised"))?;
        return Settings::current();
    }

    pub fn current() -> Result<&'static Settings> {
        SETTINGS.get().ok_or_else(|| anyhow!("settings were not initialised"))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim_end_matches('/')).with_context(|| format!("invalid base url '{}'", raw))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("base url '{}' must use http or https", raw));
    }
    return Ok(url);
}
