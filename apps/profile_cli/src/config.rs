use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{bail, Context};
use client_core::transport::DEFAULT_HTTP_TIMEOUT;
use url::Url;

pub const DEFAULT_SETTINGS_FILE: &str = "profile_cli.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub service_url: String,
    pub identifier: Option<String>,
    pub password: Option<String>,
    pub http_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:2583".into(),
            identifier: None,
            password: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

pub fn load_settings(path: &Path) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut ClientSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("service_url") {
        settings.service_url = v.clone();
    }
    if let Some(v) = file_cfg.get("identifier") {
        settings.identifier = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("password") {
        settings.password = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("http_timeout_seconds") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.http_timeout = Duration::from_secs(parsed);
        }
    }
}

fn apply_env(settings: &mut ClientSettings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("PROFILE_SERVICE_URL") {
        settings.service_url = v;
    }
    if let Some(v) = var("APP__SERVICE_URL") {
        settings.service_url = v;
    }

    if let Some(v) = var("PROFILE_IDENTIFIER") {
        settings.identifier = Some(v);
    }
    if let Some(v) = var("APP__IDENTIFIER") {
        settings.identifier = Some(v);
    }

    if let Some(v) = var("PROFILE_PASSWORD") {
        settings.password = Some(v);
    }
    if let Some(v) = var("APP__PASSWORD") {
        settings.password = Some(v);
    }

    if let Some(v) = var("APP__HTTP_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.http_timeout = Duration::from_secs(parsed);
        }
    }
}

/// Trims trailing slashes, assumes `https://` when no scheme is given and
/// rejects anything that is not an http(s) URL.
pub fn normalize_service_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim().trim_end_matches('/');
    if raw.is_empty() {
        return Ok(ClientSettings::default().service_url);
    }

    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed =
        Url::parse(&candidate).with_context(|| format!("invalid service url '{raw}'"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!("service url must use http or https: '{raw}'");
    }

    Ok(candidate)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
