use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::RuntimeConfig;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub server_url: String,
    pub channel_url: Option<String>,
    pub reconnect_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub fusion_timeout_ms: u64,
    pub simulation: bool,
    pub simulation_cadence_ms: u64,
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            channel_url: None,
            reconnect_delay_ms: 3000,
            poll_interval_ms: 2000,
            fusion_timeout_ms: 1200,
            simulation: false,
            simulation_cadence_ms: 1500,
            log_filter: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    channel_url: Option<String>,
    reconnect_delay_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    fusion_timeout_ms: Option<u64>,
    simulation: Option<bool>,
    simulation_cadence_ms: Option<u64>,
    log_filter: Option<String>,
}

/// Settings plus the problems found while reading them. Loading happens
/// before logging is configured, so warnings are reported by the caller.
#[derive(Debug)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub warnings: Vec<String>,
}

pub fn load_settings(config_path: Option<&Path>) -> LoadedSettings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> LoadedSettings {
    let mut settings = Settings::default();
    let mut warnings = Vec::new();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warnings.push(format!("ignoring unreadable config '{}': {err}", path.display())),
        },
        Err(err) if config_path.is_some() => {
            warnings.push(format!("config file '{}' not loaded: {err}", path.display()));
        }
        Err(_) => {}
    }

    if let Some(v) = env("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("DASHBOARD_CHANNEL_URL") {
        settings.channel_url = Some(v);
    }

    if let Some(v) = env("DASHBOARD_SIMULATION") {
        settings.simulation = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }

    let numeric = [
        ("APP__RECONNECT_DELAY_MS", &mut settings.reconnect_delay_ms),
        ("APP__POLL_INTERVAL_MS", &mut settings.poll_interval_ms),
        ("APP__FUSION_TIMEOUT_MS", &mut settings.fusion_timeout_ms),
        ("APP__SIMULATION_CADENCE_MS", &mut settings.simulation_cadence_ms),
    ];
    for (key, slot) in numeric {
        if let Some(v) = env(key) {
            match v.trim().parse::<u64>() {
                Ok(parsed) => *slot = parsed,
                Err(_) => warnings.push(format!("ignoring {key}={v}: not a number of milliseconds")),
            }
        }
    }

    settings.simulation_cadence_ms = settings.simulation_cadence_ms.clamp(1000, 2000);

    LoadedSettings { settings, warnings }
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if file_cfg.channel_url.is_some() {
        settings.channel_url = file_cfg.channel_url;
    }
    if let Some(v) = file_cfg.reconnect_delay_ms {
        settings.reconnect_delay_ms = v;
    }
    if let Some(v) = file_cfg.poll_interval_ms {
        settings.poll_interval_ms = v;
    }
    if let Some(v) = file_cfg.fusion_timeout_ms {
        settings.fusion_timeout_ms = v;
    }
    if let Some(v) = file_cfg.simulation {
        settings.simulation = v;
    }
    if let Some(v) = file_cfg.simulation_cadence_ms {
        settings.simulation_cadence_ms = v;
    }
    if file_cfg.log_filter.is_some() {
        settings.log_filter = file_cfg.log_filter;
    }
}

impl Settings {
    pub fn runtime_config(&self) -> anyhow::Result<RuntimeConfig> {
        let channel_url = self
            .channel_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("invalid channel url '{raw}'")))
            .transpose()?;
        Ok(RuntimeConfig {
            channel_url,
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            fusion_timeout: Duration::from_millis(self.fusion_timeout_ms),
            simulation: self.simulation,
            simulation_cadence: Duration::from_millis(self.simulation_cadence_ms),
            polling: true,
        })
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
