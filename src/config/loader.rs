// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::core::AppConfig;
use super::validation::ConfigValidator;
use crate::scanners::ServiceProfile;

pub struct ConfigLoader {
    config_path: PathBuf,
    format: ConfigFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| anyhow::anyhow!("Could not determine file format of {:?}", path))?;

        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            other => Err(anyhow::anyhow!("Unsupported file format: {}", other)),
        }
    }

    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        let value = match self {
            ConfigFormat::Yaml => serde_yaml::from_str(content).context("Failed to parse YAML")?,
            ConfigFormat::Toml => toml::from_str(content).context("Failed to parse TOML")?,
            ConfigFormat::Json => serde_json::from_str(content).context("Failed to parse JSON")?,
        };
        Ok(value)
    }
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = ConfigFormat::detect(path)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    format
        .parse(&content)
        .with_context(|| format!("Invalid contents in {:?}", path))
}

impl ConfigLoader {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref().to_path_buf();
        let format = ConfigFormat::detect(&path)?;
        Ok(Self {
            config_path: path,
            format,
        })
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config: AppConfig = read_file(&self.config_path)?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        ConfigValidator::validate_app_config(&config)?;
        debug!("Loaded configuration from {:?}", self.config_path);
        Ok(config)
    }
}

/// Config file when given, defaults otherwise; env overrides and validation apply to both
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => ConfigLoader::new(path)?.load_config(),
        None => {
            let mut config = AppConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
            ConfigValidator::validate_app_config(&config)?;
            Ok(config)
        }
    }
}

/// `RECON_TIMEOUT`, `RECON_CONCURRENCY` and `LOG_LEVEL` win over file values
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(timeout) = lookup("RECON_TIMEOUT") {
        config.http.timeout_secs = timeout.trim().parse().context("Invalid RECON_TIMEOUT")?;
    }

    if let Some(concurrency) = lookup("RECON_CONCURRENCY") {
        let concurrency: usize = concurrency.trim().parse().context("Invalid RECON_CONCURRENCY")?;
        config.fingerprint.concurrency = concurrency;
        config.aggregation.concurrency = concurrency;
    }

    if let Some(log_level) = lookup("LOG_LEVEL") {
        config.observability.log_level = log_level.trim().to_lowercase();
    }

    Ok(())
}

/// Custom service profile (probe cascade) from YAML, TOML or JSON
pub fn load_profile(path: &Path) -> Result<ServiceProfile> {
    let profile: ServiceProfile = read_file(path)?;
    ConfigValidator::validate_service_profile(&profile)?;
    debug!("Loaded profile '{}' with {} probes", profile.name, profile.probes.len());
    Ok(profile)
}
