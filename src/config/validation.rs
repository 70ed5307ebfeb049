// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use std::collections::HashSet;
use url::Url;
use validator::Validate;

use super::core::AppConfig;
use crate::extractor::compile_all;
use crate::probes::{ProbeKind, StatusRequirement};
use crate::scanners::ServiceProfile;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_app_config(config: &AppConfig) -> Result<()> {
        config.validate().context("Configuration validation failed")?;

        Self::validate_fingerprint_config(config)?;
        Self::validate_sources_config(config)?;
        Self::validate_observability_config(config)?;

        Ok(())
    }

    fn validate_fingerprint_config(config: &AppConfig) -> Result<()> {
        if config.fingerprint.tomcat_ports.contains(&0) {
            return Err(anyhow::anyhow!("Tomcat ports must be between 1 and 65535"));
        }

        let unique: HashSet<_> = config.fingerprint.tomcat_ports.iter().collect();
        if unique.len() != config.fingerprint.tomcat_ports.len() {
            return Err(anyhow::anyhow!("Tomcat ports contain duplicates"));
        }

        Ok(())
    }

    fn validate_sources_config(config: &AppConfig) -> Result<()> {
        for (name, source) in config.sources.iter() {
            if let Some(base_url) = &source.base_url {
                let url = Url::parse(base_url)
                    .with_context(|| format!("Invalid base_url for {}: {}", name, base_url))?;
                if url.scheme() != "http" && url.scheme() != "https" {
                    return Err(anyhow::anyhow!(
                        "base_url for {} must use http or https",
                        name
                    ));
                }
            }
        }

        Ok(())
    }

    fn validate_observability_config(config: &AppConfig) -> Result<()> {
        let level = config.observability.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}' (expected one of {})",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        Ok(())
    }

    /// Reject profiles that would fail at probe construction
    pub fn validate_service_profile(profile: &ServiceProfile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(anyhow::anyhow!("Profile name cannot be empty"));
        }

        if profile.probes.is_empty() {
            return Err(anyhow::anyhow!("Profile '{}' defines no probes", profile.name));
        }

        let mut ids = HashSet::new();
        for probe in &profile.probes {
            if !ids.insert(probe.id.as_str()) {
                return Err(anyhow::anyhow!(
                    "Profile '{}' has duplicate probe id '{}'",
                    profile.name,
                    probe.id
                ));
            }

            // Without signatures or a status gate every response would match
            let unconstrained = probe.signatures.is_empty()
                && matches!(probe.status, StatusRequirement::Any)
                && !matches!(probe.kind, ProbeKind::VulnerabilityProbe { .. });
            if unconstrained {
                return Err(anyhow::anyhow!(
                    "Probe '{}' needs signatures or a status requirement",
                    probe.id
                ));
            }

            match &probe.kind {
                ProbeKind::PathProbe { paths } if paths.is_empty() => {
                    return Err(anyhow::anyhow!("Probe '{}' lists no paths", probe.id));
                }
                ProbeKind::MethodProbe { methods, .. } if methods.is_empty() => {
                    return Err(anyhow::anyhow!("Probe '{}' lists no methods", probe.id));
                }
                ProbeKind::VulnerabilityProbe { indicators } if indicators.is_empty() => {
                    return Err(anyhow::anyhow!("Probe '{}' lists no indicators", probe.id));
                }
                _ => {}
            }

            compile_all(&probe.signatures)
                .with_context(|| format!("Probe '{}' has an invalid signature", probe.id))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanners::{liferay, tomcat};

    #[test]
    fn test_builtin_profiles_are_valid() {
        ConfigValidator::validate_service_profile(&tomcat::profile(&tomcat::DEFAULT_PORTS)).unwrap();
        ConfigValidator::validate_service_profile(&liferay::profile()).unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.observability.log_level = "chatty".to_string();
        assert!(ConfigValidator::validate_app_config(&config).is_err());

        let mut config = AppConfig::default();
        config.fingerprint.tomcat_ports = vec![80, 80];
        assert!(ConfigValidator::validate_app_config(&config).is_err());

        let mut config = AppConfig::default();
        config.sources.github.base_url = Some("ftp://api.github.com".to_string());
        assert!(ConfigValidator::validate_app_config(&config).is_err());

        let mut config = AppConfig::default();
        config.http.timeout_secs = 0;
        assert!(ConfigValidator::validate_app_config(&config).is_err());
    }

    #[test]
    fn test_rejects_duplicate_probe_ids() {
        let mut profile = liferay::profile();
        let first = profile.probes[0].clone();
        profile.probes.push(first);
        assert!(ConfigValidator::validate_service_profile(&profile).is_err());
    }
}
