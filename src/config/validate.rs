// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PodrunError, Result};
use crate::resource::is_dns_label;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PodrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runtime(cfg)?;
    validate_discovery(cfg)?;
    validate_tasks(cfg)?;
    validate_cluster(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> PodrunError {
    PodrunError::ConfigError(msg.into())
}

fn validate_runtime(cfg: &RawConfigFile) -> Result<()> {
    let rt = &cfg.runtime;

    if rt.image.trim().is_empty() {
        return Err(config_error("[runtime].image must not be empty"));
    }
    if !is_dns_label(&rt.container_name) {
        return Err(config_error(format!(
            "[runtime].container_name '{}' is not a valid DNS label",
            rt.container_name
        )));
    }
    if !rt.mount_path.starts_with('/') {
        return Err(config_error(format!(
            "[runtime].mount_path must be absolute (got '{}')",
            rt.mount_path
        )));
    }
    if rt.mount_path.len() > 1 && rt.mount_path.ends_with('/') {
        return Err(config_error(format!(
            "[runtime].mount_path must not end with '/' (got '{}')",
            rt.mount_path
        )));
    }
    if rt.sub_path.starts_with('/') {
        return Err(config_error(format!(
            "[runtime].sub_path must be relative (got '{}')",
            rt.sub_path
        )));
    }
    if rt.service_account.trim().is_empty() {
        return Err(config_error("[runtime].service_account must not be empty"));
    }
    if rt.ports.is_empty() {
        return Err(config_error("[runtime].ports must list at least one port"));
    }
    if rt.ports.contains(&0) {
        return Err(config_error("[runtime].ports must not contain 0"));
    }

    Ok(())
}

fn validate_discovery(cfg: &RawConfigFile) -> Result<()> {
    let d = &cfg.discovery;

    if d.probe_timeout_ms == 0 {
        return Err(config_error(
            "[discovery].probe_timeout_ms must be >= 1 (got 0)",
        ));
    }
    if d.poll_interval_ms == 0 {
        return Err(config_error(
            "[discovery].poll_interval_ms must be >= 1 (got 0)",
        ));
    }
    if d.ready_timeout_ms == Some(0) {
        return Err(config_error(
            "[discovery].ready_timeout_ms must be >= 1 when set (got 0)",
        ));
    }

    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (key, suffix) in [
        ("full_suffix", &cfg.tasks.full_suffix),
        ("incremental_suffix", &cfg.tasks.incremental_suffix),
    ] {
        if !suffix.starts_with('/') || suffix.len() < 2 {
            return Err(config_error(format!(
                "[tasks].{key} must be a path starting with '/' (got '{suffix}')"
            )));
        }
    }
    Ok(())
}

fn validate_cluster(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.cluster;

    if c.kubectl.trim().is_empty() {
        return Err(config_error("[cluster].kubectl must not be empty"));
    }
    if c.claim_selector.trim().is_empty() {
        return Err(config_error("[cluster].claim_selector must not be empty"));
    }
    if let Some(ns) = &c.namespace {
        if !is_dns_label(ns) {
            return Err(config_error(format!(
                "[cluster].namespace '{ns}' is not a valid DNS label"
            )));
        }
    }

    Ok(())
}
