#![allow(dead_code)]

use podrun::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` with timings short enough for tests.
///
/// Probe gives up after 50ms and polls every 5ms; the mandatory wait is
/// capped at 500ms so a stuck test fails instead of hanging.
pub struct ConfigBuilder {
    config: RawConfigFile,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.discovery.probe_timeout_ms = 50;
        config.discovery.poll_interval_ms = 5;
        config.discovery.ready_timeout_ms = Some(500);
        Self { config }
    }

    pub fn probe_timeout_ms(mut self, ms: u64) -> Self {
        self.config.discovery.probe_timeout_ms = ms;
        self
    }

    pub fn ready_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.config.discovery.ready_timeout_ms = ms;
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.config.runtime.image = image.to_string();
        self
    }

    pub fn mount_path(mut self, path: &str) -> Self {
        self.config.runtime.mount_path = path.to_string();
        self
    }

    pub fn sub_path(mut self, path: &str) -> Self {
        self.config.runtime.sub_path = path.to_string();
        self
    }

    pub fn container_name(mut self, name: &str) -> Self {
        self.config.runtime.container_name = name.to_string();
        self
    }

    pub fn claim_selector(mut self, selector: &str) -> Self {
        self.config.cluster.claim_selector = selector.to_string();
        self
    }

    pub fn adopt_existing(mut self, adopt: bool) -> Self {
        self.config.cluster.adopt_existing = adopt;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
