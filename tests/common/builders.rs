//! Test data builders for creating test objects

use modbus_ai_panel::backend::SerialSettings;
use modbus_ai_panel::config::{AppConfig, FailedReadPolicy};

/// Builder for creating test configurations
pub struct ConfigBuilder {
    config: AppConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.config.acquisition.channel = channel;
        self
    }

    pub fn emulation(mut self, enabled: bool) -> Self {
        self.config.emulation.enabled = enabled;
        self
    }

    pub fn policy(mut self, policy: FailedReadPolicy) -> Self {
        self.config.acquisition.failed_read_policy = policy;
        self
    }

    pub fn tick_interval_ms(mut self, ms: u64) -> Self {
        self.config.acquisition.tick_interval_ms = ms;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.acquisition.history_capacity = capacity;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

/// Serial settings for a port with the default timeouts
pub fn settings(port: &str, baud: u32) -> SerialSettings {
    SerialSettings::new(port, baud)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .channel(3)
            .emulation(true)
            .tick_interval_ms(20)
            .build();

        assert_eq!(config.acquisition.channel, 3);
        assert!(config.emulation.enabled);
        assert_eq!(config.acquisition.tick_interval_ms, 20);
        assert!(config.validate().is_ok());
    }
}
