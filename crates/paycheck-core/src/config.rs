//! Emulator configuration.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::protocol::constants::*;

/// Timing, framing, and identity knobs for the emulator.
///
/// Every field has the default the real firmware ships with; deployments
/// usually only tune the print-cycle delays to match a site's EGM polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Period of unsolicited status frames, in milliseconds.
    pub status_reporting_interval_ms: u64,
    /// Delay between print acceptance and the Busy flag rising.
    pub print_start_delay_ms: u64,
    /// Busy time before the validation number is reported done.
    pub validation_delay_ms: u64,
    /// Remaining busy time after validation.
    pub busy_state_change_delay_ms: u64,
    /// Time from job completion back to top of form.
    pub tof_state_change_delay_ms: u64,
    /// Delay from validation done until paper shows in the chute.
    pub paper_in_chute_set_delay_ms: u64,
    /// How long the paper stays in the chute.
    pub paper_in_chute_clear_delay_ms: u64,
    /// Inter-segment reassembly timeout.
    pub reassembly_timeout_ms: u64,
    /// Shortest valid inbound frame.
    pub min_message_size: usize,
    /// Cap on the reassembly buffer.
    pub max_message_size: usize,
    /// Unit address emitted in status frames, as ASCII decimal.
    pub unit_address: u8,
    /// Firmware version string emitted in status frames.
    pub software_version: String,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            status_reporting_interval_ms: DEFAULT_STATUS_REPORTING_INTERVAL_MS,
            print_start_delay_ms: DEFAULT_PRINT_START_DELAY_MS,
            validation_delay_ms: DEFAULT_VALIDATION_DELAY_MS,
            busy_state_change_delay_ms: DEFAULT_BUSY_STATE_CHANGE_DELAY_MS,
            tof_state_change_delay_ms: DEFAULT_TOF_STATE_CHANGE_DELAY_MS,
            paper_in_chute_set_delay_ms: DEFAULT_PAPER_IN_CHUTE_SET_DELAY_MS,
            paper_in_chute_clear_delay_ms: DEFAULT_PAPER_IN_CHUTE_CLEAR_DELAY_MS,
            reassembly_timeout_ms: DEFAULT_REASSEMBLY_TIMEOUT_MS,
            min_message_size: MIN_MESSAGE_SIZE,
            max_message_size: MAX_MESSAGE_SIZE,
            unit_address: DEFAULT_UNIT_ADDRESS,
            software_version: DEFAULT_SOFTWARE_VERSION.to_string(),
        }
    }
}

impl EmulatorConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EmulatorConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn status_reporting_interval(&self) -> Duration {
        Duration::from_millis(self.status_reporting_interval_ms)
    }

    pub fn print_start_delay(&self) -> Duration {
        Duration::from_millis(self.print_start_delay_ms)
    }

    pub fn validation_delay(&self) -> Duration {
        Duration::from_millis(self.validation_delay_ms)
    }

    pub fn busy_state_change_delay(&self) -> Duration {
        Duration::from_millis(self.busy_state_change_delay_ms)
    }

    pub fn tof_state_change_delay(&self) -> Duration {
        Duration::from_millis(self.tof_state_change_delay_ms)
    }

    pub fn paper_in_chute_set_delay(&self) -> Duration {
        Duration::from_millis(self.paper_in_chute_set_delay_ms)
    }

    pub fn paper_in_chute_clear_delay(&self) -> Duration {
        Duration::from_millis(self.paper_in_chute_clear_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_firmware() {
        let config = EmulatorConfig::default();
        assert_eq!(config.status_reporting_interval_ms, 2000);
        assert_eq!(config.print_start_delay_ms, 3000);
        assert_eq!(config.validation_delay_ms, 18_000);
        assert_eq!(config.busy_state_change_delay_ms, 20_000);
        assert_eq!(config.tof_state_change_delay_ms, 4000);
        assert_eq!(config.reassembly_timeout_ms, 20);
        assert_eq!(config.software_version, "PAY-6.22B");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EmulatorConfig =
            toml::from_str("status_reporting_interval_ms = 500\nunit_address = 2\n").unwrap();
        assert_eq!(config.status_reporting_interval_ms, 500);
        assert_eq!(config.unit_address, 2);
        assert_eq!(config.print_start_delay_ms, 3000);
        assert_eq!(config.software_version, "PAY-6.22B");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EmulatorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: EmulatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.validation_delay_ms, config.validation_delay_ms);
        assert_eq!(back.software_version, config.software_version);
    }
}
