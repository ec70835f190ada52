use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::ConfigError;
use crate::format::raw;

const DEFAULT_DEVICE: &str = "/dev/tty_ble";
const DEFAULT_OUTPUT_DIR: &str = ".";
const DEFAULT_HEARTBEAT_WINDOW_SECS: u64 = 30;
const DEFAULT_STATUS_INTERVAL_SECS: u64 = 1;
const DEFAULT_LOG_FILTER: &str = "info";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// pcap with the Nordic BLE link type
    Pcap,
    /// Raw timestamped frame dump
    Raw,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pcap => "pcap",
            OutputFormat::Raw => "bin",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pcap" => Ok(OutputFormat::Pcap),
            "raw" => Ok(OutputFormat::Raw),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub device: String,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub heartbeat_window_secs: u64,
    pub status_interval_secs: u64,
    pub write_through: bool,
    pub log_filter: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: OutputFormat::Pcap,
            heartbeat_window_secs: DEFAULT_HEARTBEAT_WINDOW_SECS,
            status_interval_secs: DEFAULT_STATUS_INTERVAL_SECS,
            write_through: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl CaptureConfig {
    /// Load defaults, then the config file, then environment overrides.
    ///
    /// The file is `path` if given, otherwise `BLESNIFF_CONFIG` if set.
    /// Without either, only defaults and the environment apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = CaptureConfig::default();

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("BLESNIFF_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = path {
            let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            config.apply_file(&content)?;
        }

        // Allow environment variable overrides
        if let Ok(val) = std::env::var("BLESNIFF_DEVICE") {
            config.set("device", &val)?;
        }
        if let Ok(val) = std::env::var("BLESNIFF_OUTPUT_DIR") {
            config.set("output_dir", &val)?;
        }
        if let Ok(val) = std::env::var("BLESNIFF_FORMAT") {
            config.set("format", &val)?;
        }
        if let Ok(val) = std::env::var("BLESNIFF_LOG") {
            config.set("log_filter", &val)?;
        }

        Ok(config)
    }

    /// Apply `key = value` lines. Blank lines and `#` comments are skipped.
    pub fn apply_file(&mut self, content: &str) -> Result<(), ConfigError> {
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                self.set(key.trim(), value.trim())?;
            }
        }
        Ok(())
    }

    /// Set one option by name. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::Invalid {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "device" => self.device = value.to_string(),
            "output_dir" => self.output_dir = PathBuf::from(value),
            "format" => self.format = value.parse().map_err(|_| invalid())?,
            "heartbeat_window_secs" => {
                let secs: u64 = value.parse().map_err(|_| invalid())?;
                if window_from_secs(secs).is_none() {
                    return Err(invalid());
                }
                self.heartbeat_window_secs = secs;
            }
            "status_interval_secs" => {
                let secs: u64 = value.parse().map_err(|_| invalid())?;
                if secs == 0 {
                    return Err(invalid());
                }
                self.status_interval_secs = secs;
            }
            "write_through" => self.write_through = value.parse().map_err(|_| invalid())?,
            "log_filter" => self.log_filter = value.to_string(),
            _ => {}
        }
        Ok(())
    }

    /// Liveness window for the heartbeat tracker.
    ///
    /// A window too large to represent saturates to the longest duration.
    pub fn heartbeat_window(&self) -> chrono::Duration {
        window_from_secs(self.heartbeat_window_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn status_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.status_interval_secs)
    }

    /// Output file for a capture started at `now`.
    pub fn output_path(&self, now: DateTime<Utc>) -> PathBuf {
        self.output_dir.join(format!(
            "ble_sniffer_{}.{}",
            raw::to_ticks(now),
            self.format.extension()
        ))
    }
}

fn window_from_secs(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    fn clear_env() {
        for key in [
            "BLESNIFF_CONFIG",
            "BLESNIFF_DEVICE",
            "BLESNIFF_OUTPUT_DIR",
            "BLESNIFF_FORMAT",
            "BLESNIFF_LOG",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.device, "/dev/tty_ble");
        assert_eq!(config.format, OutputFormat::Pcap);
        assert!(config.write_through);
        assert_eq!(config.heartbeat_window(), chrono::Duration::seconds(30));
    }

    #[test]
    fn test_apply_file() {
        let mut config = CaptureConfig::default();
        config
            .apply_file(
                "# sniffer\n\
                 device = /dev/ttyACM0\n\
                 \n\
                 format = raw\n\
                 heartbeat_window_secs = 5\n\
                 unknown_key = ignored\n",
            )
            .unwrap();

        assert_eq!(config.device, "/dev/ttyACM0");
        assert_eq!(config.format, OutputFormat::Raw);
        assert_eq!(config.heartbeat_window_secs, 5);
    }

    #[test]
    fn test_invalid_value() {
        let mut config = CaptureConfig::default();
        assert!(matches!(
            config.set("heartbeat_window_secs", "soon"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(config.set("format", "pcapng").is_err());
        assert!(config.set("status_interval_secs", "0").is_err());
    }

    #[test]
    fn test_heartbeat_window_out_of_range() {
        let mut config = CaptureConfig::default();
        assert!(matches!(
            config.set("heartbeat_window_secs", "18446744073709551615"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(config
            .set("heartbeat_window_secs", &i64::MAX.to_string())
            .is_err());
        assert_eq!(config.heartbeat_window_secs, 30);
        assert_eq!(config.heartbeat_window(), chrono::Duration::seconds(30));

        // a window set directly on the struct saturates instead of panicking
        config.heartbeat_window_secs = u64::MAX;
        assert_eq!(config.heartbeat_window(), chrono::Duration::MAX);
    }

    #[test]
    fn test_baud_rate_key_is_ignored() {
        let mut config = CaptureConfig::default();
        config.apply_file("baud_rate = 9600\ndevice = /dev/ttyUSB1\n").unwrap();
        assert_eq!(config.device, "/dev/ttyUSB1");
    }

    #[test]
    fn test_output_path() {
        let mut config = CaptureConfig::default();
        config.output_dir = PathBuf::from("/tmp/captures");
        let epoch = DateTime::from_timestamp(0, 0).unwrap();

        assert_eq!(
            config.output_path(epoch),
            PathBuf::from("/tmp/captures/ble_sniffer_621355968000000000.pcap")
        );
        config.format = OutputFormat::Raw;
        assert!(config.output_path(epoch).to_string_lossy().ends_with(".bin"));
    }

    #[test]
    #[serial]
    fn test_load_file_then_env() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blesniff.conf");
        std::fs::write(&path, "device = /dev/from_file\nformat = raw\n").unwrap();

        env::set_var("BLESNIFF_FORMAT", "pcap");
        let config = CaptureConfig::load(Some(&path)).unwrap();
        clear_env();

        assert_eq!(config.device, "/dev/from_file");
        assert_eq!(config.format, OutputFormat::Pcap);
    }

    #[test]
    #[serial]
    fn test_load_missing_file() {
        clear_env();
        let result = CaptureConfig::load(Some(Path::new("/nonexistent/blesniff.conf")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_env_path() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("env.conf");
        std::fs::write(&path, "output_dir = /var/captures\n").unwrap();

        env::set_var("BLESNIFF_CONFIG", &path);
        let config = CaptureConfig::load(None).unwrap();
        clear_env();

        assert_eq!(config.output_dir, PathBuf::from("/var/captures"));
    }
}
