//! Console-based status reporter.

use std::io::{self, Write};
use std::path::Path;

use crate::reporter::{CaptureStatus, StatusReporter};

/// Prints capture progress to stdout, one line per sample.
///
/// Lines look like `1,204 (+37) [52,311 bytes] 4/9 devices`.
pub struct ConsoleReporter {
    /// Whether to include the device counts
    show_devices: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self { show_devices: true }
    }

    /// Enable or disable the device counts.
    pub fn with_devices(mut self, show_devices: bool) -> Self {
        self.show_devices = show_devices;
        self
    }

    fn format_status(&self, status: &CaptureStatus) -> String {
        let mut output = format!(
            "{} (+{}) [{} bytes]",
            group_thousands(status.stats.frames_captured),
            status.delta_frames,
            group_thousands(status.stats.bytes_written)
        );

        if self.show_devices {
            output.push_str(&format!(
                " {}/{} devices",
                status.active_devices, status.total_devices
            ));
        }

        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter for ConsoleReporter {
    fn on_start(&self, device: &str, output: &Path) {
        println!("Starting BLE capture from {} ({})...", device, output.display());
        println!("Press Ctrl+C to stop.\n");
    }

    fn report(&self, status: &CaptureStatus) {
        let output = self.format_status(status);
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "{}", output);
    }

    fn on_stop(&self, status: &CaptureStatus) {
        println!(
            "\nStopped BLE capture: {} frames, {} skipped, {} bytes.",
            group_thousands(status.stats.frames_captured),
            status.stats.frames_skipped,
            group_thousands(status.stats.bytes_written)
        );
    }
}

/// Format with comma thousands separators.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
