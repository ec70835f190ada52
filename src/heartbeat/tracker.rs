//! Heartbeat map shared between the capture thread and status readers.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::domain::{layout, DeviceAddress};

/// Last-seen time per device address.
///
/// The capture thread is the only writer. Readers may query from any
/// thread while it runs and see each entry either before or after an
/// update, never torn. Entries are never removed; callers age them out by
/// comparing against a window.
#[derive(Debug, Default)]
pub struct DeviceHeartbeatTracker {
    last_seen: RwLock<HashMap<DeviceAddress, DateTime<Utc>>>,
}

impl DeviceHeartbeatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting of the device that sent `frame`.
    ///
    /// Frames shorter than [`layout::HEARTBEAT_MIN_LEN`] are ignored. The
    /// stored time is overwritten with `now`, even if it is older.
    pub fn record(&self, frame: &[u8], now: DateTime<Utc>) -> Option<DeviceAddress> {
        let address = layout::device_address(frame)?;
        let mut map = self.last_seen.write().unwrap_or_else(PoisonError::into_inner);
        if map.insert(address, now).is_none() {
            tracing::debug!("New device {}", address);
        }
        Some(address)
    }

    /// Number of devices heard from within `window` of the current time.
    pub fn active_count(&self, window: Duration) -> usize {
        self.active_count_at(window, Utc::now())
    }

    /// Number of devices heard from within `window` of `now`.
    ///
    /// A device seen exactly `window` ago still counts as active.
    pub fn active_count_at(&self, window: Duration, now: DateTime<Utc>) -> usize {
        let map = self.last_seen.read().unwrap_or_else(PoisonError::into_inner);
        map.values()
            .filter(|&&seen| is_active(seen, window, now))
            .count()
    }

    /// Devices heard from within `window` of `now`, sorted by address.
    pub fn active_devices(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Vec<(DeviceAddress, DateTime<Utc>)> {
        let map = self.last_seen.read().unwrap_or_else(PoisonError::into_inner);
        let mut devices: Vec<_> = map
            .iter()
            .filter(|(_, seen)| is_active(**seen, window, now))
            .map(|(&addr, &seen)| (addr, seen))
            .collect();
        devices.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));
        devices
    }

    /// Number of distinct devices ever seen.
    pub fn total_count(&self) -> usize {
        self.last_seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// When `address` was last seen, if ever.
    pub fn last_seen(&self, address: &DeviceAddress) -> Option<DateTime<Utc>> {
        self.last_seen
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .copied()
    }
}

fn is_active(seen: DateTime<Utc>, window: Duration, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(seen) <= window
}
