use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::DeviceSelector;
use crate::transport::DEFAULT_IO_TIMEOUT;

/// Shortest interval the module needs to process a frame. Anything shorter
/// makes it misbehave or lock up until it is power cycled.
pub const MIN_SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Reboot time after a reset command.
pub const RESET_DELAY: Duration = Duration::from_millis(1500);

/// Extra wait after a folder play before the current track can be queried.
pub const FOLDER_PLAY_DELAY: Duration = Duration::from_millis(60);

/// Driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Source used by current-track and file-count queries.
    pub device: DeviceSelector,
    /// Never read from the transport (TX-only wiring).
    pub no_receive: bool,
    /// Post-send wait. Values below [`MIN_SETTLE_DELAY`] are raised to it.
    pub settle_delay_ms: u64,
    pub reset_delay_ms: u64,
    pub folder_play_delay_ms: u64,
    /// Serial read timeout.
    pub io_timeout_ms: u64,
    /// Send an all-zero frame instead of failing on invalid arguments.
    pub zero_frame_on_invalid: bool,
    /// Reject received frames with bad markers or checksum.
    pub verify_checksum: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            device: DeviceSelector::default(),
            no_receive: false,
            settle_delay_ms: MIN_SETTLE_DELAY.as_millis() as u64,
            reset_delay_ms: RESET_DELAY.as_millis() as u64,
            folder_play_delay_ms: FOLDER_PLAY_DELAY.as_millis() as u64,
            io_timeout_ms: DEFAULT_IO_TIMEOUT.as_millis() as u64,
            zero_frame_on_invalid: false,
            verify_checksum: false,
        }
    }
}

impl PlayerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms).max(MIN_SETTLE_DELAY)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn folder_play_delay(&self) -> Duration {
        Duration::from_millis(self.folder_play_delay_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }

    pub fn with_device(mut self, device: DeviceSelector) -> Self {
        self.device = device;
        self
    }

    pub fn with_no_receive(mut self, no_receive: bool) -> Self {
        self.no_receive = no_receive;
        self
    }
}
