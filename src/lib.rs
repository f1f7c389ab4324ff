//! DFPlayer Mini MP3 module driver.
//!
//! The module is controlled over a 9600 baud half-duplex serial link with
//! fixed ten-byte frames. This crate provides:
//!
//! - [`frame`]: the frame codec (build, checksum, parse), free of any I/O;
//! - [`DfPlayer`]: the command driver mapping playback operations to frames
//!   and reading back query replies;
//! - [`Transport`] implementations for a real serial port and an in-memory
//!   channel.
//!
//! # Timing
//!
//! Every frame is followed by a blocking settle delay (20 ms minimum) that
//! the module needs to process it. The delay goes through [`Clock`] so tests
//! can substitute [`ManualClock`] and check it was honoured.
//!
//! # Example
//! ```ignore
//! use dfplayer::{DfPlayer, PlayerConfig};
//!
//! let mut player = DfPlayer::new(PlayerConfig::default());
//! player.open_serial("/dev/ttyUSB0")?;
//! player.set_volume(20)?;
//! if let Some(track) = player.play_track_from_dir(1, 1, true)? {
//!     println!("playing physical track {track}");
//! }
//! ```

pub mod clock;
pub mod command;
pub mod config;
pub mod device;
mod dfplayer;
mod errors;
pub mod frame;
pub mod logging;
pub mod observer;
pub mod response;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, Equalizer, PlayMode};
pub use config::PlayerConfig;
pub use device::DeviceSelector;
pub use dfplayer::{DfPlayer, MAX_VOLUME};
pub use errors::*;
pub use frame::{compute_checksum, Frame, FRAME_LEN};
pub use observer::{LogObserver, NullObserver, Observer};
pub use response::{ErrorReason, Response};
pub use transport::{MemoryTransport, SerialTransport, Transport, BAUD_RATE};
