//! DFPlayer Mini command driver.
//!
//! Maps playback operations onto protocol frames, pushes them through the
//! attached [`Transport`] and interprets whatever the module sends back.
//!
//! # Timing
//!
//! The module needs a fixed processing interval after every frame. Each send
//! blocks for [`PlayerConfig::settle_delay`] once the bytes are out, even if
//! the write failed part-way, and a send never starts before the previous
//! interval has fully elapsed. Skipping the wait can hang the module until it
//! is power cycled.
//!
//! # Responses
//!
//! Most commands are never acknowledged. Queries read back frames while the
//! transport holds a whole number of frames; framing is best-effort and a
//! partial or misaligned frame is not resynchronised.
//!
//! The driver is not reentrant. Wrap it in a mutex to share it between
//! threads.

use std::time::Duration;

use log::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, Equalizer, PlayMode};
use crate::config::PlayerConfig;
use crate::device::DeviceSelector;
use crate::errors::{DriverError, Result};
use crate::frame::{Frame, END_BYTE, FRAME_LEN, START_BYTE};
use crate::observer::{LogObserver, Observer};
use crate::response::ErrorReason;
use crate::transport::{SerialTransport, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Highest volume step.
pub const MAX_VOLUME: u8 = 30;

// ============================================================================
// Driver
// ============================================================================

/// DFPlayer Mini driver.
///
/// # Example
/// ```ignore
/// let mut player = DfPlayer::new(PlayerConfig::default());
/// player.open_serial("/dev/ttyUSB0")?;
/// player.set_volume(20)?;
/// let track = player.play_track_from_dir(1, 2, true)?;
/// ```
pub struct DfPlayer {
    transport: Option<Box<dyn Transport>>,
    device: DeviceSelector,
    no_receive: bool,
    last_response: Option<Frame>,
    last_send: Option<Duration>,
    config: PlayerConfig,
    clock: Box<dyn Clock>,
    observer: Box<dyn Observer>,
}

impl Default for DfPlayer {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}

impl DfPlayer {
    // ------------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------------

    /// Create a driver with no transport attached.
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            transport: None,
            device: config.device,
            no_receive: config.no_receive,
            last_response: None,
            last_send: None,
            config,
            clock: Box::new(SystemClock::default()),
            observer: Box::new(LogObserver),
        }
    }

    /// Replace the time source used for settle delays.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self.last_send = None;
        self
    }

    /// Replace the traffic observer (defaults to [`LogObserver`]).
    pub fn with_observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    // ------------------------------------------------------------------------
    // Transport lifecycle
    // ------------------------------------------------------------------------

    /// Attach a transport, dropping the previous one if any.
    pub fn attach(&mut self, transport: impl Transport + 'static) {
        if self.transport.replace(Box::new(transport)).is_some() {
            info!("replaced previous transport");
        }
        self.last_response = None;
    }

    /// Detach and hand back the current transport.
    pub fn detach(&mut self) -> Option<Box<dyn Transport>> {
        self.last_response = None;
        self.transport.take()
    }

    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    /// Open a serial port at 9600 baud, attach it and reset the module.
    pub fn open_serial(&mut self, path: &str) -> Result<()> {
        info!("connecting to DFPlayer on {}", path);
        let transport = SerialTransport::open(path, self.config.io_timeout())?;
        self.attach(transport);
        self.reset()?;
        if self.backlog()? > 0 {
            info!("DFPlayer answered after reset");
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // State accessors
    // ------------------------------------------------------------------------

    pub fn device(&self) -> DeviceSelector {
        self.device
    }

    /// Select the source used by track and file queries. This does not tell
    /// the module anything; see [`DfPlayer::select_source`].
    pub fn set_device(&mut self, device: DeviceSelector) {
        self.device = device;
    }

    pub fn is_no_receive(&self) -> bool {
        self.no_receive
    }

    pub fn set_no_receive(&mut self, no_receive: bool) {
        self.no_receive = no_receive;
    }

    /// Frame stored by the latest [`DfPlayer::receive_frame`] call.
    pub fn last_response(&self) -> Option<&Frame> {
        self.last_response.as_ref()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Bytes waiting to be read from the module.
    pub fn backlog(&mut self) -> Result<usize> {
        let result = self.transport_mut()?.bytes_available();
        result.map_err(|e| self.fail(e.into()))
    }

    // ------------------------------------------------------------------------
    // Protocol primitives
    // ------------------------------------------------------------------------

    /// Build a frame and send it.
    ///
    /// Invalid arguments fail with [`DriverError::InvalidParameter`], unless
    /// `zero_frame_on_invalid` is set, in which case an all-zero frame is
    /// sent and the module answers with an error of its own.
    pub fn send_command(&mut self, command: Command, value: u16, upper: u16) -> Result<()> {
        let frame = match Frame::build(command, value, upper) {
            Ok(frame) => frame,
            Err(e) if self.config.zero_frame_on_invalid => {
                warn!("{}; sending zeroed frame for {:?}", e, command);
                Frame::ZEROED
            }
            Err(e) => return Err(self.fail(e.into())),
        };
        self.send_frame(&frame)
    }

    /// Write a prepared frame and wait out the settle delay.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        if self.transport.is_none() {
            return Err(self.fail(DriverError::NotAttached));
        }
        self.wait_for_settle();
        self.observer.before_send(frame);

        let written = self.transport_mut()?.write_all(frame.as_bytes());
        // The module may have seen some bytes even if the write failed.
        self.last_send = Some(self.clock.now());
        self.clock.sleep(self.config.settle_delay());

        written.map_err(|e| self.fail(e.into()))
    }

    /// Read one frame from the module, if a whole-frame backlog is waiting.
    ///
    /// Frames are read one at a time, each ended by the end marker, until
    /// one begins with the start marker or the backlog is no longer a
    /// nonzero multiple of the frame size. Returns `None` in no-receive
    /// mode or when nothing was read.
    pub fn receive_frame(&mut self) -> Result<Option<Frame>> {
        self.last_response = None;
        if self.no_receive {
            return Ok(None);
        }

        let read = Self::read_raw_frame(&mut **self.transport_mut()?);
        let raw = match read {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => return Err(self.fail(e.into())),
        };

        let frame = Frame::parse(raw);
        if self.config.verify_checksum && !frame.is_well_formed() {
            return Err(self.fail(DriverError::CorruptFrame(raw)));
        }
        self.observer.after_receive(&frame);
        self.last_response = Some(frame);
        Ok(Some(frame))
    }

    // ------------------------------------------------------------------------
    // Playback commands
    // ------------------------------------------------------------------------

    /// Reset the module and wait for it to reboot.
    pub fn reset(&mut self) -> Result<()> {
        self.send_command(Command::Reset, 0, 0)?;
        self.clock.sleep(self.config.reset_delay());
        Ok(())
    }

    /// Set the volume, 0-30. Never acknowledged.
    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        if volume > MAX_VOLUME {
            return Err(self.fail(DriverError::OutOfRange {
                what: "volume",
                value: volume as u16,
                max: MAX_VOLUME as u16,
            }));
        }
        self.send_command(Command::Volume, volume as u16, 0)
    }

    /// Never acknowledged.
    pub fn set_equalizer(&mut self, equalizer: Equalizer) -> Result<()> {
        self.send_command(Command::Equalizer, u8::from(equalizer) as u16, 0)
    }

    /// Play `track` from `folder`.
    ///
    /// With `return_physical` the current track is queried afterwards and
    /// returned; otherwise `None` is returned without reading anything.
    pub fn play_track_from_dir(
        &mut self,
        track: u8,
        folder: u8,
        return_physical: bool,
    ) -> Result<Option<u16>> {
        self.send_command(Command::Folder, track as u16, folder as u16)?;
        self.clock.sleep(self.config.folder_play_delay());
        if return_physical {
            self.get_current_track().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Loop the current track. The module expects 0 to enable looping and
    /// 1 to disable it.
    pub fn set_single_loop(&mut self, enabled: bool) -> Result<()> {
        self.send_command(Command::SingleRepeat, u16::from(!enabled), 0)
    }

    /// Query the track currently playing from the selected source.
    pub fn get_current_track(&mut self) -> Result<u16> {
        let query = match self.device.current_track_query() {
            Some(query) => query,
            None => return Err(self.unsupported("current track")),
        };
        self.send_command(query, 0, 0)?;
        self.await_reply(query)
    }

    /// Ask for the number of files on the selected source without reading
    /// the answer; use [`DfPlayer::query_total_files`] to get it.
    pub fn count_total_files(&mut self) -> Result<()> {
        let query = self.file_count_query()?;
        self.send_command(query, 0, 0)
    }

    /// Number of files on the selected source.
    pub fn query_total_files(&mut self) -> Result<u16> {
        let query = self.file_count_query()?;
        self.send_command(query, 0, 0)?;
        self.await_reply(query)
    }

    // Not verified against hardware beyond frame layout.

    pub fn next(&mut self) -> Result<()> {
        self.send_command(Command::Next, 0, 0)
    }

    pub fn previous(&mut self) -> Result<()> {
        self.send_command(Command::Previous, 0, 0)
    }

    /// Play by root index, 0-2999.
    pub fn play_track(&mut self, track: u16) -> Result<()> {
        self.send_command(Command::PlayTrack, track, 0)
    }

    pub fn volume_up(&mut self) -> Result<()> {
        self.send_command(Command::VolumeUp, 0, 0)
    }

    pub fn volume_down(&mut self) -> Result<()> {
        self.send_command(Command::VolumeDown, 0, 0)
    }

    pub fn play_mode(&mut self, mode: PlayMode) -> Result<()> {
        self.send_command(Command::PlayMode, u8::from(mode) as u16, 0)
    }

    /// Resume playback.
    pub fn play(&mut self) -> Result<()> {
        self.send_command(Command::Playback, 0, 0)
    }

    pub fn pause(&mut self) -> Result<()> {
        self.send_command(Command::Pause, 0, 0)
    }

    pub fn stop(&mut self) -> Result<()> {
        self.send_command(Command::Stop, 0, 0)
    }

    pub fn count_track_in_dir(&mut self, folder: u8) -> Result<()> {
        self.send_command(Command::TrackFolder, folder as u16, 0)
    }

    /// Interrupt playback with an advert track, 0-9999.
    pub fn play_advert(&mut self, track: u16) -> Result<()> {
        self.send_command(Command::Advert, track, 0)
    }

    /// Ask for the module status without reading the answer.
    pub fn get_status(&mut self) -> Result<()> {
        self.send_command(Command::Status, 0, 0)
    }

    pub fn query_status(&mut self) -> Result<u16> {
        self.query(Command::Status)
    }

    pub fn query_volume(&mut self) -> Result<u16> {
        self.query(Command::QueryVolume)
    }

    pub fn query_version(&mut self) -> Result<u16> {
        self.query(Command::QueryVersion)
    }

    /// Switch the module's playback source and use it for later queries.
    pub fn select_source(&mut self, device: DeviceSelector) -> Result<()> {
        self.send_command(Command::Source, device.source_param() as u16, 0)?;
        self.device = device;
        Ok(())
    }

    pub fn standby(&mut self) -> Result<()> {
        self.send_command(Command::Standby, 0, 0)
    }

    /// Leave standby.
    pub fn wake(&mut self) -> Result<()> {
        self.send_command(Command::Normal, 0, 0)
    }

    // ------------------------------------------------------------------------
    // Internal Methods
    // ------------------------------------------------------------------------

    fn transport_mut(&mut self) -> Result<&mut Box<dyn Transport>> {
        if self.transport.is_none() {
            return Err(self.fail(DriverError::NotAttached));
        }
        self.transport.as_mut().ok_or(DriverError::NotAttached)
    }

    fn fail(&mut self, error: DriverError) -> DriverError {
        self.observer.on_error(&error);
        error
    }

    fn unsupported(&mut self, query: &'static str) -> DriverError {
        let selector = self.device;
        self.fail(DriverError::Unsupported { selector, query })
    }

    fn file_count_query(&mut self) -> Result<Command> {
        match self.device.file_count_query() {
            Some(query) => Ok(query),
            None => Err(self.unsupported("file count")),
        }
    }

    /// Block until the previous settle interval has fully elapsed.
    fn wait_for_settle(&mut self) {
        let Some(last) = self.last_send else {
            return;
        };
        let elapsed = self.clock.now().saturating_sub(last);
        let settle = self.config.settle_delay();
        if elapsed < settle {
            self.clock.sleep(settle - elapsed);
        }
    }

    fn query(&mut self, query: Command) -> Result<u16> {
        self.send_command(query, 0, 0)?;
        self.await_reply(query)
    }

    /// Drain whole frames from the backlog and return the parameter of the
    /// last one answering `query`.
    ///
    /// A corrupt frame only counts against the query when nothing else
    /// answers it.
    fn await_reply(&mut self, query: Command) -> Result<u16> {
        let expected = query.code();
        if self.no_receive {
            return Err(self.fail(DriverError::NoResponse { command: expected }));
        }

        let mut found = None;
        let mut device_error = None;
        let mut corrupt = None;
        while Self::is_frame_aligned(self.backlog()?) {
            let frame = match self.receive_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(DriverError::CorruptFrame(raw)) => {
                    corrupt = Some(raw);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if frame.command_byte() == expected {
                found = Some(frame.param());
            } else if frame.command() == Some(Command::Error) {
                device_error = Some(ErrorReason::from_index(frame.param_low()));
            }
        }

        match (found, device_error, corrupt) {
            (Some(value), _, _) => {
                debug!("query {:#04X} answered with {}", expected, value);
                Ok(value)
            }
            (None, Some(reason), _) => Err(self.fail(DriverError::Device(reason))),
            // Already passed to the observer when it was read.
            (None, None, Some(raw)) => Err(DriverError::CorruptFrame(raw)),
            (None, None, None) => Err(self.fail(DriverError::NoResponse { command: expected })),
        }
    }

    fn is_frame_aligned(available: usize) -> bool {
        available > 0 && available % FRAME_LEN == 0
    }

    fn read_raw_frame(transport: &mut dyn Transport) -> std::io::Result<Option<[u8; FRAME_LEN]>> {
        let mut raw = [0u8; FRAME_LEN];
        let mut received = false;
        while raw[0] != START_BYTE && Self::is_frame_aligned(transport.bytes_available()?) {
            raw = [0u8; FRAME_LEN];
            if transport.read_until(END_BYTE, &mut raw)? == 0 {
                break;
            }
            received = true;
        }
        Ok(received.then_some(raw))
    }
}
