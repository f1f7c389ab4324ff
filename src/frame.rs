//! Fixed-length frame codec.
//!
//! Every message exchanged with the module, in either direction, is exactly
//! ten bytes:
//!
//! ```text
//! ┌──────┬─────────┬────────┬─────────┬──────────┬─────────┬─────────┬──────────────┬──────┐
//! │ 0x7E │ 0xFF    │ 0x06   │ command │ feedback │ param H │ param L │ checksum (BE)│ 0xEF │
//! │ start│ version │ length │         │ 0x00     │         │         │ 2 bytes      │ end  │
//! └──────┴─────────┴────────┴─────────┴──────────┴─────────┴─────────┴──────────────┴──────┘
//! ```
//!
//! The checksum is the two's-complement negative of the sum of bytes 1..=6.
//! The codec knows nothing about the transport.

use std::fmt;

use crate::command::Command;
use crate::errors::FrameError;

/// Size of every frame on the wire.
pub const FRAME_LEN: usize = 10;

pub const START_BYTE: u8 = 0x7E;
pub const VERSION_BYTE: u8 = 0xFF;
pub const LENGTH_BYTE: u8 = 0x06;
/// Feedback flag, always "no acknowledgement requested".
pub const NO_FEEDBACK: u8 = 0x00;
pub const END_BYTE: u8 = 0xEF;

const CHECKSUM_RANGE: std::ops::Range<usize> = 1..7;

/// Compute the checksum of a raw frame: `0 - sum(bytes[1..=6])`.
///
/// Only the payload bytes are read, so the slice may already carry a stale
/// checksum. Panics if `bytes` is shorter than seven bytes.
pub fn compute_checksum(bytes: &[u8]) -> u16 {
    let sum = bytes[CHECKSUM_RANGE]
        .iter()
        .fold(0u16, |acc, &b| acc.wrapping_add(b as u16));
    0u16.wrapping_sub(sum)
}

/// One protocol frame, command or response.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Deliberately malformed all-zero frame. The module answers it with a
    /// checksum error, which is occasionally useful as a liveness probe.
    pub const ZEROED: Frame = Frame([0; FRAME_LEN]);

    /// Build a command frame.
    ///
    /// Commands come in two calling shapes that share bytes 5 and 6:
    /// - two independent bytes: `value` goes to byte 6, `upper` to byte 5
    ///   (e.g. folder play: `value` = track, `upper` = folder);
    /// - one 16-bit argument: `value` above 255 with `upper == 0` is split
    ///   big-endian across bytes 5 and 6 (e.g. play track 1200).
    ///
    /// `upper` must fit in a byte, and a wide `value` cannot be combined
    /// with a nonzero `upper`.
    pub fn build(command: Command, value: u16, upper: u16) -> Result<Self, FrameError> {
        let wide = value > 0xFF;
        if upper > 0xFF || (wide && upper != 0) {
            return Err(FrameError::InvalidParameter { value, upper });
        }

        let [high, low] = if wide {
            value.to_be_bytes()
        } else {
            [upper as u8, value as u8]
        };

        let mut raw = [
            START_BYTE,
            VERSION_BYTE,
            LENGTH_BYTE,
            command.into(),
            NO_FEEDBACK,
            high,
            low,
            0x00,
            0x00,
            END_BYTE,
        ];
        seal(&mut raw);
        Ok(Frame(raw))
    }

    /// Like [`Frame::build`], but invalid arguments yield [`Frame::ZEROED`]
    /// instead of an error.
    pub fn build_or_zeroed(command: Command, value: u16, upper: u16) -> Self {
        Self::build(command, value, upper).unwrap_or(Self::ZEROED)
    }

    /// Reinterpret ten raw bytes positionally. No validation is done; see
    /// [`Frame::is_well_formed`].
    #[inline]
    pub const fn parse(raw: [u8; FRAME_LEN]) -> Self {
        Frame(raw)
    }

    /// Parse from a slice that must be exactly [`FRAME_LEN`] bytes long.
    pub fn from_slice(raw: &[u8]) -> Result<Self, FrameError> {
        match <[u8; FRAME_LEN]>::try_from(raw) {
            Ok(bytes) => Ok(Frame(bytes)),
            Err(_) => Err(FrameError::Length {
                expected: FRAME_LEN,
                actual: raw.len(),
            }),
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    #[inline]
    pub fn into_bytes(self) -> [u8; FRAME_LEN] {
        self.0
    }

    /// Raw command byte (offset 3).
    #[inline]
    pub fn command_byte(&self) -> u8 {
        self.0[3]
    }

    /// Command code, if the byte is a known one.
    pub fn command(&self) -> Option<Command> {
        Command::try_from(self.command_byte()).ok()
    }

    /// 16-bit big-endian parameter (offsets 5-6).
    #[inline]
    pub fn param(&self) -> u16 {
        u16::from_be_bytes([self.0[5], self.0[6]])
    }

    #[inline]
    pub fn param_high(&self) -> u8 {
        self.0[5]
    }

    #[inline]
    pub fn param_low(&self) -> u8 {
        self.0[6]
    }

    /// Checksum as stored in offsets 7-8.
    #[inline]
    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.0[7], self.0[8]])
    }

    pub fn has_markers(&self) -> bool {
        self.0[0] == START_BYTE && self.0[FRAME_LEN - 1] == END_BYTE
    }

    pub fn has_valid_checksum(&self) -> bool {
        self.checksum() == compute_checksum(&self.0)
    }

    /// Markers in place and checksum matching.
    pub fn is_well_formed(&self) -> bool {
        self.has_markers() && self.has_valid_checksum()
    }
}

impl From<[u8; FRAME_LEN]> for Frame {
    fn from(raw: [u8; FRAME_LEN]) -> Self {
        Frame::parse(raw)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({:02X?})", self.0)
    }
}

fn seal(raw: &mut [u8; FRAME_LEN]) {
    let [hi, lo] = compute_checksum(raw).to_be_bytes();
    raw[7] = hi;
    raw[8] = lo;
}
