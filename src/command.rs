//! Command codes and typed command arguments.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Byte at offset 3 of a frame.
///
/// Codes up to 0x19 are requests sent to the module; 0x3A..=0x3F are
/// unsolicited notifications from it; 0x40 onward are replies and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Command {
    Next = 0x01,
    Previous = 0x02,
    /// Play track by root index, 0-2999.
    PlayTrack = 0x03,
    VolumeUp = 0x04,
    VolumeDown = 0x05,
    /// Set volume, 0-30.
    Volume = 0x06,
    Equalizer = 0x07,
    PlayMode = 0x08,
    /// Select playback source: U/TF/AUX/SLEEP/FLASH = 0/1/2/3/4.
    Source = 0x09,
    Standby = 0x0A,
    Normal = 0x0B,
    Reset = 0x0C,
    Playback = 0x0D,
    Pause = 0x0E,
    /// Play track (low byte) in folder (high byte).
    Folder = 0x0F,
    VolumeAdjust = 0x10,
    Repeat = 0x11,
    TrackFolder = 0x12,
    Advert = 0x13,
    Background = 0x15,
    Stop = 0x16,
    /// Single repeat; 0 enables, 1 disables.
    SingleRepeat = 0x19,
    PlugIn = 0x3A,
    PlugOut = 0x3B,
    UsbEndPlay = 0x3C,
    TfEndPlay = 0x3D,
    FlashEndPlay = 0x3E,
    Init = 0x3F,
    Error = 0x40,
    Reply = 0x41,
    Status = 0x42,
    QueryVolume = 0x43,
    QueryEqualizer = 0x44,
    QueryPlayMode = 0x45,
    QueryVersion = 0x46,
    QueryUsbFiles = 0x47,
    QueryTfFiles = 0x48,
    QueryFlashFiles = 0x49,
    KeepOn = 0x4A,
    QueryUsbCurrent = 0x4B,
    QueryTfCurrent = 0x4C,
    QueryFlashCurrent = 0x4D,
}

impl Command {
    #[inline]
    pub fn code(self) -> u8 {
        self.into()
    }
}

/// Equalizer presets accepted by [`Command::Equalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Equalizer {
    #[default]
    Normal = 0,
    Pop = 1,
    Rock = 2,
    Jazz = 3,
    Classic = 4,
    Bass = 5,
}

/// Playback modes accepted by [`Command::PlayMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PlayMode {
    #[default]
    Repeat = 0,
    FolderRepeat = 1,
    SingleRepeat = 2,
    Random = 3,
}
