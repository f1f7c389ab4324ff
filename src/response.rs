//! Interpretation of frames sent by the module.

use std::fmt;

use thiserror::Error;

use crate::command::Command;
use crate::device::DeviceSelector;
use crate::frame::Frame;

/// Reason carried by an [`Command::Error`] frame, 1-based in the low
/// parameter byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorReason {
    #[error("Module busy")]
    ModuleBusy,
    #[error("Currently sleep mode")]
    Sleeping,
    #[error("Serial receiving error")]
    SerialReceive,
    #[error("Checksum incorrect")]
    Checksum,
    #[error("Specified track is out of current track scope")]
    TrackOutOfRange,
    #[error("Specified track is not found")]
    TrackNotFound,
    #[error("Advertise error")]
    Advert,
    #[error("SD card reading failed")]
    StorageRead,
    #[error("Entered into sleep mode")]
    EnteredSleep,
    #[error("Unknown error code {0}")]
    Unknown(u8),
}

impl ErrorReason {
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => ErrorReason::ModuleBusy,
            2 => ErrorReason::Sleeping,
            3 => ErrorReason::SerialReceive,
            4 => ErrorReason::Checksum,
            5 => ErrorReason::TrackOutOfRange,
            6 => ErrorReason::TrackNotFound,
            7 => ErrorReason::Advert,
            8 => ErrorReason::StorageRead,
            9 => ErrorReason::EnteredSleep,
            other => ErrorReason::Unknown(other),
        }
    }

    pub fn index(self) -> u8 {
        match self {
            ErrorReason::ModuleBusy => 1,
            ErrorReason::Sleeping => 2,
            ErrorReason::SerialReceive => 3,
            ErrorReason::Checksum => 4,
            ErrorReason::TrackOutOfRange => 5,
            ErrorReason::TrackNotFound => 6,
            ErrorReason::Advert => 7,
            ErrorReason::StorageRead => 8,
            ErrorReason::EnteredSleep => 9,
            ErrorReason::Unknown(other) => other,
        }
    }
}

/// Decoded meaning of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Error(ErrorReason),
    /// Storage plugged in; the parameter is the media bitmask (2 = TF card).
    MediaInserted(u16),
    MediaRemoved(u16),
    TrackFinished {
        source: Option<DeviceSelector>,
        track: u16,
    },
    /// Power-up report of the online media bitmask.
    Initialized {
        media: u16,
    },
    Reply,
    CurrentTrack {
        source: DeviceSelector,
        track: u16,
    },
    FileCount {
        source: DeviceSelector,
        count: u16,
    },
    Volume(u16),
    Equalizer(u16),
    PlayMode(u16),
    Version(u16),
    Status(u16),
    Other(Frame),
}

impl Response {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

impl From<&Frame> for Response {
    fn from(frame: &Frame) -> Self {
        let param = frame.param();
        let Some(command) = frame.command() else {
            return Response::Other(*frame);
        };
        match command {
            Command::Error => Response::Error(ErrorReason::from_index(frame.param_low())),
            Command::PlugIn => Response::MediaInserted(param),
            Command::PlugOut => Response::MediaRemoved(param),
            Command::UsbEndPlay | Command::TfEndPlay | Command::FlashEndPlay => {
                Response::TrackFinished {
                    source: DeviceSelector::from_reply(command),
                    track: param,
                }
            }
            Command::Init => Response::Initialized { media: param },
            Command::Reply => Response::Reply,
            Command::QueryUsbCurrent => Response::CurrentTrack {
                source: DeviceSelector::Usb,
                track: param,
            },
            Command::QueryTfCurrent => Response::CurrentTrack {
                source: DeviceSelector::TfCard,
                track: param,
            },
            Command::QueryFlashCurrent => Response::CurrentTrack {
                source: DeviceSelector::Flash,
                track: param,
            },
            Command::QueryUsbFiles => Response::FileCount {
                source: DeviceSelector::Usb,
                count: param,
            },
            Command::QueryTfFiles => Response::FileCount {
                source: DeviceSelector::TfCard,
                count: param,
            },
            Command::QueryFlashFiles => Response::FileCount {
                source: DeviceSelector::Flash,
                count: param,
            },
            Command::QueryVolume => Response::Volume(param),
            Command::QueryEqualizer => Response::Equalizer(param),
            Command::QueryPlayMode => Response::PlayMode(param),
            Command::QueryVersion => Response::Version(param),
            Command::Status => Response::Status(param),
            _ => Response::Other(*frame),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Error(reason) => write!(f, "error: {reason}"),
            Response::MediaInserted(media) => write!(f, "media {media:#04X} plugged in"),
            Response::MediaRemoved(media) => write!(f, "media {media:#04X} plugged out"),
            Response::TrackFinished { track, .. } => write!(f, "track finished playing: {track}"),
            Response::Initialized { media } => write!(f, "media {media:#04X} online"),
            Response::Reply => f.write_str("reply"),
            Response::CurrentTrack { track, .. } => write!(f, "current track playing: {track}"),
            Response::FileCount { source, count } => write!(f, "{count} files on {source}"),
            Response::Volume(v) => write!(f, "volume {v}"),
            Response::Equalizer(v) => write!(f, "equalizer {v}"),
            Response::PlayMode(v) => write!(f, "play mode {v}"),
            Response::Version(v) => write!(f, "software version {v}"),
            Response::Status(v) => write!(f, "status {v:#06X}"),
            Response::Other(frame) => write!(f, "unhandled message {:02X?}", frame.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(command: u8, high: u8, low: u8) -> Frame {
        Frame::parse([0x7E, 0xFF, 0x06, command, 0x00, high, low, 0x00, 0x00, 0xEF])
    }

    #[test]
    fn error_frame_maps_to_one_based_reason() {
        let response = Response::from(&reply(0x40, 0x00, 0x03));
        assert_eq!(response, Response::Error(ErrorReason::SerialReceive));
        assert!(response.is_error());

        let response = Response::from(&reply(0x40, 0x00, 0x04));
        assert_eq!(response, Response::Error(ErrorReason::Checksum));
        assert_eq!(ErrorReason::Checksum.to_string(), "Checksum incorrect");
    }

    #[test]
    fn reason_index_round_trips() {
        for index in 0..=12u8 {
            assert_eq!(ErrorReason::from_index(index).index(), index);
        }
        assert_eq!(ErrorReason::from_index(0), ErrorReason::Unknown(0));
        assert_eq!(ErrorReason::from_index(10), ErrorReason::Unknown(10));
    }

    #[test]
    fn current_track_carries_source_and_track() {
        let response = Response::from(&reply(0x4C, 0x01, 0x02));
        assert_eq!(
            response,
            Response::CurrentTrack {
                source: DeviceSelector::TfCard,
                track: 0x0102
            }
        );
        assert_eq!(response.to_string(), "current track playing: 258");
    }

    #[test]
    fn file_counts_carry_their_source() {
        assert_eq!(
            Response::from(&reply(0x47, 0x00, 0x21)),
            Response::FileCount {
                source: DeviceSelector::Usb,
                count: 0x21
            }
        );
        assert_eq!(
            Response::from(&reply(0x4D, 0x00, 0x05)),
            Response::CurrentTrack {
                source: DeviceSelector::Flash,
                track: 5
            }
        );
    }

    #[test]
    fn notifications_are_classified() {
        assert_eq!(
            Response::from(&reply(0x3A, 0x00, 0x02)),
            Response::MediaInserted(2)
        );
        assert_eq!(
            Response::from(&reply(0x3D, 0x00, 0x09)),
            Response::TrackFinished {
                source: Some(DeviceSelector::TfCard),
                track: 9
            }
        );
        assert_eq!(
            Response::from(&reply(0x3F, 0x00, 0x02)),
            Response::Initialized { media: 2 }
        );
    }

    #[test]
    fn unknown_codes_fall_through() {
        let frame = reply(0x77, 0x00, 0x00);
        assert_eq!(Response::from(&frame), Response::Other(frame));
    }
}
