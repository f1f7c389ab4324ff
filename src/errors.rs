use std::io;
use thiserror::Error;

use crate::device::DeviceSelector;
use crate::response::ErrorReason;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serial error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] FrameError),
    #[error("{what} out of range: {value} (max {max})")]
    OutOfRange {
        what: &'static str,
        value: u16,
        max: u16,
    },
    #[error("device error: {0}")]
    Device(ErrorReason),
    #[error("no response to query {command:#04X}")]
    NoResponse { command: u8 },
    #[error("{selector} source has no {query} query")]
    Unsupported {
        selector: DeviceSelector,
        query: &'static str,
    },
    #[error("no transport attached")]
    NotAttached,
    #[error("corrupt frame: {0:02X?}")]
    CorruptFrame([u8; 10]),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("cannot pack value {value:#06X} with upper byte {upper:#06X}")]
    InvalidParameter { value: u16, upper: u16 },
    #[error("frame must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, DriverError>;
