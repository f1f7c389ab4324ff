//! Hooks the driver calls around every exchange with the module.

use log::{debug, log_enabled, trace, warn, Level};

use crate::command::Command;
use crate::errors::DriverError;
use crate::frame::Frame;
use crate::response::Response;

/// Observer of driver traffic. All methods default to doing nothing.
pub trait Observer: Send {
    /// Called right before a frame is written.
    fn before_send(&mut self, _frame: &Frame) {}

    /// Called for every frame read back from the module.
    fn after_receive(&mut self, _frame: &Frame) {}

    /// Called whenever an operation is about to return an error.
    fn on_error(&mut self, _error: &DriverError) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Forwards traffic to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn before_send(&mut self, frame: &Frame) {
        if log_enabled!(Level::Debug) {
            debug!("send: {}", describe_request(frame));
        }
        trace!("send raw: {:02X?}", frame.as_bytes());
    }

    fn after_receive(&mut self, frame: &Frame) {
        let response = Response::from(frame);
        if response.is_error() {
            warn!("module reported {}", response);
        } else {
            debug!("recv: {}", response);
        }
        trace!("recv raw: {:02X?}", frame.as_bytes());
    }

    fn on_error(&mut self, error: &DriverError) {
        warn!("driver error: {}", error);
    }
}

/// Human-readable summary of an outgoing frame.
pub fn describe_request(frame: &Frame) -> String {
    let Some(command) = frame.command() else {
        return format!("unhandled message {:02X?}", frame.as_bytes());
    };
    match command {
        Command::SingleRepeat if frame.param_low() == 0 => "enable single play mode".to_string(),
        Command::SingleRepeat => "disable single play mode".to_string(),
        Command::Folder => format!(
            "play file {} in folder {}",
            frame.param_low(),
            frame.param_high()
        ),
        Command::Volume => format!("set volume to {}", frame.param_low()),
        Command::Equalizer => format!("set equalizer to {}", frame.param_low()),
        Command::PlayTrack => format!("play track {}", frame.param()),
        Command::Reset => "reset".to_string(),
        Command::QueryUsbCurrent | Command::QueryTfCurrent | Command::QueryFlashCurrent => {
            "query current track".to_string()
        }
        other => format!("{:?} ({:#06X})", other, frame.param()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_known_requests() {
        let frame = Frame::build(Command::Folder, 12, 2).unwrap();
        assert_eq!(describe_request(&frame), "play file 12 in folder 2");

        let frame = Frame::build(Command::SingleRepeat, 0, 0).unwrap();
        assert_eq!(describe_request(&frame), "enable single play mode");

        let frame = Frame::build(Command::Pause, 0, 0).unwrap();
        assert_eq!(describe_request(&frame), "Pause (0x0000)");
    }

    #[test]
    fn describes_garbage_as_unhandled() {
        assert!(describe_request(&Frame::ZEROED).starts_with("unhandled message"));
    }
}
