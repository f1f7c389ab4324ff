use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info};
use serialport::SerialPort;

use crate::errors::Result;
use crate::frame::{Frame, FRAME_LEN};

/// The module only talks at this rate.
pub const BAUD_RATE: u32 = 9600;

/// Default timeout for a single serial read.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(1000);

/// Byte-oriented duplex channel the driver talks through.
pub trait Transport: Send {
    /// Write every byte of `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read into `buf` until it is full, `delimiter` has been read (it is
    /// stored), or no more bytes arrive. Returns the number of bytes stored.
    fn read_until(&mut self, delimiter: u8, buf: &mut [u8]) -> io::Result<usize>;
}

/// Byte-at-a-time `read_until` over any reader. A read timeout ends the
/// read early, the same way an exhausted reader does.
pub fn read_until<R: Read + ?Sized>(
    reader: &mut R,
    delimiter: u8,
    buf: &mut [u8],
) -> io::Result<usize> {
    let mut filled = 0;
    let mut byte = [0u8; 1];
    while filled < buf.len() {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                buf[filled] = byte[0];
                filled += 1;
                if byte[0] == delimiter {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e)
                if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock =>
            {
                break
            }
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// ============================================================================
// Serial port
// ============================================================================

/// Serial port transport, fixed at [`BAUD_RATE`].
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial device (e.g. `/dev/ttyUSB0`).
    pub fn open(path: &str, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, BAUD_RATE).timeout(timeout).open()?;
        info!("opened serial port {} at {} baud", path, BAUD_RATE);
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        let n = self.port.bytes_to_read().map_err(io::Error::from)?;
        Ok(n as usize)
    }

    fn read_until(&mut self, delimiter: u8, buf: &mut [u8]) -> io::Result<usize> {
        read_until(&mut self.port, delimiter, buf)
    }
}

// ============================================================================
// In-memory channel
// ============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    fail_writes: bool,
}

/// In-memory transport for simulations and tests.
///
/// Clones share the same buffers, so one handle can be given to the driver
/// while another scripts replies and inspects what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue raw bytes as if the module had sent them.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.state().incoming.extend(bytes.iter().copied());
    }

    /// Queue a whole frame as if the module had sent it.
    pub fn push_frame(&self, frame: &Frame) {
        self.push_incoming(frame.as_bytes());
    }

    /// Bytes queued but not yet read.
    pub fn pending(&self) -> usize {
        self.state().incoming.len()
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    /// Everything written so far, cut into frames. A trailing partial
    /// frame is dropped.
    pub fn written_frames(&self) -> Vec<Frame> {
        self.state()
            .written
            .chunks_exact(FRAME_LEN)
            .filter_map(|chunk| Frame::from_slice(chunk).ok())
            .collect()
    }

    /// Make subsequent writes fail with `BrokenPipe`.
    pub fn fail_writes(&self, fail: bool) {
        self.state().fail_writes = fail;
    }
}

impl Transport for MemoryTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state();
        if state.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory transport closed",
            ));
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.state().incoming.len())
    }

    fn read_until(&mut self, delimiter: u8, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        let mut filled = 0;
        while filled < buf.len() {
            let Some(byte) = state.incoming.pop_front() else {
                break;
            };
            buf[filled] = byte;
            filled += 1;
            if byte == delimiter {
                break;
            }
        }
        debug!("memory transport read {} bytes", filled);
        Ok(filled)
    }
}
