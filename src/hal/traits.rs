use embedded_hal::blocking::delay::DelayMs;

use crate::protocol::Line;

/// Fault while reading from the serial channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError<E> {
    /// No complete line arrived within the timeout
    TimedOut,
    /// The underlying peripheral failed
    Io(E),
}

/// Duplex byte stream to the module
///
/// The module terminates every line with CRLF; `read_line` strips the
/// terminator and may return an empty line (the module emits bare CRLF
/// between some responses). Lines longer than the buffer are truncated.
pub trait SerialChannel {
    /// Error type of the underlying peripheral
    type Error;

    /// Write all bytes to the module
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read one line, waiting at most `timeout_ms` for it to complete
    fn read_line(&mut self, timeout_ms: u32, line: &mut Line)
        -> Result<(), ChannelError<Self::Error>>;
}

/// Control line that hardware-resets the module
pub trait ResetControl {
    /// Error type of the underlying pin
    type Error;

    /// Toggle the reset line once, holding each level long enough for the
    /// module to register it
    fn pulse<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), Self::Error>;
}

/// External watchdog to keep alive during long protocol sequences
pub trait Watchdog {
    /// Refresh the watchdog timer
    fn refresh(&mut self);
}

/// Watchdog implementation for systems without one
#[derive(Debug, Default, Clone, Copy)]
pub struct NoWatchdog;

impl Watchdog for NoWatchdog {
    fn refresh(&mut self) {}
}
