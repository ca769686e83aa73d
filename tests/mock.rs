//! Scripted capability mocks for driver tests

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;
use rn2483::hal::traits::{ChannelError, ResetControl, SerialChannel, Watchdog};
use rn2483::protocol::Line;

/// One scripted answer to a line read
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// A response line from the module
    Line(&'static str),
    /// No response within the timeout
    Timeout,
    /// A channel-level fault
    Fault,
}

/// Channel fault injected by the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptFault;

/// Serial channel that answers reads from a script and records writes
pub struct ScriptedChannel {
    replies: VecDeque<Reply>,
    partial: String,
    /// Complete CRLF-terminated commands written to the module, in order
    pub writes: Vec<String>,
}

impl ScriptedChannel {
    /// Create a channel that will answer reads with `replies`, then time out
    pub fn new(replies: &[Reply]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            partial: String::new(),
            writes: Vec::new(),
        }
    }
}

impl SerialChannel for ScriptedChannel {
    type Error = ScriptFault;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.partial.push_str(std::str::from_utf8(bytes).unwrap());
        while let Some(pos) = self.partial.find("\r\n") {
            let command: String = self.partial.drain(..pos + 2).collect();
            self.writes.push(command);
        }
        Ok(())
    }

    fn read_line(
        &mut self,
        _timeout_ms: u32,
        line: &mut Line,
    ) -> Result<(), ChannelError<Self::Error>> {
        line.clear();
        match self.replies.pop_front() {
            None | Some(Reply::Timeout) => Err(ChannelError::TimedOut),
            Some(Reply::Fault) => Err(ChannelError::Io(ScriptFault)),
            Some(Reply::Line(text)) => {
                for c in text.chars() {
                    line.push(c).unwrap();
                }
                Ok(())
            }
        }
    }
}

/// Reset line that accepts every pulse
#[derive(Debug, Default)]
pub struct MockReset;

impl ResetControl for MockReset {
    type Error = ();

    fn pulse<D: DelayMs<u32>>(&mut self, _delay: &mut D) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Delay source that returns immediately
#[derive(Debug, Default)]
pub struct MockDelay;

impl DelayMs<u32> for MockDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

/// Watchdog that counts refreshes through a shared handle
pub struct CountingWatchdog {
    feeds: Rc<Cell<u32>>,
}

impl CountingWatchdog {
    /// Create the watchdog and a handle to observe its refresh count
    pub fn new() -> (Self, Rc<Cell<u32>>) {
        let feeds = Rc::new(Cell::new(0));
        (
            Self {
                feeds: feeds.clone(),
            },
            feeds,
        )
    }
}

impl Watchdog for CountingWatchdog {
    fn refresh(&mut self) {
        self.feeds.set(self.feeds.get() + 1);
    }
}
