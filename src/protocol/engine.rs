use super::command::Command;
use super::response::{classify, Outcome, ResponseContext};
use super::Line;
use crate::hal::traits::{ChannelError, SerialChannel};

/// Line terminator on the wire
const TERMINATOR: &[u8] = b"\r\n";

/// How many empty lines may precede a real response
///
/// Empty reads are CRLF residue already sitting in the receive buffer, so
/// discarding them does not consume meaningful time; the cap keeps the wait
/// bounded regardless.
const BLANK_LINE_BUDGET: u8 = 4;

/// Write one command and await its classified response
///
/// Exactly one command may be in flight at a time; the caller sequences
/// invocations. A channel fault is returned as `Err` and never retried
/// here; retry policy belongs to the calling state machine.
pub fn execute<C: SerialChannel>(channel: &mut C, command: &Command) -> Result<Outcome, C::Error> {
    debug_log!("execute: {=str}", command.text());
    channel.write_all(command.text().as_bytes())?;
    channel.write_all(TERMINATOR)?;
    await_response(channel, command.context(), command.timeout_ms())
}

/// Write one command without awaiting a response
///
/// Used for `sys sleep`, which the module only answers after waking.
pub fn send_only<C: SerialChannel>(channel: &mut C, command: &Command) -> Result<(), C::Error> {
    debug_log!("send only: {=str}", command.text());
    channel.write_all(command.text().as_bytes())?;
    channel.write_all(TERMINATOR)
}

/// Read lines until one classifies as a terminal outcome or the timeout
/// elapses
///
/// Also used on its own for the delayed join and transmit verdicts, which
/// arrive as a second line seconds after the immediate acknowledgement.
pub fn await_response<C: SerialChannel>(
    channel: &mut C,
    context: ResponseContext,
    timeout_ms: u32,
) -> Result<Outcome, C::Error> {
    let mut blanks = 0;
    loop {
        let mut line = Line::new();
        match channel.read_line(timeout_ms, &mut line) {
            Ok(()) => {}
            Err(ChannelError::TimedOut) => return Ok(Outcome::Timeout),
            Err(ChannelError::Io(e)) => return Err(e),
        }

        let text = line.trim();
        if text.is_empty() {
            blanks += 1;
            if blanks > BLANK_LINE_BUDGET {
                return Ok(Outcome::Timeout);
            }
            continue;
        }

        debug_log!("response: {=str}", text);
        return Ok(classify(context, text));
    }
}
