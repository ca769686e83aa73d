//! Uplink transmission
//!
//! `mac tx` answers twice: an immediate acknowledgement that the payload
//! was accepted into the queue, then, once the radio exchange finishes,
//! the transmit verdict. A busy radio or duty-cycle limiter is retried a
//! bounded number of times with a fixed backoff; the limiter clears on a
//! known schedule, so the delay is not exponential.

use embedded_hal::blocking::delay::DelayMs;

use crate::device::{DriverState, Rn2483};
use crate::hal::traits::{ResetControl, SerialChannel, Watchdog};
use crate::protocol::command::{Command, MAX_TX_PAYLOAD};
use crate::protocol::response::{ErrorCode, Outcome, ResponseContext};
use crate::protocol::Line;

/// Successful uplink result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
    /// The uplink was transmitted
    Sent,
    /// The uplink was transmitted and a downlink arrived with it; the text
    /// is surfaced as received, not parsed
    Downlink(Line),
}

/// Error from [`Rn2483::send`] and [`Rn2483::send_data`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxError<E> {
    /// The driver holds no network session; nothing was written to the wire
    /// unless the module itself reported the lost session
    NotJoined,
    /// Payload exceeds [`MAX_TX_PAYLOAD`]; nothing was written to the wire
    PayloadTooLarge,
    /// The radio stayed busy through every retry
    ChannelBusy,
    /// The module rejected the transmit command
    Rejected(ErrorCode),
    /// The uplink was not delivered
    TxFailed,
    /// No transmit verdict within the transmit timeout
    TxTimeout,
    /// The module answered with an unknown token
    Unrecognized(Line),
    /// Channel fault
    Io(E),
}

impl<C, RST, D, W> Rn2483<C, RST, D, W>
where
    C: SerialChannel,
    RST: ResetControl,
    D: DelayMs<u32>,
    W: Watchdog,
{
    /// Send an unconfirmed uplink on the configured default port
    pub fn send(&mut self, payload: &[u8]) -> Result<TxOutcome, TxError<C::Error>> {
        let port = self.config.port;
        self.send_data(port, payload, false)
    }

    /// Send an uplink on `port`, confirmed or unconfirmed
    ///
    /// Only valid while joined. A failed or timed-out transmit leaves the
    /// session intact; only a module-reported `not_joined` drops the driver
    /// back to [`DriverState::JoinFailed`].
    pub fn send_data(
        &mut self,
        port: u8,
        payload: &[u8],
        confirmed: bool,
    ) -> Result<TxOutcome, TxError<C::Error>> {
        if self.state != DriverState::Joined {
            return Err(TxError::NotJoined);
        }
        if payload.len() > MAX_TX_PAYLOAD {
            return Err(TxError::PayloadTooLarge);
        }

        self.state = DriverState::Transmitting;
        let result = self.transmit(port, payload, confirmed);
        self.state = match result {
            Err(TxError::NotJoined) => DriverState::JoinFailed,
            _ => DriverState::Joined,
        };
        result
    }

    fn transmit(
        &mut self,
        port: u8,
        payload: &[u8],
        confirmed: bool,
    ) -> Result<TxOutcome, TxError<C::Error>> {
        let command = Command::mac_tx(port, payload, confirmed, self.config.response_timeout_ms);

        let mut busy_answers = 0;
        loop {
            match self.round_trip(&command).map_err(TxError::Io)? {
                Outcome::Success(_) => break,
                Outcome::Error(ErrorCode::Busy) | Outcome::Error(ErrorCode::NoFreeChannel) => {
                    busy_answers += 1;
                    debug_log!("tx busy, answer {=u8}", busy_answers);
                    if busy_answers >= self.config.busy_retries {
                        return Err(TxError::ChannelBusy);
                    }
                    self.delay.delay_ms(self.config.busy_backoff_ms);
                }
                Outcome::Error(ErrorCode::NotJoined) => return Err(TxError::NotJoined),
                Outcome::Error(code) => return Err(TxError::Rejected(code)),
                Outcome::Unrecognized(text) => return Err(TxError::Unrecognized(text)),
                Outcome::Timeout => return Err(TxError::TxTimeout),
            }
        }

        // The verdict arrives as a second line once the radio exchange and
        // receive windows finish.
        let verdict = self
            .await_async(ResponseContext::TxResult, self.config.tx_timeout_ms)
            .map_err(TxError::Io)?;
        match verdict {
            Outcome::Success(None) => Ok(TxOutcome::Sent),
            Outcome::Success(Some(data)) => Ok(TxOutcome::Downlink(data)),
            Outcome::Error(ErrorCode::TxFail) => Err(TxError::TxFailed),
            Outcome::Error(code) => Err(TxError::Rejected(code)),
            Outcome::Unrecognized(text) => Err(TxError::Unrecognized(text)),
            Outcome::Timeout => Err(TxError::TxTimeout),
        }
    }
}
