//! Over-the-air activation
//!
//! The join procedure is a fixed sequence of configuration commands
//! followed by `mac join otaa`. The join command itself answers twice:
//! an immediate acknowledgement that the attempt started, then, seconds
//! later, the network's verdict. The verdict is awaited as a single
//! blocking read with an extended timeout.

use embedded_hal::blocking::delay::DelayMs;

use crate::device::{DriverState, Rn2483};
use crate::hal::traits::{ResetControl, SerialChannel, Watchdog};
use crate::protocol::command::Command;
use crate::protocol::response::{ErrorCode, Outcome, ResponseContext};
use crate::protocol::Line;

/// Why a single join step failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The module reported a known error token
    Module(ErrorCode),
    /// No response within the step's timeout
    Timeout,
    /// The module answered with an unknown token
    Unrecognized(Line),
}

/// Error from [`Rn2483::initialize_otaa`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinError<E> {
    /// The driver has not been initialized
    NotInitialized,
    /// A device-class or radio-default configuration command failed
    ConfigurationRejected(Failure),
    /// Setting the AppEUI or AppKey failed
    CredentialsRejected(Failure),
    /// The module refused to start the join attempt
    JoinRejected(ErrorCode),
    /// The network denied the join request
    JoinDenied,
    /// No join verdict arrived within the join timeout
    JoinTimeout,
    /// The module answered with an unknown token
    Unrecognized(Line),
    /// Channel fault
    Io(E),
}

enum StepError<E> {
    Failed(Failure),
    Io(E),
}

impl<E> StepError<E> {
    fn configuration(self) -> JoinError<E> {
        match self {
            StepError::Failed(failure) => JoinError::ConfigurationRejected(failure),
            StepError::Io(e) => JoinError::Io(e),
        }
    }

    fn credentials(self) -> JoinError<E> {
        match self {
            StepError::Failed(failure) => JoinError::CredentialsRejected(failure),
            StepError::Io(e) => JoinError::Io(e),
        }
    }
}

fn failure(outcome: Outcome) -> Failure {
    match outcome {
        Outcome::Error(code) => Failure::Module(code),
        Outcome::Unrecognized(text) => Failure::Unrecognized(text),
        Outcome::Timeout => Failure::Timeout,
        Outcome::Success(_) => Failure::Unrecognized(Line::new()),
    }
}

impl<C, RST, D, W> Rn2483<C, RST, D, W>
where
    C: SerialChannel,
    RST: ResetControl,
    D: DelayMs<u32>,
    W: Watchdog,
{
    /// Join the network via over-the-air activation
    ///
    /// Configures the device class and radio defaults, sets the
    /// credentials, then starts the join and blocks until the network
    /// accepts or denies it, or the join timeout elapses. A denied join is
    /// not retried here; calling again restarts the full configuration
    /// sequence.
    pub fn initialize_otaa(&mut self) -> Result<(), JoinError<C::Error>> {
        if self.state == DriverState::Uninitialized {
            return Err(JoinError::NotInitialized);
        }

        self.state = DriverState::Joining;
        let result = self.join_sequence();
        self.state = if result.is_ok() {
            DriverState::Joined
        } else {
            DriverState::JoinFailed
        };
        debug_log!("join finished: {}", self.state);
        result
    }

    fn join_sequence(&mut self) -> Result<(), JoinError<C::Error>> {
        let t = self.config.response_timeout_ms;

        // The device EUI is the module's own hardware EUI.
        let cmd = Command::sys_get_hweui(t);
        let hweui = match self.round_trip(&cmd).map_err(JoinError::Io)? {
            Outcome::Success(Some(eui)) => eui,
            other => return Err(JoinError::ConfigurationRejected(failure(other))),
        };

        let configuration = [
            Command::mac_reset(self.config.band, t),
            Command::mac_set_deveui(hweui.as_str(), t),
            Command::mac_set_pwridx(self.config.power_index, t),
            Command::mac_set_dr(self.config.data_rate, t),
            Command::mac_set_adr(self.config.adaptive_data_rate, t),
            Command::mac_set_ar(self.config.auto_reply, t),
        ];
        for command in &configuration {
            self.join_step(command).map_err(StepError::configuration)?;
        }

        let appeui = Command::mac_set_appeui(&self.credentials.app_eui, t);
        self.join_step(&appeui).map_err(StepError::credentials)?;
        let appkey = Command::mac_set_appkey(&self.credentials.app_key, t);
        self.join_step(&appkey).map_err(StepError::credentials)?;

        let save = Command::mac_save(t);
        self.join_step(&save).map_err(StepError::configuration)?;

        // Immediate acknowledgement that the join attempt started.
        let join = Command::mac_join_otaa(t);
        match self.round_trip(&join).map_err(JoinError::Io)? {
            Outcome::Success(_) => {}
            Outcome::Error(code) => return Err(JoinError::JoinRejected(code)),
            Outcome::Unrecognized(text) => return Err(JoinError::Unrecognized(text)),
            Outcome::Timeout => return Err(JoinError::JoinTimeout),
        }

        // The radio handshake takes several seconds; the verdict arrives as
        // a second line.
        let verdict = self
            .await_async(ResponseContext::JoinResult, self.config.join_timeout_ms)
            .map_err(JoinError::Io)?;
        match verdict {
            Outcome::Success(_) => Ok(()),
            Outcome::Error(ErrorCode::Denied) => Err(JoinError::JoinDenied),
            Outcome::Error(code) => Err(JoinError::JoinRejected(code)),
            Outcome::Unrecognized(text) => Err(JoinError::Unrecognized(text)),
            Outcome::Timeout => Err(JoinError::JoinTimeout),
        }
    }

    fn join_step(&mut self, command: &Command) -> Result<(), StepError<C::Error>> {
        match self.round_trip(command).map_err(StepError::Io)? {
            Outcome::Success(_) => Ok(()),
            other => Err(StepError::Failed(failure(other))),
        }
    }
}
