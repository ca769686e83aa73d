//! High-level RN2483 driver interface
//!
//! This module provides the driver type owning the serial channel, reset
//! line, delay source, and optional watchdog. It handles module bring-up
//! and the single-command operations; the join and transmit sequences live
//! in their own modules.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::device::{ConfigError, Credentials, DriverConfig};
use crate::hal::traits::{ChannelError, NoWatchdog, ResetControl, SerialChannel, Watchdog};
use crate::protocol::command::Command;
use crate::protocol::engine;
use crate::protocol::response::{ErrorCode, Outcome, ResponseContext};
use crate::protocol::Line;

/// Timeout for the version banner the module prints after reset
const BANNER_TIMEOUT_MS: u32 = 2_000;

/// Per-attempt timeout while polling for module readiness
const READY_POLL_TIMEOUT_MS: u32 = 1_000;

/// How many readiness polls are attempted before giving up
const READY_POLL_ATTEMPTS: u32 = 50;

/// Delay between readiness polls, in milliseconds
const READY_POLL_DELAY_MS: u32 = 10;

/// Shortest sleep the module accepts, in milliseconds
const MIN_SLEEP_MS: u32 = 100;

/// Driver lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverState {
    /// Constructed, module not yet reset
    Uninitialized,
    /// Module reset and responding; not joined
    Configured,
    /// Join sequence in progress
    Joining,
    /// Network session established
    Joined,
    /// Uplink in progress
    Transmitting,
    /// The last join attempt failed; a new one may be started
    JoinFailed,
}

/// Error during module bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError<E> {
    /// The reset line could not be driven
    Reset,
    /// The module never answered a query sanely
    NotResponding,
    /// Channel fault
    Io(E),
}

/// Error from a single-command module operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError<E> {
    /// The driver has not been initialized
    NotInitialized,
    /// The argument is outside the module's documented range; nothing was
    /// written to the wire
    InvalidValue,
    /// The module rejected the command
    Rejected(ErrorCode),
    /// The module answered with an unknown token
    Unrecognized(Line),
    /// No response within the command timeout
    Timeout,
    /// Channel fault
    Io(E),
}

/// Driver for the RN2483 LoRaWAN module
///
/// Owns its capabilities for its whole lifetime: the serial channel, the
/// reset line, a delay source, and optionally a watchdog that is refreshed
/// after every command round trip. All operations are blocking and run to
/// completion on the calling thread of control.
pub struct Rn2483<C, RST, D, W = NoWatchdog>
where
    C: SerialChannel,
    RST: ResetControl,
    D: DelayMs<u32>,
    W: Watchdog,
{
    pub(crate) channel: C,
    pub(crate) reset: RST,
    pub(crate) delay: D,
    pub(crate) watchdog: W,
    pub(crate) credentials: Credentials,
    pub(crate) config: DriverConfig,
    pub(crate) state: DriverState,
}

impl<C, RST, D> Rn2483<C, RST, D, NoWatchdog>
where
    C: SerialChannel,
    RST: ResetControl,
    D: DelayMs<u32>,
{
    /// Create a driver without a watchdog
    pub fn new(
        channel: C,
        reset: RST,
        delay: D,
        credentials: Credentials,
        config: DriverConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_watchdog(channel, reset, delay, credentials, config, NoWatchdog)
    }
}

impl<C, RST, D, W> Rn2483<C, RST, D, W>
where
    C: SerialChannel,
    RST: ResetControl,
    D: DelayMs<u32>,
    W: Watchdog,
{
    /// Create a driver that refreshes `watchdog` during long operations
    ///
    /// Configuration and credentials are validated here, before any I/O.
    pub fn with_watchdog(
        channel: C,
        reset: RST,
        delay: D,
        credentials: Credentials,
        config: DriverConfig,
        watchdog: W,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            channel,
            reset,
            delay,
            watchdog,
            credentials,
            config,
            state: DriverState::Uninitialized,
        })
    }

    /// Hardware-reset the module and wait until it responds
    ///
    /// The module prints a version banner after reset and garbles commands
    /// while still starting up, so readiness is probed with a harmless
    /// query until it answers cleanly.
    pub fn init(&mut self) -> Result<(), InitError<C::Error>> {
        self.watchdog.refresh();
        self.reset
            .pulse(&mut self.delay)
            .map_err(|_| InitError::Reset)?;
        self.watchdog.refresh();

        let mut banner = Line::new();
        match self.channel.read_line(BANNER_TIMEOUT_MS, &mut banner) {
            Ok(()) | Err(ChannelError::TimedOut) => {}
            Err(ChannelError::Io(e)) => return Err(InitError::Io(e)),
        }

        for _ in 0..READY_POLL_ATTEMPTS {
            let cmd = Command::sys_get_hweui(READY_POLL_TIMEOUT_MS);
            match self.round_trip(&cmd).map_err(InitError::Io)? {
                Outcome::Success(_) => {
                    self.state = DriverState::Configured;
                    debug_log!("module ready");
                    return Ok(());
                }
                _ => self.delay.delay_ms(READY_POLL_DELAY_MS),
            }
        }
        Err(InitError::NotResponding)
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Borrow the serial channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Consume the driver and release its capabilities
    pub fn release(self) -> (C, RST, D, W) {
        (self.channel, self.reset, self.delay, self.watchdog)
    }

    /// Query version information (`sys get ver`)
    pub fn firmware_version(&mut self) -> Result<Line, CommandError<C::Error>> {
        self.ensure_ready()?;
        let cmd = Command::sys_get_ver(self.config.response_timeout_ms);
        self.query(&cmd)
    }

    /// Query the module's hardware EUI (`sys get hweui`)
    pub fn hardware_eui(&mut self) -> Result<Line, CommandError<C::Error>> {
        self.ensure_ready()?;
        let cmd = Command::sys_get_hweui(self.config.response_timeout_ms);
        self.query(&cmd)
    }

    /// Put the module to sleep for `length_ms` milliseconds
    ///
    /// Write-only: the module acknowledges only after waking, so no
    /// response is awaited.
    pub fn sleep(&mut self, length_ms: u32) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        if length_ms < MIN_SLEEP_MS {
            return Err(CommandError::InvalidValue);
        }
        let cmd = Command::sys_sleep(length_ms);
        engine::send_only(&mut self.channel, &cmd).map_err(CommandError::Io)?;
        self.watchdog.refresh();
        Ok(())
    }

    /// Set the output power index (0..=5)
    pub fn set_power_index(&mut self, power_index: u8) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        if power_index > 5 {
            return Err(CommandError::InvalidValue);
        }
        let cmd = Command::mac_set_pwridx(power_index, self.config.response_timeout_ms);
        self.set_command(&cmd)?;
        self.config.power_index = power_index;
        Ok(())
    }

    /// Set the transceiver output power (3..=15)
    pub fn set_radio_power(&mut self, power: u8) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        if !(3..=15).contains(&power) {
            return Err(CommandError::InvalidValue);
        }
        let cmd = Command::radio_set_pwr(power, self.config.response_timeout_ms);
        self.set_command(&cmd)
    }

    /// Set the data rate (0..=7)
    pub fn set_data_rate(&mut self, data_rate: u8) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        if data_rate > 7 {
            return Err(CommandError::InvalidValue);
        }
        let cmd = Command::mac_set_dr(data_rate, self.config.response_timeout_ms);
        self.set_command(&cmd)?;
        self.config.data_rate = data_rate;
        Ok(())
    }

    /// Enable or disable adaptive data rate
    pub fn set_adaptive_data_rate(&mut self, on: bool) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        let cmd = Command::mac_set_adr(on, self.config.response_timeout_ms);
        self.set_command(&cmd)?;
        self.config.adaptive_data_rate = on;
        Ok(())
    }

    /// Enable or disable automatic reply
    pub fn set_auto_reply(&mut self, on: bool) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        let cmd = Command::mac_set_ar(on, self.config.response_timeout_ms);
        self.set_command(&cmd)?;
        self.config.auto_reply = on;
        Ok(())
    }

    /// Persist the MAC configuration to the module's EEPROM (`mac save`)
    pub fn save_settings(&mut self) -> Result<(), CommandError<C::Error>> {
        self.ensure_ready()?;
        let cmd = Command::mac_save(self.config.response_timeout_ms);
        self.set_command(&cmd)
    }

    /// One command round trip, with the watchdog refreshed afterwards
    pub(crate) fn round_trip(&mut self, command: &Command) -> Result<Outcome, C::Error> {
        let outcome = engine::execute(&mut self.channel, command)?;
        self.watchdog.refresh();
        Ok(outcome)
    }

    /// Await a delayed verdict line, with the watchdog refreshed afterwards
    pub(crate) fn await_async(
        &mut self,
        context: ResponseContext,
        timeout_ms: u32,
    ) -> Result<Outcome, C::Error> {
        let outcome = engine::await_response(&mut self.channel, context, timeout_ms)?;
        self.watchdog.refresh();
        Ok(outcome)
    }

    fn ensure_ready(&self) -> Result<(), CommandError<C::Error>> {
        if self.state == DriverState::Uninitialized {
            return Err(CommandError::NotInitialized);
        }
        Ok(())
    }

    fn set_command(&mut self, command: &Command) -> Result<(), CommandError<C::Error>> {
        match self.round_trip(command).map_err(CommandError::Io)? {
            Outcome::Success(_) => Ok(()),
            Outcome::Error(code) => Err(CommandError::Rejected(code)),
            Outcome::Unrecognized(text) => Err(CommandError::Unrecognized(text)),
            Outcome::Timeout => Err(CommandError::Timeout),
        }
    }

    fn query(&mut self, command: &Command) -> Result<Line, CommandError<C::Error>> {
        match self.round_trip(command).map_err(CommandError::Io)? {
            Outcome::Success(value) => Ok(value.unwrap_or_default()),
            Outcome::Error(code) => Err(CommandError::Rejected(code)),
            Outcome::Unrecognized(text) => Err(CommandError::Unrecognized(text)),
            Outcome::Timeout => Err(CommandError::Timeout),
        }
    }
}
