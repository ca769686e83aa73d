use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::serial;

use super::traits::{ChannelError, ResetControl, SerialChannel};
use crate::protocol::Line;

/// How long each level of the reset pulse is held, in milliseconds
const RESET_HOLD_MS: u32 = 500;

/// Polling interval while waiting for serial data, in microseconds
///
/// One character at 57600 baud takes about 170 us, so polling at 100 us
/// cannot miss bytes in the peripheral FIFO.
const POLL_INTERVAL_US: u32 = 100;

/// Fault on the underlying serial peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError<RE, WE> {
    /// Read side failed
    Read(RE),
    /// Write side failed
    Write(WE),
}

/// Serial channel over an embedded-hal UART
///
/// Wraps a non-blocking serial peripheral and a delay source into the
/// blocking, timeout-bounded line discipline the protocol needs.
pub struct UartChannel<S, D> {
    serial: S,
    delay: D,
}

impl<S, D> UartChannel<S, D>
where
    S: serial::Read<u8> + serial::Write<u8>,
    D: DelayUs<u32>,
{
    /// Create a channel over a serial peripheral and a delay source
    pub fn new(serial: S, delay: D) -> Self {
        Self { serial, delay }
    }

    /// Release the underlying peripherals
    pub fn free(self) -> (S, D) {
        (self.serial, self.delay)
    }
}

impl<S, D> SerialChannel for UartChannel<S, D>
where
    S: serial::Read<u8> + serial::Write<u8>,
    D: DelayUs<u32>,
{
    type Error = UartError<<S as serial::Read<u8>>::Error, <S as serial::Write<u8>>::Error>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            nb::block!(self.serial.write(byte)).map_err(UartError::Write)?;
        }
        nb::block!(self.serial.flush()).map_err(UartError::Write)?;
        Ok(())
    }

    fn read_line(
        &mut self,
        timeout_ms: u32,
        line: &mut Line,
    ) -> Result<(), ChannelError<Self::Error>> {
        line.clear();
        let mut budget_us = timeout_ms.saturating_mul(1_000);
        loop {
            match self.serial.read() {
                Ok(b'\n') => return Ok(()),
                Ok(b'\r') => {}
                Ok(byte) => {
                    // Overlong lines are truncated per the trait contract
                    let _ = line.push(byte as char);
                }
                Err(nb::Error::WouldBlock) => {
                    if budget_us == 0 {
                        return Err(ChannelError::TimedOut);
                    }
                    self.delay.delay_us(POLL_INTERVAL_US);
                    budget_us = budget_us.saturating_sub(POLL_INTERVAL_US);
                }
                Err(nb::Error::Other(e)) => {
                    return Err(ChannelError::Io(UartError::Read(e)));
                }
            }
        }
    }
}

/// Reset line driven by a GPIO pin
pub struct GpioReset<P> {
    pin: P,
}

impl<P: OutputPin> GpioReset<P> {
    /// Wrap an output pin wired to the module's reset input
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the underlying pin
    pub fn free(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> ResetControl for GpioReset<P> {
    type Error = P::Error;

    fn pulse<D: DelayMs<u32>>(&mut self, delay: &mut D) -> Result<(), Self::Error> {
        self.pin.set_high()?;
        delay.delay_ms(RESET_HOLD_MS);
        self.pin.set_low()?;
        delay.delay_ms(RESET_HOLD_MS);
        self.pin.set_high()?;
        delay.delay_ms(RESET_HOLD_MS);
        Ok(())
    }
}
