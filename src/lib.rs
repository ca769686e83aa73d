//! RN2483 LoRaWAN module driver in Rust
//!
//! This crate drives a Microchip RN2483 LoRaWAN transceiver module over a
//! byte-oriented serial link. The module speaks a textual command/response
//! protocol; the driver issues commands, classifies the module's response
//! tokens, and sequences the multi-step join and transmit procedures on top.
//!
//! # Features
//! - Over-the-air activation (OTAA) with the full TTN configuration sequence
//! - Unconfirmed and confirmed uplinks with bounded busy-retry
//! - Context-sensitive response classification (unknown tokens are never
//!   treated as success)
//! - Hardware abstraction for the serial channel, reset line, and watchdog
//! - No unsafe code
//!
//! # Example
//! ```no_run
//! use rn2483::{
//!     config::device::{Credentials, DriverConfig},
//!     device::Rn2483,
//! };
//! # use rn2483::hal::traits::{ChannelError, ResetControl, SerialChannel};
//! # use rn2483::protocol::Line;
//! # struct Channel;
//! # impl SerialChannel for Channel {
//! #     type Error = ();
//! #     fn write_all(&mut self, _bytes: &[u8]) -> Result<(), ()> { Ok(()) }
//! #     fn read_line(&mut self, _timeout_ms: u32, line: &mut Line) -> Result<(), ChannelError<()>> {
//! #         line.push_str("ok").ok();
//! #         Ok(())
//! #     }
//! # }
//! # struct Reset;
//! # impl ResetControl for Reset {
//! #     type Error = ();
//! #     fn pulse<D: embedded_hal::blocking::delay::DelayMs<u32>>(&mut self, _delay: &mut D) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct Delay;
//! # impl embedded_hal::blocking::delay::DelayMs<u32> for Delay {
//! #     fn delay_ms(&mut self, _ms: u32) {}
//! # }
//! # let (channel, reset, delay) = (Channel, Reset, Delay);
//! // AppEUI and AppKey as provided by the network console
//! let credentials = Credentials::from_hex(
//!     "0123456789abcdef",
//!     "0123456789abcdef0123456789abcdef",
//! ).unwrap();
//!
//! let mut driver = Rn2483::new(channel, reset, delay, credentials, DriverConfig::default()).unwrap();
//!
//! // Hardware reset, then wait for the module to come up
//! driver.init().unwrap();
//!
//! // Join the network
//! driver.initialize_otaa().unwrap();
//!
//! // Send an application payload
//! driver.send(b"Hello, LoRaWAN!").unwrap();
//! ```

#![warn(missing_docs)]
#![no_std]

#[cfg(feature = "defmt")]
macro_rules! debug_log {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Credentials and driver configuration
pub mod config;

/// Hardware capability traits and embedded-hal backed implementations
pub mod hal;

/// Textual command/response protocol
pub mod protocol;

/// High-level driver interface
pub mod device;

/// Over-the-air activation procedure
pub mod join;

/// Uplink transmission
pub mod uplink;
