//! Hardware abstraction layer
//!
//! The driver consumes three capabilities: a duplex serial channel with a
//! bounded-time line read, a reset control line, and an optional watchdog.
//! The traits keep the core portable; `uart` provides implementations on
//! top of embedded-hal peripherals.

/// Capability traits consumed by the driver
pub mod traits;

/// Implementations over embedded-hal serial and GPIO peripherals
pub mod uart;

pub use traits::{ChannelError, NoWatchdog, ResetControl, SerialChannel, Watchdog};
pub use uart::{GpioReset, UartChannel};
