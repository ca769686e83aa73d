//! Credentials and driver configuration
//!
//! This module contains the types supplied at driver construction:
//! - OTAA credentials (AppEUI, AppKey)
//! - Radio and protocol defaults (band, power index, data rate)
//! - Timeout and retry policy

/// Credential and configuration types
pub mod device;

pub use device::{Credentials, DriverConfig};
