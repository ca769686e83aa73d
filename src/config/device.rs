/// EUI-64 (8 bytes)
pub type AppEui = [u8; 8];
/// AES-128 key (16 bytes)
pub type AppKey = [u8; 16];

/// Frequency band the module operates in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Band {
    /// EU 868 MHz band
    Mhz868,
    /// EU 433 MHz band
    Mhz433,
}

impl Band {
    /// Band number as the module expects it on the wire
    pub fn number(&self) -> u16 {
        match self {
            Band::Mhz868 => 868,
            Band::Mhz433 => 433,
        }
    }
}

/// Configuration error raised before any module I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// AppEUI is not 16 hexadecimal characters / 8 bytes
    InvalidAppEui,
    /// AppKey is not 32 hexadecimal characters / 16 bytes
    InvalidAppKey,
    /// Power index outside the module's 0..=5 range
    PowerIndexOutOfRange,
    /// Data rate outside the module's 0..=7 range
    DataRateOutOfRange,
    /// Uplink port outside the LoRaWAN application range 1..=223
    PortOutOfRange,
}

/// OTAA credentials for the application this device belongs to
///
/// The module expects both values as hexadecimal text on the wire; they are
/// validated here, at construction, so a malformed credential can never reach
/// the join sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Application EUI
    pub app_eui: AppEui,
    /// Application key
    pub app_key: AppKey,
}

impl Credentials {
    /// Create credentials from raw bytes
    pub const fn new(app_eui: AppEui, app_key: AppKey) -> Self {
        Self { app_eui, app_key }
    }

    /// Create credentials from hexadecimal text, as handed out by network
    /// consoles. Length and charset are checked.
    pub fn from_hex(app_eui: &str, app_key: &str) -> Result<Self, ConfigError> {
        let mut eui = [0u8; 8];
        hex::decode_to_slice(app_eui, &mut eui).map_err(|_| ConfigError::InvalidAppEui)?;
        let mut key = [0u8; 16];
        hex::decode_to_slice(app_key, &mut key).map_err(|_| ConfigError::InvalidAppKey)?;
        Ok(Self {
            app_eui: eui,
            app_key: key,
        })
    }
}

/// Driver configuration
///
/// The defaults reproduce the module's TTN class A setup: EU 868 band,
/// power index 1, data rate 5, ADR and auto-reply off, uplink port 1.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Frequency band
    pub band: Band,
    /// Output power index (0..=5)
    pub power_index: u8,
    /// Data rate (0..=7)
    pub data_rate: u8,
    /// Adaptive data rate
    pub adaptive_data_rate: bool,
    /// Automatic reply to downlinks
    pub auto_reply: bool,
    /// Default uplink port (1..=223)
    pub port: u8,
    /// Timeout for the immediate response to a command, in milliseconds
    pub response_timeout_ms: u32,
    /// Timeout for the asynchronous join result, in milliseconds
    pub join_timeout_ms: u32,
    /// Timeout for the asynchronous transmit result, in milliseconds
    pub tx_timeout_ms: u32,
    /// How many busy answers are tolerated before a transmit gives up
    pub busy_retries: u8,
    /// Delay between busy retries, in milliseconds
    pub busy_backoff_ms: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            band: Band::Mhz868,
            power_index: 1,
            data_rate: 5,
            adaptive_data_rate: false,
            auto_reply: false,
            port: 1,
            response_timeout_ms: 5_000,
            join_timeout_ms: 30_000,
            tx_timeout_ms: 15_000,
            busy_retries: 3,
            busy_backoff_ms: 200,
        }
    }
}

impl DriverConfig {
    /// Check all values against the module's documented ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.power_index > 5 {
            return Err(ConfigError::PowerIndexOutOfRange);
        }
        if self.data_rate > 7 {
            return Err(ConfigError::DataRateOutOfRange);
        }
        if self.port == 0 || self.port > 223 {
            return Err(ConfigError::PortOutOfRange);
        }
        Ok(())
    }
}
