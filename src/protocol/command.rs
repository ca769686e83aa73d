use core::fmt::Write;

use heapless::String;

use super::response::ResponseContext;
use crate::config::device::{AppEui, AppKey, Band};

/// Maximum length of a rendered command, in bytes
///
/// Sized for the largest command the driver issues: `mac tx` with a
/// full-length hex-encoded payload.
pub const MAX_COMMAND_LEN: usize = 128;

/// Largest uplink payload accepted, in bytes
///
/// The module's limit depends on the current data rate; 51 bytes is valid
/// at every EU868 data rate, so the driver enforces it as a fixed bound
/// instead of tracking the active rate.
pub const MAX_TX_PAYLOAD: usize = 51;

type CommandBuf = String<MAX_COMMAND_LEN>;

/// One request to the module: rendered command text, the classification
/// context of its response, and its timeout
#[derive(Debug, Clone)]
pub struct Command {
    text: CommandBuf,
    context: ResponseContext,
    timeout_ms: u32,
}

impl Command {
    /// Rendered command text, without the CRLF terminator
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Classification context for the response
    pub fn context(&self) -> ResponseContext {
        self.context
    }

    /// How long to wait for the immediate response, in milliseconds
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// `sys get ver`: query version information
    pub fn sys_get_ver(timeout_ms: u32) -> Self {
        Self::render(format_args!("sys get ver"), ResponseContext::Query, timeout_ms)
    }

    /// `sys get hweui`: query the module's hardware EUI
    pub fn sys_get_hweui(timeout_ms: u32) -> Self {
        Self::render(format_args!("sys get hweui"), ResponseContext::Query, timeout_ms)
    }

    /// `sys sleep`: put the module to sleep
    ///
    /// The module answers only after waking, so this command is written
    /// without awaiting a response.
    pub fn sys_sleep(length_ms: u32) -> Self {
        Self::render(format_args!("sys sleep {}", length_ms), ResponseContext::SetParam, 0)
    }

    /// `mac reset`: reset the MAC layer to the defaults of a band
    pub fn mac_reset(band: Band, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("mac reset {}", band.number()),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `mac set deveui`: set the device EUI from already-encoded hex text
    pub fn mac_set_deveui(deveui: &str, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("mac set deveui {}", deveui),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `mac set appeui`: set the application EUI
    pub fn mac_set_appeui(app_eui: &AppEui, timeout_ms: u32) -> Self {
        let mut text = CommandBuf::new();
        write!(text, "mac set appeui ").ok();
        push_hex(&mut text, app_eui);
        Self {
            text,
            context: ResponseContext::SetParam,
            timeout_ms,
        }
    }

    /// `mac set appkey`: set the application key
    pub fn mac_set_appkey(app_key: &AppKey, timeout_ms: u32) -> Self {
        let mut text = CommandBuf::new();
        write!(text, "mac set appkey ").ok();
        push_hex(&mut text, app_key);
        Self {
            text,
            context: ResponseContext::SetParam,
            timeout_ms,
        }
    }

    /// `mac set pwridx`: set the output power index
    pub fn mac_set_pwridx(power_index: u8, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("mac set pwridx {}", power_index),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `mac set dr`: set the data rate
    pub fn mac_set_dr(data_rate: u8, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("mac set dr {}", data_rate),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `mac set adr`: enable or disable adaptive data rate
    pub fn mac_set_adr(on: bool, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("mac set adr {}", on_off(on)),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `mac set ar`: enable or disable automatic reply
    pub fn mac_set_ar(on: bool, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("mac set ar {}", on_off(on)),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `radio set pwr`: set the transceiver output power
    pub fn radio_set_pwr(power: u8, timeout_ms: u32) -> Self {
        Self::render(
            format_args!("radio set pwr {}", power),
            ResponseContext::SetParam,
            timeout_ms,
        )
    }

    /// `mac save`: persist the MAC configuration to EEPROM
    pub fn mac_save(timeout_ms: u32) -> Self {
        Self::render(format_args!("mac save"), ResponseContext::SetParam, timeout_ms)
    }

    /// `mac join otaa`: start the over-the-air activation procedure
    pub fn mac_join_otaa(timeout_ms: u32) -> Self {
        Self::render(format_args!("mac join otaa"), ResponseContext::JoinAck, timeout_ms)
    }

    /// `mac tx`: transmit an application payload
    ///
    /// The payload is hex-encoded; anything beyond [`MAX_TX_PAYLOAD`] is
    /// truncated, the caller bounds the length beforehand.
    pub fn mac_tx(port: u8, payload: &[u8], confirmed: bool, timeout_ms: u32) -> Self {
        let mut text = CommandBuf::new();
        let mode = if confirmed { "cnf" } else { "uncnf" };
        write!(text, "mac tx {} {} ", mode, port).ok();
        push_hex(&mut text, &payload[..payload.len().min(MAX_TX_PAYLOAD)]);
        Self {
            text,
            context: ResponseContext::TxAck,
            timeout_ms,
        }
    }

    fn render(args: core::fmt::Arguments, context: ResponseContext, timeout_ms: u32) -> Self {
        let mut text = CommandBuf::new();
        text.write_fmt(args).ok();
        Self {
            text,
            context,
            timeout_ms,
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}

/// Append bytes as lowercase hex
fn push_hex(buf: &mut CommandBuf, bytes: &[u8]) {
    for &byte in bytes {
        let mut pair = [0u8; 2];
        if hex::encode_to_slice([byte], &mut pair).is_ok() {
            for &digit in &pair {
                let _ = buf.push(digit as char);
            }
        }
    }
}
