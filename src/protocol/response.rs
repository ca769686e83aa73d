use super::Line;

/// Which command a response line belongs to
///
/// The same token can mean different things after different commands: a bare
/// `ok` confirms a parameter write but only acknowledges that a join or
/// transmit was started, and `mac_tx_ok` is meaningful solely while a
/// transmit result is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseContext {
    /// A parameter write; the only success token is `ok`
    SetParam,
    /// A query; any non-error line is the queried value
    Query,
    /// Immediate acknowledgement of `mac join`
    JoinAck,
    /// Asynchronous join verdict (`accepted` / `denied`)
    JoinResult,
    /// Immediate acknowledgement of `mac tx`
    TxAck,
    /// Asynchronous transmit verdict (`mac_tx_ok` / `mac_tx_fail`)
    TxResult,
}

/// Error token reported by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorCode {
    /// `invalid_param`: the command or one of its arguments was rejected
    InvalidParam,
    /// `not_joined`: the module has no network session
    NotJoined,
    /// `no_free_ch`: all channels are blocked by the duty-cycle limiter
    NoFreeChannel,
    /// `busy`: the radio is not ready for the operation
    Busy,
    /// `mac_tx_fail`: the uplink was not delivered
    TxFail,
    /// `denied`: the network rejected the join request
    Denied,
    /// `radio_err`: the transceiver reported a hardware-level fault
    RadioErr,
}

/// Classified module response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation succeeded; queries and downlink-carrying transmit
    /// results attach the remaining line text
    Success(Option<Line>),
    /// The module reported a known error token
    Error(ErrorCode),
    /// The line matched no token known for this context; never treated as
    /// success
    Unrecognized(Line),
    /// No response arrived within the command's timeout
    Timeout,
}

/// Classify one response line for the given context
///
/// Matching is case-sensitive and exact after trimming surrounding
/// whitespace. Error tokens carry the same meaning everywhere; success
/// tokens depend on the context. Anything else is `Unrecognized`.
pub fn classify(context: ResponseContext, line: &str) -> Outcome {
    let text = line.trim();

    let code = match text {
        "invalid_param" => Some(ErrorCode::InvalidParam),
        "not_joined" => Some(ErrorCode::NotJoined),
        "no_free_ch" => Some(ErrorCode::NoFreeChannel),
        "busy" => Some(ErrorCode::Busy),
        "mac_tx_fail" => Some(ErrorCode::TxFail),
        "denied" => Some(ErrorCode::Denied),
        "radio_err" => Some(ErrorCode::RadioErr),
        _ => None,
    };
    if let Some(code) = code {
        return Outcome::Error(code);
    }

    match context {
        ResponseContext::SetParam | ResponseContext::JoinAck | ResponseContext::TxAck => {
            if text == "ok" {
                Outcome::Success(None)
            } else {
                Outcome::Unrecognized(owned(text))
            }
        }
        ResponseContext::Query => Outcome::Success(Some(owned(text))),
        ResponseContext::JoinResult => {
            if text == "accepted" {
                Outcome::Success(None)
            } else {
                Outcome::Unrecognized(owned(text))
            }
        }
        ResponseContext::TxResult => {
            if text == "mac_tx_ok" {
                Outcome::Success(None)
            } else if let Some(rest) = text.strip_prefix("mac_tx_ok ") {
                Outcome::Success(Some(owned(rest.trim())))
            } else {
                Outcome::Unrecognized(owned(text))
            }
        }
    }
}

/// Copy response text into an owned line, truncating if oversized
pub(crate) fn owned(text: &str) -> Line {
    let mut line = Line::new();
    for c in text.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
    line
}
