use rn2483::config::device::{ConfigError, Credentials, DriverConfig};
use rn2483::device::{CommandError, DriverState, InitError, Rn2483};
use rn2483::hal::traits::NoWatchdog;
use rn2483::join::{Failure, JoinError};
use rn2483::protocol::response::ErrorCode;
use rn2483::uplink::{TxError, TxOutcome};

mod mock;
use mock::{CountingWatchdog, MockDelay, MockReset, Reply, ScriptedChannel};

type TestDriver<W = NoWatchdog> = Rn2483<ScriptedChannel, MockReset, MockDelay, W>;

/// Replies consumed by `init`: the post-reset banner and one readiness poll
const INIT: [Reply; 2] = [
    Reply::Line("RN2483 1.0.5 Mar 24 2021 14:54:11"),
    Reply::Line("0004A30B001A55ED"),
];

/// Replies for a complete, accepted join sequence
const JOIN_OK: [Reply; 12] = [
    Reply::Line("0004A30B001A55ED"),
    Reply::Line("ok"), // mac reset
    Reply::Line("ok"), // mac set deveui
    Reply::Line("ok"), // mac set pwridx
    Reply::Line("ok"), // mac set dr
    Reply::Line("ok"), // mac set adr
    Reply::Line("ok"), // mac set ar
    Reply::Line("ok"), // mac set appeui
    Reply::Line("ok"), // mac set appkey
    Reply::Line("ok"), // mac save
    Reply::Line("ok"), // mac join otaa
    Reply::Line("accepted"),
];

fn test_credentials() -> Credentials {
    Credentials::from_hex("0123456789abcdef", "0123456789abcdef0123456789abcdef").unwrap()
}

/// Driver that has been constructed but not initialized
fn raw_driver(script: &[Reply]) -> TestDriver {
    let channel = ScriptedChannel::new(script);
    Rn2483::new(
        channel,
        MockReset,
        MockDelay,
        test_credentials(),
        DriverConfig::default(),
    )
    .unwrap()
}

/// Driver that has been reset and polled ready; `script` covers what follows
fn ready_driver(script: &[Reply]) -> TestDriver {
    let mut replies = INIT.to_vec();
    replies.extend_from_slice(script);
    let mut driver = raw_driver(&replies);
    driver.init().unwrap();
    driver
}

/// Driver that has joined; `script` covers what follows
fn joined_driver(script: &[Reply]) -> TestDriver {
    let mut replies = JOIN_OK.to_vec();
    replies.extend_from_slice(script);
    let mut driver = ready_driver(&replies);
    driver.initialize_otaa().unwrap();
    driver
}

#[test]
fn test_init_brings_the_module_up() {
    let driver = ready_driver(&[]);
    assert_eq!(driver.state(), DriverState::Configured);
    assert_eq!(driver.channel().writes, vec!["sys get hweui\r\n"]);
}

#[test]
fn test_init_retries_while_the_module_garbles_commands() {
    let mut driver = raw_driver(&[
        Reply::Line("RN2483 1.0.5 Mar 24 2021 14:54:11"),
        Reply::Line("invalid_param"),
        Reply::Line("0004A30B001A55ED"),
    ]);
    driver.init().unwrap();
    assert_eq!(driver.state(), DriverState::Configured);
    assert_eq!(driver.channel().writes.len(), 2);
}

#[test]
fn test_init_gives_up_on_a_silent_module() {
    let mut driver = raw_driver(&[]);
    assert_eq!(driver.init(), Err(InitError::NotResponding));
    assert_eq!(driver.state(), DriverState::Uninitialized);
}

#[test]
fn test_operations_require_init() {
    let mut driver = raw_driver(&[]);
    assert!(matches!(
        driver.initialize_otaa(),
        Err(JoinError::NotInitialized)
    ));
    assert!(matches!(driver.send(b"x"), Err(TxError::NotJoined)));
    assert!(matches!(
        driver.firmware_version(),
        Err(CommandError::NotInitialized)
    ));
    assert!(driver.channel().writes.is_empty());
}

#[test]
fn test_join_accepted() {
    let mut driver = ready_driver(&JOIN_OK);
    driver.initialize_otaa().unwrap();
    assert_eq!(driver.state(), DriverState::Joined);

    let expected = vec![
        "sys get hweui\r\n", // init readiness poll
        "sys get hweui\r\n",
        "mac reset 868\r\n",
        "mac set deveui 0004A30B001A55ED\r\n",
        "mac set pwridx 1\r\n",
        "mac set dr 5\r\n",
        "mac set adr off\r\n",
        "mac set ar off\r\n",
        "mac set appeui 0123456789abcdef\r\n",
        "mac set appkey 0123456789abcdef0123456789abcdef\r\n",
        "mac save\r\n",
        "mac join otaa\r\n",
    ];
    assert_eq!(driver.channel().writes, expected);
}

#[test]
fn test_join_denied() {
    let mut script = JOIN_OK[..11].to_vec();
    script.push(Reply::Line("denied"));
    let mut driver = ready_driver(&script);

    assert_eq!(driver.initialize_otaa(), Err(JoinError::JoinDenied));
    assert_eq!(driver.state(), DriverState::JoinFailed);
}

#[test]
fn test_join_timeout_waiting_for_the_verdict() {
    let mut script = JOIN_OK[..11].to_vec();
    script.push(Reply::Timeout);
    let mut driver = ready_driver(&script);

    assert_eq!(driver.initialize_otaa(), Err(JoinError::JoinTimeout));
    assert_eq!(driver.state(), DriverState::JoinFailed);
}

#[test]
fn test_join_configuration_rejected() {
    // mac reset answers invalid_param
    let mut driver = ready_driver(&[
        Reply::Line("0004A30B001A55ED"),
        Reply::Line("invalid_param"),
    ]);

    assert_eq!(
        driver.initialize_otaa(),
        Err(JoinError::ConfigurationRejected(Failure::Module(
            ErrorCode::InvalidParam
        )))
    );
    assert_eq!(driver.state(), DriverState::JoinFailed);
    // Nothing past the rejected command went out
    assert_eq!(driver.channel().writes.last().unwrap(), "mac reset 868\r\n");
}

#[test]
fn test_join_credentials_rejected() {
    let mut script = JOIN_OK[..7].to_vec();
    script.push(Reply::Line("invalid_param")); // mac set appeui
    let mut driver = ready_driver(&script);

    assert_eq!(
        driver.initialize_otaa(),
        Err(JoinError::CredentialsRejected(Failure::Module(
            ErrorCode::InvalidParam
        )))
    );
    assert_eq!(driver.state(), DriverState::JoinFailed);
}

#[test]
fn test_join_rejected_by_a_busy_module() {
    let mut script = JOIN_OK[..10].to_vec();
    script.push(Reply::Line("busy")); // mac join otaa
    let mut driver = ready_driver(&script);

    assert_eq!(
        driver.initialize_otaa(),
        Err(JoinError::JoinRejected(ErrorCode::Busy))
    );
    assert_eq!(driver.state(), DriverState::JoinFailed);
}

#[test]
fn test_unknown_join_verdict_is_surfaced() {
    let mut script = JOIN_OK[..11].to_vec();
    script.push(Reply::Line("something_new"));
    let mut driver = ready_driver(&script);

    assert!(matches!(
        driver.initialize_otaa(),
        Err(JoinError::Unrecognized(text)) if text.as_str() == "something_new"
    ));
}

#[test]
fn test_rejoin_after_denial_restarts_the_full_sequence() {
    let mut script = JOIN_OK[..11].to_vec();
    script.push(Reply::Line("denied"));
    script.extend_from_slice(&JOIN_OK);
    let mut driver = ready_driver(&script);

    assert_eq!(driver.initialize_otaa(), Err(JoinError::JoinDenied));
    driver.initialize_otaa().unwrap();
    assert_eq!(driver.state(), DriverState::Joined);

    // The configuration and credential commands were sent again, not skipped
    let count = |text: &str| {
        driver
            .channel()
            .writes
            .iter()
            .filter(|w| w.as_str() == text)
            .count()
    };
    assert_eq!(count("mac reset 868\r\n"), 2);
    assert_eq!(count("mac set appkey 0123456789abcdef0123456789abcdef\r\n"), 2);
    assert_eq!(count("mac join otaa\r\n"), 2);
}

#[test]
fn test_join_io_fault_is_fatal_to_the_attempt_only() {
    let mut driver = ready_driver(&[Reply::Fault]);
    assert!(matches!(driver.initialize_otaa(), Err(JoinError::Io(_))));
    assert_eq!(driver.state(), DriverState::JoinFailed);
}

#[test]
fn test_send_requires_join_and_performs_no_io() {
    let mut driver = ready_driver(&[]);
    let writes_before = driver.channel().writes.len();

    assert!(matches!(driver.send(b"hello"), Err(TxError::NotJoined)));
    assert_eq!(driver.channel().writes.len(), writes_before);
    assert_eq!(driver.state(), DriverState::Configured);
}

#[test]
fn test_send_unconfirmed_uplink() {
    let mut driver = joined_driver(&[Reply::Line("ok"), Reply::Line("mac_tx_ok")]);

    assert_eq!(driver.send(b"PeterMaffay"), Ok(TxOutcome::Sent));
    assert_eq!(driver.state(), DriverState::Joined);
    assert_eq!(
        driver.channel().writes.last().unwrap(),
        "mac tx uncnf 1 50657465724d6166666179\r\n"
    );
}

#[test]
fn test_send_confirmed_uplink_on_port() {
    let mut driver = joined_driver(&[Reply::Line("ok"), Reply::Line("mac_tx_ok")]);

    assert_eq!(driver.send_data(12, &[0x01], true), Ok(TxOutcome::Sent));
    assert_eq!(driver.channel().writes.last().unwrap(), "mac tx cnf 12 01\r\n");
}

#[test]
fn test_send_surfaces_the_downlink() {
    let mut driver = joined_driver(&[
        Reply::Line("ok"),
        Reply::Line("mac_tx_ok 1 48656c6c6f"),
    ]);

    match driver.send(b"ping").unwrap() {
        TxOutcome::Downlink(data) => assert_eq!(data.as_str(), "1 48656c6c6f"),
        other => panic!("expected a downlink, got {:?}", other),
    }
}

#[test]
fn test_payload_size_boundary() {
    let mut driver = joined_driver(&[Reply::Line("ok"), Reply::Line("mac_tx_ok")]);
    let writes_before = driver.channel().writes.len();

    // One byte over the bound is rejected before any I/O
    let oversized = [0u8; 52];
    assert!(matches!(
        driver.send(&oversized),
        Err(TxError::PayloadTooLarge)
    ));
    assert_eq!(driver.channel().writes.len(), writes_before);
    assert_eq!(driver.state(), DriverState::Joined);

    // The full 51 bytes go through
    let maximal = [0xA5u8; 51];
    assert_eq!(driver.send(&maximal), Ok(TxOutcome::Sent));
    let wire = driver.channel().writes.last().unwrap();
    assert_eq!(wire.len(), "mac tx uncnf 1 \r\n".len() + 102);
}

#[test]
fn test_busy_answers_below_the_ceiling_are_retried() {
    let mut driver = joined_driver(&[
        Reply::Line("busy"),
        Reply::Line("no_free_ch"),
        Reply::Line("ok"),
        Reply::Line("mac_tx_ok"),
    ]);

    assert_eq!(driver.send(b"x"), Ok(TxOutcome::Sent));
    let tx_writes = driver
        .channel()
        .writes
        .iter()
        .filter(|w| w.starts_with("mac tx"))
        .count();
    assert_eq!(tx_writes, 3);
}

#[test]
fn test_busy_answers_at_the_ceiling_exhaust_the_attempt() {
    // Three busy answers hit the default ceiling even though a fourth
    // attempt would have gone through
    let mut driver = joined_driver(&[
        Reply::Line("busy"),
        Reply::Line("busy"),
        Reply::Line("busy"),
        Reply::Line("ok"),
        Reply::Line("mac_tx_ok"),
    ]);

    assert!(matches!(driver.send(b"x"), Err(TxError::ChannelBusy)));
    assert_eq!(driver.state(), DriverState::Joined);
    let tx_writes = driver
        .channel()
        .writes
        .iter()
        .filter(|w| w.starts_with("mac tx"))
        .count();
    assert_eq!(tx_writes, 3);
}

#[test]
fn test_tx_fail_leaves_the_session_intact() {
    let mut driver = joined_driver(&[Reply::Line("ok"), Reply::Line("mac_tx_fail")]);

    assert!(matches!(driver.send(b"x"), Err(TxError::TxFailed)));
    assert_eq!(driver.state(), DriverState::Joined);
}

#[test]
fn test_tx_timeout_leaves_the_session_intact() {
    let mut driver = joined_driver(&[Reply::Line("ok"), Reply::Timeout]);

    assert!(matches!(driver.send(b"x"), Err(TxError::TxTimeout)));
    assert_eq!(driver.state(), DriverState::Joined);
}

#[test]
fn test_module_reported_not_joined_drops_the_session() {
    let mut driver = joined_driver(&[Reply::Line("not_joined")]);

    assert!(matches!(driver.send(b"x"), Err(TxError::NotJoined)));
    assert_eq!(driver.state(), DriverState::JoinFailed);

    // Follow-up sends are rejected without I/O again
    let writes_before = driver.channel().writes.len();
    assert!(matches!(driver.send(b"x"), Err(TxError::NotJoined)));
    assert_eq!(driver.channel().writes.len(), writes_before);
}

#[test]
fn test_tx_io_fault_propagates() {
    let mut driver = joined_driver(&[Reply::Fault]);
    assert_eq!(driver.send(b"x"), Err(TxError::Io(mock::ScriptFault)));
    assert_eq!(driver.state(), DriverState::Joined);
}

#[test]
fn test_watchdog_is_refreshed_through_the_join() {
    let mut replies = INIT.to_vec();
    replies.extend_from_slice(&JOIN_OK);
    let channel = ScriptedChannel::new(&replies);
    let (watchdog, feeds) = CountingWatchdog::new();
    let mut driver: TestDriver<CountingWatchdog> = Rn2483::with_watchdog(
        channel,
        MockReset,
        MockDelay,
        test_credentials(),
        DriverConfig::default(),
        watchdog,
    )
    .unwrap();

    driver.init().unwrap();
    let after_init = feeds.get();
    assert!(after_init > 0);

    driver.initialize_otaa().unwrap();
    // One refresh per command round trip plus one for the verdict wait
    assert!(feeds.get() >= after_init + 12);
}

#[test]
fn test_firmware_version_query() {
    let mut driver = ready_driver(&[Reply::Line("RN2483 1.0.5 Mar 24 2021 14:54:11")]);
    let version = driver.firmware_version().unwrap();
    assert_eq!(version.as_str(), "RN2483 1.0.5 Mar 24 2021 14:54:11");
    assert_eq!(driver.channel().writes.last().unwrap(), "sys get ver\r\n");
}

#[test]
fn test_sleep_is_write_only_and_validated() {
    let mut driver = ready_driver(&[]);

    assert!(matches!(driver.sleep(99), Err(CommandError::InvalidValue)));

    driver.sleep(2_000).unwrap();
    assert_eq!(driver.channel().writes.last().unwrap(), "sys sleep 2000\r\n");
}

#[test]
fn test_setters_validate_before_any_io() {
    let mut driver = ready_driver(&[]);
    let writes_before = driver.channel().writes.len();

    assert!(matches!(
        driver.set_power_index(6),
        Err(CommandError::InvalidValue)
    ));
    assert!(matches!(
        driver.set_data_rate(8),
        Err(CommandError::InvalidValue)
    ));
    assert!(matches!(
        driver.set_radio_power(2),
        Err(CommandError::InvalidValue)
    ));
    assert!(matches!(
        driver.set_radio_power(16),
        Err(CommandError::InvalidValue)
    ));
    assert_eq!(driver.channel().writes.len(), writes_before);
}

#[test]
fn test_setters_issue_their_commands() {
    let mut driver = ready_driver(&[
        Reply::Line("ok"),
        Reply::Line("ok"),
        Reply::Line("ok"),
        Reply::Line("ok"),
    ]);

    driver.set_data_rate(4).unwrap();
    driver.set_adaptive_data_rate(true).unwrap();
    driver.set_radio_power(5).unwrap();
    driver.save_settings().unwrap();

    let writes = &driver.channel().writes;
    let n = writes.len();
    assert_eq!(writes[n - 4], "mac set dr 4\r\n");
    assert_eq!(writes[n - 3], "mac set adr on\r\n");
    assert_eq!(writes[n - 2], "radio set pwr 5\r\n");
    assert_eq!(writes[n - 1], "mac save\r\n");
}

#[test]
fn test_blank_lines_before_the_response_are_discarded() {
    let mut driver = ready_driver(&[Reply::Line(""), Reply::Line(""), Reply::Line("ok")]);
    driver.set_data_rate(4).unwrap();
}

#[test]
fn test_endless_blank_lines_become_a_timeout() {
    let blanks = [Reply::Line(""); 8];
    let mut driver = ready_driver(&blanks);
    assert!(matches!(
        driver.set_data_rate(4),
        Err(CommandError::Timeout)
    ));
}

#[test]
fn test_setter_rejection_is_surfaced() {
    let mut driver = ready_driver(&[Reply::Line("invalid_param")]);
    assert!(matches!(
        driver.set_data_rate(4),
        Err(CommandError::Rejected(ErrorCode::InvalidParam))
    ));
}

#[test]
fn test_configured_values_are_used_by_the_next_join() {
    // Lower the data rate, then re-join: the sequence must carry it
    let mut replies = vec![Reply::Line("ok")]; // mac set dr
    replies.extend_from_slice(&JOIN_OK);
    let mut driver = ready_driver(&replies);

    driver.set_data_rate(0).unwrap();
    driver.initialize_otaa().unwrap();
    assert!(driver
        .channel()
        .writes
        .iter()
        .any(|w| w == "mac set dr 0\r\n"));
}

#[test]
fn test_credentials_are_validated_at_construction() {
    assert_eq!(
        Credentials::from_hex("0123", "0123456789abcdef0123456789abcdef"),
        Err(ConfigError::InvalidAppEui)
    );
    assert_eq!(
        Credentials::from_hex("0123456789abcdeg", "0123456789abcdef0123456789abcdef"),
        Err(ConfigError::InvalidAppEui)
    );
    assert_eq!(
        Credentials::from_hex("0123456789abcdef", "0123"),
        Err(ConfigError::InvalidAppKey)
    );
    assert!(Credentials::from_hex(
        "0123456789ABCDEF",
        "0123456789ABCDEF0123456789ABCDEF"
    )
    .is_ok());
}

#[test]
fn test_driver_config_is_validated_at_construction() {
    let mut config = DriverConfig::default();
    config.port = 0;
    let result = Rn2483::new(
        ScriptedChannel::new(&[]),
        MockReset,
        MockDelay,
        test_credentials(),
        config,
    );
    assert!(matches!(result, Err(ConfigError::PortOutOfRange)));

    let mut config = DriverConfig::default();
    config.data_rate = 8;
    let result = Rn2483::new(
        ScriptedChannel::new(&[]),
        MockReset,
        MockDelay,
        test_credentials(),
        config,
    );
    assert!(matches!(result, Err(ConfigError::DataRateOutOfRange)));
}
