//! Scripted OTAA walkthrough
//!
//! Runs the full join and uplink sequence against an in-memory module that
//! answers the way real hardware does, and prints every wire exchange.
//! Useful for seeing the command flow without a serial adapter attached.
//!
//! Run with: `cargo run --example otaa --features std`

use std::collections::VecDeque;

use embedded_hal::blocking::delay::DelayMs;
use rn2483::config::device::{Credentials, DriverConfig};
use rn2483::device::Rn2483;
use rn2483::hal::traits::{ChannelError, ResetControl, SerialChannel};
use rn2483::protocol::Line;

/// In-memory module: answers reads from a script and echoes writes
struct ScriptedLink {
    replies: VecDeque<&'static str>,
    partial: String,
}

impl ScriptedLink {
    fn new(replies: &[&'static str]) -> Self {
        Self {
            replies: replies.iter().copied().collect(),
            partial: String::new(),
        }
    }
}

impl SerialChannel for ScriptedLink {
    type Error = std::convert::Infallible;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.partial.push_str(std::str::from_utf8(bytes).unwrap_or(""));
        while let Some(pos) = self.partial.find("\r\n") {
            let command: String = self.partial.drain(..pos + 2).collect();
            println!("-> {}", command.trim_end());
        }
        Ok(())
    }

    fn read_line(
        &mut self,
        _timeout_ms: u32,
        line: &mut Line,
    ) -> Result<(), ChannelError<Self::Error>> {
        line.clear();
        match self.replies.pop_front() {
            None => Err(ChannelError::TimedOut),
            Some(text) => {
                println!("<- {}", text);
                for c in text.chars() {
                    let _ = line.push(c);
                }
                Ok(())
            }
        }
    }
}

struct NoReset;

impl ResetControl for NoReset {
    type Error = std::convert::Infallible;

    fn pulse<D: DelayMs<u32>>(&mut self, _delay: &mut D) -> Result<(), Self::Error> {
        println!("-- reset pulse --");
        Ok(())
    }
}

struct HostDelay;

impl DelayMs<u32> for HostDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms).min(5)));
    }
}

fn main() {
    let link = ScriptedLink::new(&[
        // Bring-up
        "RN2483 1.0.5 Mar 24 2021 14:54:11",
        "0004A30B001A55ED",
        // Join sequence
        "0004A30B001A55ED",
        "ok", // mac reset
        "ok", // mac set deveui
        "ok", // mac set pwridx
        "ok", // mac set dr
        "ok", // mac set adr
        "ok", // mac set ar
        "ok", // mac set appeui
        "ok", // mac set appkey
        "ok", // mac save
        "ok", // mac join otaa
        "accepted",
        // Uplink: one busy answer, then through
        "busy",
        "ok",
        "mac_tx_ok",
    ]);

    let credentials = Credentials::from_hex(
        "0123456789abcdef",
        "0123456789abcdef0123456789abcdef",
    )
    .expect("credentials");

    let mut driver = Rn2483::new(link, NoReset, HostDelay, credentials, DriverConfig::default())
        .expect("config");

    driver.init().expect("init");
    println!("-- module ready: {:?} --", driver.state());

    driver.initialize_otaa().expect("join");
    println!("-- joined: {:?} --", driver.state());

    let outcome = driver.send(b"Hello, LoRaWAN!").expect("send");
    println!("-- uplink done: {:?} --", outcome);
}
