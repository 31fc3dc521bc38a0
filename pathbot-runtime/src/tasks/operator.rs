//! Operator input and status output tasks
//!
//! The operator types a color name per line on a serial link; the robot
//! answers with one status line per [`StatusReport`].

use core::fmt::Write as _;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io_async::{Read, Write};
use heapless::{String, Vec};

use pathbot_core::color::{ColorId, ColorLabel, ColorProfile, ColorSet};
use pathbot_core::mission::StatusReport;
use pathbot_core::state::RobotState;

use crate::channels::RobotChannels;

/// Longest accepted input line
pub const MAX_LINE_LEN: usize = 32;

/// Buffer size for serial reads
const RX_BUF_SIZE: usize = 32;

/// Longest status line
const STATUS_LINE_LEN: usize = 64;

/// Splits a byte stream into lines
#[derive(Debug, Default)]
pub struct LineReader {
    line: Vec<u8, MAX_LINE_LEN>,
    overflow: bool,
}

impl LineReader {
    /// Create an empty reader
    pub const fn new() -> Self {
        Self {
            line: Vec::new(),
            overflow: false,
        }
    }

    /// Feed one byte, returning a line when it is complete
    ///
    /// Overlong lines and lines that are not UTF-8 are dropped.
    pub fn feed(&mut self, byte: u8) -> Option<String<MAX_LINE_LEN>> {
        if byte != b'\n' && byte != b'\r' {
            if self.line.push(byte).is_err() {
                self.overflow = true;
            }
            return None;
        }

        let overflow = core::mem::replace(&mut self.overflow, false);
        let bytes = core::mem::take(&mut self.line);
        if overflow {
            warn!("Operator line too long, dropped");
            return None;
        }
        if bytes.is_empty() {
            return None;
        }

        String::from_utf8(bytes).ok()
    }
}

/// Turn typed input into a profile label: trimmed, lower case, words joined by '-'
pub fn normalize(input: &str) -> Option<ColorLabel> {
    let mut label = ColorLabel::new();
    for c in input.trim().chars() {
        let c = match c {
            ' ' | '_' => '-',
            c => c.to_ascii_lowercase(),
        };
        label.push(c).ok()?;
    }
    Some(label)
}

/// Resolve typed input to one of the allowed destination colors
pub fn resolve(input: &str, profile: &ColorProfile, destinations: ColorSet) -> Option<ColorId> {
    normalize(input)
        .and_then(|label| profile.id(label.as_str()))
        .filter(|id| destinations.contains(*id))
}

/// Apply one operator line to the shared state
pub fn apply_line<M: RawMutex>(
    line: &str,
    profile: &ColorProfile,
    destinations: ColorSet,
    channels: &RobotChannels<M>,
    state: &RobotState,
) -> Option<ColorId> {
    match resolve(line, profile, destinations) {
        Some(id) => {
            info!("Destination set to color {}", id.index());
            state.set_desired_destination(id);
            Some(id)
        }
        None => {
            warn!("Operator input is not a destination color");
            channels.publish(StatusReport::UnknownColor);
            None
        }
    }
}

/// Operator input task - reads destination colors from a serial link
///
/// Only colors in `destinations` are accepted, see
/// [`MissionConfig::destinations`](pathbot_core::config::MissionConfig::destinations).
pub async fn operator_task<M: RawMutex, R: Read>(
    mut rx: R,
    profile: &ColorProfile,
    destinations: ColorSet,
    channels: &RobotChannels<M>,
    state: &RobotState,
) {
    info!("Operator input task started");

    let mut reader = LineReader::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("Operator RX: {} bytes", n);
                for &byte in &buf[..n] {
                    if let Some(line) = reader.feed(byte) {
                        apply_line(line.as_str(), profile, destinations, channels, state);
                    }
                }
            }
            Ok(_) => {}
            Err(_) => {
                warn!("Operator read error");
            }
        }
    }
}

/// Render a status report as one newline-terminated line
pub fn render(report: &StatusReport) -> String<STATUS_LINE_LEN> {
    let mut line = String::new();
    if writeln!(line, "{}", report).is_err() {
        // Truncated reports still end the line
        line.clear();
        let _ = line.push_str("?\n");
    }
    line
}

/// Status task - writes status reports to the operator link
pub async fn status_task<M: RawMutex, W: Write>(mut tx: W, channels: &RobotChannels<M>) {
    info!("Status task started");

    loop {
        let report = channels.status.receive().await;
        let line = render(&report);
        if tx.write_all(line.as_bytes()).await.is_err() {
            warn!("Status write failed, dropping report");
        }
    }
}
