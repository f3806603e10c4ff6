//! candump log parsing
//!
//! Reads lines of the form `(1436509052.249713) can0 340#0011223344556677`,
//! optionally followed by `T` (frame the application wants to send) or `R`
//! (received frame, the default).
//!
//! The format only carries CAN frames, so replayed traces never exercise the
//! LIN transmit gate; its counters in the report stay at zero.

use can_safety_core::Message;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Errors raised while reading a trace file
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether a trace line was received or is an outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Rx,
    Tx,
}

/// One frame of a recorded trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
    pub message: Message,
}

/// Read and parse a whole trace file
pub fn load_trace(path: &Path) -> Result<Vec<TraceRecord>, TraceError> {
    let content = fs::read_to_string(path)?;
    let records = parse_trace(&content)?;
    log::info!("Loaded {} frames from {:?}", records.len(), path);
    Ok(records)
}

/// Parse trace text; blank lines and `#` comments are skipped
pub fn parse_trace(content: &str) -> Result<Vec<TraceRecord>, TraceError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| {
            parse_line(line.trim()).map_err(|reason| TraceError::Malformed {
                line: idx + 1,
                reason,
            })
        })
        .collect()
}

fn parse_line(line: &str) -> Result<TraceRecord, String> {
    let mut fields = line.split_whitespace();

    let timestamp = fields
        .next()
        .ok_or("missing timestamp")
        .and_then(|ts| parse_timestamp(ts).ok_or("invalid timestamp"))?;
    let bus = fields
        .next()
        .ok_or("missing interface")
        .and_then(|iface| parse_interface(iface).ok_or("interface must look like canN"))?;
    let frame = fields.next().ok_or("missing frame")?;
    let direction = match fields.next() {
        None | Some("R") => Direction::Rx,
        Some("T") => Direction::Tx,
        Some(other) => return Err(format!("unknown direction '{}'", other)),
    };
    if let Some(extra) = fields.next() {
        return Err(format!("unexpected trailing field '{}'", extra));
    }

    let (id, data) = frame
        .split_once('#')
        .ok_or_else(|| format!("frame '{}' has no '#'", frame))?;
    let address = parse_hex(id)
        .and_then(|id| u32::from_str_radix(id, 16).ok())
        .ok_or_else(|| format!("invalid CAN ID '{}'", id))?;
    if address > 0x1FFF_FFFF {
        return Err(format!("CAN ID 0x{:X} exceeds 29 bits", address));
    }

    Ok(TraceRecord {
        timestamp,
        direction,
        message: Message::new(bus, address, parse_data(data)?),
    })
}

fn parse_timestamp(field: &str) -> Option<DateTime<Utc>> {
    let inner = field.strip_prefix('(')?.strip_suffix(')')?;
    let (secs, frac) = inner.split_once('.').unwrap_or((inner, "0"));
    let secs: i64 = secs.parse().ok()?;
    if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let nanos: u32 = format!("{:0<9}", frac).parse().ok()?;
    DateTime::from_timestamp(secs, nanos)
}

fn parse_interface(field: &str) -> Option<u8> {
    field
        .strip_prefix("vcan")
        .or_else(|| field.strip_prefix("can"))?
        .parse()
        .ok()
}

/// `from_str_radix` tolerates a leading sign; candump fields never carry one
fn parse_hex(field: &str) -> Option<&str> {
    (!field.is_empty() && field.bytes().all(|b| b.is_ascii_hexdigit())).then_some(field)
}

fn parse_data(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err(format!("odd-length data '{}'", hex));
    }
    if hex.len() > 128 {
        return Err("payload longer than 64 bytes".to_string());
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(parse_hex)
                .and_then(|byte| u8::from_str_radix(byte, 16).ok())
                .ok_or_else(|| format!("invalid data '{}'", hex))
        })
        .collect()
}
