//! Report generation
//!
//! Writes replay results as aligned text or as JSON lines.

use crate::config::OutputFormat;
use crate::replay::{Decision, ReplayResult};
use crate::trace::Direction;
use anyhow::Result;
use std::io::Write;

/// Write one replay result in the requested format
pub fn write_report<W: Write>(
    out: &mut W,
    result: &ReplayResult,
    format: OutputFormat,
    only_blocked: bool,
) -> Result<()> {
    let decisions = result
        .decisions
        .iter()
        .filter(|decision| !only_blocked || decision.is_blocked());

    match format {
        OutputFormat::Txt => {
            writeln!(out, "═══════════════════════════════════════════════")?;
            writeln!(out, "  {}", result.source.display())?;
            writeln!(out, "═══════════════════════════════════════════════")?;
            for decision in decisions {
                writeln!(out, "{}", format_decision(decision))?;
            }
            write_summary(out, result)?;
        }
        OutputFormat::Json => {
            for decision in decisions {
                serde_json::to_writer(&mut *out, decision)?;
                writeln!(out)?;
            }
            serde_json::to_writer(
                &mut *out,
                &serde_json::json!({
                    "source": result.source,
                    "controls_allowed": result.controls_allowed,
                    "stats": result.stats,
                }),
            )?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn format_decision(decision: &Decision) -> String {
    let ts = decision.timestamp.timestamp() as f64
        + decision.timestamp.timestamp_subsec_nanos() as f64 / 1_000_000_000.0;
    let verdict = match (decision.direction, decision.allowed, decision.forward_to) {
        (Direction::Tx, true, _) => "TX allowed".to_string(),
        (Direction::Tx, false, _) => "TX BLOCKED".to_string(),
        (Direction::Rx, false, _) => "RX REJECTED".to_string(),
        (Direction::Rx, true, Some(bus)) => format!("RX fwd -> bus {}", bus),
        (Direction::Rx, true, None) => "RX no forward".to_string(),
    };
    format!(
        "{:>17.6}  bus {}  0x{:03X} [{}]  {:<16} fwd_en={} holdoff={}",
        ts,
        decision.bus,
        decision.address,
        decision.len,
        verdict,
        decision.forwarding_enabled,
        decision.holdoff
    )
}

fn write_summary<W: Write>(out: &mut W, result: &ReplayResult) -> Result<()> {
    let stats = &result.stats;
    writeln!(out, "\n=== SUMMARY ===")?;
    writeln!(out, "Frames replayed:  {}", result.decisions.len())?;
    writeln!(out, "controls_allowed: {}", result.controls_allowed)?;
    writeln!(out, "RX accepted/rejected: {}/{}", stats.rx_accepted, stats.rx_rejected)?;
    writeln!(out, "TX allowed/blocked:   {}/{}", stats.tx_allowed, stats.tx_blocked)?;
    writeln!(out, "LIN allowed/blocked:  {}/{}", stats.lin_allowed, stats.lin_blocked)?;
    writeln!(out, "Forwarded/dropped:    {}/{}", stats.forwarded, stats.dropped)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::replay;
    use crate::trace::parse_trace;
    use can_safety_core::SafetyConfig;
    use std::path::PathBuf;

    fn sample() -> ReplayResult {
        let records = parse_trace(
            "(2.5) can0 064#00\n(2.6) can0 340#00\n(2.7) can0 064#00 T\n",
        )
        .unwrap();
        replay(PathBuf::from("bench.log"), &records, SafetyConfig::new(), false)
    }

    #[test]
    fn test_txt_report() {
        let mut out = Vec::new();
        write_report(&mut out, &sample(), OutputFormat::Txt, false).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("bench.log"));
        assert!(text.contains("RX fwd -> bus 2"));
        assert!(text.contains("RX no forward"));
        assert!(text.contains("TX BLOCKED"));
        assert!(text.contains("Frames replayed:  3"));
        assert!(text.contains("TX allowed/blocked:   0/1"));
        // candump traces carry no LIN traffic
        assert!(text.contains("LIN allowed/blocked:  0/0"));
    }

    #[test]
    fn test_only_blocked_filter() {
        let mut out = Vec::new();
        write_report(&mut out, &sample(), OutputFormat::Txt, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("RX fwd -> bus 2"));
        assert!(text.contains("TX BLOCKED"));
    }

    #[test]
    fn test_json_report() {
        let mut out = Vec::new();
        write_report(&mut out, &sample(), OutputFormat::Json, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["direction"], "rx");
        assert_eq!(lines[0]["forward_to"], 2);
        assert_eq!(lines[1]["forward_to"], serde_json::Value::Null);
        assert_eq!(lines[2]["allowed"], false);
        assert_eq!(lines[3]["stats"]["tx_blocked"], 1);
        assert_eq!(lines[3]["stats"]["lin_allowed"], 0);
        assert_eq!(lines[3]["stats"]["lin_blocked"], 0);
        assert_eq!(lines[3]["controls_allowed"], false);
    }
}
