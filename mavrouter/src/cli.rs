//! Command-line surface, exactly the flag table in spec §6.

use std::time::Duration;

use clap::Parser;

/// Link together MAVLink endpoints over a single learned, routed bus.
#[derive(Parser, Debug)]
#[command(name = "mavrouter", version, about, long_about = None)]
pub struct Cli {
    /// Endpoints to link together, each `kind:args` (serial, udps, udpc, udpb, tcps, tcpc, tlog).
    #[arg(value_name = "ENDPOINT")]
    pub endpoints: Vec<String>,

    /// Suppress info-level log messages.
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Log every routed frame in human-readable form.
    #[arg(long = "print")]
    pub print: bool,

    /// Log each parse error individually instead of an aggregated count every 5 seconds.
    #[arg(long = "print-errors")]
    pub print_errors: bool,

    /// How long a single read may block before the channel is considered stalled.
    #[arg(long = "read-timeout", default_value = "10s", value_parser = parse_duration)]
    pub read_timeout: Duration,

    /// How long a single write may block before the channel is considered stalled.
    #[arg(long = "write-timeout", default_value = "10s", value_parser = parse_duration)]
    pub write_timeout: Duration,

    /// How long a channel may go without producing a frame before it is torn down.
    #[arg(long = "idle-timeout", default_value = "60s", value_parser = parse_duration)]
    pub idle_timeout: Duration,

    /// Disable this router's own heartbeat emission.
    #[arg(long = "hb-disable")]
    pub hb_disable: bool,

    /// MAVLink protocol version to stamp on emitted heartbeats.
    #[arg(long = "hb-version", default_value = "1", value_parser = ["1", "2"])]
    pub hb_version: String,

    /// System ID to stamp on emitted heartbeats and originated traffic (stream requests).
    ///
    /// It is recommended to set a different system ID for each router in a network.
    #[arg(long = "hb-systemid", default_value_t = 125)]
    pub hb_systemid: u8,

    /// Component ID to stamp on emitted heartbeats and originated traffic.
    #[arg(long = "hb-componentid", default_value_t = 191)]
    pub hb_componentid: u8,

    /// Period, in seconds, between emitted heartbeats.
    #[arg(long = "hb-period", default_value_t = 5)]
    pub hb_period: u64,

    /// Do not request telemetry streams from ArduPilot peers.
    ///
    /// Requesting streams is usually delegated to the router, to avoid conflicts when
    /// multiple ground stations are connected at once.
    #[arg(long = "streamreq-disable")]
    pub streamreq_disable: bool,

    /// Stream rate, in Hz, to request from ArduPilot peers.
    #[arg(long = "streamreq-frequency", default_value_t = 4)]
    pub streamreq_frequency: u16,

    /// Persist routed traffic to rotating tlog segments.
    #[arg(long = "dump")]
    pub dump: bool,

    /// Path template for dump segments. The file name portion is a Go reference-time
    /// layout (e.g. `2006-01-02_15-04-05`), rendered through the start-of-segment time.
    #[arg(long = "dump-path", default_value = "dump/2006-01-02_15-04-05.tlog")]
    pub dump_path: String,

    /// Wall-clock duration of each dump segment before it is rotated.
    #[arg(long = "dump-duration", default_value = "1h", value_parser = parse_duration)]
    pub dump_duration: Duration,
}

/// Parses a duration of the form `<number><unit>`, `unit` one of `s`, `m`, `h`.
///
/// A bare number (no unit) is interpreted as seconds, matching the CLI examples in spec §6
/// (`--hb-period=5`).
fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (digits, unit) = match raw.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration {raw:?}"))?;

    let seconds = match unit {
        "" | "s" => value,
        "m" => value * 60,
        "h" => value * 3600,
        other => return Err(format!("unknown duration unit {other:?} in {raw:?}")),
    };

    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_seconds() {
        assert_eq!(parse_duration("10").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn parses_suffixed_units() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10x").is_err());
    }
}
