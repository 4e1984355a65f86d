//! A single, immutable configuration value assembled once at startup and threaded through
//! every constructor — no process-global state beyond the cancellation token and the logger.

use std::path::PathBuf;
use std::time::Duration;

use mavrouter_core::io::ChannelTimeouts;
use mavrouter_core::protocol::{ComponentId, SystemId};

use crate::cli::Cli;
use crate::endpoints::{self, EndpointSpec};
use crate::error::ConfigError;
use crate::timefmt;

/// MAVLink protocol version to stamp on frames this router originates (heartbeats, stream
/// requests).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HbVersion {
    V1,
    V2,
}

/// Resolved `--hb-*` flags.
#[derive(Clone, Debug)]
pub struct HeartbeatConfig {
    pub disabled: bool,
    pub version: HbVersion,
    pub system_id: SystemId,
    pub component_id: ComponentId,
    pub period: Duration,
}

/// Resolved `--streamreq-*` flags.
#[derive(Copy, Clone, Debug)]
pub struct StreamRequestConfig {
    pub disabled: bool,
    pub frequency_hz: u16,
}

/// Resolved `--dump*` flags, present only when `--dump` was given.
#[derive(Clone, Debug)]
pub struct DumpConfig {
    /// Directory portion of `--dump-path`, unchanged.
    pub dir: PathBuf,
    /// `chrono` format string translated from the Go reference-time layout in the file-name
    /// portion of `--dump-path`.
    pub file_name_format: String,
    pub duration: Duration,
}

/// Everything the rest of the program needs, resolved once from [`Cli`].
#[derive(Clone, Debug)]
pub struct Config {
    pub endpoints: Vec<EndpointSpec>,
    pub quiet: bool,
    pub print: bool,
    pub print_errors: bool,
    pub timeouts: ChannelTimeouts,
    pub heartbeat: HeartbeatConfig,
    pub stream_request: StreamRequestConfig,
    pub dump: Option<DumpConfig>,
}

impl Config {
    /// Validates and resolves a parsed [`Cli`] into a [`Config`].
    pub fn from_cli(cli: Cli) -> Result<Config, ConfigError> {
        if cli.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let endpoints = cli
            .endpoints
            .iter()
            .map(|raw| endpoints::parse_spec(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let heartbeat = HeartbeatConfig {
            disabled: cli.hb_disable,
            version: match cli.hb_version.as_str() {
                "2" => HbVersion::V2,
                _ => HbVersion::V1,
            },
            system_id: cli.hb_systemid,
            component_id: cli.hb_componentid,
            period: Duration::from_secs(cli.hb_period),
        };

        let stream_request = StreamRequestConfig {
            disabled: cli.streamreq_disable,
            frequency_hz: cli.streamreq_frequency,
        };

        let dump = if cli.dump {
            Some(parse_dump_path(&cli.dump_path, cli.dump_duration)?)
        } else {
            None
        };

        Ok(Config {
            endpoints,
            quiet: cli.quiet,
            print: cli.print,
            print_errors: cli.print_errors,
            timeouts: ChannelTimeouts {
                read: cli.read_timeout,
                write: cli.write_timeout,
                idle: cli.idle_timeout,
            },
            heartbeat,
            stream_request,
            dump,
        })
    }
}

fn parse_dump_path(dump_path: &str, duration: Duration) -> Result<DumpConfig, ConfigError> {
    let path = PathBuf::from(dump_path);
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    let file_name = path.file_name().ok_or_else(|| ConfigError::InvalidDumpTemplate {
        template: dump_path.to_string(),
        reason: "missing file name".to_string(),
    })?;
    let file_name = file_name.to_string_lossy();

    Ok(DumpConfig {
        dir,
        file_name_format: timefmt::translate(&file_name),
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["mavrouter"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn rejects_zero_endpoints() {
        let err = Config::from_cli(cli(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::NoEndpoints));
    }

    #[test]
    fn resolves_dump_path_template() {
        let config = Config::from_cli(cli(&[
            "tcps:0.0.0.0:6666",
            "--dump",
            "--dump-path=dump/2006-01-02_15-04-05.tlog",
        ]))
        .unwrap();
        let dump = config.dump.unwrap();
        assert_eq!(dump.dir, PathBuf::from("dump"));
        assert_eq!(dump.file_name_format, "%Y-%m-%d_%H-%M-%S.tlog");
    }

    #[test]
    fn defaults_match_spec() {
        let config = Config::from_cli(cli(&["tcps:0.0.0.0:6666"])).unwrap();
        assert_eq!(config.timeouts.read, Duration::from_secs(10));
        assert_eq!(config.timeouts.write, Duration::from_secs(10));
        assert_eq!(config.timeouts.idle, Duration::from_secs(60));
        assert_eq!(config.heartbeat.system_id, 125);
        assert_eq!(config.heartbeat.component_id, 191);
        assert_eq!(config.heartbeat.period, Duration::from_secs(5));
        assert_eq!(config.stream_request.frequency_hz, 4);
        assert!(config.dump.is_none());
    }
}
