//! Endpoint spec parsing (`kind:args`) and construction of the corresponding
//! [`mavrouter_core::io::Endpoint`].

use std::net::SocketAddr;
use std::path::PathBuf;

use mavrouter_core::io::{
    ChannelTimeouts, Connector, Endpoint, Retry, SerialPort, TcpClient, TcpServer, TlogFile,
    UdpBroadcast, UdpClient, UdpServer,
};
use mavrouter_core::io::{ConnectionDetails, ConnectionInfo};

use crate::error::ConfigError;

/// One `kind:args` endpoint argument, parsed but not yet turned into a running [`Endpoint`].
#[derive(Clone, Debug)]
pub enum EndpointSpec {
    /// `serial:<device>:<baud>`
    Serial { path: String, baud_rate: u32 },
    /// `udps:<ip:port>`
    UdpServer { bind_addr: SocketAddr },
    /// `udpc:<ip:port>`
    UdpClient { remote_addr: SocketAddr },
    /// `udpb:<ip:port>`
    UdpBroadcast { broadcast_addr: SocketAddr },
    /// `tcps:<ip:port>`
    TcpServer { bind_addr: SocketAddr },
    /// `tcpc:<ip:port>`
    TcpClient { remote_addr: SocketAddr },
    /// `tlog:<path>`
    Tlog { path: PathBuf },
}

/// Parses one positional CLI argument of the form `kind:args`.
pub fn parse_spec(raw: &str) -> Result<EndpointSpec, ConfigError> {
    let (kind, args) = raw.split_once(':').ok_or_else(|| ConfigError::InvalidEndpoint {
        spec: raw.to_string(),
        reason: "expected `kind:args`".to_string(),
    })?;

    match kind {
        "serial" => {
            let (path, baud) = args.rsplit_once(':').ok_or_else(|| ConfigError::InvalidEndpoint {
                spec: raw.to_string(),
                reason: "expected `serial:<device>:<baud>`".to_string(),
            })?;
            let baud_rate = baud
                .parse()
                .map_err(|source| ConfigError::InvalidBaudRate {
                    spec: raw.to_string(),
                    source,
                })?;
            Ok(EndpointSpec::Serial {
                path: path.to_string(),
                baud_rate,
            })
        }
        "udps" => Ok(EndpointSpec::UdpServer {
            bind_addr: parse_addr(raw, args)?,
        }),
        "udpc" => Ok(EndpointSpec::UdpClient {
            remote_addr: parse_addr(raw, args)?,
        }),
        "udpb" => Ok(EndpointSpec::UdpBroadcast {
            broadcast_addr: parse_addr(raw, args)?,
        }),
        "tcps" => Ok(EndpointSpec::TcpServer {
            bind_addr: parse_addr(raw, args)?,
        }),
        "tcpc" => Ok(EndpointSpec::TcpClient {
            remote_addr: parse_addr(raw, args)?,
        }),
        "tlog" => Ok(EndpointSpec::Tlog {
            path: PathBuf::from(args),
        }),
        other => Err(ConfigError::UnknownEndpointKind {
            spec: raw.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn parse_addr(raw: &str, args: &str) -> Result<SocketAddr, ConfigError> {
    args.parse().map_err(|source| ConfigError::InvalidAddress {
        spec: raw.to_string(),
        source,
    })
}

/// Builds a running [`Endpoint`] from a parsed spec, wiring up the right [`Connector`],
/// [`Retry`] policy and static description.
///
/// Connector-style endpoints (serial, TCP/UDP client, UDP broadcast) retry indefinitely on
/// disconnect per spec §4.1; acceptor-style endpoints (TCP/UDP server) and the one-shot tlog
/// sink never retry — a server socket that fails to bind is a fatal startup error, not a
/// transient one, and a dead tlog file can't meaningfully be reopened.
pub fn build(spec: &EndpointSpec, timeouts: ChannelTimeouts) -> Endpoint {
    match spec {
        EndpointSpec::Serial { path, baud_rate } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::Serial {
                path: path.clone(),
                baud_rate: *baud_rate,
            }),
            Box::new(SerialPort::new(path.clone(), *baud_rate)) as Box<dyn Connector>,
            Retry::default(),
            timeouts,
        ),
        EndpointSpec::UdpServer { bind_addr } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::UdpServer {
                bind_addr: *bind_addr,
            }),
            Box::new(UdpServer::new(*bind_addr)),
            Retry::Never,
            timeouts,
        ),
        EndpointSpec::UdpClient { remote_addr } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::UdpClient {
                remote_addr: *remote_addr,
            }),
            Box::new(UdpClient::new(*remote_addr)),
            Retry::default(),
            timeouts,
        ),
        EndpointSpec::UdpBroadcast { broadcast_addr } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::UdpBroadcast {
                broadcast_addr: *broadcast_addr,
            }),
            Box::new(UdpBroadcast::new(*broadcast_addr)),
            Retry::default(),
            timeouts,
        ),
        EndpointSpec::TcpServer { bind_addr } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::TcpServer {
                bind_addr: *bind_addr,
            }),
            Box::new(TcpServer::new(*bind_addr)),
            Retry::Never,
            timeouts,
        ),
        EndpointSpec::TcpClient { remote_addr } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::TcpClient {
                remote_addr: *remote_addr,
            }),
            Box::new(TcpClient::new(*remote_addr)),
            Retry::default(),
            timeouts,
        ),
        EndpointSpec::Tlog { path } => Endpoint::new(
            ConnectionInfo::new(ConnectionDetails::TlogFile { path: path.clone() }),
            Box::new(TlogFile::new(path.clone())),
            Retry::Never,
            timeouts,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serial() {
        let spec = parse_spec("serial:/dev/ttyUSB0:57600").unwrap();
        assert!(matches!(
            spec,
            EndpointSpec::Serial { baud_rate: 57600, .. }
        ));
    }

    #[test]
    fn parses_tcp_server() {
        let spec = parse_spec("tcps:0.0.0.0:6666").unwrap();
        match spec {
            EndpointSpec::TcpServer { bind_addr } => {
                assert_eq!(bind_addr, "0.0.0.0:6666".parse().unwrap())
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(matches!(
            parse_spec("quic:127.0.0.1:1234"),
            Err(ConfigError::UnknownEndpointKind { .. })
        ));
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(matches!(
            parse_spec("tcps"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn parses_tlog_path() {
        let spec = parse_spec("tlog:/var/log/mav.tlog").unwrap();
        match spec {
            EndpointSpec::Tlog { path } => assert_eq!(path, PathBuf::from("/var/log/mav.tlog")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
