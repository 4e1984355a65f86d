//! Configuration-time errors: everything that should fail fast at startup.

/// Something wrong with the command line or the configuration it describes.
///
/// Every variant here is a spec §7 "Configuration error": reported to stderr and the
/// process exits `1` before any endpoint is opened.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No endpoints were given on the command line.
    #[error("at least one endpoint must be specified")]
    NoEndpoints,

    /// An endpoint argument didn't match `kind:args`.
    #[error("invalid endpoint spec {spec:?}: {reason}")]
    InvalidEndpoint { spec: String, reason: String },

    /// An endpoint kind isn't one of the recognized ones.
    #[error("unknown endpoint kind {kind:?} in {spec:?}")]
    UnknownEndpointKind { spec: String, kind: String },

    /// A network address failed to parse.
    #[error("invalid address in {spec:?}: {source}")]
    InvalidAddress {
        spec: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A baud rate failed to parse as an integer.
    #[error("invalid baud rate in {spec:?}: {source}")]
    InvalidBaudRate {
        spec: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// `--dump` was requested but `--dump-path`'s time template used a reference-layout
    /// token this implementation doesn't translate.
    #[error("invalid --dump-path template {template:?}: {reason}")]
    InvalidDumpTemplate { template: String, reason: String },
}
