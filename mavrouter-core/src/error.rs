//! Crate-wide error type.

use std::sync::Arc;

pub use mavio::error::{FrameError, SpecError};

/// Convenience alias for results returned by this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by the channel/endpoint I/O engine.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed.
    ///
    /// Wrapped in an [`Arc`] since [`std::io::Error`] is not [`Clone`] and events carrying
    /// this error may be cloned onto multiple subscribers.
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),

    /// A MAVLink frame could not be parsed off the wire.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A MAVLink message could not be encoded or decoded against its dialect.
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),

    /// The channel's outgoing queue was closed while a frame was still in flight.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Something went wrong that doesn't fit the other variants.
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<mavio::error::Error> for Error {
    fn from(err: mavio::error::Error) -> Self {
        match err {
            mavio::error::Error::Io(err) => Error::Io(Arc::new(err)),
            mavio::error::Error::Frame(err) => Error::Frame(err),
            mavio::error::Error::Spec(err) => Error::Spec(err),
            other => Error::Other(other.to_string()),
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for Error {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        Error::ChannelClosed(err.to_string())
    }
}

#[cfg(feature = "serial")]
impl From<tokio_serial::Error> for Error {
    fn from(err: tokio_serial::Error) -> Self {
        Error::from(std::io::Error::from(err))
    }
}
