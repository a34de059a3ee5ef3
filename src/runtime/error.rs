// ABOUTME: Backend connection errors with SNAFU pattern.
// ABOUTME: Distinguishes unreachable sockets from engines that do not answer.

use snafu::Snafu;

/// Failure to establish a working connection to the backend under test.
///
/// Connection failures are setup errors: the run aborts before any scenario
/// executes.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("cannot open engine socket {path}: {source}"))]
    Socket {
        path: String,
        source: bollard::errors::Error,
    },

    #[snafu(display("engine at {path} did not answer a ping: {source}"))]
    Ping {
        path: String,
        source: bollard::errors::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    /// The socket could not be opened at all.
    SocketUnreachable,
    /// The socket opened but the engine did not respond.
    NotResponding,
}

impl ConnectError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ConnectErrorKind {
        match self {
            ConnectError::Socket { .. } => ConnectErrorKind::SocketUnreachable,
            ConnectError::Ping { .. } => ConnectErrorKind::NotResponding,
        }
    }

    /// The socket path the connection was attempted against.
    pub fn socket_path(&self) -> &str {
        match self {
            ConnectError::Socket { path, .. } | ConnectError::Ping { path, .. } => path,
        }
    }
}
