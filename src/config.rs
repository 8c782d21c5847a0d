//! Connection configuration for a Livestatus endpoint.
//!
//! A [`ConnectionConfig`] is validated once, at construction. A value that
//! exists is always usable; a misconfigured endpoint never reaches the
//! socket layer.
use std::{
    fmt,
    fs::OpenOptions,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;

/// List of possible errors raised while validating connection options.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a socket path must be supplied for a unix endpoint")]
    MissingPath,

    #[error("the socket path '{0}' is not accessible to this process")]
    InaccessiblePath(String),

    #[error("a socket address must be supplied for a tcp endpoint")]
    MissingAddress,

    #[error("a non-zero socket port must be supplied for a tcp endpoint")]
    MissingPort,
}

/// Where the Livestatus daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// UNIX domain stream socket at a filesystem path.
    Unix { path: PathBuf },
    /// TCP stream socket.
    Tcp { host: String, port: u16 },
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix { path } => write!(f, "unix:{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

/// Send/receive timeout pair applied to the socket after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    pub read: Duration,
    pub write: Duration,
}

/// Validated options for reaching a Livestatus daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    endpoint: Endpoint,
    timeout: Option<Timeout>,
}

impl ConnectionConfig {
    /// Configuration for a daemon behind a UNIX domain socket.
    ///
    /// The path must name an existing socket that this process may read
    /// and write.
    pub fn unix(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }
        check_access(&path)?;

        Ok(Self {
            endpoint: Endpoint::Unix { path },
            timeout: None,
        })
    }

    /// Configuration for a daemon behind a TCP socket.
    pub fn tcp(host: impl Into<String>, port: u16) -> Result<Self, ConfigError> {
        let host = host.into();
        if host.is_empty() {
            return Err(ConfigError::MissingAddress);
        }
        if port == 0 {
            return Err(ConfigError::MissingPort);
        }

        Ok(Self {
            endpoint: Endpoint::Tcp { host, port },
            timeout: None,
        })
    }

    /// Apply a send/receive timeout pair to every connection.
    pub fn with_timeout(mut self, read: Duration, write: Duration) -> Self {
        self.timeout = Some(Timeout { read, write });
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn timeout(&self) -> Option<Timeout> {
        self.timeout
    }
}

// Opening a socket file with `open(2)` fails with ENXIO even when the
// permission bits allow access; only a missing file or a permission error
// means the daemon socket cannot be used.
fn check_access(path: &Path) -> Result<(), ConfigError> {
    match OpenOptions::new().read(true).write(true).open(path) {
        Ok(_) => Ok(()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            Err(ConfigError::InaccessiblePath(path.display().to_string()))
        }
        Err(_) => Ok(()),
    }
}
