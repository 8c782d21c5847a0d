use std::{
    io::{self, Read, Write},
    net::TcpStream,
    os::unix::net::UnixStream,
    time::{SystemTime, UNIX_EPOCH},
};

use log::{debug, trace};
use thiserror::Error;

use crate::{
    config::{ConnectionConfig, Endpoint, Timeout},
    query::{Query, QueryError},
};

use super::{
    response::{self, DecodeError, ResponseEnvelope, ResultSet},
    transport::{ProtocolTransport, TransportError},
};

/// List of possible errors raised while running a request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unable to connect to {endpoint}: {source}")]
    Connection { endpoint: String, source: io::Error },

    #[error("failed to build request: {0}")]
    Query(#[from] QueryError),

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("error response from livestatus ({status}): {detail}")]
    Protocol { status: u16, detail: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),
}

/// Live connection to the daemon, one of the two configured socket families.
#[derive(Debug)]
enum Stream {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl Stream {
    fn connect(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let endpoint = config.endpoint();
        let failed = |source| ClientError::Connection {
            endpoint: endpoint.to_string(),
            source,
        };

        let stream = match endpoint {
            Endpoint::Unix { path } => Stream::Unix(UnixStream::connect(path).map_err(failed)?),
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).map_err(failed)?;
                stream.set_nodelay(true).map_err(failed)?;
                Stream::Tcp(stream)
            }
        };

        if let Some(timeout) = config.timeout() {
            stream.set_timeouts(timeout).map_err(failed)?;
        }

        Ok(stream)
    }

    fn set_timeouts(&self, timeout: Timeout) -> io::Result<()> {
        match self {
            Stream::Unix(s) => {
                s.set_read_timeout(Some(timeout.read))?;
                s.set_write_timeout(Some(timeout.write))
            }
            Stream::Tcp(s) => {
                s.set_read_timeout(Some(timeout.read))?;
                s.set_write_timeout(Some(timeout.write))
            }
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Unix(s) => s.read(buf),
            Stream::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Unix(s) => s.write(buf),
            Stream::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Unix(s) => s.flush(),
            Stream::Tcp(s) => s.flush(),
        }
    }
}

/// Blocking client for one Livestatus daemon.
///
/// The client owns at most one live connection, opened lazily and dropped
/// at the end of every completed cycle. It is not designed for concurrent
/// use; give each thread its own instance.
#[derive(Debug)]
pub struct LivestatusClient {
    config: ConnectionConfig,
    stream: Option<Stream>,
}

impl LivestatusClient {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Run a query and return its decoded rows.
    pub fn execute(&mut self, query: &Query) -> Result<ResultSet, ClientError> {
        let request = query.render()?;
        let envelope = self.run(&request)?;
        let result = envelope.decode(query.format())?;

        self.close();
        Ok(result)
    }

    /// Run a query and pair every row value with its column name.
    ///
    /// Column names come from the explicit projection when one was set;
    /// otherwise the first response row is consumed as the header row.
    pub fn execute_assoc(&mut self, query: &Query) -> Result<ResultSet, ClientError> {
        let request = query.render()?;
        let envelope = self.run(&request)?;
        let result = match envelope.decode(query.format())? {
            ResultSet::Rows(rows) => {
                ResultSet::AssocRows(response::associate(rows, query.explicit_columns())?)
            }
            other => other,
        };

        self.close();
        Ok(result)
    }

    /// Run a caller-supplied raw request through the framed cycle.
    pub fn execute_raw(&mut self, request: &str) -> Result<ResultSet, ClientError> {
        self.execute(&Query::raw(request))
    }

    /// Send an external command.
    ///
    /// Fire-and-forget; the daemon does not reply to commands.
    pub fn command<I, S>(&mut self, parts: I) -> Result<(), ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let line = format_command(parts, now);

        let stream = self.open()?;
        let mut transport = ProtocolTransport::new(stream);
        transport.write_request(&line)?;

        self.close();
        Ok(())
    }

    /// Drop any live connection. Idempotent.
    pub fn reset(&mut self) {
        self.close();
    }

    fn run(&mut self, request: &str) -> Result<ResponseEnvelope, ClientError> {
        let stream = self.open()?;
        let mut transport = ProtocolTransport::new(stream);

        trace!("sending request:\n{request}");
        transport.write_request(request)?;

        let envelope = transport.read_envelope()?;
        debug!(
            "response status {} ({} bytes)",
            envelope.status, envelope.length
        );

        // The daemon encodes the error description in the body for any
        // status other than 200.
        if envelope.status != 200 {
            return Err(ClientError::Protocol {
                status: envelope.status,
                detail: String::from_utf8_lossy(&envelope.body).into_owned(),
            });
        }

        Ok(envelope)
    }

    // Idempotent; an already-open connection is reused.
    fn open(&mut self) -> Result<&mut Stream, ClientError> {
        if self.stream.is_none() {
            debug!("connecting to {}", self.config.endpoint());
            self.stream = Some(Stream::connect(&self.config)?);
        }

        Ok(self.stream.as_mut().unwrap())
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            trace!("connection closed");
        }
    }
}

fn format_command<I, S>(parts: I, timestamp: u64) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts = parts
        .into_iter()
        .map(|part| part.as_ref().to_string())
        .collect::<Vec<String>>();

    format!("COMMAND [{timestamp}] {}\n", parts.join(";"))
}
