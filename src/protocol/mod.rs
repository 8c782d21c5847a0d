//! Livestatus wire protocol.
//!
//! This module defines the client side of the MK Livestatus query protocol,
//! including request framing, response decoding, and the connection
//! lifecycle. It provides the types and logic required to send a rendered
//! query to a monitoring daemon and interpret what comes back.
//!
//! # Overview
//!
//! Livestatus is a line-based, table-oriented request/response protocol
//! spoken over a UNIX domain socket or a TCP socket. A request is ASCII
//! text, one directive per line, terminated by a blank line. Every response
//! is preceded by a fixed-length preamble (the "fixed16" header) so the
//! client always knows exactly how many bytes to read.
//!
//! # Key Components
//!
//! - [`LivestatusClient`]: Owns the socket and drives the request/response
//!   cycle for queries and external commands.
//! - [`ProtocolTransport`]: Abstraction over a bidirectional stream used to
//!   write requests and read framed responses.
//! - [`ResultSet`]: Decoded query results, positional or associative.
//!
//! # Wire Format
//!
//! Responses are framed with a 16-byte header:
//!
//! - Bytes 0..3 carry a 3-digit decimal status code; `200` means success,
//!   anything else carries an error description in the body.
//! - Bytes 4..15 carry the body length as a whitespace-padded decimal.
//! - Byte 15 is a terminating newline.
//!
//! The body follows, exactly as many bytes as the header declared. For the
//! json output format it is a JSON array of row arrays.
//!
//! # Connection Lifecycle
//!
//! Connections are opened lazily on the first request and dropped at the
//! end of every completed cycle, modelling one request per connection.
//! Opening an already-open client is a no-op; an unrecoverable I/O error
//! leaves the socket to be cleared by an explicit reset.
//!
//! # See Also
//!
//! - [`query`](crate::query): Builder producing the request text this
//!   module transmits.
mod client;
mod response;
mod transport;

pub use client::{ClientError, LivestatusClient};
pub use response::{DecodeError, ResponseEnvelope, ResultSet};
pub use transport::{ProtocolTransport, TransportError};
