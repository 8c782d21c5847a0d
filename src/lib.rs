pub mod config;
pub mod protocol;
pub mod query;

pub use config::{ConfigError, ConnectionConfig, Endpoint, Timeout};
pub use protocol::{ClientError, LivestatusClient, ResultSet};
pub use query::{Query, QueryError};
