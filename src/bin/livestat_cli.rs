use clap::Parser;
use std::{error::Error, path::PathBuf, time::Duration};

use livestat::{ConnectionConfig, LivestatusClient, Query, ResultSet};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Table to query, e.g. hosts or services
    table: String,
    /// Path to the daemon's UNIX socket
    #[arg(long, conflicts_with_all = ["address", "port"])]
    socket: Option<PathBuf>,
    /// Daemon TCP address
    #[arg(long, requires = "port")]
    address: Option<String>,
    /// Daemon TCP port
    #[arg(long)]
    port: Option<u16>,
    /// Column to request; repeat for more
    #[arg(short, long)]
    column: Vec<String>,
    /// Filter expression; repeat for more
    #[arg(short, long)]
    filter: Vec<String>,
    /// Cap the number of result rows
    #[arg(short, long)]
    limit: Option<usize>,
    /// Send/receive timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,
    /// Pair every value with its column name
    #[arg(long)]
    assoc: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize env_logger; For logging to STDOUT/STDERR
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match (&cli.socket, &cli.address, cli.port) {
        (Some(path), _, _) => ConnectionConfig::unix(path)?,
        (None, Some(address), Some(port)) => ConnectionConfig::tcp(address.clone(), port)?,
        _ => return Err("either --socket or --address and --port must be supplied".into()),
    };
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs), Duration::from_secs(secs));
    }

    let mut query = Query::get(cli.table).columns(cli.column);
    for filter in cli.filter {
        query = query.filter(filter);
    }
    if let Some(limit) = cli.limit {
        query = query.limit(limit);
    }

    let mut client = LivestatusClient::new(config);
    let result = if cli.assoc {
        client.execute_assoc(&query)?
    } else {
        client.execute(&query)?
    };

    match result {
        ResultSet::Rows(rows) => {
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        ResultSet::AssocRows(rows) => {
            for row in rows {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        ResultSet::Raw(body) => print!("{body}"),
    }

    Ok(())
}
