//! couchcache - command line client for the bounded cache facade
//!
//! Connects to the backend once, runs a single operation, and closes the session.

use std::io::{Read, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use couchcache::{CacheFacade, Config};

#[derive(Parser)]
#[command(name = "couchcache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Command,
}

/// Connection flags. Unset flags keep the value from `Config::from_env`.
#[derive(Args)]
struct ConnectionArgs {
    /// Host name (defaults to localhost)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Port number (defaults to 8091; Couchbase data nodes listen on 11210)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Bucket name (defaults to couchcache)
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Bucket password (defaults to password)
    #[arg(long = "pass", global = true)]
    password: Option<String>,
}

impl ConnectionArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(bucket) = self.bucket {
            config.bucket = bucket;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print the value stored under a key
    Get { key: String },

    /// Store a value, read from stdin when omitted
    Set {
        key: String,
        value: Option<String>,
        /// Expiry in seconds, clamped to 30 days; 0 never expires
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        ttl: i64,
    },

    /// Delete a key
    Delete { key: String },

    /// Append to an existing value, read from stdin when omitted
    Append { key: String, value: Option<String> },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "couchcache=debug"
    } else {
        "couchcache=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.connection.apply(Config::from_env());
    let facade = CacheFacade::from_config(&config)
        .await
        .with_context(|| format!("could not open bucket '{}'", config.bucket))?;

    let found = run(&facade, cli.command).await;
    facade.close();
    info!("Session closed");

    Ok(if found? {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Runs one command. Returns false when `get` found nothing.
async fn run(facade: &CacheFacade, command: Command) -> Result<bool> {
    match command {
        Command::Get { key } => match facade.get(&key).await {
            Some(value) => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&value)?;
                stdout.flush()?;
                Ok(true)
            }
            None => {
                info!("'{}' not found", key);
                Ok(false)
            }
        },
        Command::Set { key, value, ttl } => {
            let value = value_or_stdin(value)?;
            facade
                .set(&key, value, ttl)
                .await
                .with_context(|| format!("set '{}' failed", key))?;
            Ok(true)
        }
        Command::Delete { key } => {
            facade
                .delete(&key)
                .await
                .with_context(|| format!("delete '{}' failed", key))?;
            Ok(true)
        }
        Command::Append { key, value } => {
            let value = value_or_stdin(value)?;
            facade
                .append(&key, value)
                .await
                .with_context(|| format!("append '{}' failed", key))?;
            Ok(true)
        }
    }
}

fn value_or_stdin(value: Option<String>) -> Result<Bytes> {
    match value {
        Some(value) => Ok(Bytes::from(value)),
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read value from stdin")?;
            Ok(Bytes::from(buf))
        }
    }
}
