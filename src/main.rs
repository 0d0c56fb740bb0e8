use std::error::Error as StdError;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use tokio::io::AsyncRead;
use tokio::net::TcpListener;

use ringframe::config::{load_config, Config};
use ringframe::{framing, CircularBuffer, Error};

#[derive(Parser, Debug)]
#[command(name = "ringframe", version, about = "Decode length-delimited records through a fixed-size ring buffer")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Accept TCP connections and decode the records each peer sends
    Listen {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        capacity: Option<usize>,
        #[arg(long)]
        read_timeout_ms: Option<u64>,
    },
    /// Decode every record in a file
    Decode {
        path: PathBuf,
        #[arg(long)]
        capacity: Option<usize>,
    },
}

fn get_config_path() -> String {
    if let Ok(home) = std::env::var("HOME") {
        format!("{}/.config/ringframe/config.toml", home)
    } else {
        "/etc/ringframe/config.toml".to_string()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn StdError>> {
    // Initialize logging
    env_logger::init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(get_config_path);
    let mut cfg = load_config(&config_path)?;

    match cli.command {
        Command::Listen { addr, capacity, read_timeout_ms } => {
            if let Some(addr) = addr {
                cfg.listen.addr = addr;
            }
            if let Some(capacity) = capacity {
                cfg.buffer.capacity = capacity;
            }
            if let Some(ms) = read_timeout_ms {
                cfg.listen.read_timeout_ms = ms;
            }
            listen(cfg).await
        }
        Command::Decode { path, capacity } => {
            let capacity = capacity.unwrap_or(cfg.buffer.capacity);
            let (records, payload_bytes) = decode_file(&path, capacity)?;
            println!("{} records, {} payload bytes", records, payload_bytes);
            Ok(())
        }
    }
}

async fn listen(cfg: Config) -> Result<(), Box<dyn StdError>> {
    let listener = TcpListener::bind(&cfg.listen.addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    let read_timeout = match cfg.listen.read_timeout_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };

    loop {
        let (stream, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);
        let capacity = cfg.buffer.capacity;
        tokio::spawn(async move {
            match serve_connection(stream, capacity, read_timeout).await {
                Ok(records) => info!("{} closed after {} records", peer, records),
                Err(e) => error!("Connection {} dropped: {}", peer, e),
            }
        });
    }
}

/// Read `stream` to the end, decoding records as they complete.
async fn serve_connection<R>(
    mut stream: R,
    capacity: usize,
    read_timeout: Option<Duration>,
) -> Result<usize, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = CircularBuffer::new(capacity)?;
    let mut records = 0;

    loop {
        let read = match read_timeout {
            Some(limit) => match tokio::time::timeout(limit, buf.read_from_async(&mut stream)).await {
                Ok(res) => res,
                Err(_) => {
                    debug!("No data within {:?}, still waiting", limit);
                    continue;
                }
            },
            None => buf.read_from_async(&mut stream).await,
        };
        let n = read?;

        records += framing::drain_records(&mut buf, |payload| {
            debug!("Record with {} byte payload", payload.len());
        })?;

        if n == 0 {
            if !buf.is_empty() {
                warn!("Stream ended with {} bytes of an incomplete record", buf.used());
            }
            return Ok(records);
        }
    }
}

/// Stream a file through the buffer; returns (records, payload bytes).
fn decode_file(path: &Path, capacity: usize) -> Result<(usize, usize), Box<dyn StdError>> {
    let mut file = File::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let mut buf = CircularBuffer::new(capacity)?;
    let mut records = 0;
    let mut payload_bytes = 0;

    loop {
        let n = match buf.read_from(&mut file) {
            Ok(n) => n,
            Err(Error::Io(e)) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        records += framing::drain_records(&mut buf, |payload| payload_bytes += payload.len())?;

        if n == 0 {
            break;
        }
    }

    if !buf.is_empty() {
        return Err(format!(
            "{} ends with {} bytes of an incomplete record",
            path.display(),
            buf.used()
        )
        .into());
    }
    info!("Decoded {} records from {}", records, path.display());
    Ok((records, payload_bytes))
}
