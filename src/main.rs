//! embercache - A Networked In-Memory LRU Cache
//!
//! Server entry point: parses the command line, wires up logging and signal
//! handling, and runs the accept loop on the main thread until stopped.

use embercache::server::{CacheServer, DEFAULT_PORT};
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration.
struct Config {
    /// Port to listen on.
    port: u16,
    /// Number of worker threads.
    threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            threads: num_cpus::get(),
        }
    }
}

impl Config {
    /// Parses configuration from command-line arguments.
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--threads" | "-t" => {
                    if i + 1 < args.len() {
                        config.threads = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid thread count");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --threads requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("embercache version {}", embercache::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }
}

fn print_help() {
    println!(
        r#"
embercache - A Networked In-Memory LRU Cache

USAGE:
    embercache [OPTIONS]

OPTIONS:
    -p, --port <PORT>       Port to listen on (default: {DEFAULT_PORT})
    -t, --threads <N>       Number of worker threads (default: CPU cores)
    -v, --version           Print version information
        --help              Print this help message

EXAMPLES:
    embercache                      # Listen on 0.0.0.0:{DEFAULT_PORT}
    embercache --port 9090          # Listen on port 9090
    embercache --threads 8          # Use 8 worker threads

CONNECTING:
    Use embercache-cli (or netcat) to talk to the server:
    $ embercache-cli
    > SET name ada
    OK
    > GET name
    OK ada
"#
    );
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let server = Arc::new(CacheServer::new(config.port, config.threads));

    // Ctrl+C / SIGTERM trigger a cooperative stop; start() then returns.
    {
        let server = Arc::clone(&server);
        ctrlc::set_handler(move || {
            info!("shutdown signal received, stopping server...");
            server.stop();
        })?;
    }

    info!(
        port = config.port,
        threads = config.threads,
        "starting embercache server"
    );

    if let Err(e) = server.start() {
        error!(error = %e, "failed to start server");
        std::process::exit(1);
    }

    info!("server shutdown complete");
    Ok(())
}
