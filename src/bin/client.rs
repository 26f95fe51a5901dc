//! embercache-cli - Interactive Cache Client
//!
//! A small line-protocol client for poking at a running embercache server.
//! With no trailing arguments it runs a REPL; with trailing arguments it
//! sends them as a single command and prints the response.
//!
//! ```text
//! $ embercache-cli --port 8080
//! connected to 127.0.0.1:8080
//! > SET name ada
//! OK
//! > GET name
//! OK ada
//! > quit
//! ```

use anyhow::Context;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

struct Config {
    host: String,
    port: u16,
    /// A one-shot command assembled from trailing arguments.
    command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            command: None,
        }
    }
}

impl Config {
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
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
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    // Everything from the first free argument on is the
                    // command to send.
                    config.command = Some(args[i..].join(" "));
                    break;
                }
            }
        }

        config
    }
}

fn print_help() {
    println!(
        r#"
embercache-cli - Interactive Cache Client

USAGE:
    embercache-cli [OPTIONS] [COMMAND...]

OPTIONS:
    -h, --host <HOST>    Server host (default: 127.0.0.1)
    -p, --port <PORT>    Server port (default: 8080)
        --help           Print this help message

COMMANDS:
    SET key value...     Store a value
    GET key              Read a value
    DELETE key           Remove a key
    CLEAR                Remove all entries
    STATS                Show server statistics

With no COMMAND, an interactive prompt is started. Type 'quit' to leave.
"#
    );
}

/// A connected client: writes command lines, reads response lines.
struct CacheClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl CacheClient {
    fn connect(host: &str, port: u16) -> anyhow::Result<Self> {
        let stream = TcpStream::connect((host, port))
            .with_context(|| format!("failed to connect to {host}:{port}"))?;
        let reader = BufReader::new(stream.try_clone().context("failed to clone stream")?);
        Ok(Self { stream, reader })
    }

    fn send_command(&mut self, command: &str) -> anyhow::Result<String> {
        self.stream.write_all(command.as_bytes())?;
        self.stream.write_all(b"\n")?;

        let mut response = String::new();
        let n = self.reader.read_line(&mut response)?;
        if n == 0 {
            anyhow::bail!("server closed the connection");
        }
        Ok(response.trim_end().to_string())
    }
}

fn repl(client: &mut CacheClient) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();

        match line {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            _ => println!("{}", client.send_command(line)?),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    let mut client = CacheClient::connect(&config.host, config.port)?;

    match config.command {
        Some(command) => {
            let response = client.send_command(&command)?;
            println!("{response}");
            if response.starts_with("ERROR") {
                std::process::exit(1);
            }
        }
        None => {
            println!("connected to {}:{}", config.host, config.port);
            repl(&mut client)?;
        }
    }

    Ok(())
}
