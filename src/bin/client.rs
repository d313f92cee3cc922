//! Tunnel client binary.
//!
//! Usage: qtun-client [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>  Path to JSON configuration file
//!   -l, --local <ADDR>   Local listen address
//!   -r, --remote <ADDR>  Remote server address
//!   -p, --password <PW>  Shared password
//!   -h, --help           Print help information

use std::env;

use qtun::client::{Client, ClientConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing — respects RUST_LOG env var (e.g. RUST_LOG=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut config = ClientConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-c" | "--config" => {
                let path = require_value(&mut args, "--config")?;
                let content = std::fs::read_to_string(&path)?;
                config = serde_json::from_str(&content)?;
            }
            "-l" | "--local" => config.local = require_value(&mut args, "--local")?,
            "-r" | "--remote" => config.remote = require_value(&mut args, "--remote")?,
            "-p" | "--password" => config.password = require_value(&mut args, "--password")?,
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                return Ok(());
            }
        }
    }

    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("local address : {}", config.local);
    tracing::info!("remote server : {}", config.remote);

    let client = Client::new(config);
    client.run().await?;
    Ok(())
}

fn require_value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
}

fn print_usage() {
    println!(
        r#"qtun-client - local end of the obfuscated tunnel

USAGE:
    qtun-client [OPTIONS]

OPTIONS:
    -c, --config <FILE>   Path to JSON configuration file
    -l, --local <ADDR>    Local listen address (default 0.0.0.0:2080)
    -r, --remote <ADDR>   Remote server address (default 127.0.0.1:1443)
    -p, --password <PW>   Shared password (default 12345678)
    -h, --help            Print help information

CONFIGURATION FILE FORMAT (JSON):
    {{
        "local": "0.0.0.0:2080",
        "remote": "server.example.com:1443",
        "password": "12345678"
    }}

EXAMPLES:
    Run with flags:
        qtun-client --remote server.example.com:1443 --password s3cret

    Run from a config file:
        qtun-client --config client.json
"#
    );
}
