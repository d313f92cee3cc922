//! Tunnel server binary.
//!
//! Usage: qtun-server [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>   Path to TOML configuration file
//!   -l, --listen <ADDR>   Listen address
//!   -g, --gateway <EP>    Upstream gateway endpoint
//!   -p, --password <PW>   Obfuscation password
//!   --generate            Print a default configuration file
//!   -h, --help            Print help information

use std::env;

use qtun::server::{Server, ServerConfig};

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

    let mut config = ServerConfig::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "--generate" => {
                generate_config()?;
                return Ok(());
            }
            "-c" | "--config" => {
                let path = require_value(&mut args, "--config")?;
                let content = std::fs::read_to_string(&path)?;
                config = toml::from_str(&content)?;
            }
            "-l" | "--listen" => config.listen = require_value(&mut args, "--listen")?,
            "-g" | "--gateway" => config.gateway = Some(require_value(&mut args, "--gateway")?),
            "-p" | "--password" => config.password = Some(require_value(&mut args, "--password")?),
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                return Ok(());
            }
        }
    }

    config.validate()?;

    let server = Server::new(config)?;
    server.run().await?;
    Ok(())
}

fn require_value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
}

fn generate_config() -> anyhow::Result<()> {
    let config = ServerConfig {
        password: Some("change-me".to_string()),
        ..ServerConfig::default()
    };

    println!("# qtun server configuration");
    println!("#");
    println!("# gateway accepts none://, socks4://, socks5:// (alias socks://)");
    println!("# and http:// endpoints; omit it to connect directly.");
    println!();
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn print_usage() {
    println!(
        r#"qtun-server - remote end of the obfuscated tunnel

USAGE:
    qtun-server [OPTIONS]

OPTIONS:
    -c, --config <FILE>   Path to TOML configuration file
    -l, --listen <ADDR>   Listen address (default 0.0.0.0:1443)
    -g, --gateway <EP>    Upstream gateway endpoint, e.g. socks5://10.0.0.1:1080
    -p, --password <PW>   Obfuscation password; omit to accept plain proxy clients
    --generate            Print a default configuration file
    -h, --help            Print help information

EXAMPLES:
    Generate a configuration:
        qtun-server --generate > server.toml

    Run the server:
        qtun-server --config server.toml

    Obfuscated listener chaining through an upstream proxy:
        qtun-server --password s3cret --gateway socks5://10.0.0.1:1080
"#
    );
}
