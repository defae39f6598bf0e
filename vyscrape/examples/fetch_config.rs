//! Fetch a router's running configuration and print a summary.
//!
//! Connects over SSH, dumps the configuration as JSON, normalizes it and
//! prints the firewall rule sets. With `--file`, loads a saved JSON dump
//! instead of connecting.
//!
//! # Usage
//!
//! With password authentication:
//! ```bash
//! cargo run --example fetch_config -- --host 192.168.1.1 --password vyos
//! ```
//!
//! With SSH key authentication:
//! ```bash
//! cargo run --example fetch_config -- --host fw1.example.net --key ~/.ssh/id_ed25519
//! ```
//!
//! From a saved dump:
//! ```bash
//! cargo run --example fetch_config -- --file config.json --section nat
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use vyscrape::{ConfigStore, ConnectParams, Retriever, ScraperBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let scraper = ScraperBuilder::new()
        .connect_timeout(Duration::from_secs(args.connect_timeout))
        .overall_timeout(Duration::from_secs(args.overall_timeout))
        .build()?;
    let store = Arc::new(ConfigStore::new());
    let retriever = Retriever::new(scraper, store.clone());

    let result = match &args.file {
        Some(path) => {
            let contents = std::fs::read(path)?;
            retriever.load_file(Some(contents.as_slice()))
        }
        None => {
            let mut params = ConnectParams::new(&args.host)
                .port(args.port)
                .user(&args.user);
            if let Some(password) = &args.password {
                params = params.secret(password);
            }
            if let Some(key) = &args.key {
                params = params.key_path(key);
            }

            println!("Fetching configuration from {}...", params.target());
            retriever.fetch(&params).await
        }
    };

    if let Err(e) = result {
        let report = e.report();
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(1);
    }

    println!("\nFirewall rule sets");
    println!("{}", "-".repeat(50));
    for name in store.firewall_rulesets() {
        let ruleset = store.firewall_ruleset(&name);
        let rules = ruleset["rule"].as_object().map(|r| r.len()).unwrap_or(0);
        println!(
            "{:<24} default-action={:<8} rules={}",
            name,
            ruleset["default-action"].as_str().unwrap_or("-"),
            rules
        );
    }

    if let Some(section) = &args.section {
        println!("\n[{}]", section);
        println!("{}", serde_json::to_string_pretty(&store.section(section))?);
    }

    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    file: Option<PathBuf>,
    section: Option<String>,
    connect_timeout: u64,
    overall_timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut parsed = Self {
            host: String::new(),
            port: vyscrape::transport::DEFAULT_PORT,
            user: vyscrape::transport::DEFAULT_USER.to_string(),
            password: None,
            key: None,
            file: None,
            section: None,
            connect_timeout: 5,
            overall_timeout: 30,
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1).cloned();
            match args[i].as_str() {
                "--host" | "-h" => parsed.host = value.unwrap_or_default(),
                "--port" | "-p" => {
                    parsed.port = value.and_then(|v| v.parse().ok()).unwrap_or(22);
                }
                "--user" | "-u" => {
                    if let Some(user) = value {
                        parsed.user = user;
                    }
                }
                "--password" | "-P" => parsed.password = value,
                "--key" | "-k" => parsed.key = value.map(PathBuf::from),
                "--file" | "-f" => parsed.file = value.map(PathBuf::from),
                "--section" | "-s" => parsed.section = value,
                "--connect-timeout" => {
                    parsed.connect_timeout = value.and_then(|v| v.parse().ok()).unwrap_or(5);
                }
                "--timeout" | "-t" => {
                    parsed.overall_timeout = value.and_then(|v| v.parse().ok()).unwrap_or(30);
                }
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    i += 1;
                    continue;
                }
            }
            i += 2;
        }

        parsed
    }

    fn print_help() {
        println!(
            r#"vyscrape fetch_config example

USAGE:
    cargo run --example fetch_config -- [OPTIONS]

OPTIONS:
    -h, --host <HOST>          Router to connect to
    -p, --port <PORT>          SSH port [default: 22]
    -u, --user <USER>          Username [default: vyos]
    -P, --password <PASS>      Password (key authentication when omitted)
    -k, --key <PATH>           Private key instead of ~/.ssh defaults
    -f, --file <PATH>          Load a saved JSON dump instead of connecting
    -s, --section <NAME>       Also print this top-level section
        --connect-timeout <S>  Connect timeout in seconds [default: 5]
    -t, --timeout <SECS>       Overall collection budget [default: 30]
    --help                     Print this help message
"#
        );
    }
}
