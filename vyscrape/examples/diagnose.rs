//! Connectivity diagnostics for a router.
//!
//! Resolves the host name, then opens and closes an SSH shell without
//! sending any command, reporting each step separately.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example diagnose -- fw1.example.net vyos
//! ```

use std::env;

use vyscrape::transport::resolve;
use vyscrape::{ConnectParams, ErrorKind, ScraperBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let Some(host) = args.next() else {
        eprintln!("usage: diagnose <host> [user] [password]");
        std::process::exit(2);
    };
    let mut params = ConnectParams::new(host);
    if let Some(user) = args.next() {
        params = params.user(user);
    }
    if let Some(password) = args.next() {
        params = params.secret(password);
    }

    println!("--- Diagnostics for {} ---", params.target());

    println!("[1] Resolving '{}'...", params.host());
    match resolve(params.host(), params.port).await {
        Ok(addrs) => println!("    SUCCESS: resolved to {:?}", addrs),
        Err(e) => {
            println!("    FAILURE: {}", e);
            std::process::exit(1);
        }
    }

    println!("[2] Opening SSH shell as '{}'...", params.user);
    let scraper = ScraperBuilder::new().build()?;
    match scraper.probe(&params).await {
        Ok(_) => println!("    SUCCESS: shell opened and closed"),
        Err(e) if e.kind() == ErrorKind::Authentication => {
            println!("    FAILURE: credentials rejected: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            println!("    FAILURE ({:?}): {}", e.kind(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
