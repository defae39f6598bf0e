//! # vyscrape
//!
//! Async SSH scraper that retrieves a VyOS router's running configuration
//! and normalizes it into one stable schema.
//!
//! The router has no machine-readable RPC for this, so vyscrape drives an
//! interactive shell: it discards the login banner, asks for the running
//! configuration rendered as JSON, collects output until the device goes
//! quiet, and digs the JSON out of the surrounding prompts and echoes.
//!
//! ## Features
//!
//! - Async SSH connections via russh, password or key authentication
//! - Bounded-wait collection: idle threshold plus a hard overall budget
//! - Terminal escape stripping as output arrives
//! - Shape-based detection of legacy (1.3) and current (1.4+) config formats
//! - A shared, atomically replaced configuration store with section queries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vyscrape::{ConfigStore, ConnectParams, Retriever, ScraperBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vyscrape::Error> {
//!     let store = Arc::new(ConfigStore::new());
//!     let retriever = Retriever::new(ScraperBuilder::new().build()?, store.clone());
//!
//!     let params = ConnectParams::new("192.168.1.1")
//!         .user("vyos")
//!         .secret("vyos");
//!     let config = retriever.fetch(&params).await?;
//!
//!     println!("rule sets: {:?}", config.firewall_rulesets());
//!     println!("address group: {}", store.firewall_group("address", "servers"));
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod retrieval;
pub mod schema;
pub mod scraper;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use error::{Error, ErrorKind, ErrorReport};
pub use retrieval::{ConfigStore, Retriever};
pub use schema::{SchemaVersion, UnifiedConfig, normalize};
pub use scraper::{ScrapeConfig, Scraper, ScraperBuilder, SessionState, Transcript};
pub use transport::{ConnectParams, Connector, ShellChannel, SshConnector};
