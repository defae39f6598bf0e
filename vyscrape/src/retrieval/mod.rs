//! Retrieval orchestrator.
//!
//! Composes the pipeline the rest of the system calls: scrape the device,
//! decode the output, isolate and parse the JSON payload, normalize it and
//! publish the result to the [`ConfigStore`]. Uploaded documents skip the
//! session and extraction steps and go straight to normalization.
//!
//! Nothing is retried. A failure leaves the published configuration as it
//! was and is reported once.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vyscrape::{ConfigStore, ConnectParams, Retriever, ScraperBuilder};
//!
//! # async fn example() -> Result<(), vyscrape::Error> {
//! let store = Arc::new(ConfigStore::new());
//! let retriever = Retriever::new(ScraperBuilder::new().build()?, store.clone());
//!
//! retriever
//!     .fetch(&ConnectParams::new("192.168.1.1").secret("vyos"))
//!     .await?;
//!
//! for name in store.firewall_rulesets() {
//!     println!("{}: {}", name, store.firewall_ruleset(&name));
//! }
//! # Ok(())
//! # }
//! ```

mod extract;
mod store;

pub use extract::{extract_candidate, parse_payload};
pub use store::ConfigStore;

use std::sync::Arc;

use log::{debug, info};
use serde_json::Value;

use crate::error::{Error, PayloadError, Result, excerpt};
use crate::schema::{UnifiedConfig, normalize_detected};
use crate::scraper::Scraper;
use crate::transport::{ConnectParams, Connector, SshConnector};

/// Entry point for fetching and loading router configuration.
pub struct Retriever<C: Connector = SshConnector> {
    scraper: Scraper<C>,
    store: Arc<ConfigStore>,
}

impl<C: Connector> Retriever<C> {
    /// Create a retriever publishing into `store`.
    pub fn new(scraper: Scraper<C>, store: Arc<ConfigStore>) -> Self {
        Self { scraper, store }
    }

    /// Get the store this retriever publishes into.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Get the scraper.
    pub fn scraper(&self) -> &Scraper<C> {
        &self.scraper
    }

    /// Retrieve the running configuration from a device and publish it.
    pub async fn fetch(&self, params: &ConnectParams) -> Result<Arc<UnifiedConfig>> {
        let transcript = self.scraper.scrape(params).await?;
        let document = parse_payload(&transcript.text())?;
        debug!(
            "{}: parsed payload from {} byte transcript",
            params.target(),
            transcript.output.len()
        );

        Ok(self.publish(document, &params.target()))
    }

    /// Normalize and publish an already-parsed document.
    pub fn load(&self, document: Value) -> Arc<UnifiedConfig> {
        self.publish(document, "upload")
    }

    /// Parse, normalize and publish an uploaded JSON file.
    pub fn load_file(&self, contents: Option<&[u8]>) -> Result<Arc<UnifiedConfig>> {
        let contents = match contents {
            Some(contents) if !contents.is_empty() => contents,
            _ => return Err(Error::MissingInput { what: "file" }),
        };

        let document = serde_json::from_slice(contents).map_err(|source| {
            PayloadError::Malformed {
                excerpt: excerpt(&String::from_utf8_lossy(contents)),
                source,
            }
        })?;

        Ok(self.load(document))
    }

    fn publish(&self, document: Value, origin: &str) -> Arc<UnifiedConfig> {
        let (version, config) = normalize_detected(document);
        info!("{}: loaded {} configuration", origin, version);
        self.store.publish(config)
    }
}
