//! NASA ADS search client.
//!
//! API docs: https://ui.adsabs.harvard.edu/help/api/

use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use crate::config::AdsConfig;
use crate::error::{Error, Result};
use crate::identifier::QueryToken;

pub mod types;

pub use types::AdsDocument;
use types::SearchResponse;

/// Fields requested for a metadata update.
pub const METADATA_FIELDS: &[&str] = &[
    "title",
    "author",
    "doi",
    "bibcode",
    "abstract",
    "bibstem",
    "volume",
    "issue",
    "page",
    "pub",
    "issn",
    "pubdate",
    "property",
    "identifier",
    "arxiv_class",
    "doctype",
];

/// Fields requested to locate a publisher PDF.
pub const PDF_FIELDS: &[&str] = &["esources", "bibcode"];

pub struct AdsClient {
    agent: ureq::Agent,
    api_url: String,
    gateway_url: String,
    token: String,
}

impl AdsClient {
    pub fn new(config: &AdsConfig, token: String) -> Self {
        let cfg = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(cfg),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Base of the ADS web UI, used for abstract pages and the link gateway.
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Link gateway URL for one electronic source of a record, e.g. `PUB_PDF`.
    pub fn link_gateway(&self, bibcode: &str, esource: &str) -> String {
        format!("{}/link_gateway/{bibcode}/{esource}", self.gateway_url)
    }

    fn search_url(&self, query: &QueryToken, fields: &[&str]) -> Result<Url> {
        let raw = format!(
            "{}/search/query?q={}&fl={}&rows=1",
            self.api_url,
            query.encoded(),
            fields.join(",")
        );
        let url = Url::parse(&raw).with_context(|| format!("invalid ADS API URL {raw}"))?;
        Ok(url)
    }

    /// Run a one-row search for `query` and return the first hit, if any.
    pub fn search(&self, query: &QueryToken, fields: &[&str]) -> Result<Option<AdsDocument>> {
        let url = self.search_url(query, fields)?;
        tracing::info!(query = %query.query_term(), "querying NASA ADS");
        tracing::debug!(url = %url, "search request");

        let spinner = spinner(format!("Querying NASA ADS for {query}"));
        let response = self
            .agent
            .get(url.as_str())
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .call();
        spinner.finish_and_clear();
        let mut response = response?;

        let status = response.status().as_u16();
        if status != 200 {
            tracing::warn!(status, "NASA ADS search failed");
            return Err(Error::Transport { status });
        }

        let body = response.body_mut().read_to_string()?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        let doc = parsed.response.docs.into_iter().next();
        if let Some(doc) = &doc {
            tracing::debug!(bibcode = %doc.bibcode, doctype = %doc.doctype, "search hit");
        }
        Ok(doc)
    }
}

/// A stderr spinner, drawn only when stderr is a terminal.
pub(crate) fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
