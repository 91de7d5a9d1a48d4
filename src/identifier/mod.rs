use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::record::Record;

pub mod arxiv;
pub mod doi;

/// Characters escaped by `encodeURIComponent`: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The key a record is looked up by in ADS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryToken {
    Doi(String),
    /// Always carries the `arXiv:` prefix, e.g. `arXiv:2301.00001`.
    ArxivId(String),
}

impl QueryToken {
    /// The term placed in the `q` parameter of a search query.
    pub fn query_term(&self) -> String {
        match self {
            QueryToken::Doi(doi) => format!("doi:{doi}"),
            QueryToken::ArxivId(id) => id.clone(),
        }
    }

    /// The query term escaped for use inside a URL query string.
    pub fn encoded(&self) -> String {
        match self {
            QueryToken::Doi(doi) => {
                format!("doi:{}", utf8_percent_encode(doi, COMPONENT_ENCODE_SET))
            }
            QueryToken::ArxivId(id) => utf8_percent_encode(id, COMPONENT_ENCODE_SET).to_string(),
        }
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryToken::Doi(doi) => write!(f, "DOI {doi}"),
            QueryToken::ArxivId(id) => f.write_str(id),
        }
    }
}

/// Derive the query token for `record`.
///
/// NOTE: Ordering is important here. A DOI always wins; the arXiv id is only reconstructed when
/// there is no DOI, first from the archive id and then from the record URL.
pub fn resolve(record: &Record) -> Option<QueryToken> {
    if !record.doi.is_empty() {
        return Some(QueryToken::Doi(record.doi.clone()));
    }

    arxiv::from_archive_id(&record.archive_id)
        .or_else(|| arxiv::from_url(&record.url))
        .filter(|candidate| candidate.contains(arxiv::PREFIX))
        .map(QueryToken::ArxivId)
}
