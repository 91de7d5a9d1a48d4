//! Strict response types for the ADS search API.
//!
//! Every field but `bibcode` is optional. A value counts as present only when it is non-empty;
//! the accessors below are the only way the merge code looks at the payload.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub response: SearchBody,
}

#[derive(Debug, Deserialize)]
pub struct SearchBody {
    #[serde(default)]
    pub docs: Vec<AdsDocument>,
}

/// A single document from ADS search results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdsDocument {
    pub bibcode: String,
    #[serde(default)]
    pub doctype: String,
    pub title: Option<Vec<String>>,
    pub author: Option<Vec<String>>,
    pub doi: Option<Vec<String>>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub bibstem: Option<Vec<String>>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<Vec<String>>,
    #[serde(rename = "pub")]
    pub publication: Option<String>,
    pub issn: Option<Vec<String>>,
    pub pubdate: Option<String>,
    pub property: Option<Vec<String>>,
    pub identifier: Option<Vec<String>>,
    pub arxiv_class: Option<Vec<String>>,
    pub esources: Option<Vec<String>>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn first(list: &Option<Vec<String>>) -> Option<&str> {
    list.as_ref()
        .and_then(|l| l.first())
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

fn contains(list: &Option<Vec<String>>, needle: &str) -> bool {
    list.as_ref().is_some_and(|l| l.iter().any(|v| v == needle))
}

impl AdsDocument {
    pub fn is_eprint(&self) -> bool {
        self.doctype == "eprint"
    }

    pub fn is_article(&self) -> bool {
        self.doctype == "article"
    }

    /// Raw `"Last, First"` author names, if ADS sent any.
    pub fn authors(&self) -> Option<&[String]> {
        self.author.as_deref().filter(|a| !a.is_empty())
    }

    pub fn abstract_text(&self) -> Option<&str> {
        present(&self.abstract_text)
    }

    pub fn publication(&self) -> Option<&str> {
        present(&self.publication)
    }

    pub fn journal_abbreviation(&self) -> Option<&str> {
        first(&self.bibstem)
    }

    pub fn volume(&self) -> Option<&str> {
        present(&self.volume)
    }

    pub fn issue(&self) -> Option<&str> {
        present(&self.issue)
    }

    pub fn pages(&self) -> Option<&str> {
        first(&self.page)
    }

    pub fn issn(&self) -> Option<&str> {
        first(&self.issn)
    }

    pub fn doi(&self) -> Option<&str> {
        first(&self.doi)
    }

    pub fn pubdate(&self) -> Option<&str> {
        present(&self.pubdate)
    }

    pub fn primary_class(&self) -> Option<&str> {
        first(&self.arxiv_class)
    }

    pub fn has_property(&self, property: &str) -> bool {
        contains(&self.property, property)
    }

    pub fn has_esource(&self, esource: &str) -> bool {
        contains(&self.esources, esource)
    }

    /// The first identifier of the form `arXiv:<id>`.
    pub fn arxiv_identifier(&self) -> Option<&str> {
        self.identifier
            .as_ref()?
            .iter()
            .map(String::as_str)
            .find(|id| id.starts_with(crate::identifier::arxiv::PREFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let json = r#"{
            "responseHeader": {"status": 0},
            "response": {"numFound": 1, "start": 0, "docs": [{
                "bibcode": "2020ApJ...900..1A",
                "doctype": "article",
                "title": ["A Title"],
                "author": ["Smith, Jane", "Doe, J."],
                "doi": ["10.3847/1538-4357/abcdef"],
                "abstract": "We observe.",
                "bibstem": ["ApJ", "ApJ...900"],
                "volume": "900",
                "issue": "1",
                "page": ["1"],
                "pub": "The Astrophysical Journal",
                "issn": ["0004-637X"],
                "pubdate": "2020-09-00",
                "property": ["ARTICLE", "EPRINT_OPENACCESS", "REFEREED"],
                "identifier": ["2020ApJ...900..1A", "arXiv:2007.00001", "10.3847/1538-4357/abcdef"],
                "arxiv_class": ["astro-ph.GA"],
                "esources": ["EPRINT_PDF", "PUB_PDF"]
            }]}
        }"#;

        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let doc = &resp.response.docs[0];
        assert!(doc.is_article());
        assert_eq!(doc.journal_abbreviation(), Some("ApJ"));
        assert_eq!(doc.pages(), Some("1"));
        assert_eq!(doc.publication(), Some("The Astrophysical Journal"));
        assert_eq!(doc.arxiv_identifier(), Some("arXiv:2007.00001"));
        assert_eq!(doc.primary_class(), Some("astro-ph.GA"));
        assert!(doc.has_property("EPRINT_OPENACCESS"));
        assert!(doc.has_esource("PUB_PDF"));
    }

    #[test]
    fn minimal_document_has_nothing_present() {
        let doc: AdsDocument =
            serde_json::from_str(r#"{"bibcode": "X", "abstract": "", "page": []}"#).unwrap();
        assert_eq!(doc.doctype, "");
        assert_eq!(doc.abstract_text(), None);
        assert_eq!(doc.pages(), None);
        assert_eq!(doc.authors(), None);
        assert_eq!(doc.arxiv_identifier(), None);
        assert!(!doc.has_esource("PUB_PDF"));
    }

    #[test]
    fn empty_docs() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"response": {"numFound": 0, "docs": []}}"#).unwrap();
        assert!(resp.response.docs.is_empty());
    }
}
