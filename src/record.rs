use std::fmt;

use serde::{Deserialize, Serialize};

/// A single entry of the local reference library.
///
/// Field names follow the reference-manager vocabulary (`abstractNote`, `extra`, ...) so that a
/// library file reads the same as an export from the host application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    pub key: String,
    pub item_type: ItemType,
    pub title: String,
    pub creators: Vec<Creator>,
    pub abstract_note: String,
    pub publication_title: String,
    pub journal_abbreviation: String,
    pub volume: String,
    pub issue: String,
    pub pages: String,
    pub date: String,
    #[serde(rename = "ISSN")]
    pub issn: String,
    #[serde(rename = "DOI")]
    pub doi: String,
    pub url: String,
    pub archive_id: String,
    /// Free-text notes, one `key: value` pair per line.
    pub extra: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
}

impl Record {
    pub fn new(key: impl Into<String>, item_type: ItemType) -> Self {
        Record {
            key: key.into(),
            item_type,
            ..Default::default()
        }
    }

    /// Short human label used by `list` and in log lines.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub last_name: String,
    pub first_name: String,
    pub creator_type: CreatorType,
}

impl Creator {
    pub fn author(last_name: impl Into<String>, first_name: impl Into<String>) -> Self {
        Creator {
            last_name: last_name.into(),
            first_name: first_name.into(),
            creator_type: CreatorType::Author,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreatorType {
    Author,
    Editor,
    Contributor,
}

/// A file owned by a record, stored relative to the library's storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub title: String,
    pub path: String,
    pub content_type: String,
}

/// Item type of a record.
///
/// Unknown type names are kept verbatim so that a library written by another tool survives a
/// load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemType {
    Preprint,
    JournalArticle,
    ConferencePaper,
    Book,
    BookSection,
    Report,
    Thesis,
    Webpage,
    #[default]
    Document,
    Other(String),
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Preprint => "preprint",
            ItemType::JournalArticle => "journalArticle",
            ItemType::ConferencePaper => "conferencePaper",
            ItemType::Book => "book",
            ItemType::BookSection => "bookSection",
            ItemType::Report => "report",
            ItemType::Thesis => "thesis",
            ItemType::Webpage => "webpage",
            ItemType::Document => "document",
            ItemType::Other(s) => s,
        }
    }
}

impl From<String> for ItemType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "preprint" => ItemType::Preprint,
            "journalArticle" => ItemType::JournalArticle,
            "conferencePaper" => ItemType::ConferencePaper,
            "book" => ItemType::Book,
            "bookSection" => ItemType::BookSection,
            "report" => ItemType::Report,
            "thesis" => ItemType::Thesis,
            "webpage" => ItemType::Webpage,
            "document" => ItemType::Document,
            _ => ItemType::Other(s),
        }
    }
}

impl From<ItemType> for String {
    fn from(t: ItemType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
