//! The local reference library: a JSON file of records plus a storage directory for
//! attachments.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use biblatex::{Bibliography, Chunk, Entry, EntryType, Spanned};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::identifier::{arxiv, doi};
use crate::record::{Attachment, Creator, ItemType, Record};

/// Persistence for records.
///
/// Both methods are all-or-nothing: on error nothing of the attempted change is visible on disk.
pub trait RecordStore {
    /// Durably store every pending field of `record`.
    fn save(&mut self, record: &Record) -> anyhow::Result<()>;

    /// Store a file and make it an attachment of the record with `key`.
    fn attach(&mut self, key: &str, import: AttachmentImport) -> anyhow::Result<Attachment>;
}

/// A file about to become an attachment.
#[derive(Debug, Clone)]
pub struct AttachmentImport {
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    records: BTreeMap<String, Record>,
}

pub struct Library {
    path: PathBuf,
    data: LibraryFile,
}

impl Library {
    /// Load the library at `path`; a missing file is an empty library.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let data = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read library {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("invalid library {}", path.display()))?
        } else {
            LibraryFile::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.data.records.get(key).cloned()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.data.records.values()
    }

    pub fn len(&self) -> usize {
        self.data.records.len()
    }

    /// Directory holding the attachments of the record with `key`.
    pub fn storage_dir(&self, key: &str) -> PathBuf {
        self.root().join(storage_path(key))
    }

    fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Add every entry of a BibTeX/BibLaTeX source; keys already in the library are skipped.
    ///
    /// Returns the number of records added.
    pub fn import_bibtex(&mut self, src: &str) -> anyhow::Result<usize> {
        let bib = Bibliography::parse(src).map_err(|e| anyhow!("failed to parse BibLaTeX: {e}"))?;

        let mut added = 0;
        for entry in bib.iter() {
            if self.data.records.contains_key(&entry.key) {
                tracing::info!(key = %entry.key, "already in library, skipping");
                continue;
            }
            let record = record_from_entry(entry);
            self.data.records.insert(record.key.clone(), record);
            added += 1;
        }

        if added > 0 {
            self.write()?;
        }
        Ok(added)
    }

    /// Replace the library file with the in-memory state via a temporary file and a rename.
    fn write(&self) -> anyhow::Result<()> {
        let root = self.root();
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create {}", root.display()))?;

        let mut tmp = NamedTempFile::new_in(root)?;
        serde_json::to_writer_pretty(&mut tmp, &self.data)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("failed to write library {}", self.path.display()))?;
        Ok(())
    }
}

impl RecordStore for Library {
    fn save(&mut self, record: &Record) -> anyhow::Result<()> {
        let mut stored = record.clone();
        stored.date_modified = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let previous = self.data.records.insert(stored.key.clone(), stored);
        if let Err(e) = self.write() {
            match previous {
                Some(prev) => self.data.records.insert(record.key.clone(), prev),
                None => self.data.records.remove(&record.key),
            };
            return Err(e);
        }
        tracing::debug!(key = %record.key, "record saved");
        Ok(())
    }

    fn attach(&mut self, key: &str, import: AttachmentImport) -> anyhow::Result<Attachment> {
        let mut record = self
            .get(key)
            .ok_or_else(|| anyhow!("no item with key `{key}`"))?;

        let dir = self.storage_dir(key);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(&import.bytes)?;
        staged.as_file().sync_all()?;
        let dest = dir.join(&import.file_name);

        // A previous import of the same file stays aside until the record is saved.
        let backup = if dest.exists() {
            let backup = NamedTempFile::new_in(&dir)?.into_temp_path();
            std::fs::rename(&dest, &backup)
                .with_context(|| format!("failed to move aside {}", dest.display()))?;
            Some(backup)
        } else {
            None
        };

        if let Err(e) = staged.persist(&dest) {
            if let Some(backup) = backup.as_deref() {
                restore_attachment(&dest, Some(backup));
            }
            return Err(anyhow::Error::from(e.error))
                .with_context(|| format!("failed to write {}", dest.display()));
        }

        let attachment = Attachment {
            title: import.title,
            path: storage_path(key)
                .join(&import.file_name)
                .to_string_lossy()
                .into_owned(),
            content_type: import.content_type,
        };
        record.attachments.retain(|a| a.path != attachment.path);
        record.attachments.push(attachment.clone());

        if let Err(e) = self.save(&record) {
            restore_attachment(&dest, backup.as_deref());
            return Err(e);
        }
        tracing::info!(key, path = %attachment.path, "attachment imported");
        Ok(attachment)
    }
}

/// Put back the file `dest` held before a failed import, or remove it if there was none.
fn restore_attachment(dest: &Path, backup: Option<&Path>) {
    let result = match backup {
        Some(backup) => std::fs::rename(backup, dest),
        None => std::fs::remove_file(dest),
    };
    if let Err(e) = result {
        tracing::warn!(path = %dest.display(), error = %e, "failed to roll back attachment");
    }
}

/// `storage/<key>`, with anything that is not safe in a file name replaced.
fn storage_path(key: &str) -> PathBuf {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    Path::new("storage").join(safe)
}

fn field(entry: &Entry, name: &str) -> Option<String> {
    let value = entry.fields.get(name)?;
    let text = format_chunks(value);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

fn format_chunks(value: &[Spanned<Chunk>]) -> String {
    value
        .iter()
        .map(|chunk| match &chunk.v {
            Chunk::Normal(s) | Chunk::Verbatim(s) | Chunk::Math(s) => s.as_str(),
        })
        .collect()
}

fn record_from_entry(entry: &Entry) -> Record {
    let get = |name: &str| field(entry, name);

    let mut record = Record::new(entry.key.clone(), ItemType::Document);
    record.title = get("title").unwrap_or_default();
    record.abstract_note = get("abstract").unwrap_or_default();
    record.publication_title = get("journaltitle")
        .or_else(|| get("journal"))
        .or_else(|| get("booktitle"))
        .unwrap_or_default();
    record.journal_abbreviation = get("shortjournal").unwrap_or_default();
    record.volume = get("volume").unwrap_or_default();
    record.issue = get("number").or_else(|| get("issue")).unwrap_or_default();
    record.pages = get("pages").unwrap_or_default();
    record.date = get("date").or_else(|| get("year")).unwrap_or_default();
    record.issn = get("issn").unwrap_or_default();
    record.doi = get("doi")
        .and_then(|d| doi::normalise(&d))
        .unwrap_or_default();
    record.url = get("url").unwrap_or_default();

    let eprint_type = get("eprinttype").or_else(|| get("archiveprefix"));
    if let Some(eprint) = get("eprint")
        && eprint_type
            .as_deref()
            .is_none_or(|t| t.eq_ignore_ascii_case("arxiv"))
    {
        record.archive_id = format!("{}{}", arxiv::PREFIX, arxiv::bare(&eprint));
    }

    if let Ok(people) = entry.author() {
        record.creators = people
            .iter()
            .map(|p| {
                let last = if p.prefix.is_empty() {
                    p.name.clone()
                } else {
                    format!("{} {}", p.prefix, p.name)
                };
                Creator::author(last, p.given_name.clone())
            })
            .collect();
    }

    let is_eprint = !record.archive_id.is_empty() || arxiv::from_url(&record.url).is_some();
    record.item_type = item_type_for(&entry.entry_type, is_eprint);
    record
}

fn item_type_for(entry_type: &EntryType, is_eprint: bool) -> ItemType {
    match entry_type {
        EntryType::Article => ItemType::JournalArticle,
        EntryType::Online | EntryType::Misc | EntryType::Unpublished if is_eprint => {
            ItemType::Preprint
        }
        EntryType::Online => ItemType::Webpage,
        EntryType::InProceedings => ItemType::ConferencePaper,
        EntryType::Book | EntryType::MvBook => ItemType::Book,
        EntryType::InBook | EntryType::InCollection | EntryType::BookInBook => {
            ItemType::BookSection
        }
        EntryType::Report | EntryType::TechReport => ItemType::Report,
        EntryType::Thesis | EntryType::PhdThesis | EntryType::MastersThesis => ItemType::Thesis,
        EntryType::Unknown(name) => match name.to_ascii_lowercase().as_str() {
            "conference" => ItemType::ConferencePaper,
            "www" => ItemType::Webpage,
            _ => ItemType::Document,
        },
        _ => ItemType::Document,
    }
}

/// In-memory store that counts commits.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub records: BTreeMap<String, Record>,
    pub attachments: Vec<(String, AttachmentImport)>,
    pub saves: usize,
    pub fail_attach: bool,
}

#[cfg(test)]
impl RecordStore for MemoryStore {
    fn save(&mut self, record: &Record) -> anyhow::Result<()> {
        self.saves += 1;
        self.records.insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn attach(&mut self, key: &str, import: AttachmentImport) -> anyhow::Result<Attachment> {
        if self.fail_attach {
            return Err(anyhow!("disk full"));
        }
        let attachment = Attachment {
            title: import.title.clone(),
            path: storage_path(key).join(&import.file_name).to_string_lossy().into_owned(),
            content_type: import.content_type.clone(),
        };
        self.attachments.push((key.to_string(), import));
        Ok(attachment)
    }
}
