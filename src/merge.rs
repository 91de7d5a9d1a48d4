//! Non-destructive merge of an ADS document into a local record.

use crate::ads::{self, AdsClient, AdsDocument};
use crate::error::{Error, Result};
use crate::identifier::{QueryToken, arxiv};
use crate::library::RecordStore;
use crate::record::{Creator, ItemType, Record};

/// Keys of `extra` lines owned by this module. Any other line belongs to the user.
pub const RESERVED_EXTRA_KEYS: &[&str] = &[
    "ADS Bibcode",
    "tex.archivePrefix",
    "tex.eprint",
    "tex.primaryClass",
    "tex.adsurl",
    "tex.adsnote",
];

const ADS_NOTE: &str = "Provided by the SAO/NASA Astrophysics Data System";
const ADS_ABS_URL: &str = "https://ui.adsabs.harvard.edu/abs";

/// What a metadata update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applied {
    pub bibcode: String,
    pub promoted: bool,
    /// Names of the record fields whose value changed.
    pub changed: Vec<&'static str>,
    /// Author names that were not in `"Last, First"` form.
    pub malformed_authors: Vec<String>,
}

/// Fetch the ADS record for `query` and merge it into `record`.
///
/// Commits happen in two places only: right after a preprint is promoted to a journal article,
/// and once at the end with every other field.
pub fn update_metadata(
    record: &mut Record,
    query: &QueryToken,
    client: &AdsClient,
    store: &mut dyn RecordStore,
) -> Result<Applied> {
    let doc = client
        .search(query, ads::METADATA_FIELDS)?
        .ok_or_else(|| Error::NoResults(query.to_string()))?;

    if doc.is_eprint() {
        return Err(Error::EprintOnly(query.to_string()));
    }

    let promoted = promote_type(record, &doc);
    if promoted {
        store.save(record)?;
        tracing::info!(key = %record.key, "promoted preprint to journal article");
    }

    let mut applied = apply_document(record, &doc);
    applied.promoted = promoted;

    store.save(record)?;
    tracing::info!(
        key = %record.key,
        bibcode = %applied.bibcode,
        changed = applied.changed.len(),
        "metadata updated from NASA ADS"
    );
    Ok(applied)
}

/// Turn a preprint into a journal article once ADS knows the refereed version.
pub fn promote_type(record: &mut Record, doc: &AdsDocument) -> bool {
    if record.item_type == ItemType::Preprint && doc.is_article() {
        record.item_type = ItemType::JournalArticle;
        true
    } else {
        false
    }
}

/// Merge every field of `doc` into `record`, without touching the item type.
///
/// A field is only overwritten when ADS has a value for it. Applying the same document twice
/// leaves the record unchanged the second time.
pub fn apply_document(record: &mut Record, doc: &AdsDocument) -> Applied {
    let mut applied = Applied {
        bibcode: doc.bibcode.clone(),
        ..Default::default()
    };

    if let Some(names) = doc.authors() {
        let creators: Vec<Creator> = names
            .iter()
            .map(|name| {
                parse_author(name).unwrap_or_else(|| {
                    applied.malformed_authors.push(name.clone());
                    Creator::author(name.as_str(), "")
                })
            })
            .collect();
        if record.creators != creators {
            record.creators = creators;
            applied.changed.push("creators");
        }
    }

    let doi_url = doc.doi().map(|doi| format!("https://doi.org/{doi}"));
    let date = doc.pubdate().map(normalise_pubdate);

    let updates: [(&'static str, &mut String, Option<&str>); 10] = [
        ("abstractNote", &mut record.abstract_note, doc.abstract_text()),
        ("publicationTitle", &mut record.publication_title, doc.publication()),
        ("journalAbbreviation", &mut record.journal_abbreviation, doc.journal_abbreviation()),
        ("volume", &mut record.volume, doc.volume()),
        ("issue", &mut record.issue, doc.issue()),
        ("pages", &mut record.pages, doc.pages()),
        ("date", &mut record.date, date),
        ("ISSN", &mut record.issn, doc.issn()),
        ("DOI", &mut record.doi, doc.doi()),
        ("url", &mut record.url, doi_url.as_deref()),
    ];
    for (name, field, value) in updates {
        if let Some(value) = value
            && field.as_str() != value
        {
            *field = value.to_string();
            applied.changed.push(name);
        }
    }

    let extra = reconcile_extra(&record.extra, doc);
    if record.extra != extra {
        record.extra = extra;
        applied.changed.push("extra");
    }

    applied
}

/// Split an ADS author name on the first `", "`.
///
/// Returns `None` when the separator is missing.
pub fn parse_author(name: &str) -> Option<Creator> {
    let (last, first) = name.split_once(", ")?;
    Some(Creator::author(last, first))
}

/// ADS uses `-00` for an unknown day of month; drop it.
pub fn normalise_pubdate(pubdate: &str) -> &str {
    pubdate.strip_suffix("-00").unwrap_or(pubdate)
}

/// Rewrite the ADS-owned lines of `extra`, keeping every other line in place and in order.
pub fn reconcile_extra(extra: &str, doc: &AdsDocument) -> String {
    let mut lines: Vec<String> = extra
        .split('\n')
        .filter(|line| !is_reserved(line))
        .map(str::to_string)
        .collect();
    // An empty field splits into one empty line; don't carry that into the result.
    if lines.len() == 1 && lines[0].is_empty() {
        lines.clear();
    }

    lines.push(format!("ADS Bibcode: {}", doc.bibcode));
    if doc.has_property("EPRINT_OPENACCESS") {
        if let Some(id) = doc.arxiv_identifier() {
            lines.push("tex.archivePrefix: arXiv".to_string());
            lines.push(format!("tex.eprint: {}", arxiv::bare(id)));
        }
        if let Some(class) = doc.primary_class() {
            lines.push(format!("tex.primaryClass: {class}"));
        }
    }
    lines.push(format!("tex.adsurl: {ADS_ABS_URL}/{}", doc.bibcode));
    lines.push(format!("tex.adsnote: {ADS_NOTE}"));

    lines.join("\n")
}

fn is_reserved(line: &str) -> bool {
    line.split_once(':')
        .is_some_and(|(key, _)| RESERVED_EXTRA_KEYS.contains(&key.trim()))
}
