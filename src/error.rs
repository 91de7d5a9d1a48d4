use thiserror::Error;

/// Terminal outcomes of an `update` or `pdf` run.
///
/// The `Display` text of every variant is the message shown to the user; nothing here is
/// retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Operation cancelled. NASA ADS API key is required.")]
    MissingCredential,

    #[error("Please select one item.")]
    InvalidSelection,

    #[error("No item with key `{0}` in the library.")]
    UnknownRecord(String),

    #[error("No DOI or arXiv ID found for the selected item.")]
    UnresolvableIdentifier,

    #[error("Failed to fetch data from NASA ADS (HTTP {status}).")]
    Transport { status: u16 },

    #[error("No results found for {0}.")]
    NoResults(String),

    #[error("No non-arXiv result found for {0}.")]
    EprintOnly(String),

    #[error("No publisher PDF available from NASA ADS.")]
    PdfUnavailable,

    #[error("Failed to import the PDF: {0}")]
    AttachmentImport(String),

    #[error("An error occurred: {0}")]
    Request(#[from] ureq::Error),

    #[error("Invalid response from NASA ADS: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("An error occurred: {0:#}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
