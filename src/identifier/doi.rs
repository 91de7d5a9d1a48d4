use once_cell::sync::Lazy;
use regex::Regex;

/// Normalise a DOI found in an imported bibliography field.
///
/// Strips the textual and resolver prefixes people paste along with DOIs, and trailing prose
/// punctuation. Returns `None` when no DOI is left.
pub fn normalise(raw: &str) -> Option<String> {
    let mut s = raw.trim();

    if let Some(rest) = s
        .strip_prefix("doi:")
        .or_else(|| s.strip_prefix("DOI:"))
        .or_else(|| s.strip_prefix("urn:doi:"))
        .or_else(|| s.strip_prefix("URN:DOI:"))
    {
        s = rest.trim_start();
    }

    if let Some(rest) = s
        .strip_prefix("https://doi.org/")
        .or_else(|| s.strip_prefix("http://doi.org/"))
        .or_else(|| s.strip_prefix("https://dx.doi.org/"))
        .or_else(|| s.strip_prefix("http://dx.doi.org/"))
    {
        s = rest;
    }

    s = s.trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ')' | ']' | '}'));

    static DOI_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^10\.\d{4,9}(?:\.\d+)*/\S+$").unwrap());

    DOI_RE.is_match(s).then(|| s.to_string())
}
