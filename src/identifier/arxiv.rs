use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix ADS and reference managers use for arXiv identifiers.
pub const PREFIX: &str = "arXiv:";

/// Pull an `arXiv:<id>` identifier out of a record's archive id.
///
/// Reference managers fill this field inconsistently (`arXiv:1905.00123v2`,
/// `Preprint arXiv:1905.00123`, ...), so the identifier is taken from the first `arXiv:` up to
/// the next whitespace.
pub fn from_archive_id(archive_id: &str) -> Option<String> {
    let start = archive_id.find(PREFIX)?;
    let id = archive_id[start..]
        .split_whitespace()
        .next()
        .unwrap_or_default();
    Some(id.to_string())
}

/// Rebuild an `arXiv:<id>` identifier from an arXiv abstract page URL.
pub fn from_url(url: &str) -> Option<String> {
    static ABS_URL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)arxiv\.org/abs/([0-9.]+)").unwrap());

    let caps = ABS_URL_RE.captures(url)?;
    let id = caps.get(1)?.as_str().trim_matches('.');
    if id.is_empty() {
        return None;
    }
    Some(format!("{PREFIX}{id}"))
}

/// Strip the `arXiv:` prefix, as used for `tex.eprint`.
pub fn bare(id: &str) -> &str {
    id.strip_prefix(PREFIX).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_id_forms() {
        assert_eq!(
            from_archive_id("arXiv:1905.00123v2").as_deref(),
            Some("arXiv:1905.00123v2")
        );
        assert_eq!(
            from_archive_id("Preprint arXiv:astro-ph/0603274 [astro-ph]").as_deref(),
            Some("arXiv:astro-ph/0603274")
        );
        assert_eq!(from_archive_id("1905.00123"), None);
        assert_eq!(from_archive_id(""), None);
    }

    #[test]
    fn abs_urls() {
        assert_eq!(
            from_url("https://arxiv.org/abs/2301.00001").as_deref(),
            Some("arXiv:2301.00001")
        );
        assert_eq!(
            from_url("http://ARXIV.ORG/abs/2301.00001v3").as_deref(),
            Some("arXiv:2301.00001")
        );
        assert_eq!(
            from_url("https://export.arxiv.org/abs/1810.04805?context=cs").as_deref(),
            Some("arXiv:1810.04805")
        );
    }

    #[test]
    fn non_abs_urls_are_ignored() {
        assert_eq!(from_url("https://arxiv.org/pdf/2301.00001"), None);
        assert_eq!(from_url("https://arxiv.org/abs/astro-ph/0603274"), None);
        assert_eq!(from_url("https://doi.org/10.1000/xyz"), None);
        assert_eq!(from_url(""), None);
    }

    #[test]
    fn any_new_style_abs_url_roundtrips() {
        proptest::proptest!(|(id in "[0-9]{4}\\.[0-9]{4,5}", v in proptest::option::of(1u8..9))| {
            let url = match v {
                Some(v) => format!("https://arxiv.org/abs/{id}v{v}"),
                None => format!("https://arxiv.org/abs/{id}"),
            };
            proptest::prop_assert_eq!(from_url(&url), Some(format!("arXiv:{id}")));
        })
    }

    #[test]
    fn bare_strips_prefix() {
        assert_eq!(bare("arXiv:2301.00001"), "2301.00001");
        assert_eq!(bare("2301.00001"), "2301.00001");
    }
}
