//! Publisher PDF download through the ADS link gateway.

use crate::ads::{self, AdsClient};
use crate::error::{Error, Result};
use crate::identifier::QueryToken;
use crate::library::{AttachmentImport, RecordStore};
use crate::record::{Attachment, Record};

const PUB_PDF: &str = "PUB_PDF";

/// Publishers tend to refuse non-browser clients, so the gateway request looks like one.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.10 Safari/605.1.1";

/// Upper bound on a downloaded PDF.
const MAX_PDF_BYTES: u64 = 200 * 1024 * 1024;

/// Find the publisher PDF of the ADS record for `query` and attach it to `record`.
pub fn fetch_pdf(
    record: &Record,
    query: &QueryToken,
    client: &AdsClient,
    store: &mut dyn RecordStore,
) -> Result<Attachment> {
    let doc = client
        .search(query, ads::PDF_FIELDS)?
        .filter(|doc| doc.has_esource(PUB_PDF))
        .ok_or(Error::PdfUnavailable)?;

    let url = client.link_gateway(&doc.bibcode, PUB_PDF);
    let referer = format!("{}/", client.gateway_url());
    let bytes = download(&url, &referer).map_err(|e| Error::AttachmentImport(format!("{e:#}")))?;

    let import = AttachmentImport {
        title: "Full Text PDF".to_string(),
        file_name: format!("{}.pdf", file_stem(&doc.bibcode)),
        content_type: "application/pdf".to_string(),
        bytes,
    };
    store
        .attach(&record.key, import)
        .map_err(|e| Error::AttachmentImport(format!("{e:#}")))
}

/// GET `url` in a fresh cookie session, the way a browser tab opened on the gateway would.
///
/// No ADS credentials are sent; access rides on whatever cookies the gateway and publisher set
/// during the redirect chain.
fn download(url: &str, referer: &str) -> anyhow::Result<Vec<u8>> {
    let cfg = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build();
    let agent = ureq::Agent::new_with_config(cfg);

    tracing::info!(url, "downloading publisher PDF");
    let spinner = ads::spinner("Downloading publisher PDF".to_string());
    let response = agent
        .get(url)
        .header("User-Agent", BROWSER_USER_AGENT)
        .header("Referer", referer)
        .header("Accept", "application/pdf,*/*;q=0.8")
        .call();
    spinner.finish_and_clear();
    let mut response = response?;

    let status = response.status().as_u16();
    if status != 200 {
        anyhow::bail!("gateway answered HTTP {status}");
    }

    let bytes = response
        .body_mut()
        .with_config()
        .limit(MAX_PDF_BYTES)
        .read_to_vec()?;
    if !bytes.starts_with(b"%PDF") {
        anyhow::bail!("the publisher did not return a PDF (login or paywall page?)");
    }
    tracing::debug!(bytes = bytes.len(), "PDF downloaded");
    Ok(bytes)
}

fn file_stem(bibcode: &str) -> String {
    bibcode
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '&' | '-') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdsConfig;
    use crate::library::MemoryStore;
    use crate::record::ItemType;
    use mockito::{Matcher, Server};

    const BIBCODE: &str = "2020ApJ...900....1A";

    fn client(server: &Server) -> AdsClient {
        let cfg = AdsConfig {
            api_key: None,
            api_url: server.url(),
            gateway_url: server.url(),
        };
        AdsClient::new(&cfg, "secret-key".into())
    }

    fn search_mock(server: &mut Server, esources: &str) -> mockito::Mock {
        server
            .mock("GET", "/search/query")
            .match_query(Matcher::UrlEncoded("fl".into(), "esources,bibcode".into()))
            .match_header("authorization", "Bearer secret-key")
            .with_status(200)
            .with_body(format!(
                r#"{{"response":{{"docs":[{{"bibcode":"{BIBCODE}","esources":{esources}}}]}}}}"#
            ))
            .create()
    }

    fn query() -> QueryToken {
        QueryToken::Doi("10.3847/1538-4357/abc".into())
    }

    #[test]
    fn attaches_publisher_pdf_without_bearer() {
        let mut server = Server::new();
        let _search = search_mock(&mut server, r#"["EPRINT_PDF","PUB_PDF"]"#);
        let referer = format!("{}/", server.url());
        let gateway = server
            .mock("GET", format!("/link_gateway/{BIBCODE}/PUB_PDF").as_str())
            .match_header("authorization", Matcher::Missing)
            .match_header("referer", referer.as_str())
            .match_header("user-agent", Matcher::Regex("^Mozilla/5.0".into()))
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.7 body".to_vec())
            .expect(1)
            .create();

        let record = Record::new("smith2020", ItemType::JournalArticle);
        let mut store = MemoryStore::default();
        let attachment = fetch_pdf(&record, &query(), &client(&server), &mut store).unwrap();

        gateway.assert();
        assert_eq!(attachment.content_type, "application/pdf");
        assert_eq!(store.attachments.len(), 1);
        let (key, import) = &store.attachments[0];
        assert_eq!(key, "smith2020");
        assert_eq!(import.file_name, format!("{BIBCODE}.pdf"));
        assert_eq!(import.bytes, b"%PDF-1.7 body");
    }

    #[test]
    fn missing_pub_pdf_is_unavailable() {
        let mut server = Server::new();
        let _search = search_mock(&mut server, r#"["EPRINT_PDF"]"#);
        let gateway = server
            .mock("GET", Matcher::Regex("^/link_gateway/".into()))
            .expect(0)
            .create();

        let record = Record::new("k", ItemType::JournalArticle);
        let mut store = MemoryStore::default();
        let err = fetch_pdf(&record, &query(), &client(&server), &mut store).unwrap_err();
        assert!(matches!(err, Error::PdfUnavailable));
        gateway.assert();
    }

    #[test]
    fn no_results_is_unavailable() {
        let mut server = Server::new();
        let _search = server
            .mock("GET", "/search/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"response":{"docs":[]}}"#)
            .create();

        let record = Record::new("k", ItemType::JournalArticle);
        let mut store = MemoryStore::default();
        let err = fetch_pdf(&record, &query(), &client(&server), &mut store).unwrap_err();
        assert!(matches!(err, Error::PdfUnavailable));
    }

    #[test]
    fn paywall_page_is_import_error() {
        let mut server = Server::new();
        let _search = search_mock(&mut server, r#"["PUB_PDF"]"#);
        let _gateway = server
            .mock("GET", format!("/link_gateway/{BIBCODE}/PUB_PDF").as_str())
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html>Sign in</html>")
            .create();

        let record = Record::new("k", ItemType::JournalArticle);
        let mut store = MemoryStore::default();
        let err = fetch_pdf(&record, &query(), &client(&server), &mut store).unwrap_err();
        assert!(matches!(err, Error::AttachmentImport(_)));
        assert!(store.attachments.is_empty());
    }

    #[test]
    fn store_failure_is_import_error() {
        let mut server = Server::new();
        let _search = search_mock(&mut server, r#"["PUB_PDF"]"#);
        let _gateway = server
            .mock("GET", format!("/link_gateway/{BIBCODE}/PUB_PDF").as_str())
            .with_status(200)
            .with_body(b"%PDF-1.4".to_vec())
            .create();

        let record = Record::new("k", ItemType::JournalArticle);
        let mut store = MemoryStore {
            fail_attach: true,
            ..Default::default()
        };
        let err = fetch_pdf(&record, &query(), &client(&server), &mut store).unwrap_err();
        match err {
            Error::AttachmentImport(msg) => assert!(msg.contains("disk full")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn search_failure_is_transport_error() {
        let mut server = Server::new();
        let _search = server
            .mock("GET", "/search/query")
            .match_query(Matcher::Any)
            .with_status(500)
            .create();

        let record = Record::new("k", ItemType::JournalArticle);
        let mut store = MemoryStore::default();
        let err = fetch_pdf(&record, &query(), &client(&server), &mut store).unwrap_err();
        assert!(matches!(err, Error::Transport { status: 500 }));
    }

    #[test]
    fn bibcode_file_stem() {
        assert_eq!(file_stem("2020A&A...642A...1P"), "2020A&A...642A...1P");
        assert_eq!(file_stem("a/b"), "a_b");
    }
}
