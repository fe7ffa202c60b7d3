use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use schema_template_core::{Result, TemplateError};
use std::collections::HashMap;
use std::sync::Arc;

/// Column of a codelist CSV holding the codes
pub const CODE_COLUMN: &str = "Code";

/// Source of codelist codes, keyed by codelist filename (`partyRole.csv`)
#[async_trait]
pub trait CodelistSource: Send + Sync {
    /// Codes of a codelist, in file order
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::RemoteFetchError` if the codelist cannot be
    /// retrieved and `TemplateError::CodelistError` if it has no code column.
    async fn codes(&self, codelist: &str) -> Result<Vec<String>>;
}

/// Extract the `Code` column of a codelist CSV
///
/// # Errors
///
/// Returns `TemplateError::CodelistError` if the CSV cannot be read or has no
/// `Code` column.
pub fn parse_codelist_csv(codelist: &str, content: &[u8]) -> Result<Vec<String>> {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| TemplateError::codelist(codelist, e.to_string()))?;
    let position = headers
        .iter()
        .position(|header| header.trim() == CODE_COLUMN)
        .ok_or_else(|| TemplateError::codelist(codelist, format!("no '{CODE_COLUMN}' column")))?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| TemplateError::codelist(codelist, e.to_string()))?;
        if let Some(code) = record.get(position) {
            codes.push(code.to_string());
        }
    }
    Ok(codes)
}

/// Fetches codelists over HTTP from `base_url + filename`
pub struct HttpCodelistSource {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpCodelistSource {
    /// Create a source for codelists under `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a source that uses an existing HTTP client
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }

    /// URL a codelist is fetched from
    #[must_use]
    pub fn url_for(&self, codelist: &str) -> String {
        format!("{}{codelist}", self.base_url)
    }
}

#[async_trait]
impl CodelistSource for HttpCodelistSource {
    async fn codes(&self, codelist: &str) -> Result<Vec<String>> {
        let url = self.url_for(codelist);
        tracing::info!(%url, "fetching codelist");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| TemplateError::remote_fetch(&url, format!("Failed to fetch URL: {e}")))?;

        if !response.status().is_success() {
            return Err(TemplateError::remote_fetch(
                &url,
                format!("HTTP error: {}", response.status()),
            ));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| TemplateError::remote_fetch(&url, format!("Failed to read response: {e}")))?;

        parse_codelist_csv(codelist, &content)
    }
}

/// Codelists held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCodelists {
    lists: IndexMap<String, Vec<String>>,
}

impl StaticCodelists {
    /// Create an empty set of codelists
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a codelist
    #[must_use]
    pub fn with_codelist<I, S>(mut self, codelist: &str, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(codelist, codes);
        self
    }

    /// Add or replace a codelist
    pub fn insert<I, S>(&mut self, codelist: &str, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists
            .insert(codelist.to_string(), codes.into_iter().map(Into::into).collect());
    }
}

#[async_trait]
impl CodelistSource for StaticCodelists {
    async fn codes(&self, codelist: &str) -> Result<Vec<String>> {
        self.lists
            .get(codelist)
            .cloned()
            .ok_or_else(|| TemplateError::codelist(codelist, "codelist is not defined"))
    }
}

/// Remembers every codelist fetched through the inner source
///
/// Each codelist is retrieved at most once per cache. Failed fetches are
/// not cached.
pub struct CachingCodelistSource<S> {
    inner: S,
    cache: Arc<RwLock<HashMap<String, Vec<String>>>>,
}

impl<S: CodelistSource> CachingCodelistSource<S> {
    /// Wrap a codelist source
    #[must_use]
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of cached codelists
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

#[async_trait]
impl<S: CodelistSource> CodelistSource for CachingCodelistSource<S> {
    async fn codes(&self, codelist: &str) -> Result<Vec<String>> {
        {
            let cache = self.cache.read();
            if let Some(codes) = cache.get(codelist) {
                return Ok(codes.clone());
            }
        }

        let codes = self.inner.codes(codelist).await?;
        self.cache
            .write()
            .insert(codelist.to_string(), codes.clone());
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CodelistSource for CountingSource {
        async fn codes(&self, _codelist: &str) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["a".to_string()])
        }
    }

    #[test]
    fn test_parse_code_column() {
        let csv = "Code,Title,Description\nbuyer,Buyer,One who buys\nsupplier,Supplier,\"One, who supplies\"\n";
        let codes = parse_codelist_csv("partyRole.csv", csv.as_bytes()).expect("parses");
        assert_eq!(codes, vec!["buyer", "supplier"]);
    }

    #[test]
    fn test_parse_with_bom() {
        let csv = "\u{feff}Code,Title\nx,X\n";
        let codes = parse_codelist_csv("x.csv", csv.as_bytes()).expect("parses");
        assert_eq!(codes, vec!["x"]);
    }

    #[test]
    fn test_missing_code_column() {
        let err = parse_codelist_csv("bad.csv", b"Title\nBuyer\n").expect_err("no Code column");
        assert!(matches!(err, TemplateError::CodelistError { .. }));
    }

    #[test]
    fn test_url_for() {
        let source = HttpCodelistSource::new("https://example.com/codelists/");
        assert_eq!(
            source.url_for("partyRole.csv"),
            "https://example.com/codelists/partyRole.csv"
        );
    }

    /// Answer a single HTTP request with a canned response
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut request = [0u8; 4096];
                let _ = stream.read(&mut request).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}/codelists/")
    }

    fn http_source(base_url: &str) -> HttpCodelistSource {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("client");
        HttpCodelistSource::with_client(base_url, client)
    }

    #[tokio::test]
    async fn test_http_fetches_code_column() {
        let body = "Code,Title\nbuyer,Buyer\nsupplier,Supplier\n";
        let base = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await;

        let codes = http_source(&base).codes("partyRole.csv").await.expect("codes");
        assert_eq!(codes, vec!["buyer", "supplier"]);
    }

    #[tokio::test]
    async fn test_http_error_status_is_fatal() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;

        let err = http_source(&base)
            .codes("partyRole.csv")
            .await
            .expect_err("404 fails");
        assert!(matches!(err, TemplateError::RemoteFetchError { .. }), "{err}");
        assert!(err.to_string().contains("404"), "{err}");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = http_source(&format!("http://{addr}/"))
            .codes("partyRole.csv")
            .await
            .expect_err("connection refused");
        assert!(matches!(err, TemplateError::RemoteFetchError { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_cache_does_not_keep_failures() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string(),
        )
        .await;
        let source = CachingCodelistSource::new(http_source(&base));

        assert!(source.codes("partyRole.csv").await.is_err());
        assert_eq!(source.cached(), 0);
    }

    #[tokio::test]
    async fn test_static_unknown_codelist() {
        let source = StaticCodelists::new();
        assert!(source.codes("missing.csv").await.is_err());
    }

    #[tokio::test]
    async fn test_cache_fetches_once() {
        let source = CachingCodelistSource::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        for _ in 0..3 {
            assert_eq!(source.codes("a.csv").await.expect("codes"), vec!["a"]);
        }
        source.codes("b.csv").await.expect("codes");

        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.cached(), 2);
    }
}
