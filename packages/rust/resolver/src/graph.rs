//! The reference graph resolver.
//!
//! One entry point, [`ReferenceResolver::resolve`], drives the whole
//! chain: parse the citation, resolve the department code, build and
//! probe candidate URLs, fetch and normalize the document, then
//! recursively resolve every citation detected inside it. Resolution
//! is depth-first and single-threaded so output order is deterministic;
//! the cache and visited set are shared by all recursion levels.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use chrono::Utc;
use scraper::Html;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use circex_citation::{department_code, detect_references, normalize_title, parse_reference_title};
use circex_content::{
    extract_pdf_links, extract_structured_content, select_main_content, visible_text,
};
use circex_shared::{
    CachedDocument, DocumentContent, EdgeContent, EdgeKind, FailureReason, ReferenceEdge,
    ResolveFailure, ScrapeConfig,
};

use crate::cache::{CacheStore, VisitedSet};
use crate::client::SiteClient;
use crate::pdf::PdfProcessor;
use crate::urls::construct_candidate_urls;

/// Successful resolution: the document body plus the URL it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContent {
    pub content: DocumentContent,
    pub url: String,
}

/// Per-citation outcome. Failures are data, not process errors.
pub type ResolveResult = std::result::Result<ResolvedContent, ResolveFailure>;

/// Resolves citation titles into document content, recursively.
pub struct ReferenceResolver<C: SiteClient> {
    client: C,
    config: ScrapeConfig,
    cache: Mutex<CacheStore>,
    visited: VisitedSet,
    pdf: Option<Box<dyn PdfProcessor>>,
}

impl<C: SiteClient> ReferenceResolver<C> {
    pub fn new(client: C, config: ScrapeConfig, cache: CacheStore) -> Self {
        Self {
            client,
            config,
            cache: Mutex::new(cache),
            visited: VisitedSet::new(),
            pdf: None,
        }
    }

    /// Attach the PDF collaborator. Without one, PDF edges keep their
    /// URL but carry no extracted content.
    pub fn with_pdf_processor(mut self, pdf: Box<dyn PdfProcessor>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().expect("cache lock poisoned").len()
    }

    /// Resolve one citation title into content.
    ///
    /// Recursion through nested citations re-enters here; the visited
    /// set turns a cycle into a `CircularReference` failure instead of
    /// infinite descent.
    #[instrument(skip(self), fields(title = %title))]
    pub async fn resolve(&self, title: &str) -> ResolveResult {
        self.resolve_boxed(title.to_string()).await
    }

    /// Extract and resolve a document already located at `url`, using
    /// `title`/`document_id` for self-reference filtering. Used by the
    /// department pipeline where the URL comes from the site index.
    pub async fn resolve_at_url(
        &self,
        url: &str,
        title: &str,
        document_id: &str,
    ) -> ResolveResult {
        let Some(body) = self.client.fetch(url).await else {
            return Err(ResolveFailure::new(
                FailureReason::ContentExtractionFailed,
                "Failed to extract content",
                title,
            ));
        };
        let mut document = build_document(&body, url, title, document_id);
        if document.is_empty() {
            return Err(ResolveFailure::new(
                FailureReason::ContentExtractionFailed,
                "Failed to extract content",
                title,
            ));
        }
        if self.config.follow_references {
            self.attach_references(&mut document.references).await;
        }
        Ok(ResolvedContent {
            content: document,
            url: url.to_string(),
        })
    }

    fn resolve_boxed<'a>(&'a self, title: String) -> Pin<Box<dyn Future<Output = ResolveResult> + 'a>> {
        Box::pin(self.resolve_inner(title))
    }

    async fn resolve_inner(&self, title: String) -> ResolveResult {
        if title.trim().is_empty() {
            return Err(ResolveFailure::new(
                FailureReason::Internal,
                "No reference title provided",
                title,
            ));
        }

        // Cycle check uses the normalized key so differently-phrased
        // citations of the in-flight document still short-circuit.
        let key = normalize_title(&title);
        if self.visited.contains(&key) {
            debug!(%title, "circular reference detected");
            return Err(ResolveFailure::new(
                FailureReason::CircularReference,
                "Circular reference detected",
                title,
            ));
        }

        // Cache lookup stays on the raw title for compatibility with
        // existing cache files.
        {
            let cache = self.cache.lock().expect("cache lock poisoned");
            if let Some(cached) = cache.get(&title) {
                if !cached.content.is_empty() {
                    debug!(%title, "cache hit");
                    return Ok(ResolvedContent {
                        content: cached.content.clone(),
                        url: cached.url.clone(),
                    });
                }
            }
        }

        let _guard = self.visited.begin(key);

        let citation = parse_reference_title(&title).ok_or_else(|| {
            ResolveFailure::new(
                FailureReason::ParseFailure,
                "Could not parse reference title",
                &title,
            )
        })?;

        let dept_code = department_code(&citation.department, citation.year.as_deref())
            .ok_or_else(|| {
                ResolveFailure::new(
                    FailureReason::UnknownDepartment,
                    format!("Unknown department: {}", citation.department),
                    &title,
                )
            })?;

        let candidates = construct_candidate_urls(&self.config.base_url, dept_code, &citation);
        if candidates.is_empty() {
            return Err(ResolveFailure::new(
                FailureReason::NoCandidateUrls,
                "Could not construct URLs",
                &title,
            ));
        }

        let Some(working_url) = self.client.probe(&candidates).await else {
            let mut failure = ResolveFailure::new(
                FailureReason::NoWorkingUrl,
                "No working URL found",
                &title,
            );
            failure.attempted_urls = candidates;
            return Err(failure);
        };

        let Some(body) = self.client.fetch(&working_url).await else {
            return Err(ResolveFailure::new(
                FailureReason::ContentExtractionFailed,
                "Failed to extract content",
                &title,
            ));
        };

        let mut document = build_document(&body, &working_url, &title, "");
        if document.is_empty() {
            return Err(ResolveFailure::new(
                FailureReason::ContentExtractionFailed,
                "Failed to extract content",
                &title,
            ));
        }

        // Nested citations go back through resolve; their outcome is
        // attached under the citing edge either way.
        self.attach_references(&mut document.references).await;

        let content_hash = format!("{:x}", Sha256::digest(body.as_bytes()));
        {
            let mut cache = self.cache.lock().expect("cache lock poisoned");
            cache.insert(
                title.clone(),
                CachedDocument {
                    content: document.clone(),
                    url: working_url.clone(),
                    extracted_at: Utc::now(),
                    content_hash: Some(content_hash),
                },
            );
        }
        info!(%title, url = %working_url, "resolved citation");

        Ok(ResolvedContent {
            content: document,
            url: working_url,
        })
    }

    /// Resolve each reference edge in place.
    async fn attach_references(&self, references: &mut [ReferenceEdge]) {
        for edge in references.iter_mut() {
            match edge.kind {
                EdgeKind::Circular | EdgeKind::CircularLetter => {
                    match self.resolve_boxed(edge.title.clone()).await {
                        Ok(resolved) => {
                            edge.url = Some(resolved.url);
                            edge.content = Some(EdgeContent::Document(resolved.content));
                        }
                        Err(failure) => {
                            edge.error = Some(failure.message);
                            edge.attempted_urls = failure.attempted_urls;
                        }
                    }
                }
                EdgeKind::Pdf => {
                    let (Some(pdf), true) = (&self.pdf, self.config.extract_pdf) else {
                        continue;
                    };
                    let Some(url) = edge.url.clone() else {
                        continue;
                    };
                    let report = pdf.process_pdf_reference(&url).await;
                    match report.get("error").and_then(|e| e.as_str()) {
                        Some(error) => {
                            warn!(%url, %error, "PDF processing failed");
                            edge.error = Some(error.to_string());
                        }
                        None => edge.content = Some(EdgeContent::Pdf(report)),
                    }
                }
            }
        }
    }
}

/// Parse a fetched page into a document: normalized blocks plus
/// unresolved reference edges (citations first, then PDF links).
fn build_document(body: &str, page_url: &str, title: &str, document_id: &str) -> DocumentContent {
    let doc = Html::parse_document(body);
    let scope = select_main_content(&doc).unwrap_or_else(|| doc.root_element());

    let content = extract_structured_content(scope);

    // Detect citations over the scope's full text, before any block
    // filtering can drop the sentence that carries them.
    let full_text = visible_text(scope);
    let mut references: Vec<ReferenceEdge> = detect_references(&full_text, title, document_id)
        .into_iter()
        .map(|detected| ReferenceEdge::new(detected.kind.into(), detected.title))
        .collect();

    for pdf in extract_pdf_links(&doc, page_url) {
        let mut edge = ReferenceEdge::new(EdgeKind::Pdf, pdf.title);
        edge.url = Some(pdf.url);
        references.push(edge);
    }

    DocumentContent {
        content,
        references,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpClient;
    use circex_shared::ContentBlock;
    use std::path::PathBuf;

    fn temp_cache_path() -> PathBuf {
        std::env::temp_dir().join(format!("circex-resolver-{}.json", uuid::Uuid::now_v7()))
    }

    fn test_config(base_url: String) -> ScrapeConfig {
        ScrapeConfig {
            base_url,
            request_timeout_secs: 5,
            rate_limit_ms: 0,
            max_years: None,
            title_keywords: Vec::new(),
            follow_references: true,
            extract_pdf: false,
        }
    }

    fn resolver_for(server_uri: String, cache_path: &PathBuf) -> ReferenceResolver<HttpClient> {
        let client = HttpClient::new(5).expect("client");
        ReferenceResolver::new(client, test_config(server_uri), CacheStore::load(cache_path))
    }

    fn page(body: &str) -> String {
        format!(
            "<html><body><blockquote><p>{body}</p></blockquote></body></html>"
        )
    }

    async fn mount_page(server: &wiremock::MockServer, path: &str, body: &str) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path(path))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page(body)))
            .mount(server)
            .await;
    }

    async fn mount_fallback_404(server: &wiremock::MockServer) {
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn resolves_a_simple_citation() {
        let server = wiremock::MockServer::start().await;
        mount_page(
            &server,
            "/bprd/2012/C02.htm",
            "Banks are advised to maintain the prescribed cash reserve at all times.",
        )
        .await;
        mount_fallback_404(&server).await;

        let cache_path = temp_cache_path();
        let resolver = resolver_for(server.uri(), &cache_path);

        let resolved = resolver
            .resolve("BPRD Circular No. 02 of 2012")
            .await
            .expect("resolve");
        assert!(resolved.url.ends_with("/bprd/2012/C02.htm"));
        assert!(matches!(
            resolved.content.content.first(),
            Some(ContentBlock::Content { .. })
        ));
        std::fs::remove_file(&cache_path).ok();
    }

    #[tokio::test]
    async fn unknown_department_is_terminal() {
        let server = wiremock::MockServer::start().await;
        let cache_path = temp_cache_path();
        let resolver = resolver_for(server.uri(), &cache_path);

        let failure = resolver
            .resolve("XYZ Circular No. 01 of 2014")
            .await
            .expect_err("should fail");
        assert_eq!(failure.reason, FailureReason::UnknownDepartment);
        std::fs::remove_file(&cache_path).ok();
    }

    #[tokio::test]
    async fn probe_failure_reports_attempted_urls() {
        let server = wiremock::MockServer::start().await;
        mount_fallback_404(&server).await;

        let cache_path = temp_cache_path();
        let resolver = resolver_for(server.uri(), &cache_path);

        let failure = resolver
            .resolve("ACD Circular No. 01 of 2014")
            .await
            .expect_err("should fail");
        assert_eq!(failure.reason, FailureReason::NoWorkingUrl);
        assert_eq!(failure.attempted_urls.len(), 4);
        assert!(failure.attempted_urls[0].ends_with("/acd/2014/C01.htm"));
        std::fs::remove_file(&cache_path).ok();
    }

    #[tokio::test]
    async fn second_resolution_hits_cache_not_network() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/bprd/2015/C04.htm"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(page(
                    "All banks shall submit the quarterly statement within ten days.",
                )),
            )
            // One probe plus one fetch; a second resolve must not add more.
            .expect(2)
            .mount(&server)
            .await;
        mount_fallback_404(&server).await;

        let cache_path = temp_cache_path();
        let resolver = resolver_for(server.uri(), &cache_path);

        resolver
            .resolve("BPRD Circular No. 04 of 2015")
            .await
            .expect("first resolve");
        let second = resolver
            .resolve("BPRD Circular No. 04 of 2015")
            .await
            .expect("second resolve");
        assert!(second.url.ends_with("/bprd/2015/C04.htm"));
        assert_eq!(resolver.cache_len(), 1);
        std::fs::remove_file(&cache_path).ok();
    }

    #[tokio::test]
    async fn cycle_terminates_with_circular_reference_edge() {
        let server = wiremock::MockServer::start().await;
        // A cites B, B cites A.
        mount_page(
            &server,
            "/bprd/2012/C01.htm",
            "In continuation of BPRD Circular No. 02 of 2012, banks shall comply henceforth.",
        )
        .await;
        mount_page(
            &server,
            "/bprd/2012/C02.htm",
            "Attention is invited to BPRD Circular No. 01 of 2012 on the same subject matter.",
        )
        .await;
        mount_fallback_404(&server).await;

        let cache_path = temp_cache_path();
        let resolver = resolver_for(server.uri(), &cache_path);

        let resolved = resolver
            .resolve("BPRD Circular No. 01 of 2012")
            .await
            .expect("resolve terminates");

        let edge_to_b = &resolved.content.references[0];
        assert_eq!(edge_to_b.title, "BPRD Circular No. 02 of 2012");
        let Some(EdgeContent::Document(b_content)) = &edge_to_b.content else {
            panic!("edge to B should carry content");
        };
        let edge_back_to_a = &b_content.references[0];
        assert_eq!(
            edge_back_to_a.error.as_deref(),
            Some("Circular reference detected")
        );
        assert!(edge_back_to_a.content.is_none());
        std::fs::remove_file(&cache_path).ok();
    }

    #[tokio::test]
    async fn nested_failure_attaches_error_and_attempted_urls() {
        let server = wiremock::MockServer::start().await;
        mount_page(
            &server,
            "/acd/2014/C01.htm",
            "Further to ACD Circular No. 09 of 2013, the margin requirement stands revised.",
        )
        .await;
        mount_fallback_404(&server).await;

        let cache_path = temp_cache_path();
        let resolver = resolver_for(server.uri(), &cache_path);

        let resolved = resolver
            .resolve("AC&MFD Circular No. 01 of 2014")
            .await
            .expect("resolve");
        let nested = &resolved.content.references[0];
        assert_eq!(nested.error.as_deref(), Some("No working URL found"));
        assert_eq!(nested.attempted_urls.len(), 4);
        std::fs::remove_file(&cache_path).ok();
    }
}
