//! PDF collaborator contract.
//!
//! Decoding PDFs is outside this crate; the resolver only needs the
//! collaborator's report to attach under a PDF reference edge. The
//! download helper lives here because its retry policy is part of the
//! collaborator contract: the origin sits behind a proxy that throws
//! intermittent 520 errors which clear on a plain refresh.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use circex_shared::{CircexError, Result};

/// Refresh attempts against a 520 before giving up.
const MAX_REFRESH_ATTEMPTS: u32 = 25;
/// Pause between refresh attempts.
const REFRESH_INTERVAL: Duration = Duration::from_secs(15);

/// What a downloaded PDF contains, before deciding how to report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfAnalysis {
    pub has_images: bool,
    pub has_text: bool,
    pub text_extractable: bool,
    pub image_count: u32,
    pub text_length: u64,
    pub pages: u32,
}

/// Collaborator interface for PDF reference processing.
///
/// The returned report is attached to the citing edge verbatim: a
/// successful extraction carries `url`, `content`, an
/// `extraction_timestamp` and an `analysis` (see [`PdfAnalysis`]);
/// an image-only or unreadable PDF carries a `notification`; failures
/// carry an `error` field.
pub trait PdfProcessor {
    fn process_pdf_reference<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = serde_json::Value> + 'a>>;
}

/// Download a PDF, refreshing through transient 520 responses.
///
/// Non-520 HTTP errors fail immediately, as does a body without the
/// `%PDF` magic; connection and timeout errors retry like a 520 does.
pub async fn download_with_refresh(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    for attempt in 1..=MAX_REFRESH_ATTEMPTS {
        let request = client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .header(reqwest::header::PRAGMA, "no-cache");
        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    let bytes = response
                        .bytes()
                        .await
                        .map_err(|e| CircexError::Network(e.to_string()))?;
                    if !bytes.starts_with(b"%PDF") {
                        return Err(CircexError::Network(format!(
                            "downloaded content is not a PDF: {url}"
                        )));
                    }
                    if attempt > 1 {
                        info!(%url, attempt, size = bytes.len(), "downloaded after refresh");
                    }
                    return Ok(bytes.to_vec());
                }
                if status.as_u16() != 520 {
                    return Err(CircexError::Network(format!(
                        "download failed with status {status}: {url}"
                    )));
                }
                warn!(%url, attempt, "520 response, refreshing");
            }
            Err(e) => {
                warn!(%url, attempt, error = %e, "download error, refreshing");
            }
        }
        if attempt < MAX_REFRESH_ATTEMPTS {
            tokio::time::sleep(REFRESH_INTERVAL).await;
        }
    }
    Err(CircexError::Network(format!(
        "520 persisted after {MAX_REFRESH_ATTEMPTS} refresh attempts: {url}"
    )))
}
