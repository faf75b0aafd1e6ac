//! Department pipeline: walk a department's year archives and extract
//! every listed document.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use circex_shared::{CircexError, RefKind, Result, ScrapeConfig};

use crate::client::SiteClient;
use crate::graph::ReferenceResolver;
use crate::site::{self, CircularListing};

/// One processed document in the department report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub title: String,
    /// Full identifier ("ACD Circular No. 01 of 2014") when known.
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<circex_shared::DocumentContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearSummary {
    pub total_circulars: usize,
    pub total_circular_letters: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearReport {
    pub circulars: Vec<ProcessedDocument>,
    pub circular_letters: Vec<ProcessedDocument>,
    pub summary: YearSummary,
}

/// Full report for one department run, serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentReport {
    pub run_id: uuid::Uuid,
    pub department: String,
    pub url: String,
    pub total_years_processed: usize,
    pub processing_timestamp: DateTime<Utc>,
    /// Keyed by year, newest first in iteration order is not
    /// guaranteed; the map is sorted ascending by year.
    pub years: BTreeMap<String, YearReport>,
}

/// Process one department: scrape its year archives, extract each
/// listed document, resolve references per configuration.
#[instrument(skip(client, resolver, config), fields(department = %name))]
pub async fn process_department<C: SiteClient>(
    client: &C,
    resolver: &ReferenceResolver<C>,
    config: &ScrapeConfig,
    name: &str,
    url: &str,
) -> Result<DepartmentReport> {
    let year_links = site::extract_year_links(client, url).await;
    if year_links.is_empty() {
        return Err(CircexError::parse(format!(
            "no year links found for department {name}"
        )));
    }

    let years_to_process = match config.max_years {
        Some(max) => year_links.len().min(max as usize),
        None => year_links.len(),
    };
    info!(
        available = year_links.len(),
        processing = years_to_process,
        "found year archives"
    );

    let mut years = BTreeMap::new();
    for year_link in &year_links[..years_to_process] {
        info!(year = %year_link.year, "processing year");
        let listing =
            site::extract_circular_links(client, &year_link.url, &config.title_keywords).await;

        let circulars = process_listings(
            client,
            resolver,
            config,
            name,
            &year_link.year,
            RefKind::Circular,
            listing.circulars,
        )
        .await;
        let circular_letters = process_listings(
            client,
            resolver,
            config,
            name,
            &year_link.year,
            RefKind::CircularLetter,
            listing.circular_letters,
        )
        .await;

        let summary = YearSummary {
            total_circulars: circulars.len(),
            total_circular_letters: circular_letters.len(),
        };
        years.insert(
            year_link.year.clone(),
            YearReport {
                circulars,
                circular_letters,
                summary,
            },
        );
    }

    Ok(DepartmentReport {
        run_id: uuid::Uuid::now_v7(),
        department: name.to_string(),
        url: url.to_string(),
        total_years_processed: years_to_process,
        processing_timestamp: Utc::now(),
        years,
    })
}

async fn process_listings<C: SiteClient>(
    client: &C,
    resolver: &ReferenceResolver<C>,
    config: &ScrapeConfig,
    department: &str,
    year: &str,
    kind: RefKind,
    listings: Vec<CircularListing>,
) -> Vec<ProcessedDocument> {
    let mut processed = Vec::with_capacity(listings.len());
    for listing in listings {
        processed.push(process_one(client, resolver, department, year, kind, listing).await);
        if config.rate_limit_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.rate_limit_ms)).await;
        }
    }
    processed
}

async fn process_one<C: SiteClient>(
    client: &C,
    resolver: &ReferenceResolver<C>,
    department: &str,
    year: &str,
    kind: RefKind,
    listing: CircularListing,
) -> ProcessedDocument {
    info!(title = %listing.title, url = %listing.url, "processing document");

    let mut id = listing.id.clone();
    let mut date = listing.date.clone();

    // The document's own header is more reliable than the index row
    // for number and date.
    if let Some(body) = client.fetch(&listing.url).await {
        let (number, header_date) = site::extract_number_and_date(&body);
        if let Some(number) = number {
            // Keep an already-complete identifier; replace bare numbers.
            let replace = id
                .as_deref()
                .is_none_or(|id| id.chars().all(|c| c.is_ascii_digit()));
            if replace {
                id = Some(build_identifier(department, kind, &number, year));
            }
        }
        if header_date.is_some() {
            date = header_date;
        }
    }

    let document_id = id.clone().unwrap_or_default();
    match resolver
        .resolve_at_url(&listing.url, &listing.title, &document_id)
        .await
    {
        Ok(resolved) => ProcessedDocument {
            title: listing.title,
            id,
            date,
            url: listing.url,
            content: Some(resolved.content),
            error: None,
        },
        Err(failure) => {
            warn!(title = %listing.title, error = %failure.message, "document extraction failed");
            ProcessedDocument {
                title: listing.title,
                id,
                date,
                url: listing.url,
                content: None,
                error: Some(failure.message),
            }
        }
    }
}

/// "ACD Circular No. 01 of 2014" / "BPRD Circular Letter No. 03 of 2021".
fn build_identifier(department: &str, kind: RefKind, number: &str, year: &str) -> String {
    let kind_word = match kind {
        RefKind::Circular => "Circular",
        RefKind::CircularLetter => "Circular Letter",
    };
    format!(
        "{} {kind_word} No. {:0>2} of {year}",
        department.to_uppercase(),
        number
    )
}

/// Write a department report as pretty JSON.
pub fn save_report(report: &DepartmentReport, path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).map_err(|e| CircexError::parse(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| CircexError::io(path, e))?;
    info!(path = %path.display(), "saved department report");
    Ok(())
}
