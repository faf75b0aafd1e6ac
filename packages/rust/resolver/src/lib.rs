//! Reference graph resolution for circex.
//!
//! Takes citation titles ("AC&MFD Circular No. 01 of 2014") to
//! resolved document content by constructing and probing candidate
//! URLs, then recursively resolving the citations found inside each
//! fetched document:
//! - [`graph`] — the recursive resolver, cache-backed with cycle detection
//! - [`urls`] — candidate URL construction
//! - [`client`] — HTTP probe/fetch collaborators
//! - [`cache`] — persistent cache and the in-flight visited set
//! - [`site`] — department/year index scraping
//! - [`department`] — the full per-department pipeline
//! - [`pdf`] — PDF collaborator contract and download retry policy

pub mod cache;
pub mod client;
pub mod department;
pub mod graph;
pub mod pdf;
pub mod site;
pub mod urls;

pub use cache::{CacheStore, VisitedSet};
pub use client::{HttpClient, SiteClient};
pub use department::{DepartmentReport, ProcessedDocument, process_department, save_report};
pub use graph::{ReferenceResolver, ResolveResult, ResolvedContent};
pub use pdf::{PdfAnalysis, PdfProcessor, download_with_refresh};
pub use site::{CircularListing, YearLink, YearListing};
pub use urls::construct_candidate_urls;
