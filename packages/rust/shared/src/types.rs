//! Core domain types for circex: citations, content blocks, and the
//! reference graph attached to extracted documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version for persisted output documents.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Citations
// ---------------------------------------------------------------------------

/// The two document kinds issued by a regulatory department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Circular,
    CircularLetter,
}

impl RefKind {
    /// Stable lowercase name used in dedup keys and output JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Circular => "circular",
            RefKind::CircularLetter => "circular_letter",
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed citation to another circular, immutable once parsed.
///
/// `number` is always stored in the 2-digit zero-padded canonical form
/// ("01", "19"); URL construction re-derives the padding variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Issuing department as written, uppercase (e.g. "AC&MFD").
    pub department: String,
    /// Circular vs circular letter.
    pub kind: RefKind,
    /// Canonical 2-digit zero-padded number.
    pub number: String,
    /// 4-digit year, if any date clause carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    /// Full date text from the "of"/"dated" clause, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// The citation text exactly as it appeared in the source.
    pub original_text: String,
}

// ---------------------------------------------------------------------------
// Content blocks
// ---------------------------------------------------------------------------

/// One item in a normalized list, with up to two further levels of
/// nesting below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text, including its rendered number prefix ("1. …", "a. …").
    pub text: String,
    /// Nested sub-items (empty for leaf items).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<ListItem>,
}

impl ListItem {
    /// A leaf item with no sub-items.
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sub_items: Vec::new(),
        }
    }
}

/// One normalized unit of document structure.
///
/// A document body is an ordered `Vec<ContentBlock>`; order reflects
/// source order. `Paragraph` only appears pre-normalization — the
/// normalizer merges paragraph runs into `Content` blocks and splices
/// `Container` children inline, so normalized output contains only
/// `Content`, `List`, `Table` and `HierarchicalContent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A single source paragraph (raw, pre-merge).
    Paragraph { text: String },
    /// A merged run of adjacent paragraphs, joined by blank lines.
    Content { text: String },
    /// An ordered list with sequential numbering.
    List { items: Vec<ListItem> },
    /// A table with optional headers.
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        rows: Vec<Vec<String>>,
    },
    /// An enumerated point that introduces nested lists/tables.
    HierarchicalContent {
        main_text: String,
        sub_content: Vec<ContentBlock>,
    },
    /// Artifact of nested wrapper markup; flattened by normalization.
    Container { blocks: Vec<ContentBlock> },
}

// ---------------------------------------------------------------------------
// Reference edges
// ---------------------------------------------------------------------------

/// Kind of a reference edge in the citation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Circular,
    CircularLetter,
    Pdf,
}

impl From<RefKind> for EdgeKind {
    fn from(kind: RefKind) -> Self {
        match kind {
            RefKind::Circular => EdgeKind::Circular,
            RefKind::CircularLetter => EdgeKind::CircularLetter,
        }
    }
}

/// Payload attached to a resolved reference edge.
///
/// Circular/letter edges carry the target document's normalized body;
/// PDF edges carry the collaborator's report verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeContent {
    Document(DocumentContent),
    Pdf(serde_json::Value),
}

/// One detected citation, with resolution results attached.
///
/// The schema stays stable whether resolution succeeded or failed:
/// success populates `url` + `content`, failure populates `error`
/// (plus `attempted_urls` when probing got that far) — never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    /// Reconstructed display title ("BPRD Circular No. 02 of 2012").
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<EdgeContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted_urls: Vec<String>,
}

impl ReferenceEdge {
    /// An edge with nothing resolved yet.
    pub fn new(kind: EdgeKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            url: None,
            content: None,
            error: None,
            attempted_urls: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Normalized body of one document plus its outgoing reference edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    /// Ordered content blocks in source order.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Outgoing citation and PDF edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ReferenceEdge>,
}

impl DocumentContent {
    /// Whether the document carries any usable content at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.references.is_empty()
    }
}

/// A cache entry: resolved document content plus provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedDocument {
    pub content: DocumentContent,
    /// The URL that probing found working.
    pub url: String,
    /// When the content was extracted.
    pub extracted_at: DateTime<Utc>,
    /// SHA-256 of the fetched page, when the fetcher recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolution failures
// ---------------------------------------------------------------------------

/// Why one citation failed to resolve. Each is terminal for that
/// citation only; the overall run proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Citation text did not match the grammar.
    ParseFailure,
    /// Department resolved to no URL code.
    UnknownDepartment,
    /// Missing number/year prevented URL construction.
    NoCandidateUrls,
    /// Every probed URL returned non-200 or errored.
    NoWorkingUrl,
    /// Cycle detected via the visited set.
    CircularReference,
    /// Fetch succeeded but produced no usable content.
    ContentExtractionFailed,
    /// Anything else, caught at the resolver entry point.
    Internal,
}

/// Structured resolution failure, attached to the citing edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveFailure {
    pub reason: FailureReason,
    /// Human-readable message for the edge's `error` field.
    pub message: String,
    /// The citation title that failed.
    pub title: String,
    /// URLs probed without a hit (diagnostic, `NoWorkingUrl` only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted_urls: Vec<String>,
}

impl ResolveFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            title: title.into(),
            attempted_urls: Vec::new(),
        }
    }
}
