use serde::{Deserialize, Serialize};

use crate::config::{CodeTieBreak, ExtractionMode};
use crate::normalize::normalize_key;

/// Placeholder written to the audit log when a candidate has no matched row.
pub const UNMATCHED_PLACEHOLDER: &str = "-";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One extracted (context, quantity) pair, before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub context: String,
    pub quantity: i64,
    #[serde(default)]
    pub attribute_guess: String,
    #[serde(default)]
    pub source_tag: String,
    /// 1-based page of the quantity anchor; 0 when unknown.
    #[serde(default)]
    pub page: usize,
}

/// A catalog entry as handed over by the sheet loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub code: String,
    #[serde(default)]
    pub attribute: String,
    #[serde(default)]
    pub quantity: i64,
}

/// A catalog row with its comparison keys.
///
/// Keys are derived from `code` / `attribute` and only change through the
/// setters, so they can never go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    code: String,
    attribute: String,
    pub quantity: i64,
    code_key: String,
    attribute_key: String,
    combined_key: String,
}

impl CatalogRow {
    pub fn new(code: impl Into<String>, attribute: impl Into<String>, quantity: i64) -> Self {
        let mut row = Self {
            code: code.into(),
            attribute: attribute.into(),
            quantity,
            code_key: String::new(),
            attribute_key: String::new(),
            combined_key: String::new(),
        };
        row.rekey();
        row
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn code_key(&self) -> &str {
        &self.code_key
    }

    pub fn attribute_key(&self) -> &str {
        &self.attribute_key
    }

    pub fn combined_key(&self) -> &str {
        &self.combined_key
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.rekey();
    }

    pub fn set_attribute(&mut self, attribute: impl Into<String>) {
        self.attribute = attribute.into();
        self.rekey();
    }

    fn rekey(&mut self) {
        self.code_key = normalize_key(&self.code);
        self.attribute_key = normalize_key(&self.attribute);
        self.combined_key = format!("{}|{}", self.code_key, self.attribute_key);
    }
}

impl From<CatalogEntry> for CatalogRow {
    fn from(entry: CatalogEntry) -> Self {
        Self::new(entry.code, entry.attribute, entry.quantity)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Code substring hit and attribute key equal.
    CodeAndAttribute,
    /// Code substring hit, attribute differs or is absent.
    CodeOnly,
    /// No code hit; similarity at or above the floor.
    Fuzzy,
    Unresolved,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeAndAttribute => write!(f, "code_and_attribute"),
            Self::CodeOnly => write!(f, "code_only"),
            Self::Fuzzy => write!(f, "fuzzy"),
            Self::Unresolved => write!(f, "unresolved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub candidate: CandidateRecord,
    pub matched_row: Option<usize>,
    pub confidence: u8,
    pub method: MatchMethod,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.matched_row.is_some()
    }
}

// ---------------------------------------------------------------------------
// Aggregation output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarantineRecord {
    pub context: String,
    pub attribute_guess: String,
    pub quantity: i64,
    pub source_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditLogEntry {
    pub context: String,
    pub matched_code: String,
    pub matched_attribute: String,
    pub confidence: u8,
    pub method: MatchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub source_tag: String,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub catalog_rows: usize,
    pub duplicate_catalog_rows: usize,
    pub candidates: usize,
    pub resolved: usize,
    pub code_and_attribute: usize,
    pub code_only: usize,
    pub fuzzy: usize,
    pub quarantined: usize,
    pub candidate_quantity: i64,
    pub matched_quantity: i64,
    pub quarantined_quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub scorer: String,
    pub fuzzy_min_score: u8,
    pub context_window: usize,
    pub extraction: ExtractionMode,
    pub code_tie_break: CodeTieBreak,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub candidates: Vec<CandidateRecord>,
    /// Catalog after the merge step, same order as the input snapshot.
    pub catalog: Vec<CatalogRow>,
    /// Quantity added to each catalog row by this pass.
    pub increments: Vec<i64>,
    pub quarantine: Vec<QuarantineRecord>,
    pub audit_log: Vec<AuditLogEntry>,
}
