use serde::{Deserialize, Serialize};

use crate::attribute::BUILTIN_COLOR_KEYWORDS;
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    /// Picklist documents, relative to the config file.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub matching: MatchSettings,
    #[serde(default)]
    pub attributes: AttributeConfig,
    pub catalog: CatalogSource,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_name() -> String {
    "stockfern".into()
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Knobs the resolver and extractor read during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Lowest similarity (0..=100) accepted by the fuzzy tier.
    pub fuzzy_min_score: u8,
    /// Lines before a quantity anchor joined into its context.
    pub context_window: usize,
    pub code_tie_break: CodeTieBreak,
    /// How quantities are located in document text.
    pub extraction: ExtractionMode,
    /// Marker in front of an inline item (`SKU: AB-123 ... 3`). Empty means
    /// any line ending in a quantity token.
    pub inline_label: String,
}

pub const DEFAULT_FUZZY_MIN_SCORE: u8 = 65;
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;
pub const DEFAULT_INLINE_LABEL: &str = "SKU:";

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            fuzzy_min_score: DEFAULT_FUZZY_MIN_SCORE,
            context_window: DEFAULT_CONTEXT_WINDOW,
            code_tie_break: CodeTieBreak::default(),
            extraction: ExtractionMode::default(),
            inline_label: DEFAULT_INLINE_LABEL.to_string(),
        }
    }
}

impl MatchSettings {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.fuzzy_min_score > 100 {
            return Err(ReconError::ConfigValidation(format!(
                "fuzzy_min_score must be between 0 and 100, got {}",
                self.fuzzy_min_score
            )));
        }
        if self.context_window == 0 {
            return Err(ReconError::ConfigValidation(
                "context_window must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Which catalog code wins when several occur inside one context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeTieBreak {
    /// Longest code key; equal lengths fall back to catalog order.
    #[default]
    Longest,
    /// First code key in catalog row order.
    CatalogOrder,
}

impl std::fmt::Display for CodeTieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Longest => write!(f, "longest"),
            Self::CatalogOrder => write!(f, "catalog_order"),
        }
    }
}

/// Where a candidate's quantity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Digit-only lines, context from the lines above.
    Block,
    /// Label and trailing quantity on the same line (`pdftotext -layout` tables).
    Inline,
    /// Block per page; pages without a single block candidate are read inline.
    #[default]
    Auto,
}

impl std::fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Inline => write!(f, "inline"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for ExtractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(Self::Block),
            "inline" => Ok(Self::Inline),
            "auto" => Ok(Self::Auto),
            other => Err(format!("unknown extraction mode '{other}' (block, inline, auto)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AttributeConfig {
    #[serde(default = "builtin_keywords")]
    pub keywords: Vec<String>,
}

fn builtin_keywords() -> Vec<String> {
    BUILTIN_COLOR_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            keywords: builtin_keywords(),
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog source
// ---------------------------------------------------------------------------

/// Where the catalog sheet lives and which columns the engine owns.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSource {
    pub file: String,
    /// Sheet name; missing or unknown falls back to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_code_column")]
    pub code: ColumnRef,
    #[serde(default = "default_attribute_column")]
    pub attribute: ColumnRef,
    #[serde(default = "default_quantity_column")]
    pub quantity: ColumnRef,
    /// Rows above the data that are kept in the output but never matched.
    #[serde(default)]
    pub header_rows: usize,
}

fn default_code_column() -> ColumnRef {
    ColumnRef::Letter("B".into())
}

fn default_attribute_column() -> ColumnRef {
    ColumnRef::Letter("C".into())
}

fn default_quantity_column() -> ColumnRef {
    ColumnRef::Letter("D".into())
}

/// Resolved 0-based column indices for the catalog sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLayout {
    pub code: usize,
    pub attribute: usize,
    pub quantity: usize,
    pub header_rows: usize,
}

impl Default for CatalogLayout {
    fn default() -> Self {
        Self {
            code: 1,
            attribute: 2,
            quantity: 3,
            header_rows: 0,
        }
    }
}

impl CatalogSource {
    pub fn layout(&self) -> Result<CatalogLayout, ReconError> {
        let layout = CatalogLayout {
            code: self.code.index()?,
            attribute: self.attribute.index()?,
            quantity: self.quantity.index()?,
            header_rows: self.header_rows,
        };
        if layout.quantity == layout.code || layout.quantity == layout.attribute {
            return Err(ReconError::ConfigValidation(
                "catalog quantity column must differ from the code and attribute columns".into(),
            ));
        }
        Ok(layout)
    }
}

/// A spreadsheet column given as letters (`"B"`, `"AA"`) or a 1-based number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    Number(usize),
    Letter(String),
}

impl ColumnRef {
    /// 0-based column index.
    pub fn index(&self) -> Result<usize, ReconError> {
        match self {
            Self::Number(0) => Err(ReconError::ConfigValidation(
                "column numbers are 1-based, got 0".into(),
            )),
            Self::Number(n) => Ok(n - 1),
            Self::Letter(s) => column_letters_to_index(s),
        }
    }
}

fn column_letters_to_index(letters: &str) -> Result<usize, ReconError> {
    let trimmed = letters.trim();
    if trimmed.is_empty() || trimmed.len() > 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ReconError::ConfigValidation(format!(
            "invalid column reference '{letters}'"
        )));
    }
    let n = trimmed
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    Ok(n - 1)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, relative to the config file.
    pub dir: String,
    pub workbook: String,
    pub log: String,
    pub unknown: String,
    pub json: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: ".".into(),
            workbook: "stockfern_output.xlsx".into(),
            log: "log_report.xlsx".into(),
            unknown: "unknown_sku.xlsx".into(),
            json: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        self.matching.validate()?;

        if self.catalog.file.trim().is_empty() {
            return Err(ReconError::ConfigValidation("catalog.file must not be empty".into()));
        }
        self.catalog.layout()?;

        if self.documents.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one document is required".into(),
            ));
        }
        if let Some(doc) = self.documents.iter().find(|d| d.trim().is_empty()) {
            return Err(ReconError::ConfigValidation(format!(
                "document path must not be empty (got {doc:?})"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
documents = ["picklist.txt"]

[catalog]
file = "stock.xlsx"
"#;

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = ReconConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.name, "stockfern");
        assert_eq!(config.matching, MatchSettings::default());
        assert_eq!(config.matching.fuzzy_min_score, 65);
        assert_eq!(config.matching.context_window, 3);
        assert_eq!(config.matching.code_tie_break, CodeTieBreak::Longest);
        assert_eq!(config.matching.extraction, ExtractionMode::Auto);
        assert_eq!(config.matching.inline_label, "SKU:");
        assert_eq!(config.attributes.keywords.len(), BUILTIN_COLOR_KEYWORDS.len());
        assert_eq!(config.catalog.layout().unwrap(), CatalogLayout::default());
        assert_eq!(config.output.workbook, "stockfern_output.xlsx");
        assert!(config.output.json.is_none());
    }

    #[test]
    fn parse_full() {
        let input = r#"
name = "Daily picklist"
documents = ["a.pdf", "b.txt"]

[matching]
fuzzy_min_score = 70
context_window = 2
code_tie_break = "catalog_order"
extraction = "inline"
inline_label = "Item:"

[attributes]
keywords = ["red", "dark red"]

[catalog]
file = "stock.csv"
sheet = "Stock"
code = "A"
attribute = 3
quantity = "AA"
header_rows = 1

[output]
dir = "out"
json = "result.json"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.name, "Daily picklist");
        assert_eq!(config.documents, vec!["a.pdf", "b.txt"]);
        assert_eq!(config.matching.fuzzy_min_score, 70);
        assert_eq!(config.matching.context_window, 2);
        assert_eq!(config.matching.code_tie_break, CodeTieBreak::CatalogOrder);
        assert_eq!(config.matching.extraction, ExtractionMode::Inline);
        assert_eq!(config.matching.inline_label, "Item:");
        assert_eq!(config.attributes.keywords, vec!["red", "dark red"]);
        assert_eq!(config.catalog.sheet.as_deref(), Some("Stock"));
        let layout = config.catalog.layout().unwrap();
        assert_eq!(layout.code, 0);
        assert_eq!(layout.attribute, 2);
        assert_eq!(layout.quantity, 26);
        assert_eq!(layout.header_rows, 1);
        assert_eq!(config.output.dir, "out");
        assert_eq!(config.output.log, "log_report.xlsx");
        assert_eq!(config.output.json.as_deref(), Some("result.json"));
    }

    #[test]
    fn reject_score_above_100() {
        let input = format!("{MINIMAL}\n[matching]\nfuzzy_min_score = 101\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("fuzzy_min_score"));
    }

    #[test]
    fn reject_zero_window() {
        let input = format!("{MINIMAL}\n[matching]\ncontext_window = 0\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("context_window"));
    }

    #[test]
    fn reject_unknown_tie_break() {
        let input = format!("{MINIMAL}\n[matching]\ncode_tie_break = \"shortest\"\n");
        let err = ReconConfig::from_toml(&input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn extraction_mode_names() {
        for mode in [ExtractionMode::Block, ExtractionMode::Inline, ExtractionMode::Auto] {
            assert_eq!(mode.to_string().parse::<ExtractionMode>(), Ok(mode));
        }
        assert!("lines".parse::<ExtractionMode>().is_err());

        let input = format!("{MINIMAL}\n[matching]\nextraction = \"table\"\n");
        assert!(matches!(ReconConfig::from_toml(&input), Err(ReconError::ConfigParse(_))));
    }

    #[test]
    fn reject_missing_documents() {
        let input = "[catalog]\nfile = \"stock.xlsx\"\n";
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("document"));
    }

    #[test]
    fn reject_missing_catalog() {
        let err = ReconConfig::from_toml("documents = [\"a.txt\"]\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_overlapping_quantity_column() {
        let input = r#"
documents = ["a.txt"]
[catalog]
file = "stock.xlsx"
code = "B"
quantity = 2
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("quantity column"));
    }

    #[test]
    fn column_letters() {
        assert_eq!(ColumnRef::Letter("A".into()).index().unwrap(), 0);
        assert_eq!(ColumnRef::Letter("d".into()).index().unwrap(), 3);
        assert_eq!(ColumnRef::Letter("Z".into()).index().unwrap(), 25);
        assert_eq!(ColumnRef::Letter("AA".into()).index().unwrap(), 26);
        assert_eq!(ColumnRef::Number(1).index().unwrap(), 0);
        assert!(ColumnRef::Number(0).index().is_err());
        assert!(ColumnRef::Letter("B2".into()).index().is_err());
        assert!(ColumnRef::Letter("".into()).index().is_err());
    }
}
