//! `stockfern-recon` - picklist to stock catalog reconciliation engine.
//!
//! Pure engine crate: receives document text and catalog rows, returns the
//! updated catalog plus quarantine and audit log. No file or process IO.

pub mod aggregate;
pub mod attribute;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod resolver;
pub mod similarity;

pub use attribute::AttributeTable;
pub use config::{CatalogLayout, ExtractionMode, MatchSettings, ReconConfig};
pub use engine::{extract_candidates, reconcile, run, run_candidates};
pub use error::ReconError;
pub use extract::Document;
pub use model::{CandidateRecord, CatalogEntry, CatalogRow, MatchMethod, ReconResult};
pub use similarity::{Scorer, TokenSetRatio};
