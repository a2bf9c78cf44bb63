use crate::aggregate::{apply_increments, Aggregation, Aggregator};
use crate::attribute::AttributeTable;
use crate::catalog::CatalogIndex;
use crate::config::{MatchSettings, ReconConfig};
use crate::error::ReconError;
use crate::extract::Document;
use crate::model::{
    AuditLogEntry, CandidateRecord, CatalogRow, QuarantineRecord, ReconMeta, ReconResult,
    ReconSummary,
};
use crate::resolver::{Resolver, FUZZY_CONFIDENCE_CEILING};
use crate::similarity::{Scorer, TokenSetRatio};

/// Outcome of one reconciliation pass, before run metadata is attached.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub summary: ReconSummary,
    pub catalog: Vec<CatalogRow>,
    pub increments: Vec<i64>,
    pub quarantine: Vec<QuarantineRecord>,
    pub audit_log: Vec<AuditLogEntry>,
}

/// Full pass with the default scorer: extract, detect attributes, resolve,
/// aggregate, merge.
pub fn run(
    config: &ReconConfig,
    catalog: &[CatalogRow],
    documents: &[Document],
) -> Result<ReconResult, ReconError> {
    let attributes = AttributeTable::new(&config.attributes.keywords);
    let candidates = extract_candidates(documents, &config.matching, &attributes);
    run_candidates(config, catalog, candidates)
}

/// Same as [`run`] for candidates that were extracted elsewhere.
pub fn run_candidates(
    config: &ReconConfig,
    catalog: &[CatalogRow],
    candidates: Vec<CandidateRecord>,
) -> Result<ReconResult, ReconError> {
    let scorer = TokenSetRatio;
    let pass = reconcile(catalog, &candidates, &config.matching, &scorer)?;

    let s = &pass.summary;
    log::info!(
        "{}: {} candidates, {} resolved ({} code+attribute, {} code, {} fuzzy), {} quarantined",
        config.name,
        s.candidates,
        s.resolved,
        s.code_and_attribute,
        s.code_only,
        s.fuzzy,
        s.quarantined
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            scorer: scorer.name().to_string(),
            fuzzy_min_score: config.matching.fuzzy_min_score,
            context_window: config.matching.context_window,
            extraction: config.matching.extraction,
            code_tie_break: config.matching.code_tie_break,
        },
        summary: pass.summary,
        candidates,
        catalog: pass.catalog,
        increments: pass.increments,
        quarantine: pass.quarantine,
        audit_log: pass.audit_log,
    })
}

/// Resolve every candidate against a snapshot of `catalog` and merge the
/// increments into a new row set. `catalog` itself is left as it was.
pub fn reconcile<S: Scorer + ?Sized>(
    catalog: &[CatalogRow],
    candidates: &[CandidateRecord],
    settings: &MatchSettings,
    scorer: &S,
) -> Result<Reconciliation, ReconError> {
    settings.validate()?;
    check_candidates("candidates", candidates)?;

    let index = CatalogIndex::build(catalog);
    let duplicates = index.duplicate_rows();
    for &i in &duplicates {
        let row = &catalog[i];
        log::warn!(
            "catalog row {} repeats code {:?} / attribute {:?}; matches go to the first occurrence",
            i + 1,
            row.code(),
            row.attribute()
        );
    }

    if settings.fuzzy_min_score > FUZZY_CONFIDENCE_CEILING {
        log::info!(
            "fuzzy_min_score {} is above {FUZZY_CONFIDENCE_CEILING}; only code matches resolve",
            settings.fuzzy_min_score
        );
    }

    let resolver = Resolver::new(&index, scorer, settings);
    let mut aggregator = Aggregator::new(catalog);
    for candidate in candidates {
        aggregator.record(&resolver.resolve(candidate))?;
    }

    let Aggregation {
        increments,
        quarantine,
        audit_log,
        mut summary,
    } = aggregator.finish();
    summary.duplicate_catalog_rows = duplicates.len();

    Ok(Reconciliation {
        catalog: apply_increments(catalog, &increments)?,
        summary,
        increments,
        quarantine,
        audit_log,
    })
}

/// Candidates from every document, in document then line order, with their
/// attribute guesses filled in.
pub fn extract_candidates(
    documents: &[Document],
    settings: &MatchSettings,
    attributes: &AttributeTable,
) -> Vec<CandidateRecord> {
    let mut out = Vec::new();
    for doc in documents {
        let before = out.len();
        out.extend(doc.extract(settings));
        log::debug!(
            "{}: {} lines, {} candidates",
            doc.source_tag,
            doc.line_count(),
            out.len() - before
        );
    }
    fill_attribute_guesses(&mut out, attributes);
    out
}

/// Detect an attribute for every candidate that does not carry one yet.
pub fn fill_attribute_guesses(candidates: &mut [CandidateRecord], attributes: &AttributeTable) {
    for c in candidates.iter_mut().filter(|c| c.attribute_guess.is_empty()) {
        c.attribute_guess = attributes.detect(&c.context).to_string();
    }
}

/// Parse a pre-extracted candidate list (a JSON array of records).
/// Missing `source_tag` defaults to `source`.
pub fn candidates_from_json(source: &str, json: &str) -> Result<Vec<CandidateRecord>, ReconError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json)
        .map_err(|e| ReconError::malformed(source, 0, format!("expected a JSON array of candidates: {e}")))?;

    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.into_iter().enumerate() {
        let mut record: CandidateRecord =
            serde_json::from_value(value).map_err(|e| ReconError::malformed(source, i, e.to_string()))?;
        if record.source_tag.is_empty() {
            record.source_tag = source.to_string();
        }
        out.push(record);
    }
    check_candidates(source, &out)?;
    Ok(out)
}

fn check_candidates(source: &str, candidates: &[CandidateRecord]) -> Result<(), ReconError> {
    match candidates.iter().position(|c| c.quantity < 0) {
        Some(i) => Err(ReconError::malformed(
            source,
            i,
            format!("negative quantity {}", candidates[i].quantity),
        )),
        None => Ok(()),
    }
}
