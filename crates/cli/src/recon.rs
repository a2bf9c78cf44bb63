//! `stockfern run|extract|validate`: config-driven picklist reconciliation.

use std::path::{Path, PathBuf};

use stockfern_io::{csv as csv_io, json as json_io, xlsx, CatalogSheet};
use stockfern_recon::config::ExtractionMode;
use stockfern_recon::engine::fill_attribute_guesses;
use stockfern_recon::{
    extract_candidates, run_candidates, AttributeTable, CandidateRecord, MatchSettings, ReconConfig,
};

use crate::documents::{self, Input};
use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_REVIEW};
use crate::CliError;

pub struct RunArgs {
    pub config: PathBuf,
    pub json: bool,
    pub output: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub fuzzy_min_score: Option<u8>,
    pub quiet: bool,
}

pub struct ExtractArgs {
    pub documents: Vec<PathBuf>,
    pub window: usize,
    pub mode: ExtractionMode,
    pub label: String,
    pub out: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

fn load_config(path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    ReconConfig::from_toml(&config_str).map_err(CliError::recon)
}

/// Candidates from every input, in the order given.
fn load_candidates(
    paths: &[PathBuf],
    settings: &MatchSettings,
    attributes: &AttributeTable,
) -> Result<Vec<CandidateRecord>, CliError> {
    let mut out = Vec::new();
    for path in paths {
        match documents::load(path)? {
            Input::Text(doc) => {
                if doc.is_blank() {
                    log::warn!("{}: no text", doc.source_tag);
                }
                out.extend(extract_candidates(std::slice::from_ref(&doc), settings, attributes));
            }
            Input::Candidates(mut candidates) => {
                fill_attribute_guesses(&mut candidates, attributes);
                out.extend(candidates);
            }
        }
    }
    Ok(out)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(&args.config)?;
    if let Some(score) = args.fuzzy_min_score {
        config.matching.fuzzy_min_score = score;
        config.validate().map_err(CliError::recon)?;
    }

    // Paths in the config are relative to the config file's directory
    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));

    let layout = config.catalog.layout().map_err(CliError::recon)?;
    let catalog_path = base_dir.join(&config.catalog.file);
    let sheet = CatalogSheet::load(&catalog_path, config.catalog.sheet.as_deref())
        .map_err(CliError::from_io)?;
    let catalog = sheet.catalog_rows(&layout).map_err(CliError::recon)?;
    log::info!("{}: {} catalog rows", catalog_path.display(), catalog.len());

    let attributes = AttributeTable::new(&config.attributes.keywords);
    let doc_paths: Vec<PathBuf> = config.documents.iter().map(|d| base_dir.join(d)).collect();
    let candidates = load_candidates(&doc_paths, &config.matching, &attributes)?;

    let result = run_candidates(&config, &catalog, candidates).map_err(CliError::recon)?;

    // Workbooks
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| base_dir.join(&config.output.dir));
    std::fs::create_dir_all(&out_dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", out_dir.display())))?;

    let mut written = Vec::new();

    let workbook = out_dir.join(&config.output.workbook);
    let updated = sheet.with_quantities(&layout, &result.catalog);
    xlsx::export_result_workbook(&updated, &result.candidates, &workbook).map_err(CliError::from_io)?;
    written.push(workbook);

    let log_path = out_dir.join(&config.output.log);
    xlsx::export_log_workbook(&result.audit_log, &log_path).map_err(CliError::from_io)?;
    written.push(log_path);

    if !result.quarantine.is_empty() {
        let unknown = out_dir.join(&config.output.unknown);
        xlsx::export_unknown_workbook(&result.quarantine, &unknown).map_err(CliError::from_io)?;
        written.push(unknown);
    }

    // JSON
    let json_file = args
        .output
        .clone()
        .or_else(|| config.output.json.as_ref().map(|j| base_dir.join(j)));
    if let Some(path) = json_file {
        json_io::export(&result, &path).map_err(CliError::from_io)?;
        written.push(path);
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // Human summary to stderr
    if !args.quiet {
        for path in &written {
            eprintln!("wrote {}", path.display());
        }
        let s = &result.summary;
        eprintln!(
            "{}: {} candidates from {} document(s), {} resolved ({} code+attribute, {} code, {} fuzzy), {} quarantined",
            config.name,
            s.candidates,
            config.documents.len(),
            s.resolved,
            s.code_and_attribute,
            s.code_only,
            s.fuzzy,
            s.quarantined,
        );
        eprintln!(
            "quantity: {} picked, {} added to catalog, {} in quarantine",
            s.candidate_quantity, s.matched_quantity, s.quarantined_quantity,
        );
    }

    if result.summary.quarantined > 0 {
        return Err(CliError {
            code: EXIT_REVIEW,
            message: format!("{} candidate(s) quarantined", result.summary.quarantined),
            hint: Some(format!(
                "review {} and add the missing codes to the catalog",
                config.output.unknown
            )),
        });
    }

    Ok(())
}

pub fn cmd_extract(args: ExtractArgs) -> Result<(), CliError> {
    let ExtractArgs {
        documents: paths,
        window,
        mode,
        label,
        out,
        json,
        quiet,
    } = args;
    let settings = MatchSettings {
        context_window: window,
        extraction: mode,
        inline_label: label,
        ..MatchSettings::default()
    };
    settings
        .validate()
        .map_err(|e| CliError::args(e.to_string()))?;

    let candidates = load_candidates(&paths, &settings, &AttributeTable::builtin())?;

    if let Some(ref path) = out {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            json_io::export(&candidates, path).map_err(CliError::from_io)?;
        } else {
            csv_io::export_candidates(&candidates, path).map_err(CliError::from_io)?;
        }
        if !quiet {
            eprintln!("wrote {}", path.display());
        }
    }

    if json {
        let json_str = serde_json::to_string_pretty(&candidates)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else if out.is_none() {
        csv_io::write_candidates(&candidates, std::io::stdout().lock())
            .map_err(|e| CliError::io(format!("cannot write candidates: {e}")))?;
    }

    if !quiet {
        eprintln!("extracted {} candidate(s) from {} document(s)", candidates.len(), paths.len());
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf, quiet: bool) -> Result<(), CliError> {
    let config = load_config(&config_path).map_err(|e| {
        if e.code == EXIT_INVALID_CONFIG {
            e.with_hint("config keys: name, documents, [matching], [attributes], [catalog], [output]")
        } else {
            e
        }
    })?;

    if !quiet {
        eprintln!(
            "valid: '{}' with {} document(s), catalog {}",
            config.name,
            config.documents.len(),
            config.catalog.file,
        );
    }
    Ok(())
}
