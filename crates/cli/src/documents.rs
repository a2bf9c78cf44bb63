//! Picklist inputs: plain text, PDF (through `pdftotext`), or a JSON list of
//! already extracted candidates.

use std::path::Path;
use std::process::Command;

use stockfern_recon::engine::candidates_from_json;
use stockfern_recon::{CandidateRecord, Document};

use crate::exit_codes::{EXIT_PDFTOTEXT_FAILED, EXIT_PDFTOTEXT_MISSING, EXIT_PDF_NO_TEXT, EXIT_USAGE};
use crate::CliError;

/// A loaded picklist input.
#[derive(Debug)]
pub enum Input {
    Text(Document),
    Candidates(Vec<CandidateRecord>),
}

/// Load one input by extension. The source tag is the file name as given.
pub fn load(path: &Path) -> Result<Input, CliError> {
    let tag = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => {
            let text = run_pdftotext(path)?;
            Ok(Input::Text(Document::from_text(tag, &text)))
        }
        "json" => {
            let json = read_lossy(path)?;
            let candidates = candidates_from_json(&tag, &json).map_err(CliError::recon)?;
            Ok(Input::Candidates(candidates))
        }
        "txt" | "text" | "" => {
            let text = read_lossy(path)?;
            Ok(Input::Text(Document::from_text(tag, &text)))
        }
        other => Err(CliError {
            code: EXIT_USAGE,
            message: format!("unsupported picklist format: .{other} ({})", path.display()),
            hint: Some("use .pdf, .txt or a .json candidate list".to_string()),
        }),
    }
}

fn read_lossy(path: &Path) -> Result<String, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Run `pdftotext -layout <file> -` and capture stdout.
fn run_pdftotext(file: &Path) -> Result<String, CliError> {
    // Check that pdftotext exists
    which::which("pdftotext").map_err(|_| CliError {
        code: EXIT_PDFTOTEXT_MISSING,
        message: "pdftotext not installed (poppler-utils)".to_string(),
        hint: Some("Install with: apt install poppler-utils / brew install poppler".to_string()),
    })?;

    let file_str = file
        .to_str()
        .ok_or_else(|| CliError::args(format!("invalid file path: {}", file.display())))?;

    log::debug!("pdftotext -layout {file_str} -");
    let output = Command::new("pdftotext")
        .args(["-layout", file_str, "-"])
        .output()
        .map_err(|e| CliError {
            code: EXIT_PDFTOTEXT_MISSING,
            message: format!("failed to run pdftotext: {}", e),
            hint: None,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CliError {
            code: EXIT_PDFTOTEXT_FAILED,
            message: format!(
                "pdftotext failed on {} (exit {}): {}",
                file.display(),
                output.status.code().unwrap_or(-1),
                stderr.trim(),
            ),
            hint: None,
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();

    if text.trim().is_empty() {
        return Err(CliError {
            code: EXIT_PDF_NO_TEXT,
            message: format!("{}: PDF appears scanned/image-only, text extraction failed", file.display()),
            hint: Some("run OCR first, or pass the picklist as .txt".to_string()),
        });
    }

    Ok(text)
}
