// CSV/TSV catalog import and CSV exports

use std::io::Read;
use std::path::Path;

use stockfern_recon::model::{AuditLogEntry, CandidateRecord, QuarantineRecord};

use crate::catalog::Cell;
use crate::IoError;

/// Rows of a delimited file. `delimiter: None` sniffs it from the content.
/// Every non-empty field is kept as text so codes like `00123` survive.
pub fn import_rows(path: &Path, delimiter: Option<u8>) -> Result<Vec<Vec<Cell>>, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    log::debug!("{}: delimiter {:?}", path.display(), delimiter as char);
    rows_from_string(&content, delimiter).map_err(|e| IoError::read(path, e))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub(crate) fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by its field count.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel-exported CSVs are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn rows_from_string(content: &str, delimiter: u8) -> Result<Vec<Vec<Cell>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, IoError> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| IoError::write(path, e))
}

/// `context, quantity, attribute_guess, source_tag, page`
pub fn export_candidates(candidates: &[CandidateRecord], path: &Path) -> Result<(), IoError> {
    let file = std::fs::File::create(path).map_err(|e| IoError::write(path, e))?;
    write_candidates(candidates, file).map_err(|e| IoError::write(path, e))
}

/// Same layout as [`export_candidates`], to any writer (stdout for `extract`).
pub fn write_candidates<W: std::io::Write>(candidates: &[CandidateRecord], out: W) -> Result<(), csv::Error> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    w.write_record(["context", "quantity", "attribute_guess", "source_tag", "page"])?;
    for c in candidates {
        w.serialize(c)?;
    }
    w.flush()?;
    Ok(())
}

/// `context, matched_code, matched_attribute, confidence, method, source_tag`
pub fn export_audit_log(entries: &[AuditLogEntry], path: &Path) -> Result<(), IoError> {
    let mut w = writer(path)?;
    w.write_record([
        "context",
        "matched_code",
        "matched_attribute",
        "confidence",
        "method",
        "source_tag",
    ])
    .map_err(|e| IoError::write(path, e))?;
    for e in entries {
        let confidence = e.confidence.to_string();
        let method = e.method.to_string();
        w.write_record([
            e.context.as_str(),
            e.matched_code.as_str(),
            e.matched_attribute.as_str(),
            confidence.as_str(),
            method.as_str(),
            e.source_tag.as_str(),
        ])
        .map_err(|err| IoError::write(path, err))?;
    }
    w.flush().map_err(|e| IoError::write(path, e))
}

/// `context, attribute_guess, quantity, source_tag`
pub fn export_quarantine(records: &[QuarantineRecord], path: &Path) -> Result<(), IoError> {
    let mut w = writer(path)?;
    w.write_record(["context", "attribute_guess", "quantity", "source_tag"])
        .map_err(|e| IoError::write(path, e))?;
    for q in records {
        w.serialize(q).map_err(|e| IoError::write(path, e))?;
    }
    w.flush().map_err(|e| IoError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stockfern_recon::model::MatchMethod;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "1;AB-123;แดง;5\n2;CD-9;ดำ;0\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "1,AB-123,แดง,5\n2,CD-9,ดำ,0\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "1\tAB-123\tแดง\t5\n2\tCD-9\tดำ\t0\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "1;\"AB-123, case\";แดง;5\n2;\"CD-9\";ดำ;0\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_import_keeps_text_and_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stock.csv");
        fs::write(&path, "1,00123,,5\n2,CD-9,ดำ\n").unwrap();

        let rows = import_rows(&path, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], Cell::Text("00123".into()));
        assert_eq!(rows[0][2], Cell::Empty);
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Café" in Windows-1252
        fs::write(&path, b"1,Caf\xe9,red,2\n").unwrap();
        let rows = import_rows(&path, None).unwrap();
        assert_eq!(rows[0][1], Cell::Text("Café".into()));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = import_rows(Path::new("/nonexistent/stock.csv"), None).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[test]
    fn test_export_audit_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let entries = vec![AuditLogEntry {
            context: "AB123 สีแดง".into(),
            matched_code: "AB-123".into(),
            matched_attribute: "แดง".into(),
            confidence: 100,
            method: MatchMethod::CodeAndAttribute,
            row: Some(0),
            source_tag: "a.pdf".into(),
        }];
        export_audit_log(&entries, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("context,matched_code,matched_attribute,confidence,method,source_tag")
        );
        assert_eq!(lines.next(), Some("AB123 สีแดง,AB-123,แดง,100,code_and_attribute,a.pdf"));
    }

    #[test]
    fn test_export_candidates_and_quarantine() {
        let dir = tempdir().unwrap();
        let candidates = vec![CandidateRecord {
            context: "Widget, large".into(),
            quantity: 3,
            attribute_guess: String::new(),
            source_tag: "p.txt".into(),
            page: 2,
        }];
        let path = dir.path().join("candidates.csv");
        export_candidates(&candidates, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("context,quantity,attribute_guess,source_tag,page\n"));
        assert!(content.contains("\"Widget, large\",3,,p.txt,2"));

        let quarantine = vec![QuarantineRecord {
            context: "mystery".into(),
            attribute_guess: "ดำ".into(),
            quantity: 4,
            source_tag: "p.txt".into(),
        }];
        let path = dir.path().join("unknown.csv");
        export_quarantine(&quarantine, &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "context,attribute_guess,quantity,source_tag\nmystery,ดำ,4,p.txt\n");
    }
}
