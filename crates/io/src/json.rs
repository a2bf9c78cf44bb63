// JSON export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::IoError;

/// Pretty-printed JSON of any result value (the full reconciliation result,
/// a candidate list).
pub fn export<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value).map_err(|e| IoError::write(path, e))
}
