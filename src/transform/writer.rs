//! CBF file writing

use crate::error::{Error, Result, ResultExt};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a CBF CSV file, gzip-compressed when the name ends in `.gz`
///
/// Returns the number of data rows written.
pub fn write_cbf_file(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let buffered = BufWriter::new(file);

    let compressed = path.extension().is_some_and(|ext| ext == "gz");
    if compressed {
        let encoder = write_rows(GzEncoder::new(buffered, Compression::default()), headers, rows)?;
        encoder.finish()?.flush()?;
    } else {
        write_rows(buffered, headers, rows)?.flush()?;
    }

    Ok(rows.len())
}

fn write_rows<W: Write>(inner: W, headers: &[String], rows: &[Vec<String>]) -> Result<W> {
    let mut writer = csv::Writer::from_writer(inner);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::output(format!("Failed to flush CBF rows: {}", e.error())))
}
