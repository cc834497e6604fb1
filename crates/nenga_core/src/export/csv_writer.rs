//! CSV serialization, character encoding and atomic file output.
//!
//! # Invariants
//! - Rows use the excel dialect: minimal quoting, CRLF record terminators.
//! - Unrepresentable characters fail the export; nothing is substituted.
//! - Output is fully buffered and renamed into place only on success.

use crate::export::genenga::GenengaRow;
use crate::export::{ExportError, ExportResult};
use encoding_rs::{Encoding, UTF_8};
use log::{error, info};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Resolves a WHATWG encoding label (`utf-8`, `shift_jis`, `euc-jp`, ...).
///
/// Labels that cannot be used for output (the UTF-16 family and the
/// replacement encoding) are rejected.
pub fn resolve_encoding(label: &str) -> ExportResult<&'static Encoding> {
    let trimmed = label.trim();
    let encoding = Encoding::for_label(trimmed.as_bytes())
        .ok_or_else(|| ExportError::UnsupportedEncoding(trimmed.to_string()))?;
    if encoding.output_encoding() != encoding {
        return Err(ExportError::UnsupportedEncoding(trimmed.to_string()));
    }
    Ok(encoding)
}

/// Serializes rows as CSV and encodes the result.
pub fn encode_rows(rows: &[GenengaRow], encoding: &'static Encoding) -> ExportResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row.columns())?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;

    if encoding == UTF_8 {
        return Ok(buffer);
    }

    let text = String::from_utf8(buffer)
        .map_err(|err| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))?;
    let (bytes, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(unrepresentable(&text, encoding));
    }
    Ok(bytes.into_owned())
}

/// Encodes rows and writes them to `path` through a sibling temp file.
///
/// Returns the number of bytes written.
pub fn write_rows_atomically(
    path: impl AsRef<Path>,
    rows: &[GenengaRow],
    encoding_label: &str,
) -> ExportResult<usize> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let result = resolve_encoding(encoding_label)
        .and_then(|encoding| encode_rows(rows, encoding).map(|bytes| (encoding, bytes)))
        .and_then(|(encoding, bytes)| {
            persist_bytes(path, &bytes)?;
            Ok((encoding, bytes.len()))
        });

    match result {
        Ok((encoding, written)) => {
            info!(
                "event=genenga_export module=export status=ok encoding={} rows={} bytes={} duration_ms={}",
                encoding.name(),
                rows.len(),
                written,
                started_at.elapsed().as_millis()
            );
            Ok(written)
        }
        Err(err) => {
            error!(
                "event=genenga_export module=export status=error duration_ms={} error_kind={:?} error={}",
                started_at.elapsed().as_millis(),
                err.kind(),
                err
            );
            Err(err)
        }
    }
}

fn persist_bytes(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|err| ExportError::Io(err.error))?;
    Ok(())
}

fn unrepresentable(text: &str, encoding: &'static Encoding) -> ExportError {
    let mut buf = [0u8; 4];
    let character = text
        .chars()
        .find(|ch| encoding.encode(ch.encode_utf8(&mut buf)).2)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    ExportError::Unrepresentable {
        encoding: encoding.name(),
        character,
    }
}
