//! Patch an XLSX ZIP archive with replacement parts.
//!
//! Unmodified entries are copied via `raw_copy_file` (zero recompression cost).
//! Replaced parts are deflated fresh.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Result;

/// Rebuild the archive, swapping in `replacements` (zip path -> new bytes).
///
/// Entry order is preserved. Replacement paths that do not exist in the
/// original archive are ignored.
pub(crate) fn patch_zip(
    original_data: &[u8],
    replacements: &HashMap<String, Vec<u8>>,
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(original_data))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(original_data.len())));

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;

        if let Some(bytes) = replacements.get(entry.name()) {
            let name = entry.name().to_string();
            drop(entry);
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options)?;
            writer.write_all(bytes)?;
            continue;
        }

        writer.raw_copy_file(entry)?;
    }

    Ok(writer.finish()?.into_inner())
}
