// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Archive stage: pack every regular file directly inside a job's output
//! directory into a flat, deflate-compressed zip.

use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::JobError;

/// Build `<zip_dir>/<folder_name>.zip` from the regular files directly
/// inside `log_dir` (no inner directories, no recursion). Runs on a
/// blocking thread since `zip` performs synchronous file I/O.
pub fn build_archive(log_dir: &Path, zip_dir: &Path, folder_name: &str) -> Result<PathBuf, JobError> {
    std::fs::create_dir_all(zip_dir)?;
    let zip_path = zip_dir.join(format!("{folder_name}.zip"));

    let file = std::fs::File::create(&zip_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entries: Vec<_> = std::fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        writer
            .start_file(name.as_ref(), options)
            .map_err(|e| JobError::Archive(e.to_string()))?;
        let contents = std::fs::read(entry.path())?;
        writer.write_all(&contents)?;
    }

    writer.finish().map_err(|e| JobError::Archive(e.to_string()))?;
    Ok(zip_path)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
