//! Measurement export pipeline
//!
//! Five renderers, each a pure function of a measurement-log snapshot, plus
//! an [`ExportManager`] that writes them into the export directory and
//! copies them to the downloads folder at shutdown. Rendering the same
//! snapshot twice produces byte-identical output, so every write simply
//! overwrites its target.

pub mod csv;
pub mod geojson;
pub mod html;
pub mod json;
pub mod kml;

use crate::error::{AppError, Result};
use crate::models::MeasurementEntry;
use crate::types::ExportFormat;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Base name of every export file in the export directory
pub const EXPORT_BASENAME: &str = "range_test";

/// Filename stem used for timestamped downloads copies
pub const DOWNLOAD_STEM: &str = "rtest";

/// Render a snapshot into the requested format
pub fn render(format: ExportFormat, entries: &[MeasurementEntry]) -> String {
    match format {
        ExportFormat::Csv => csv::render(entries),
        ExportFormat::Json => json::render(entries),
        ExportFormat::GeoJson => geojson::render(entries),
        ExportFormat::Kml => kml::render(entries),
        ExportFormat::Html => html::render(entries),
    }
}

/// Writes export files and manages the downloads copy
pub struct ExportManager {
    export_dir: PathBuf,
}

impl ExportManager {
    /// Create the export directory if needed
    pub fn new(export_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&export_dir)
            .map_err(|e| AppError::io(format!("Failed to create {}: {}", export_dir.display(), e)))?;
        Ok(Self { export_dir })
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Target path for one format
    pub fn file_path(&self, format: ExportFormat) -> PathBuf {
        self.export_dir
            .join(format!("{}.{}", EXPORT_BASENAME, format.extension()))
    }

    /// Render and overwrite the file for one format
    pub fn write(&self, format: ExportFormat, entries: &[MeasurementEntry]) -> Result<PathBuf> {
        let path = self.file_path(format);
        let contents = render(format, entries);
        std::fs::write(&path, contents)
            .map_err(|e| AppError::export(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(path)
    }

    /// Render every format, collecting per-format failures instead of
    /// aborting on the first one
    pub fn write_all(&self, entries: &[MeasurementEntry]) -> Vec<(ExportFormat, Result<PathBuf>)> {
        ExportFormat::ALL
            .iter()
            .map(|&format| (format, self.write(format, entries)))
            .collect()
    }

    /// Copy the requested formats into the downloads folder with a
    /// run-timestamp suffix; returns the destination paths that worked
    pub fn copy_to_downloads(&self, formats: &[ExportFormat]) -> Result<Vec<PathBuf>> {
        if formats.is_empty() {
            return Ok(Vec::new());
        }

        let downloads = downloads_dir().ok_or_else(|| {
            AppError::export(format!(
                "Could not find a downloads folder; files are in {}",
                self.export_dir.display()
            ))
        })?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let mut copied = Vec::new();
        for &format in formats {
            let src = self.file_path(format);
            if !src.exists() {
                continue;
            }
            let dst = downloads.join(format!("{}_{}.{}", DOWNLOAD_STEM, stamp, format.extension()));
            std::fs::copy(&src, &dst)
                .map_err(|e| AppError::export(format!("Failed to copy to {}: {}", dst.display(), e)))?;
            copied.push(dst);
        }
        Ok(copied)
    }
}

/// Locate the user's downloads folder
///
/// Checks the Termux shared-storage path first, then the platform download
/// directory, then a literal `~/Downloads`.
fn downloads_dir() -> Option<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        let termux = home.join("storage/downloads");
        if termux.is_dir() {
            return Some(termux);
        }
    }

    if let Some(dir) = dirs::download_dir() {
        if dir.is_dir() {
            return Some(dir);
        }
    }

    let fallback = dirs::home_dir()?.join("Downloads");
    fallback.is_dir().then_some(fallback)
}

/// Escape XML-special characters for element content
pub(crate) fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
