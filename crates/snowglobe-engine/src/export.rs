//! Artifact export for the Snowglobe engine
//!
//! Writes the dense grid and the bounding-box list to disk, either as the
//! raw bytes a renderer uploads or as JSON for inspection.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use snowglobe_core::{DenseGrid, SceneObject};

/// Supported export file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Native-endian `f32` values or packed [`SceneObject`] records
    #[default]
    Raw,

    /// Pretty-printed JSON
    Json,
}

impl ExportFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Raw => "bin",
            ExportFormat::Json => "json",
        }
    }

    /// Parse format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "bin" | "raw" => Some(ExportFormat::Raw),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }

    /// Infer format from a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Options for artifact export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Output file path
    pub path: PathBuf,

    /// Export format (if None, inferred from path extension)
    pub format: Option<ExportFormat>,
}

impl ExportOptions {
    /// Create export options for a given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Set the export format explicitly
    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Get the effective format (explicit, inferred from path, or raw)
    pub fn effective_format(&self) -> ExportFormat {
        self.format
            .or_else(|| ExportFormat::from_path(&self.path))
            .unwrap_or_default()
    }

    /// Output path with the format's extension added when missing
    fn output_path(&self, format: ExportFormat) -> PathBuf {
        let mut path = self.path.clone();
        if path.extension().is_none() {
            path.set_extension(format.extension());
        }
        path
    }
}

/// Result of a successful export operation
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// Path where the file was written
    pub path: PathBuf,

    /// Format used for export
    pub format: ExportFormat,

    /// Number of grid values or objects written
    pub count: usize,

    /// Size of the written file
    pub bytes: u64,
}

impl std::fmt::Display for ExportResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Exported {} ({} entries, {} bytes)",
            self.path.display(),
            self.count,
            self.bytes
        )
    }
}

/// Write a dense grid
pub fn export_grid(grid: &DenseGrid, options: &ExportOptions) -> Result<ExportResult> {
    let format = options.effective_format();
    let path = options.output_path(format);

    write_file(&path, |writer| match format {
        ExportFormat::Raw => Ok(writer.write_all(grid.as_bytes())?),
        ExportFormat::Json => Ok(serde_json::to_writer_pretty(writer, grid)?),
    })?;

    finish(path, format, grid.len())
}

/// Write the bounding-box list
pub fn export_objects(objects: &[SceneObject], options: &ExportOptions) -> Result<ExportResult> {
    let format = options.effective_format();
    let path = options.output_path(format);

    write_file(&path, |writer| match format {
        ExportFormat::Raw => Ok(writer.write_all(bytemuck::cast_slice(objects))?),
        ExportFormat::Json => Ok(serde_json::to_writer_pretty(writer, objects)?),
    })?;

    finish(path, format, objects.len())
}

fn write_file(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

fn finish(path: PathBuf, format: ExportFormat, count: usize) -> Result<ExportResult> {
    let bytes = std::fs::metadata(&path)?.len();
    tracing::info!("Wrote {} ({} entries)", path.display(), count);
    Ok(ExportResult {
        path,
        format,
        count,
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use snowglobe_core::Scene;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("snowglobe-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ExportFormat::Raw.extension(), "bin");
        assert_eq!(ExportFormat::Json.extension(), "json");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("grid.BIN")),
            Some(ExportFormat::Raw)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("/tmp/objects.json")),
            Some(ExportFormat::Json)
        );
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
        assert_eq!(ExportOptions::new("noext").effective_format(), ExportFormat::Raw);
    }

    #[test]
    fn test_raw_grid_export() {
        let grid = Scene::demo().generate_dense_grid(4).unwrap();
        let result = export_grid(&grid, &ExportOptions::new(scratch("grid"))).unwrap();

        assert_eq!(result.path.extension().unwrap(), "bin");
        assert_eq!(result.count, 64);
        assert_eq!(result.bytes, 64 * 4);

        let bytes = std::fs::read(&result.path).unwrap();
        assert_eq!(bytes, grid.as_bytes());
    }

    #[test]
    fn test_json_objects_export() {
        let objects = Scene::demo().objects().unwrap();
        let options = ExportOptions::new(scratch("objects.json"));
        let result = export_objects(&objects, &options).unwrap();
        assert_eq!(result.format, ExportFormat::Json);

        let text = std::fs::read_to_string(&result.path).unwrap();
        let parsed: Vec<SceneObject> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, objects);
    }

    #[test]
    fn test_raw_objects_are_packed() {
        let objects = Scene::demo().objects().unwrap();
        let options = ExportOptions::new(scratch("objects")).with_format(ExportFormat::Raw);
        let result = export_objects(&objects, &options).unwrap();
        assert_eq!(result.bytes, (objects.len() * 32) as u64);
    }
}
