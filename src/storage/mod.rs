// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};

use crate::batch::RunReport;
use crate::extractors::ExtractionRecord;
use crate::pdf::PageContent;
use crate::schema::FieldSchema;
use crate::utils::error::StorageError;

/// Header of the leading column holding each row's source PDF.
pub const FILENAME_HEADER: &str = "filename";
pub const SHEET_NAME: &str = "extract";

const MIN_COLUMN_WIDTH: usize = 15;
const MAX_COLUMN_WIDTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, StorageError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(StorageError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Header plus one row per record, all as plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    pub fn new(schema: &FieldSchema, records: &[ExtractionRecord]) -> Self {
        Self {
            headers: schema.headers(),
            rows: records.iter().map(ExtractionRecord::row).collect(),
        }
    }

    /// Display width per column: longest cell plus padding, clamped.
    fn column_widths(&self) -> Vec<usize> {
        (0..self.headers.len())
            .map(|col| {
                let longest = std::iter::once(&self.headers[col])
                    .chain(self.rows.iter().filter_map(|row| row.get(col)))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0);
                (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

pub struct StorageManager {
    output_path: PathBuf,
    format: OutputFormat,
}

impl StorageManager {
    /// Validates the output format and makes sure the output directory exists.
    pub fn new<P: AsRef<Path>>(output_path: P) -> Result<Self, StorageError> {
        let output_path = output_path.as_ref().to_path_buf();
        let format = OutputFormat::from_path(&output_path)?;

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        Ok(Self {
            output_path,
            format,
        })
    }

    /// Writes the whole table, replacing any existing file.
    pub fn write_table(&self, table: &OutputTable) -> Result<PathBuf, StorageError> {
        match self.format {
            OutputFormat::Xlsx => write_xlsx(&self.output_path, table)?,
            OutputFormat::Csv => write_csv(&self.output_path, table)?,
        }
        tracing::info!(
            "Wrote {} rows to {}",
            table.rows.len(),
            self.output_path.display()
        );
        Ok(self.output_path.clone())
    }

    /// Saves a JSON summary of the run next to the spreadsheet (or wherever asked).
    pub fn save_summary(&self, path: &Path, report: &RunReport) -> Result<PathBuf, StorageError> {
        ensure_parent(path)?;

        let summary = serde_json::json!({
            "input_dir": report.input_dir.display().to_string(),
            "output_path": self.output_path.display().to_string(),
            "total_files": report.files.len(),
            "failed_files": report.failed_count(),
            "files": report.files,
            "run_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let summary_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(path, summary_str)?;

        tracing::info!("Saved run summary to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Dumps the reconstructed tables and lines of one PDF for alias debugging.
    pub fn save_debug_layout(
        &self,
        debug_dir: &Path,
        source_name: &str,
        pages: &[PageContent],
    ) -> Result<PathBuf, StorageError> {
        fs::create_dir_all(debug_dir)?;
        let file_path = debug_dir.join(format!("{}.layout.json", source_name));

        let layout = serde_json::to_string_pretty(pages)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, layout)?;

        tracing::debug!("Saved layout dump to {}", file_path.display());
        Ok(file_path)
    }
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

fn write_xlsx(path: &Path, table: &OutputTable) -> Result<(), StorageError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string(r as u32 + 1, col as u16, value)?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    for (col, width) in table.column_widths().into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(path: &Path, table: &OutputTable) -> Result<(), StorageError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
