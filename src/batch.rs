// src/batch.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::RunConfig;
use crate::extractors::{self, ExtractionRecord, FieldExtractor, RecordStatus};
use crate::storage::{OutputTable, StorageManager};
use crate::utils::error::ExtractError;
use crate::utils::AppError;

/// Per-file line of the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub filled: usize,
    pub missing: Vec<String>,
}

impl FileOutcome {
    fn from_record(record: &ExtractionRecord) -> Self {
        let (status, error) = match &record.status {
            RecordStatus::Extracted => ("extracted", None),
            RecordStatus::Failed(reason) => ("failed", Some(reason.clone())),
        };
        Self {
            file: record.source_file.clone(),
            status,
            error,
            filled: record.filled_count(),
            missing: record.missing_fields().into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub files: Vec<FileOutcome>,
}

impl RunReport {
    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| f.status == "failed").count()
    }
}

/// Extracts every PDF in the input directory and writes one spreadsheet.
pub async fn run(config: &RunConfig, extractor: Arc<FieldExtractor>) -> Result<RunReport, AppError> {
    let is_dir = tokio::fs::metadata(&config.input_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        tracing::error!("Input directory not found: {}", config.input_dir.display());
        return Err(AppError::Config(format!(
            "Input directory not found: {}",
            config.input_dir.display()
        )));
    }

    let storage = StorageManager::new(&config.output_path)?;
    let pdfs = list_pdfs(&config.input_dir).await?;
    tracing::info!(
        "Found {} PDF files in {}",
        pdfs.len(),
        config.input_dir.display()
    );

    let mut records = Vec::with_capacity(pdfs.len());
    for path in pdfs {
        tracing::info!("Processing {}", path.display());
        let record = process_file(&storage, config, Arc::clone(&extractor), path).await;
        tracing::info!(
            "{}: {}/{} fields filled",
            record.source_file,
            record.filled_count(),
            record.values.len()
        );
        records.push(record);
    }

    storage.write_table(&OutputTable::new(extractor.schema(), &records))?;

    let report = RunReport {
        input_dir: config.input_dir.clone(),
        output_path: config.output_path.clone(),
        files: records.iter().map(FileOutcome::from_record).collect(),
    };
    if let Some(summary_path) = &config.summary_path {
        storage.save_summary(summary_path, &report)?;
    }

    tracing::info!(
        "Processing finished. Files: {}, Failures: {}",
        report.files.len(),
        report.failed_count()
    );
    Ok(report)
}

/// Parses one PDF on the blocking pool. Any failure, including a panic, gives a blank row.
async fn process_file(
    storage: &StorageManager,
    config: &RunConfig,
    extractor: Arc<FieldExtractor>,
    path: PathBuf,
) -> ExtractionRecord {
    let name = extractors::source_name(&path);
    let task_extractor = Arc::clone(&extractor);
    let task_path = path.clone();
    let outcome = tokio::task::spawn_blocking(move || task_extractor.read_and_extract(&task_path)).await;

    let error = match outcome {
        Ok(Ok(extraction)) => {
            if let Some(debug_dir) = &config.debug_dir {
                if let Err(e) = storage.save_debug_layout(debug_dir, &name, &extraction.pages) {
                    tracing::warn!("Failed to save layout dump for {}: {}", name, e);
                }
            }
            return extraction.record;
        }
        Ok(Err(e)) => ExtractError::from(e),
        Err(e) => ExtractError::Aborted(e.to_string()),
    };

    tracing::warn!("Skipping {}: {}", path.display(), error);
    ExtractionRecord::failed(&name, extractor.schema(), error.to_string())
}

/// Regular `.pdf` files (any case) directly inside `dir`, sorted by name.
pub async fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pdfs = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && entry.file_type().await?.is_file() {
            pdfs.push(path);
        }
    }

    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}
