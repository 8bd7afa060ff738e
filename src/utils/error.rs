// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Failed to read page {page}: {message}")]
    Page { page: u32, message: String },

    #[error("No extractable text found in document")]
    NoText,
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Invalid alias pattern '{alias}' for field {field}: {source}")]
    AliasPattern {
        field: String,
        alias: String,
        #[source]
        source: regex::Error,
    },

    #[error("PDF could not be read: {0}")]
    Pdf(#[from] PdfError),

    #[error("Extraction task aborted: {0}")]
    Aborted(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
