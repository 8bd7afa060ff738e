// src/extractors/mod.rs
pub mod lines;
pub mod record;
pub mod table;

use std::path::Path;

use crate::pdf::{PageContent, PageSource};
use crate::schema::FieldSchema;
use crate::utils::error::{ExtractError, PdfError};

pub use lines::LineStrategy;
pub use record::{ExtractionRecord, Findings, MatchSource, RecordStatus};
pub use table::TableStrategy;

/// One way of locating field values in a document's pages.
///
/// Strategies run in order; each only fills fields that are still empty in
/// `findings`.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, schema: &FieldSchema, pages: &[PageContent], findings: &mut Findings);
}

/// A record together with the layout it was extracted from.
#[derive(Debug)]
pub struct Extraction {
    pub record: ExtractionRecord,
    pub pages: Vec<PageContent>,
}

/// Turns a PDF into one `ExtractionRecord`: tables first, then text lines.
pub struct FieldExtractor {
    schema: FieldSchema,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    reader: Box<dyn PageSource>,
}

impl FieldExtractor {
    pub fn new(schema: FieldSchema, reader: Box<dyn PageSource>) -> Result<Self, ExtractError> {
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(TableStrategy),
            Box::new(LineStrategy::new(&schema)?),
        ];
        Ok(Self {
            schema,
            strategies,
            reader,
        })
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn extract_pages(&self, source_name: &str, pages: &[PageContent]) -> ExtractionRecord {
        let mut findings = Findings::new(&self.schema);

        for strategy in &self.strategies {
            if findings.is_complete() {
                break;
            }
            strategy.apply(&self.schema, pages, &mut findings);
            tracing::trace!("{}: '{}' strategy done", source_name, strategy.name());
        }

        for (idx, field) in self.schema.fields().iter().enumerate() {
            match findings.get(idx) {
                Some(found) => tracing::debug!(
                    "{}: {} found on page {}",
                    source_name,
                    field.name,
                    found.source.page()
                ),
                None => tracing::debug!("{}: {} not found", source_name, field.name),
            }
        }

        ExtractionRecord::from_findings(source_name, &self.schema, &findings)
    }

    pub fn read_and_extract(&self, path: &Path) -> Result<Extraction, PdfError> {
        let pages = self.reader.read_pages(path)?;
        let record = self.extract_pages(&source_name(path), &pages);
        Ok(Extraction { record, pages })
    }

    /// Never fails: unreadable documents give a blank, `Failed` record.
    pub fn extract(&self, path: &Path) -> ExtractionRecord {
        match self.read_and_extract(path) {
            Ok(extraction) => extraction.record,
            Err(e) => {
                let err = ExtractError::from(e);
                tracing::warn!("Skipping {}: {}", path.display(), err);
                ExtractionRecord::failed(&source_name(path), &self.schema, err.to_string())
            }
        }
    }
}

/// File name shown in the output's first column.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testutil::TestPdf;
    use crate::pdf::LopdfReader;

    fn extractor() -> FieldExtractor {
        FieldExtractor::new(FieldSchema::standard(), Box::new(LopdfReader::default())).unwrap()
    }

    #[test]
    fn test_component_id_from_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = TestPdf::new()
            .row(700, &["Component ID", "CMP-4471"])
            .write(dir.path(), "one.pdf");

        let record = extractor().extract(&path);
        assert_eq!(record.source_file, "one.pdf");
        assert_eq!(record.status, RecordStatus::Extracted);
        assert_eq!(record.get("component_id"), Some("CMP-4471"));
    }

    #[test]
    fn test_assignment_row_leaves_component_id_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = TestPdf::new()
            .row(700, &["Assignment", "CMP-4471"])
            .write(dir.path(), "two.pdf");

        let record = extractor().extract(&path);
        assert_eq!(record.get("component_id"), Some(""));
        assert_eq!(record.get("assignment"), Some("CMP-4471"));
    }

    #[test]
    fn test_text_only_document_uses_line_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = TestPdf::new()
            .line(700, "Site Number: 101")
            .line(680, "Subject ID: SCR-0001")
            .line(660, "First Informed Consent Date: 12-Jun-2025")
            .line(640, "Randomization/Allocation Number")
            .line(620, "20417")
            .page()
            .line(700, "Date of Component ID Assignment: 14-Jun-2025")
            .write(dir.path(), "text.pdf");

        let record = extractor().extract(&path);
        assert_eq!(record.get("site_number"), Some("101"));
        assert_eq!(record.get("subject"), Some("SCR-0001"));
        assert_eq!(record.get("first_informed_consent_date"), Some("12-Jun-2025"));
        assert_eq!(record.get("randomization_number"), Some("20417"));
        assert_eq!(record.get("component_id_assignment_date"), Some("14-Jun-2025"));
        assert_eq!(record.get("component_id"), Some(""));
    }

    #[test]
    fn test_table_value_takes_precedence_over_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = TestPdf::new()
            .line(720, "Age: 40 Years")
            .row(700, &["Age", "41 Years"])
            .row(680, &["Sex Reported at Birth", "Female"])
            .write(dir.path(), "mixed.pdf");

        let mut findings = Findings::new(&FieldSchema::standard());
        let extractor = extractor();
        let extraction = extractor.read_and_extract(&path).unwrap();
        for strategy in &extractor.strategies {
            strategy.apply(extractor.schema(), &extraction.pages, &mut findings);
        }
        let age = extractor.schema().index_of("age").unwrap();

        assert_eq!(extraction.record.get("age"), Some("41 Years"));
        assert_eq!(findings.get(age).unwrap().source, MatchSource::Table { page: 1 });
        assert_eq!(extraction.record.get("sex_reported_at_birth"), Some("Female"));
    }

    #[test]
    fn test_invalid_values_stay_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = TestPdf::new()
            .row(700, &["Site Number", "Pending"])
            .row(680, &["Birth Year", "N/A"])
            .write(dir.path(), "invalid.pdf");

        let record = extractor().extract(&path);
        assert_eq!(record.status, RecordStatus::Extracted);
        assert_eq!(record.filled_count(), 0);
    }

    #[test]
    fn test_unreadable_pdf_gives_blank_failed_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.pdf");
        std::fs::write(&path, b"%PDF-1.4 truncated").unwrap();

        let record = extractor().extract(&path);
        assert_eq!(record.source_file, "corrupt.pdf");
        assert_eq!(record.values.len(), 11);
        assert!(record.values.iter().all(|(_, v)| v.is_empty()));
        assert!(matches!(record.status, RecordStatus::Failed(_)));
    }

    #[test]
    fn test_extract_pages_without_reader() {
        let pages = vec![PageContent {
            number: 1,
            tables: Vec::new(),
            lines: vec!["Cohort Assignment: Cohort B".to_string()],
        }];
        let record = extractor().extract_pages("in-memory", &pages);
        assert_eq!(record.get("assignment"), Some("Cohort B"));
    }
}
