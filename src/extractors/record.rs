// src/extractors/record.rs
use crate::schema::FieldSchema;

/// Where an accepted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Table { page: u32 },
    Line { page: u32 },
}

impl MatchSource {
    pub fn page(&self) -> u32 {
        match self {
            MatchSource::Table { page } | MatchSource::Line { page } => *page,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub value: String,
    pub source: MatchSource,
}

/// Working set of matches for one document, indexed like the schema.
#[derive(Debug, Clone)]
pub struct Findings {
    slots: Vec<Option<FieldMatch>>,
}

impl Findings {
    pub fn new(schema: &FieldSchema) -> Self {
        Self {
            slots: vec![None; schema.len()],
        }
    }

    pub fn is_found(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Some(_)))
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// First value wins; later calls for the same field are ignored.
    pub fn record(&mut self, idx: usize, value: String, source: MatchSource) -> bool {
        match self.slots.get_mut(idx) {
            Some(slot) if slot.is_none() => {
                *slot = Some(FieldMatch { value, source });
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, idx: usize) -> Option<&FieldMatch> {
        self.slots.get(idx).and_then(Option::as_ref)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStatus {
    Extracted,
    Failed(String),
}

/// One output row: the source file and a value (possibly empty) per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    pub source_file: String,
    /// (canonical field name, value) in schema order.
    pub values: Vec<(String, String)>,
    pub status: RecordStatus,
}

impl ExtractionRecord {
    pub fn from_findings(source_file: &str, schema: &FieldSchema, findings: &Findings) -> Self {
        let values = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                let value = findings.get(idx).map(|m| m.value.clone()).unwrap_or_default();
                (field.name.clone(), value)
            })
            .collect();

        Self {
            source_file: source_file.to_string(),
            values,
            status: RecordStatus::Extracted,
        }
    }

    /// A row with every field blank, for documents that could not be read.
    pub fn failed(source_file: &str, schema: &FieldSchema, reason: String) -> Self {
        Self {
            source_file: source_file.to_string(),
            values: schema
                .fields()
                .iter()
                .map(|f| (f.name.clone(), String::new()))
                .collect(),
            status: RecordStatus::Failed(reason),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Filename followed by the field values, ready to be written out.
    pub fn row(&self) -> Vec<String> {
        std::iter::once(self.source_file.clone())
            .chain(self.values.iter().map(|(_, v)| v.clone()))
            .collect()
    }

    pub fn missing_fields(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.values.len() - self.missing_fields().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let schema = FieldSchema::standard();
        let mut findings = Findings::new(&schema);

        assert!(findings.record(0, "101".into(), MatchSource::Table { page: 1 }));
        assert!(!findings.record(0, "202".into(), MatchSource::Line { page: 1 }));
        assert_eq!(findings.get(0).unwrap().value, "101");
        assert!(!findings.record(99, "x".into(), MatchSource::Line { page: 1 }));
        assert!(!findings.is_complete());
    }

    #[test]
    fn test_record_rows_follow_schema_order() {
        let schema = FieldSchema::standard();
        let mut findings = Findings::new(&schema);
        let component = schema.index_of("component_id").unwrap();
        findings.record(component, "CMP-4471".into(), MatchSource::Table { page: 1 });

        let record = ExtractionRecord::from_findings("a.pdf", &schema, &findings);
        let row = record.row();

        assert_eq!(row.len(), 12);
        assert_eq!(row[0], "a.pdf");
        assert_eq!(row[component + 1], "CMP-4471");
        assert_eq!(record.get("component_id"), Some("CMP-4471"));
        assert_eq!(record.filled_count(), 1);
        assert_eq!(record.missing_fields().len(), 10);
    }

    #[test]
    fn test_failed_record_is_blank() {
        let schema = FieldSchema::standard();
        let record = ExtractionRecord::failed("bad.pdf", &schema, "boom".into());

        assert_eq!(record.source_file, "bad.pdf");
        assert!(record.values.iter().all(|(_, v)| v.is_empty()));
        assert_eq!(record.status, RecordStatus::Failed("boom".into()));
    }
}
