// src/extractors/table.rs
use super::record::{Findings, MatchSource};
use super::ExtractionStrategy;
use crate::pdf::PageContent;
use crate::schema::{normalize, FieldSchema};

// First-cell texts that mark a table's header row rather than data.
const HEADER_ROW_LABELS: &[&str] = &["item", "field", "parameter"];

/// Label cell followed by its value cell in the same table row.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableStrategy;

impl ExtractionStrategy for TableStrategy {
    fn name(&self) -> &'static str {
        "table"
    }

    fn apply(&self, schema: &FieldSchema, pages: &[PageContent], findings: &mut Findings) {
        for page in pages {
            for table in &page.tables {
                for row in &table.rows {
                    scan_row(schema, page.number, row, findings);
                }
            }
            if findings.is_complete() {
                break;
            }
        }
    }
}

fn scan_row(schema: &FieldSchema, page: u32, row: &[String], findings: &mut Findings) {
    let cells: Vec<String> = row.iter().map(|c| normalize(c)).collect();

    let is_header = cells
        .first()
        .map(|c| HEADER_ROW_LABELS.contains(&c.to_lowercase().as_str()))
        .unwrap_or(false);
    if is_header {
        return;
    }

    let mut i = 0;
    while i < cells.len() {
        let Some(idx) = schema.field_for_label(&cells[i]) else {
            i += 1;
            continue;
        };
        if findings.is_found(idx) {
            i += 1;
            continue;
        }

        // The value is the next non-empty cell to the right.
        let candidate = cells
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(_, c)| !c.is_empty());

        match candidate {
            Some((j, text)) => match schema.accept_candidate(idx, text) {
                Some(value) => {
                    tracing::debug!(
                        "Table match on page {}: {} = '{}'",
                        page,
                        schema.fields()[idx].name,
                        value
                    );
                    findings.record(idx, value, MatchSource::Table { page });
                    i = j + 1;
                }
                None => i += 1,
            },
            None => break,
        }
    }
}
