// src/pdf/layout.rs
//! Rebuilds rows, cells, tables and lines from positioned text spans.

use std::cmp::Ordering;

use super::models::{PageContent, Table, TextSpan};
use crate::schema::normalize;

// Gap (in font sizes) above which two pieces of text in a cell get a space.
const WORD_GAP_RATIO: f64 = 0.15;
const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Tolerances used when grouping spans into rows and cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    /// Max baseline difference within a row, as a fraction of the average font size.
    pub row_tolerance: f64,
    /// Horizontal gap, in font sizes, that separates two cells.
    pub cell_gap: f64,
    /// Consecutive multi-cell rows needed before they count as a table.
    pub min_table_rows: usize,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            row_tolerance: 0.5,
            cell_gap: 1.0,
            min_table_rows: 1,
        }
    }
}

pub fn build_page(number: u32, spans: Vec<TextSpan>, settings: &LayoutSettings) -> PageContent {
    let spans: Vec<TextSpan> = spans
        .into_iter()
        .filter(|s| !s.text.trim().is_empty())
        .collect();

    let mut page = PageContent {
        number,
        ..PageContent::default()
    };
    if spans.is_empty() {
        return page;
    }

    let avg_font_size = spans.iter().map(|s| s.font_size).sum::<f64>() / spans.len() as f64;
    let avg_font_size = if avg_font_size > 0.0 { avg_font_size } else { DEFAULT_FONT_SIZE };

    let mut pending: Vec<Vec<String>> = Vec::new();
    for row in cluster_into_rows(spans, avg_font_size * settings.row_tolerance) {
        let cells = split_cells(&row, settings.cell_gap);
        let line = normalize(&cells.join(" "));
        if !line.is_empty() {
            page.lines.push(line);
        }

        if cells.len() >= 2 {
            pending.push(cells);
        } else {
            flush_table(&mut pending, &mut page.tables, settings.min_table_rows);
        }
    }
    flush_table(&mut pending, &mut page.tables, settings.min_table_rows);

    page
}

fn flush_table(pending: &mut Vec<Vec<String>>, tables: &mut Vec<Table>, min_rows: usize) {
    if !pending.is_empty() && pending.len() >= min_rows {
        tables.push(Table {
            rows: std::mem::take(pending),
        });
    }
    pending.clear();
}

/// Group spans into rows by baseline, top to bottom, each row sorted left to right.
fn cluster_into_rows(mut spans: Vec<TextSpan>, tolerance: f64) -> Vec<Vec<TextSpan>> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut rows: Vec<Vec<TextSpan>> = Vec::new();
    let mut current_row: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f64> = None;

    for span in spans {
        match current_y {
            Some(y) if (span.y - y).abs() <= tolerance => current_row.push(span),
            _ => {
                if !current_row.is_empty() {
                    rows.push(std::mem::take(&mut current_row));
                }
                current_y = Some(span.y);
                current_row.push(span);
            }
        }
    }
    if !current_row.is_empty() {
        rows.push(current_row);
    }

    for row in &mut rows {
        row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    rows
}

/// Split a sorted row into cells wherever the horizontal gap is wide.
fn split_cells(row: &[TextSpan], gap_ratio: f64) -> Vec<String> {
    let mut cells: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut right_edge: Option<f64> = None;

    for span in row {
        if let Some(right) = right_edge {
            let gap = span.x - right;
            if gap > span.font_size * gap_ratio {
                cells.push(normalize(&current));
                current.clear();
            } else if gap > span.font_size * WORD_GAP_RATIO && !current.ends_with(' ') {
                current.push(' ');
            }
        }
        current.push_str(&span.text);
        right_edge = Some(right_edge.map_or(span.right(), |r| r.max(span.right())));
    }
    cells.push(normalize(&current));

    cells.retain(|c| !c.is_empty());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f64, y: f64) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            width: text.chars().count() as f64 * 6.0,
            font_size: 10.0,
        }
    }

    #[test]
    fn test_two_column_rows_form_a_table() {
        let spans = vec![
            span("Subject ID", 72.0, 700.0),
            span("SCR-0001", 300.0, 700.0),
            span("Age", 72.0, 680.0),
            span("42 Years", 300.0, 680.0),
        ];

        let page = build_page(1, spans, &LayoutSettings::default());

        assert_eq!(page.tables.len(), 1);
        assert_eq!(page.tables[0].rows[0], vec!["Subject ID", "SCR-0001"]);
        assert_eq!(page.tables[0].rows[1], vec!["Age", "42 Years"]);
        assert_eq!(page.lines, vec!["Subject ID SCR-0001", "Age 42 Years"]);
    }

    #[test]
    fn test_single_cell_rows_split_tables() {
        let spans = vec![
            span("Site Number", 72.0, 700.0),
            span("101", 300.0, 700.0),
            span("Notes: nothing to report", 72.0, 680.0),
            span("Cohort", 72.0, 660.0),
            span("B", 300.0, 660.0),
        ];

        let page = build_page(2, spans, &LayoutSettings::default());

        assert_eq!(page.number, 2);
        assert_eq!(page.tables.len(), 2);
        assert_eq!(page.lines[1], "Notes: nothing to report");
    }

    #[test]
    fn test_adjacent_pieces_join_into_one_cell() {
        // "Compo" ends at 102; "nent" starts right there, "ID" after a word gap.
        let spans = vec![
            span("Compo", 72.0, 500.0),
            span("nent", 102.0, 500.0),
            span("ID", 129.0, 500.0),
        ];
        let cells = split_cells(&spans, 1.0);
        assert_eq!(cells, vec!["Component ID"]);
    }

    #[test]
    fn test_baseline_jitter_stays_in_row() {
        let spans = vec![
            span("A", 0.0, 100.0),
            span("B", 200.0, 100.4),
            span("C", 0.0, 80.0),
        ];
        let rows = cluster_into_rows(spans, 5.0);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0][0].text, "A");
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_min_table_rows_drops_short_runs() {
        let spans = vec![span("Age", 72.0, 700.0), span("30", 300.0, 700.0)];
        let settings = LayoutSettings {
            min_table_rows: 2,
            ..LayoutSettings::default()
        };

        let page = build_page(1, spans, &settings);
        assert!(page.tables.is_empty());
        assert_eq!(page.lines, vec!["Age 30"]);
    }
}
