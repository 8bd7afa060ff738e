// src/pdf/models.rs
use serde::Serialize;

/// A run of text shown by a single text operator, in user-space coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSpan {
    pub text: String,
    pub x: f64,
    /// Baseline, growing upwards as in PDF user space.
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
}

impl TextSpan {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// A table reconstructed from aligned text: rows of cell strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
}

/// Everything the extractor needs from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageContent {
    /// 1-based page number.
    pub number: u32,
    pub tables: Vec<Table>,
    /// Normalized, non-empty text lines in reading order.
    pub lines: Vec<String>,
}

impl PageContent {
    pub fn has_text(&self) -> bool {
        !self.lines.is_empty() || self.tables.iter().any(|t| !t.rows.is_empty())
    }
}
