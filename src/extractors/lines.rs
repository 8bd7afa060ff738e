// src/extractors/lines.rs
use regex::Regex;

use super::record::{Findings, MatchSource};
use super::ExtractionStrategy;
use crate::pdf::PageContent;
use crate::schema::{normalize, FieldSchema};
use crate::utils::error::ExtractError;

struct LabelPattern {
    field: usize,
    // normalized alias length, used for ordering
    weight: usize,
    regex: Regex,
}

/// "Label: value" scanning over plain text lines, for fields the tables missed.
pub struct LineStrategy {
    // Longest alias first, so "Component ID Assignment Date" beats "Component ID".
    patterns: Vec<LabelPattern>,
}

impl LineStrategy {
    pub fn new(schema: &FieldSchema) -> Result<Self, ExtractError> {
        let mut patterns = Vec::new();
        for (idx, field) in schema.fields().iter().enumerate() {
            for alias in &field.aliases {
                let regex = Regex::new(&label_pattern(alias)).map_err(|source| {
                    ExtractError::AliasPattern {
                        field: field.name.clone(),
                        alias: alias.clone(),
                        source,
                    }
                })?;
                patterns.push(LabelPattern {
                    field: idx,
                    weight: normalize(alias).chars().count(),
                    regex,
                });
            }
        }
        patterns.sort_by(|a, b| b.weight.cmp(&a.weight));
        Ok(Self { patterns })
    }

    /// The field a line is labelled with, and the text after the label.
    fn owner_of<'l>(&self, line: &'l str) -> Option<(usize, &'l str)> {
        self.patterns.iter().find_map(|p| {
            p.regex
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|rest| (p.field, rest.as_str()))
        })
    }
}

fn label_pattern(alias: &str) -> String {
    let words: Vec<String> = alias.split_whitespace().map(regex::escape).collect();
    let boundary = match alias.trim_end().chars().last() {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    };
    format!(r"(?i)^\s*{}{}[:\s]*(.*)$", words.join(r"\s+"), boundary)
}

impl ExtractionStrategy for LineStrategy {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn apply(&self, schema: &FieldSchema, pages: &[PageContent], findings: &mut Findings) {
        for page in pages {
            for (i, line) in page.lines.iter().enumerate() {
                if findings.is_complete() {
                    return;
                }
                let Some((idx, rest)) = self.owner_of(line) else {
                    continue;
                };
                if findings.is_found(idx) {
                    continue;
                }

                let candidate = if normalize(rest).is_empty() {
                    match page.lines.get(i + 1) {
                        Some(next) if self.owner_of(next).is_none() => next.as_str(),
                        _ => continue,
                    }
                } else {
                    rest
                };

                if let Some(value) = schema.accept_candidate(idx, candidate) {
                    tracing::debug!(
                        "Line match on page {}: {} = '{}'",
                        page.number,
                        schema.fields()[idx].name,
                        value
                    );
                    findings.record(idx, value, MatchSource::Line { page: page.number });
                }
            }
        }
    }
}
