// src/config.rs
use std::path::PathBuf;

pub const DEFAULT_INPUT_DIR: &str = "data/input_pdfs";
pub const DEFAULT_OUTPUT_PATH: &str = "data/output/pdf_extract.xlsx";

/// Where a batch run reads from and writes to.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_path: PathBuf,
    pub summary_path: Option<PathBuf>,
    /// Set in debug mode: per-PDF layout dumps go here.
    pub debug_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_path: output_path.into(),
            summary_path: None,
            debug_dir: None,
        }
    }

    pub fn with_summary(mut self, path: Option<PathBuf>) -> Self {
        self.summary_path = path;
        self
    }

    /// Debug dumps live in `debug/` beside the output file.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_dir = enabled.then(|| {
            self.output_path
                .parent()
                .map(|p| p.join("debug"))
                .unwrap_or_else(|| PathBuf::from("debug"))
        });
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("data/input_pdfs"));
        assert_eq!(config.output_path, PathBuf::from("data/output/pdf_extract.xlsx"));
        assert!(config.summary_path.is_none());
        assert!(config.debug_dir.is_none());
    }

    #[test]
    fn test_debug_dir_sits_next_to_output() {
        let config = RunConfig::new("in", "out/run.csv").with_debug(true);
        assert_eq!(config.debug_dir, Some(PathBuf::from("out/debug")));
        assert!(RunConfig::default().with_debug(false).debug_dir.is_none());
    }
}
