use crate::report::ExportFormat;

/// Options for the memory analysis pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Analyze independent graphs on the rayon thread pool
    pub parallel: bool,
    /// Mark tensors live at the peak node in the tensor table
    pub highlight_peak: bool,
    /// Format used when reports are written out
    pub export_format: ExportFormat,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            highlight_peak: true,
            export_format: ExportFormat::Json,
        }
    }
}

impl AnalysisOptions {
    /// Create a new analysis options object
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable parallel analysis across graphs
    pub fn enable_parallel(mut self, enable: bool) -> Self {
        self.parallel = enable;
        self
    }

    /// Enable or disable peak highlighting
    pub fn highlight_peak(mut self, enable: bool) -> Self {
        self.highlight_peak = enable;
        self
    }

    /// Set the export format
    pub fn set_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_setters() {
        let options = AnalysisOptions::new();
        assert!(!options.parallel);
        assert!(options.highlight_peak);
        assert_eq!(options.export_format, ExportFormat::Json);

        let options = options
            .enable_parallel(true)
            .highlight_peak(false)
            .set_export_format(ExportFormat::Csv);
        assert!(options.parallel);
        assert!(!options.highlight_peak);
        assert_eq!(options.export_format, ExportFormat::Csv);
    }
}
