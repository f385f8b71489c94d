//! Row-by-row batch pipeline
//!
//! For every CSV row: normalize, map onto template fields, fill, write the
//! filled document to a scoped temp file, flatten it and persist the final
//! `flattened_<n>.pdf`. Finished rows can then be merged into one document.

use crate::config::{BatchConfig, FailurePolicy, FlattenStrategy};
use crate::row::{normalize_row, read_rows, CsvRow};
use crate::{BatchError, Result};
use pdf_core::{
    flatten_rasterized, flatten_structural, merge_files, FormFiller, PdfDocument, Pdftoppm,
    Rasterizer,
};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use template::{load_schema, FieldSchema};

/// A row whose flattened document was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOutput {
    /// 1-based row number
    pub row: usize,
    /// Path of `flattened_<n>.pdf`
    pub path: PathBuf,
}

/// Result of one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Flattened(PathBuf),
    Skipped(String),
}

/// Per-row entry of a batch summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport {
    /// 1-based row number
    pub row: usize,
    pub outcome: RowOutcome,
}

/// What a successful batch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows read from the CSV
    pub rows: usize,
    /// One report per row, in CSV order
    pub reports: Vec<RowReport>,
    /// Flattened documents, in CSV order
    pub outputs: Vec<RowOutput>,
    /// Merged document, when merging was enabled and a row succeeded
    pub merged: Option<PathBuf>,
    /// Whether the per-row documents were deleted after merging
    pub row_outputs_removed: bool,
}

impl BatchSummary {
    /// Number of rows that produced a document
    pub fn succeeded(&self) -> usize {
        self.outputs.len()
    }

    /// Number of rows skipped after an error
    pub fn skipped(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, RowOutcome::Skipped(_)))
            .count()
    }

    /// Single status line for the user
    pub fn status_message(&self) -> String {
        let mut message = match (self.succeeded(), &self.merged) {
            (0, _) => "No PDFs generated".to_string(),
            (n, Some(_)) => format!("{n} PDFs generated, flattened & merged successfully!"),
            (n, None) => format!("{n} PDFs generated & flattened successfully!"),
        };
        if self.skipped() > 0 {
            message.push_str(&format!(" ({} rows skipped)", self.skipped()));
        }
        message
    }
}

/// A batch that stopped before finishing
#[derive(Debug)]
pub struct BatchFailure {
    /// What went wrong
    pub error: BatchError,
    /// Failing row, `None` for startup or merge failures
    pub row: Option<usize>,
    /// Rows finished before the failure; their files are left in place
    pub completed: Vec<RowOutput>,
}

impl BatchFailure {
    fn startup(error: BatchError) -> Self {
        Self {
            error,
            row: None,
            completed: Vec::new(),
        }
    }

    /// Single status line for the user
    pub fn status_message(&self) -> String {
        format!("Failed to generate PDFs: {self}")
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "row {row}: {}", self.error),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for BatchFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Runs batches against one template
///
/// The template is read, introspected and bound to a field schema once;
/// every row then fills a fresh copy.
pub struct BatchProcessor {
    config: BatchConfig,
    filler: FormFiller,
    schema: FieldSchema,
    rasterizer: Option<Box<dyn Rasterizer>>,
}

impl BatchProcessor {
    /// Load the template and resolve its field schema
    pub fn new<P: AsRef<Path>>(template_path: P, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        let filler = FormFiller::from_file(template_path.as_ref())?;
        let schema_file = match &config.schema_path {
            Some(path) => Some(load_schema(path)?),
            None => None,
        };
        let schema = FieldSchema::for_field_names(filler.field_names(), schema_file.as_ref())?;

        log::info!(
            "Loaded template {} ({} fields, {} schema)",
            template_path.as_ref().display(),
            filler.field_names().len(),
            if schema_file.is_some() { "named" } else { "positional" }
        );

        Ok(Self {
            config,
            filler,
            schema,
            rasterizer: None,
        })
    }

    /// Use this rasterizer instead of looking up `pdftoppm`
    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    /// The resolved field schema
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// The batch configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process every row of a CSV file
    pub fn run<P: AsRef<Path>>(
        &mut self,
        csv_path: P,
    ) -> std::result::Result<BatchSummary, BatchFailure> {
        let rows = read_rows(csv_path.as_ref()).map_err(BatchFailure::startup)?;
        log::info!("Processing {} rows from {}", rows.len(), csv_path.as_ref().display());
        self.run_rows(&rows)
    }

    /// Process already parsed rows
    pub fn run_rows(
        &mut self,
        rows: &[CsvRow],
    ) -> std::result::Result<BatchSummary, BatchFailure> {
        std::fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BatchFailure::startup(e.into()))?;
        self.prepare_rasterizer().map_err(BatchFailure::startup)?;

        let mut reports = Vec::with_capacity(rows.len());
        let mut outputs: Vec<RowOutput> = Vec::new();

        for (index, row) in rows.iter().enumerate() {
            let n = index + 1;
            match self.process_row(n, row) {
                Ok(path) => {
                    log::info!("Done row {n} -> {}", path.display());
                    reports.push(RowReport {
                        row: n,
                        outcome: RowOutcome::Flattened(path.clone()),
                    });
                    outputs.push(RowOutput { row: n, path });
                }
                Err(error) => match self.config.failure_policy {
                    FailurePolicy::Abort => {
                        log::error!("Row {n} failed: {error}");
                        return Err(BatchFailure {
                            error,
                            row: Some(n),
                            completed: outputs,
                        });
                    }
                    FailurePolicy::SkipRow => {
                        log::warn!("Skipping row {n}: {error}");
                        reports.push(RowReport {
                            row: n,
                            outcome: RowOutcome::Skipped(error.to_string()),
                        });
                    }
                },
            }
        }

        let mut summary = BatchSummary {
            rows: rows.len(),
            reports,
            outputs,
            merged: None,
            row_outputs_removed: false,
        };

        if self.config.merge && !summary.outputs.is_empty() {
            let merged = match self.merge_outputs(&summary.outputs) {
                Ok(merged) => merged,
                Err(error) => {
                    return Err(BatchFailure {
                        error,
                        row: None,
                        completed: summary.outputs,
                    })
                }
            };
            log::info!("Merged PDF created: {}", merged.display());
            summary.merged = Some(merged);

            if !self.config.keep_row_outputs {
                remove_row_outputs(&summary.outputs);
                summary.row_outputs_removed = true;
            }
        }

        Ok(summary)
    }

    fn prepare_rasterizer(&mut self) -> Result<()> {
        if let FlattenStrategy::Rasterize { .. } = self.config.flatten {
            if self.rasterizer.is_none() {
                let pdftoppm = Pdftoppm::locate(self.config.rasterizer_path.as_deref())?;
                log::debug!("Using rasterizer {}", pdftoppm.program().display());
                self.rasterizer = Some(Box::new(pdftoppm));
            }
        }
        Ok(())
    }

    /// Fill and flatten one row, returning the final document's path
    fn process_row(&self, n: usize, row: &CsvRow) -> Result<PathBuf> {
        let values = normalize_row(row, self.config.date_policy);
        let fields = self.schema.map(&values);
        let filled = self.filler.fill_to_bytes(fields.iter())?;

        // Removed on drop, whichever way this row ends
        let mut temp = tempfile::Builder::new()
            .prefix(&format!("temp_filled_{n}_"))
            .suffix(".pdf")
            .tempfile_in(&self.config.output_dir)?;
        temp.write_all(&filled)?;
        temp.flush()?;

        let mut flattened = match self.config.flatten {
            FlattenStrategy::Structural => flatten_structural(&PdfDocument::open(temp.path())?)?,
            FlattenStrategy::Rasterize { dpi } => {
                let rasterizer = self.rasterizer.as_deref().ok_or_else(|| {
                    BatchError::Pdf(pdf_core::PdfError::RasterizerUnavailable(
                        "no rasterizer configured".to_string(),
                    ))
                })?;
                flatten_rasterized(temp.path(), rasterizer, dpi)?
            }
        };

        let path = self.config.output_dir.join(format!("flattened_{n}.pdf"));
        write_atomic(&path, &flattened.to_bytes()?)?;
        Ok(path)
    }

    fn merge_outputs(&self, outputs: &[RowOutput]) -> Result<PathBuf> {
        let paths: Vec<&Path> = outputs.iter().map(|o| o.path.as_path()).collect();
        let Some(mut merged) = merge_files(&paths)? else {
            return Err(BatchError::Pdf(pdf_core::PdfError::ParseError(
                "nothing to merge".to_string(),
            )));
        };
        let path = self.config.merged_path();
        write_atomic(&path, &merged.to_bytes()?)?;
        Ok(path)
    }
}

/// Process a CSV file against a template in one call
///
/// Uses `pdftoppm` when the configuration asks for rasterized flattening.
pub fn process_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    csv_path: P,
    template_path: Q,
    config: &BatchConfig,
) -> std::result::Result<BatchSummary, BatchFailure> {
    let mut processor =
        BatchProcessor::new(template_path, config.clone()).map_err(BatchFailure::startup)?;
    processor.run(csv_path)
}

/// Write `bytes` to a sibling temp file, then rename it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(path).map_err(|e| BatchError::Io(e.error))?;
    Ok(())
}

fn remove_row_outputs(outputs: &[RowOutput]) {
    for output in outputs {
        if let Err(e) = std::fs::remove_file(&output.path) {
            log::warn!("Could not remove {}: {e}", output.path.display());
        }
    }
}
