//! Batch configuration

use crate::{BatchError, Result};
use field_text::DatePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default rasterization resolution
pub const DEFAULT_DPI: u32 = 300;

/// Default name of the merged document
pub const MERGED_FILE_NAME: &str = "merged_output.pdf";

/// How a filled document is made non-editable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FlattenStrategy {
    /// Drop the interactive form, keep widget appearances as page content
    #[default]
    Structural,
    /// Render every page to an image and rebuild the document from them
    Rasterize {
        #[serde(default = "default_dpi")]
        dpi: u32,
    },
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

/// What happens when one row fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the batch at the first failing row
    #[default]
    Abort,
    /// Record the failure and continue with the next row
    SkipRow,
}

/// Settings for one batch run
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```json
/// {
///   "output_dir": "out",
///   "flatten": { "strategy": "rasterize", "dpi": 150 },
///   "failure_policy": "skip_row"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory receiving `flattened_<n>.pdf` and the merged document
    pub output_dir: PathBuf,

    /// Normalization of the From/To columns
    pub date_policy: DatePolicy,

    /// Flattening strategy
    pub flatten: FlattenStrategy,

    /// `pdftoppm` executable; looked up on `PATH` when unset
    pub rasterizer_path: Option<PathBuf>,

    /// Concatenate all flattened rows into one document
    pub merge: bool,

    /// File name of the merged document inside `output_dir`
    pub merged_file_name: String,

    /// Keep `flattened_<n>.pdf` after a successful merge
    pub keep_row_outputs: bool,

    /// Behavior on row failure
    pub failure_policy: FailurePolicy,

    /// Named field schema; positional binding when unset
    pub schema_path: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            date_policy: DatePolicy::default(),
            flatten: FlattenStrategy::default(),
            rasterizer_path: None,
            merge: true,
            merged_file_name: MERGED_FILE_NAME.to_string(),
            keep_row_outputs: true,
            failure_policy: FailurePolicy::default(),
            schema_path: None,
        }
    }
}

impl BatchConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json).map_err(|e| BatchError::Config(format!("{}: {e}", path.display())))
    }

    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| BatchError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no batch could run with
    pub fn validate(&self) -> Result<()> {
        if let FlattenStrategy::Rasterize { dpi: 0 } = self.flatten {
            return Err(BatchError::Config("dpi must be positive".to_string()));
        }
        if self.merged_file_name.trim().is_empty() {
            return Err(BatchError::Config("merged_file_name is empty".to_string()));
        }
        Ok(())
    }

    /// Set the output directory
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the From/To normalization
    pub fn with_date_policy(mut self, policy: DatePolicy) -> Self {
        self.date_policy = policy;
        self
    }

    /// Set the flattening strategy
    pub fn with_flatten(mut self, strategy: FlattenStrategy) -> Self {
        self.flatten = strategy;
        self
    }

    /// Set the `pdftoppm` executable
    pub fn with_rasterizer_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.rasterizer_path = Some(path.into());
        self
    }

    /// Enable or disable the merged document
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Set the merged document's file name
    pub fn with_merged_file_name<S: Into<String>>(mut self, name: S) -> Self {
        self.merged_file_name = name.into();
        self
    }

    /// Keep or remove per-row outputs after merging
    pub fn with_keep_row_outputs(mut self, keep: bool) -> Self {
        self.keep_row_outputs = keep;
        self
    }

    /// Set the row failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Use a named field schema
    pub fn with_schema_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    /// Path of the merged document
    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(&self.merged_file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.date_policy, DatePolicy::Reformat);
        assert_eq!(config.flatten, FlattenStrategy::Structural);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.merge);
        assert!(config.keep_row_outputs);
        assert_eq!(config.merged_path(), PathBuf::from("./merged_output.pdf"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BatchConfig::from_json(
            r#"{
                "output_dir": "out",
                "flatten": { "strategy": "rasterize" },
                "date_policy": "strip_dashes",
                "failure_policy": "skip_row"
            }"#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.flatten, FlattenStrategy::Rasterize { dpi: 300 });
        assert_eq!(config.date_policy, DatePolicy::StripDashes);
        assert_eq!(config.failure_policy, FailurePolicy::SkipRow);
        assert_eq!(config.merged_file_name, MERGED_FILE_NAME);
    }

    #[test]
    fn test_builder() {
        let config = BatchConfig::new()
            .with_output_dir("target/out")
            .with_flatten(FlattenStrategy::Rasterize { dpi: 150 })
            .with_rasterizer_path("/opt/poppler/bin/pdftoppm")
            .with_merge(false)
            .with_keep_row_outputs(false)
            .with_schema_path("schema.json");

        assert_eq!(config.flatten, FlattenStrategy::Rasterize { dpi: 150 });
        assert_eq!(
            config.rasterizer_path,
            Some(PathBuf::from("/opt/poppler/bin/pdftoppm"))
        );
        assert!(!config.merge);
        assert_eq!(config.schema_path, Some(PathBuf::from("schema.json")));
    }

    #[test]
    fn test_rejects_zero_dpi() {
        let err = BatchConfig::from_json(r#"{ "flatten": { "strategy": "rasterize", "dpi": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, BatchError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(BatchConfig::from_json(r#"{ "failure_policy": "retry" }"#).is_err());
    }
}
