//! Schema JSON parsing

use crate::schema::{SchemaFile, SCHEMA_VERSION};
use crate::{Result, TemplateError};
use std::path::Path;

/// Parse a schema from JSON string
pub fn parse_schema(json: &str) -> Result<SchemaFile> {
    let schema: SchemaFile =
        serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))?;
    if schema.version != SCHEMA_VERSION {
        return Err(TemplateError::ParseError(format!(
            "unsupported schema version {:?} (expected {SCHEMA_VERSION:?})",
            schema.version
        )));
    }
    Ok(schema)
}

/// Load a schema from a JSON file
pub fn load_schema<P: AsRef<Path>>(path: P) -> Result<SchemaFile> {
    let json = std::fs::read_to_string(path.as_ref())?;
    log::debug!("Loaded field schema from {}", path.as_ref().display());
    parse_schema(&json)
}
