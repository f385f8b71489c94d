//! Embedded blank CSV template

use crate::Result;
use std::path::Path;

/// Blank input CSV: the header row users fill in
pub const CSV_TEMPLATE: &[u8] = include_bytes!("../assets/bir_invoice.csv");

/// Write the blank CSV template to `dest`, byte for byte
pub fn write_csv_template<P: AsRef<Path>>(dest: P) -> Result<()> {
    std::fs::write(dest.as_ref(), CSV_TEMPLATE)?;
    log::info!("CSV template saved to {}", dest.as_ref().display());
    Ok(())
}
