//! CSV ingestion and row normalization

use crate::{BatchError, Result};
use csv::{ReaderBuilder, StringRecord};
use field_text::{clean_value, split_identifier, DatePolicy};
use indexmap::IndexMap;
use std::io::Read;
use std::path::Path;
use template::{FieldKey, FieldValues};

/// Columns every input CSV must carry
pub const REQUIRED_COLUMNS: [&str; 18] = [
    "From",
    "To",
    "TIN",
    "Payee",
    "Address",
    "Zip_Code",
    "myTIN",
    "myPayee",
    "myAddress",
    "myZip_Code",
    "IPS_EWT",
    "ATC",
    "M1",
    "M2",
    "M3",
    "M_Total",
    "TWQ",
    "max_total",
];

/// Plain columns copied through as-is, with the slot they fill
const PLAIN_COLUMNS: [(&str, FieldKey); 14] = [
    ("Payee", FieldKey::Payee),
    ("Address", FieldKey::Address),
    ("Zip_Code", FieldKey::ZipCode),
    ("myPayee", FieldKey::MyPayee),
    ("myAddress", FieldKey::MyAddress),
    ("myZip_Code", FieldKey::MyZipCode),
    ("IPS_EWT", FieldKey::IpsEwt),
    ("ATC", FieldKey::Atc),
    ("M1", FieldKey::M1),
    ("M2", FieldKey::M2),
    ("M3", FieldKey::M3),
    ("M_Total", FieldKey::MTotal),
    ("TWQ", FieldKey::Twq),
    ("max_total", FieldKey::MaxTotal),
];

/// One CSV record, column name to raw cell text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    cells: IndexMap<String, String>,
}

impl CsvRow {
    fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let cells = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), cell.to_string()))
            .collect();
        Self { cells }
    }

    /// Raw cell of a column, `None` when the column is absent
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CsvRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Read every record of a CSV file
///
/// The header must name all [`REQUIRED_COLUMNS`]; extra columns are
/// ignored. Every cell is kept as text.
pub fn read_rows<P: AsRef<Path>>(path: P) -> Result<Vec<CsvRow>> {
    let file = std::fs::File::open(path.as_ref())?;
    parse_rows(file)
}

/// Read every record from CSV text
///
/// Records shorter than the header are padded: their absent cells read as
/// missing. Records longer than the header are rejected.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<CsvRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers: StringRecord = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}'))
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BatchError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(BatchError::ExtraCells {
                record: index + 1,
                found: record.len(),
                expected: headers.len(),
            });
        }
        rows.push(CsvRow::from_record(&headers, &record));
    }
    log::debug!("Read {} CSV rows", rows.len());
    Ok(rows)
}

/// Turn a raw row into values for all 24 slots
///
/// Never fails: missing cells become blanks, unparseable dates pass
/// through as written.
pub fn normalize_row(row: &CsvRow, date_policy: DatePolicy) -> FieldValues {
    let mut values = FieldValues::new();

    values.set(FieldKey::FromDate, date_policy.apply(row.get("From")));
    values.set(FieldKey::ToDate, date_policy.apply(row.get("To")));

    for (key, part) in FieldKey::TIN.into_iter().zip(split_identifier(row.get("TIN"))) {
        values.set(key, part);
    }
    for (key, part) in FieldKey::MY_TIN
        .into_iter()
        .zip(split_identifier(row.get("myTIN")))
    {
        values.set(key, part);
    }

    for (column, key) in PLAIN_COLUMNS {
        values.set(key, clean_value(row.get(column)));
    }

    values
}
