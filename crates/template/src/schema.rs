//! Field schema types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Number of semantic slots filled per row
pub const FIELD_COUNT: usize = 24;

/// Schema file version understood by this crate
pub const SCHEMA_VERSION: &str = "1.0";

/// Semantic slot of the invoice template, in canonical order
///
/// The declaration order is the positional binding order: slot *i* is
/// bound to the *i*-th template field when no named schema is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    FromDate,
    ToDate,
    #[serde(rename = "tin_part_1")]
    TinPart1,
    #[serde(rename = "tin_part_2")]
    TinPart2,
    #[serde(rename = "tin_part_3")]
    TinPart3,
    #[serde(rename = "tin_part_4")]
    TinPart4,
    Payee,
    Address,
    ZipCode,
    #[serde(rename = "my_tin_part_1")]
    MyTinPart1,
    #[serde(rename = "my_tin_part_2")]
    MyTinPart2,
    #[serde(rename = "my_tin_part_3")]
    MyTinPart3,
    #[serde(rename = "my_tin_part_4")]
    MyTinPart4,
    MyPayee,
    MyAddress,
    MyZipCode,
    IpsEwt,
    Atc,
    M1,
    M2,
    M3,
    MTotal,
    Twq,
    MaxTotal,
}

impl FieldKey {
    /// All keys in canonical order
    pub const ALL: [FieldKey; FIELD_COUNT] = [
        FieldKey::FromDate,
        FieldKey::ToDate,
        FieldKey::TinPart1,
        FieldKey::TinPart2,
        FieldKey::TinPart3,
        FieldKey::TinPart4,
        FieldKey::Payee,
        FieldKey::Address,
        FieldKey::ZipCode,
        FieldKey::MyTinPart1,
        FieldKey::MyTinPart2,
        FieldKey::MyTinPart3,
        FieldKey::MyTinPart4,
        FieldKey::MyPayee,
        FieldKey::MyAddress,
        FieldKey::MyZipCode,
        FieldKey::IpsEwt,
        FieldKey::Atc,
        FieldKey::M1,
        FieldKey::M2,
        FieldKey::M3,
        FieldKey::MTotal,
        FieldKey::Twq,
        FieldKey::MaxTotal,
    ];

    /// The four payee TIN slots
    pub const TIN: [FieldKey; 4] = [
        FieldKey::TinPart1,
        FieldKey::TinPart2,
        FieldKey::TinPart3,
        FieldKey::TinPart4,
    ];

    /// The four payor TIN slots
    pub const MY_TIN: [FieldKey; 4] = [
        FieldKey::MyTinPart1,
        FieldKey::MyTinPart2,
        FieldKey::MyTinPart3,
        FieldKey::MyTinPart4,
    ];

    /// Position in canonical order
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in schema files
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::FromDate => "from_date",
            FieldKey::ToDate => "to_date",
            FieldKey::TinPart1 => "tin_part_1",
            FieldKey::TinPart2 => "tin_part_2",
            FieldKey::TinPart3 => "tin_part_3",
            FieldKey::TinPart4 => "tin_part_4",
            FieldKey::Payee => "payee",
            FieldKey::Address => "address",
            FieldKey::ZipCode => "zip_code",
            FieldKey::MyTinPart1 => "my_tin_part_1",
            FieldKey::MyTinPart2 => "my_tin_part_2",
            FieldKey::MyTinPart3 => "my_tin_part_3",
            FieldKey::MyTinPart4 => "my_tin_part_4",
            FieldKey::MyPayee => "my_payee",
            FieldKey::MyAddress => "my_address",
            FieldKey::MyZipCode => "my_zip_code",
            FieldKey::IpsEwt => "ips_ewt",
            FieldKey::Atc => "atc",
            FieldKey::M1 => "m1",
            FieldKey::M2 => "m2",
            FieldKey::M3 => "m3",
            FieldKey::MTotal => "m_total",
            FieldKey::Twq => "twq",
            FieldKey::MaxTotal => "max_total",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named binding of semantic slots to template field names
///
/// ```json
/// {
///   "version": "1.0",
///   "fields": {
///     "from_date": "Text1",
///     "to_date": "Text2"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Schema version
    pub version: String,

    /// Slot to template field name
    pub fields: BTreeMap<FieldKey, String>,
}

impl SchemaFile {
    /// Schema reproducing the positional binding of `field_names`
    ///
    /// Useful as a starting point for a hand-edited schema. Only the first
    /// [`FIELD_COUNT`] names are used.
    pub fn from_field_names(field_names: &[String]) -> Self {
        let fields = FieldKey::ALL
            .iter()
            .zip(field_names)
            .map(|(key, name)| (*key, name.clone()))
            .collect();
        Self {
            version: SCHEMA_VERSION.to_string(),
            fields,
        }
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
