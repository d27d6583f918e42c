//! CSV parsing and row normalization
//!
//! Files are semicolon-delimited with a single header row. Header names
//! match expected column names case-sensitively; unknown columns are
//! ignored; a missing required column aborts before any row is read.
//! Each data row is normalized into typed core fields plus coerced
//! custom-field values. Coercion failures and empty required fields
//! attach issues to the row; the row is still emitted so the commit
//! stage can report a precise per-row error.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::fields::{FieldDef, TypedValue, DATE_FORMAT};
use super::{EntityKind, ImportError};

/// A normalized input row, decoupled from the CSV text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRow {
    /// 1-based line number in the uploaded file (header is line 1)
    pub line: usize,
    pub core: CoreFields,
    pub custom: Vec<CustomValue>,
    pub issues: Vec<RowIssue>,
}

impl NormalizedRow {
    /// True if any issue blocks persistence of this row
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable summary of all issues on this row
    pub fn issue_summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A validation problem attached to a row during normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    pub column: String,
    pub value: String,
    pub message: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.column, self.message)
    }
}

/// A coerced custom-field value carried by a row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomValue {
    pub field_def_id: i64,
    pub name: String,
    pub value: TypedValue,
}

/// Entity-specific core fields of a normalized row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum CoreFields {
    Assets(AssetCore),
    Contracts(ContractCore),
    Providers(ProviderCore),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetCore {
    pub name: String,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub department: Option<String>,
    pub provider: Option<String>,
    pub acquisition_format: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_price: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractCore {
    pub name: String,
    pub number: String,
    pub provider: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub cost: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCore {
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Lazy row reader over an uploaded CSV file
pub struct RowReader<R: Read> {
    records: csv::StringRecordsIntoIter<R>,
    header_map: HashMap<String, usize>,
    schema: Vec<FieldDef>,
    kind: EntityKind,
    /// Line number of the last yielded record (header is 1)
    line: usize,
}

impl<R: Read> std::fmt::Debug for RowReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("header_map", &self.header_map)
            .field("schema", &self.schema)
            .field("kind", &self.kind)
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

impl RowReader<BufReader<File>> {
    /// Open an uploaded file for parsing. The `.csv` extension is required.
    pub fn open(
        path: &Path,
        kind: EntityKind,
        schema: Vec<FieldDef>,
    ) -> Result<Self, ImportError> {
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            return Err(ImportError::NotCsv(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), kind, schema)
    }
}

impl<R: Read> RowReader<R> {
    /// Build a reader over raw CSV bytes, validating the header up front
    pub fn from_reader(rdr: R, kind: EntityKind, schema: Vec<FieldDef>) -> Result<Self, ImportError> {
        let mut csv_rdr = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(rdr);

        // Case-sensitive header map; unknown columns simply never resolve
        let headers = csv_rdr.headers()?.clone();
        let header_map: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_string(), i))
            .collect();

        for column in kind.required_columns() {
            if !header_map.contains_key(*column) {
                return Err(ImportError::MissingColumn {
                    column: (*column).to_string(),
                });
            }
        }
        // Required custom-field columns must be present as well
        for def in schema.iter().filter(|d| d.required) {
            if !header_map.contains_key(&def.name) {
                return Err(ImportError::MissingColumn {
                    column: def.name.clone(),
                });
            }
        }

        Ok(Self {
            records: csv_rdr.into_records(),
            header_map,
            schema,
            kind,
            line: 1,
        })
    }

    /// Collect all rows (convenience for staging and tests)
    pub fn collect_rows(self) -> Vec<NormalizedRow> {
        self.collect()
    }

    fn field<'r>(&self, record: &'r StringRecord, name: &str) -> Option<&'r str> {
        self.header_map
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn owned_field(&self, record: &StringRecord, name: &str) -> Option<String> {
        self.field(record, name).map(String::from)
    }

    fn require_field(
        &self,
        record: &StringRecord,
        name: &str,
        issues: &mut Vec<RowIssue>,
    ) -> String {
        match self.field(record, name) {
            Some(v) => v.to_string(),
            None => {
                issues.push(RowIssue {
                    column: name.to_string(),
                    value: String::new(),
                    message: "required field is empty".to_string(),
                });
                String::new()
            }
        }
    }

    fn date_field(
        &self,
        record: &StringRecord,
        name: &str,
        issues: &mut Vec<RowIssue>,
    ) -> Option<NaiveDate> {
        let raw = self.field(record, name)?;
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(d) => Some(d),
            Err(_) => {
                issues.push(RowIssue {
                    column: name.to_string(),
                    value: raw.to_string(),
                    message: format!("'{}' is not a date (expected YYYY-MM-DD)", raw),
                });
                None
            }
        }
    }

    fn number_field(
        &self,
        record: &StringRecord,
        name: &str,
        issues: &mut Vec<RowIssue>,
    ) -> Option<f64> {
        let raw = self.field(record, name)?;
        match raw.parse::<f64>() {
            Ok(n) => Some(n),
            Err(_) => {
                issues.push(RowIssue {
                    column: name.to_string(),
                    value: raw.to_string(),
                    message: format!("'{}' is not a number", raw),
                });
                None
            }
        }
    }

    fn normalize(&self, record: &StringRecord, line: usize) -> NormalizedRow {
        let mut issues = Vec::new();

        let core = match self.kind {
            EntityKind::Assets => CoreFields::Assets(AssetCore {
                name: self.require_field(record, "name", &mut issues),
                serial_number: self.owned_field(record, "serial_number"),
                manufacturer: self.owned_field(record, "manufacturer"),
                model: self.owned_field(record, "model"),
                status: self.owned_field(record, "status"),
                location: self.owned_field(record, "location"),
                department: self.owned_field(record, "department"),
                provider: self.owned_field(record, "provider"),
                acquisition_format: self.owned_field(record, "acquisition_format"),
                purchase_date: self.date_field(record, "purchase_date", &mut issues),
                purchase_price: self.number_field(record, "purchase_price", &mut issues),
                description: self.owned_field(record, "description"),
            }),
            EntityKind::Contracts => CoreFields::Contracts(ContractCore {
                name: self.require_field(record, "name", &mut issues),
                number: self.require_field(record, "number", &mut issues),
                provider: self.owned_field(record, "provider"),
                start_date: self.date_field(record, "start_date", &mut issues),
                end_date: self.date_field(record, "end_date", &mut issues),
                cost: self.number_field(record, "cost", &mut issues),
                description: self.owned_field(record, "description"),
            }),
            EntityKind::Providers => CoreFields::Providers(ProviderCore {
                name: self.require_field(record, "name", &mut issues),
                website: self.owned_field(record, "website"),
                phone: self.owned_field(record, "phone"),
                email: self.owned_field(record, "email"),
                address: self.owned_field(record, "address"),
                description: self.owned_field(record, "description"),
            }),
        };

        // Custom fields are looked up by definition name and coerced per type
        let mut custom = Vec::new();
        for def in &self.schema {
            let raw = self.field(record, &def.name);
            match raw {
                None => {
                    if def.required {
                        issues.push(RowIssue {
                            column: def.name.clone(),
                            value: String::new(),
                            message: "required field is empty".to_string(),
                        });
                    }
                    // Empty optional values are skipped silently
                }
                Some(raw) => match def.data_type.coerce(raw, &def.list_options) {
                    Ok(value) => custom.push(CustomValue {
                        field_def_id: def.id,
                        name: def.name.clone(),
                        value,
                    }),
                    Err(message) => issues.push(RowIssue {
                        column: def.name.clone(),
                        value: raw.to_string(),
                        message,
                    }),
                },
            }
        }

        NormalizedRow {
            line,
            core,
            custom,
            issues,
        }
    }
}

impl<R: Read> Iterator for RowReader<R> {
    type Item = NormalizedRow;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.records.next()?;
        self.line += 1;
        let line = self.line;

        match result {
            Ok(record) => Some(self.normalize(&record, line)),
            Err(e) => {
                // A malformed record flows through as an invalid row so the
                // batch keeps going and the log cites the exact line
                let core = match self.kind {
                    EntityKind::Assets => CoreFields::Assets(AssetCore::default()),
                    EntityKind::Contracts => CoreFields::Contracts(ContractCore::default()),
                    EntityKind::Providers => CoreFields::Providers(ProviderCore::default()),
                };
                Some(NormalizedRow {
                    line,
                    core,
                    custom: Vec::new(),
                    issues: vec![RowIssue {
                        column: "-".to_string(),
                        value: String::new(),
                        message: format!("CSV parse error: {}", e),
                    }],
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::fields::FieldType;

    fn schema() -> Vec<FieldDef> {
        vec![
            FieldDef {
                id: 1,
                asset_type_id: 1,
                name: "ram_gb".to_string(),
                data_type: FieldType::Number,
                required: true,
                list_options: vec![],
                unit: Some("GB".to_string()),
                description: None,
                position: 1,
            },
            FieldDef {
                id: 2,
                asset_type_id: 1,
                name: "tier".to_string(),
                data_type: FieldType::List,
                required: false,
                list_options: vec!["Gold".to_string(), "Silver".to_string()],
                unit: None,
                description: None,
                position: 2,
            },
        ]
    }

    const HEADER: &str = "name;serial_number;manufacturer;model;status;ram_gb;tier\n";

    fn parse(csv: &str) -> Vec<NormalizedRow> {
        RowReader::from_reader(csv.as_bytes(), EntityKind::Assets, schema())
            .unwrap()
            .collect_rows()
    }

    #[test]
    fn test_missing_required_header_is_file_level() {
        let err = RowReader::from_reader(
            "name;manufacturer;model;status\n".as_bytes(),
            EntityKind::Assets,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingColumn { ref column } if column == "serial_number"
        ));
    }

    #[test]
    fn test_missing_required_custom_column_is_file_level() {
        let err = RowReader::from_reader(
            "name;serial_number;manufacturer;model;status;tier\n".as_bytes(),
            EntityKind::Assets,
            schema(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingColumn { ref column } if column == "ram_gb"
        ));
    }

    #[test]
    fn test_unknown_columns_are_ignored() {
        let csv = format!(
            "{};mystery\n{}",
            HEADER.trim_end(),
            "web01;SN1;Lenovo;T14;In use;16;Gold;whatever\n"
        );
        let rows = parse(&csv);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_valid());
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let err = RowReader::from_reader(
            "Name;serial_number;manufacturer;model;status\n".as_bytes(),
            EntityKind::Assets,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn { .. }));
    }

    #[test]
    fn test_valid_row_normalizes() {
        let rows = parse(&format!(
            "{}web01;SN1;Lenovo;ThinkPad T14;In use;16;Gold\n",
            HEADER
        ));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.line, 2);
        assert!(row.is_valid());
        let CoreFields::Assets(core) = &row.core else {
            panic!("expected asset core");
        };
        assert_eq!(core.name, "web01");
        assert_eq!(core.serial_number.as_deref(), Some("SN1"));
        assert_eq!(core.manufacturer.as_deref(), Some("Lenovo"));
        assert_eq!(row.custom.len(), 2);
        assert_eq!(row.custom[0].value, TypedValue::Number(16.0));
        assert_eq!(row.custom[1].value, TypedValue::Choice("Gold".to_string()));
    }

    #[test]
    fn test_bad_number_flags_row_but_still_emits() {
        let rows = parse(&format!("{}web01;SN1;Lenovo;T14;In use;abc;\n", HEADER));
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!(!row.is_valid());
        assert_eq!(row.issues.len(), 1);
        assert_eq!(row.issues[0].column, "ram_gb");
        assert!(row.issues[0].message.contains("abc"));
    }

    #[test]
    fn test_empty_required_field_flags_row() {
        let rows = parse(&format!("{}web01;SN1;Lenovo;T14;In use;;Silver\n", HEADER));
        let row = &rows[0];
        assert!(!row.is_valid());
        assert_eq!(row.issues[0].column, "ram_gb");
        assert!(row.issues[0].message.contains("required"));
    }

    #[test]
    fn test_empty_optional_field_passes() {
        let rows = parse(&format!("{}web01;SN1;Lenovo;T14;In use;16;\n", HEADER));
        let row = &rows[0];
        assert!(row.is_valid());
        // The optional field is skipped, not stored as empty
        assert_eq!(row.custom.len(), 1);
        assert_eq!(row.custom[0].name, "ram_gb");
    }

    #[test]
    fn test_bad_list_value_flags_row() {
        let rows = parse(&format!("{}web01;SN1;Lenovo;T14;In use;16;gold\n", HEADER));
        let row = &rows[0];
        assert!(!row.is_valid());
        assert_eq!(row.issues[0].column, "tier");
    }

    #[test]
    fn test_line_numbers_count_from_header() {
        let rows = parse(&format!(
            "{}a;SN1;Lenovo;T14;In use;16;\nb;SN2;Lenovo;T14;In use;32;\n",
            HEADER
        ));
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 3);
    }

    #[test]
    fn test_contract_rows() {
        let csv = "name;number;provider;start_date;end_date;cost;description\n\
                   Support;CT-1;Acme;2024-01-01;2024-12-31;1200.50;Annual support\n";
        let rows = RowReader::from_reader(csv.as_bytes(), EntityKind::Contracts, vec![])
            .unwrap()
            .collect_rows();
        let CoreFields::Contracts(core) = &rows[0].core else {
            panic!("expected contract core");
        };
        assert_eq!(core.number, "CT-1");
        assert_eq!(core.cost, Some(1200.50));
        assert!(rows[0].is_valid());
    }

    #[test]
    fn test_bad_core_date_flags_row() {
        let csv = "name;number;provider;start_date;end_date;cost;description\n\
                   Support;CT-1;Acme;01.01.2024;;;\n";
        let rows = RowReader::from_reader(csv.as_bytes(), EntityKind::Contracts, vec![])
            .unwrap()
            .collect_rows();
        assert!(!rows[0].is_valid());
        assert_eq!(rows[0].issues[0].column, "start_date");
    }
}
