//! Custom-field schema model: typed field definitions and value coercion
//!
//! Each asset type owns an ordered set of field definitions. A definition's
//! data type drives how raw CSV text is coerced into a typed value, and the
//! typed value renders back to the canonical string stored in the database.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format accepted for `date` fields and core date columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Data types a custom field definition can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    LongText,
    Number,
    Date,
    Boolean,
    List,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::LongText => "longtext",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::List => "list",
        }
    }

    /// Coerce raw CSV text into a typed value.
    ///
    /// `options` is only consulted for `List` fields. The raw value must be
    /// non-empty; empty handling (required vs. optional) is the caller's
    /// concern.
    pub fn coerce(&self, raw: &str, options: &[String]) -> Result<TypedValue, String> {
        match self {
            FieldType::Text | FieldType::LongText => Ok(TypedValue::Text(raw.to_string())),
            FieldType::Number => raw
                .trim()
                .parse::<f64>()
                .map(TypedValue::Number)
                .map_err(|_| format!("'{}' is not a number", raw)),
            FieldType::Date => NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map(TypedValue::Date)
                .map_err(|_| format!("'{}' is not a date (expected YYYY-MM-DD)", raw)),
            FieldType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "yes" => Ok(TypedValue::Boolean(true)),
                "0" | "no" => Ok(TypedValue::Boolean(false)),
                _ => Err(format!("'{}' is not a boolean (accepted: 1, 0, yes, no)", raw)),
            },
            FieldType::List => {
                // Case-sensitive: the stored value must be one of the options verbatim
                if options.iter().any(|o| o == raw) {
                    Ok(TypedValue::Choice(raw.to_string()))
                } else {
                    Err(format!(
                        "'{}' is not one of the allowed values: {}",
                        raw,
                        options.join(", ")
                    ))
                }
            }
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "longtext" | "long_text" => Ok(FieldType::LongText),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "list" => Ok(FieldType::List),
            _ => Err(format!(
                "Unknown field type: '{}'. Supported: text, longtext, number, date, boolean, list",
                s
            )),
        }
    }
}

/// A coerced, schema-valid field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Boolean(bool),
    Choice(String),
}

impl TypedValue {
    /// Canonical string persisted in the field_values table
    pub fn storage_value(&self) -> String {
        match self {
            TypedValue::Text(s) | TypedValue::Choice(s) => s.clone(),
            TypedValue::Number(n) => {
                // Integral numbers store without a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            TypedValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            TypedValue::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
        }
    }
}

/// A custom field definition owned by an asset type
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub id: i64,
    pub asset_type_id: i64,
    pub name: String,
    pub data_type: FieldType,
    pub required: bool,
    /// Allowed values, in definition order (list fields only)
    pub list_options: Vec<String>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub position: i64,
}
