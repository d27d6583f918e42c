//! CSV template generation
//!
//! A template is a single semicolon-delimited header row: the entity's
//! core columns, plus (for assets) one column per custom field definition
//! in registry order. Templates carry no data rows.

use std::io;

use super::fields::FieldDef;
use super::{EntityKind, ImportError};

/// Column names for a template, in output order
pub fn template_columns(kind: EntityKind, schema: &[FieldDef]) -> Vec<String> {
    let mut columns: Vec<String> = kind
        .core_columns()
        .iter()
        .map(|c| (*c).to_string())
        .collect();
    if kind == EntityKind::Assets {
        columns.extend(schema.iter().map(|d| d.name.clone()));
    }
    columns
}

/// Render the CSV template for an entity kind
pub fn generate(kind: EntityKind, schema: &[FieldDef]) -> Result<String, ImportError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(Vec::new());

    wtr.write_record(template_columns(kind, schema))?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ImportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::fields::FieldType;

    fn def(id: i64, name: &str, position: i64) -> FieldDef {
        FieldDef {
            id,
            asset_type_id: 1,
            name: name.to_string(),
            data_type: FieldType::Text,
            required: false,
            list_options: vec![],
            unit: None,
            description: None,
            position,
        }
    }

    #[test]
    fn test_asset_template_appends_schema_columns_in_order() {
        let schema = vec![def(1, "ram_gb", 1), def(2, "warranty_end", 2)];
        let out = generate(EntityKind::Assets, &schema).unwrap();
        assert_eq!(
            out.trim_end(),
            "name;serial_number;manufacturer;model;status;location;department;provider;acquisition_format;purchase_date;purchase_price;description;ram_gb;warranty_end"
        );
        // Header only, no data rows
        assert_eq!(out.trim_end().lines().count(), 1);
    }

    #[test]
    fn test_fixed_entity_templates_ignore_schema() {
        let schema = vec![def(1, "ram_gb", 1)];
        let out = generate(EntityKind::Contracts, &schema).unwrap();
        assert_eq!(
            out.trim_end(),
            "name;number;provider;start_date;end_date;cost;description"
        );
    }

    #[test]
    fn test_template_round_trips_through_parser() {
        let out = generate(EntityKind::Providers, &[]).unwrap();
        let reader = crate::import::parser::RowReader::from_reader(
            out.as_bytes(),
            EntityKind::Providers,
            vec![],
        )
        .unwrap();
        assert!(reader.collect_rows().is_empty());
    }
}
