//! Master-data pre-analysis
//!
//! Before any commit, asset rows are scanned for manufacturer/model pairs
//! that do not resolve against the master tables. Unresolved pairs are
//! deduplicated (case-insensitively, first spelling wins) and surfaced
//! for confirmation before the database is mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::parser::{CoreFields, NormalizedRow};
use crate::db::{Database, DbError};

/// A manufacturer/model pair that would be created by this import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewModel {
    pub manufacturer: String,
    pub model: String,
}

/// Scan rows for manufacturer/model pairs missing from the master tables.
///
/// Rows without both a manufacturer and a model are skipped; resolution
/// trims and compares case-insensitively. The result preserves first-seen
/// order.
pub fn analyze(db: &Database, rows: &[NormalizedRow]) -> Result<Vec<NewModel>, DbError> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut new_models = Vec::new();

    for row in rows {
        let CoreFields::Assets(core) = &row.core else {
            continue;
        };
        let (Some(manufacturer), Some(model)) = (&core.manufacturer, &core.model) else {
            continue;
        };

        let key = (manufacturer.to_lowercase(), model.to_lowercase());
        if !seen.insert(key) {
            continue;
        }

        let resolved = match db.find_manufacturer(manufacturer)? {
            Some(manufacturer_id) => db.find_model(manufacturer_id, model)?.is_some(),
            None => false,
        };
        if !resolved {
            new_models.push(NewModel {
                manufacturer: manufacturer.clone(),
                model: model.clone(),
            });
        }
    }

    Ok(new_models)
}
