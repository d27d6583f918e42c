//! Import committer
//!
//! Rows are processed independently, in input order. Each row runs inside
//! its own savepoint: foreign keys resolve by name, the target entity is
//! upserted by natural key, custom-field values are written, and an audit
//! entry is appended. A row that fails rolls back its own writes only;
//! there is no cross-row transaction, so one bad row never aborts the
//! batch.

use crate::db::{AssetRecord, ContractRecord, Database, DbError, MasterKind, ProviderRecord};

use super::fields::DATE_FORMAT;
use super::parser::{AssetCore, ContractCore, CoreFields, NormalizedRow, ProviderCore};

/// Outcome of committing one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    Error(String),
}

impl RowOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RowOutcome::Created => "created",
            RowOutcome::Updated => "updated",
            RowOutcome::Error(_) => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, RowOutcome::Error(_))
    }
}

impl std::fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowOutcome::Created => write!(f, "created"),
            RowOutcome::Updated => write!(f, "updated"),
            RowOutcome::Error(msg) => write!(f, "error {}", msg),
        }
    }
}

/// Per-row result, in input order
#[derive(Debug, Clone)]
pub struct RowResult {
    pub line: usize,
    pub outcome: RowOutcome,
}

/// Row-scoped commit failure: either a resolution problem with a
/// user-facing message, or a storage error
enum CommitError {
    Row(String),
    Db(DbError),
}

impl From<DbError> for CommitError {
    fn from(e: DbError) -> Self {
        CommitError::Db(e)
    }
}

/// Commit a batch of normalized rows.
///
/// Returns one result per input row, preserving order. Only a failure to
/// manage savepoints aborts the batch; everything else is a per-row
/// outcome.
pub fn commit_rows(
    db: &Database,
    actor: &str,
    asset_type_id: Option<i64>,
    rows: &[NormalizedRow],
) -> Result<Vec<RowResult>, DbError> {
    let mut results = Vec::with_capacity(rows.len());

    for row in rows {
        // Validation issues flagged during parsing block persistence
        if !row.issues.is_empty() {
            results.push(RowResult {
                line: row.line,
                outcome: RowOutcome::Error(row.issue_summary()),
            });
            continue;
        }

        db.row_savepoint_begin()?;
        let outcome = match commit_one(db, actor, asset_type_id, row) {
            Ok(outcome) => {
                db.row_savepoint_commit()?;
                outcome
            }
            Err(CommitError::Row(message)) => {
                db.row_savepoint_rollback()?;
                RowOutcome::Error(message)
            }
            Err(CommitError::Db(e)) => {
                db.row_savepoint_rollback()?;
                RowOutcome::Error(e.to_string())
            }
        };
        results.push(RowResult {
            line: row.line,
            outcome,
        });
    }

    Ok(results)
}

fn commit_one(
    db: &Database,
    actor: &str,
    asset_type_id: Option<i64>,
    row: &NormalizedRow,
) -> Result<RowOutcome, CommitError> {
    match &row.core {
        CoreFields::Assets(core) => {
            let asset_type_id = asset_type_id
                .ok_or_else(|| CommitError::Row("asset type not resolved".to_string()))?;
            commit_asset(db, actor, asset_type_id, core, row)
        }
        CoreFields::Contracts(core) => commit_contract(db, actor, core),
        CoreFields::Providers(core) => commit_provider(db, actor, core),
    }
}

/// Resolve an optional reference against a simple master table by exact
/// name, failing the row with a message naming the column and value
fn resolve_named(
    db: &Database,
    kind: MasterKind,
    value: &Option<String>,
) -> Result<Option<i64>, CommitError> {
    match value {
        None => Ok(None),
        Some(name) => db
            .find_named_id(kind, name)?
            .map(Some)
            .ok_or_else(|| CommitError::Row(format!("{}: no match for '{}'", kind.column(), name))),
    }
}

fn resolve_manufacturer_model(
    db: &Database,
    core: &AssetCore,
) -> Result<(Option<i64>, Option<i64>), CommitError> {
    let manufacturer_id = match &core.manufacturer {
        None => None,
        Some(name) => Some(db.find_manufacturer(name)?.ok_or_else(|| {
            CommitError::Row(format!("manufacturer: no match for '{}'", name))
        })?),
    };

    let model_id = match &core.model {
        None => None,
        Some(name) => {
            let Some(manufacturer_id) = manufacturer_id else {
                return Err(CommitError::Row(format!(
                    "model: '{}' given without a manufacturer",
                    name
                )));
            };
            Some(db.find_model(manufacturer_id, name)?.ok_or_else(|| {
                CommitError::Row(format!("model: no match for '{}'", name))
            })?)
        }
    };

    Ok((manufacturer_id, model_id))
}

fn commit_asset(
    db: &Database,
    actor: &str,
    asset_type_id: i64,
    core: &AssetCore,
    row: &NormalizedRow,
) -> Result<RowOutcome, CommitError> {
    let (manufacturer_id, model_id) = resolve_manufacturer_model(db, core)?;

    let record = AssetRecord {
        asset_type_id,
        name: core.name.clone(),
        serial_number: core.serial_number.clone(),
        manufacturer_id,
        model_id,
        status_id: resolve_named(db, MasterKind::Status, &core.status)?,
        location_id: resolve_named(db, MasterKind::Location, &core.location)?,
        department_id: resolve_named(db, MasterKind::Department, &core.department)?,
        provider_id: resolve_named(db, MasterKind::Provider, &core.provider)?,
        acquisition_format_id: resolve_named(
            db,
            MasterKind::AcquisitionFormat,
            &core.acquisition_format,
        )?,
        purchase_date: core.purchase_date.map(|d| d.format(DATE_FORMAT).to_string()),
        purchase_price: core.purchase_price,
        description: core.description.clone(),
    };

    // Upsert by natural key; serial-less rows always create
    let existing = match &core.serial_number {
        Some(serial) => db.find_asset_by_natural_key(asset_type_id, serial)?,
        None => None,
    };

    let (asset_id, outcome, before) = match existing {
        Some(id) => {
            let before = db.asset_snapshot(id)?;
            db.update_asset(id, &record)?;
            (id, RowOutcome::Updated, before)
        }
        None => (db.insert_asset(&record)?, RowOutcome::Created, None),
    };

    for value in &row.custom {
        db.write_field_value(asset_id, value.field_def_id, &value.value.storage_value())?;
    }

    let after = db.asset_snapshot(asset_id)?;
    let operation = match outcome {
        RowOutcome::Updated => "import.update",
        _ => "import.create",
    };
    db.append_audit(actor, operation, "asset", asset_id, before.as_ref(), after.as_ref())?;

    Ok(outcome)
}

fn commit_contract(
    db: &Database,
    actor: &str,
    core: &ContractCore,
) -> Result<RowOutcome, CommitError> {
    let record = ContractRecord {
        name: core.name.clone(),
        number: core.number.clone(),
        provider_id: resolve_named(db, MasterKind::Provider, &core.provider)?,
        start_date: core.start_date.map(|d| d.format(DATE_FORMAT).to_string()),
        end_date: core.end_date.map(|d| d.format(DATE_FORMAT).to_string()),
        cost: core.cost,
        description: core.description.clone(),
    };

    let (contract_id, outcome, before) = match db.find_contract_by_number(&core.number)? {
        Some(id) => {
            let before = db.contract_snapshot(id)?;
            db.update_contract(id, &record)?;
            (id, RowOutcome::Updated, before)
        }
        None => (db.insert_contract(&record)?, RowOutcome::Created, None),
    };

    let after = db.contract_snapshot(contract_id)?;
    let operation = match outcome {
        RowOutcome::Updated => "import.update",
        _ => "import.create",
    };
    db.append_audit(actor, operation, "contract", contract_id, before.as_ref(), after.as_ref())?;

    Ok(outcome)
}

fn commit_provider(
    db: &Database,
    actor: &str,
    core: &ProviderCore,
) -> Result<RowOutcome, CommitError> {
    let record = ProviderRecord {
        name: core.name.clone(),
        website: core.website.clone(),
        phone: core.phone.clone(),
        email: core.email.clone(),
        address: core.address.clone(),
        description: core.description.clone(),
    };

    let (provider_id, outcome, before) = match db.find_provider_by_name(&core.name)? {
        Some(id) => {
            let before = db.provider_snapshot(id)?;
            db.update_provider(id, &record)?;
            (id, RowOutcome::Updated, before)
        }
        None => (db.insert_provider(&record)?, RowOutcome::Created, None),
    };

    let after = db.provider_snapshot(provider_id)?;
    let operation = match outcome {
        RowOutcome::Updated => "import.update",
        _ => "import.create",
    };
    db.append_audit(actor, operation, "provider", provider_id, before.as_ref(), after.as_ref())?;

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::fields::{FieldType, TypedValue};
    use crate::import::parser::{CustomValue, RowIssue};

    struct Fixture {
        db: Database,
        type_id: i64,
        ram_def_id: i64,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let type_id = db.create_asset_type("Laptop").unwrap();
        let ram_def_id = db
            .create_field_def(type_id, "ram_gb", FieldType::Number, false, &[], None, None)
            .unwrap();
        db.create_named(MasterKind::Status, "In use").unwrap();
        let mf = db.find_or_create_manufacturer("Lenovo").unwrap();
        db.find_or_create_model(mf, "ThinkPad T14").unwrap();
        Fixture {
            db,
            type_id,
            ram_def_id,
        }
    }

    fn asset_row(fix: &Fixture, line: usize, serial: Option<&str>, status: &str) -> NormalizedRow {
        NormalizedRow {
            line,
            core: CoreFields::Assets(AssetCore {
                name: format!("asset-{}", line),
                serial_number: serial.map(String::from),
                manufacturer: Some("Lenovo".to_string()),
                model: Some("ThinkPad T14".to_string()),
                status: Some(status.to_string()),
                ..Default::default()
            }),
            custom: vec![CustomValue {
                field_def_id: fix.ram_def_id,
                name: "ram_gb".to_string(),
                value: TypedValue::Number(16.0),
            }],
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let fix = fixture();
        let rows = vec![asset_row(&fix, 2, Some("SN-1"), "In use")];

        let first = commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();
        assert_eq!(first[0].outcome, RowOutcome::Created);

        let second = commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();
        assert_eq!(second[0].outcome, RowOutcome::Updated);

        assert_eq!(fix.db.list_assets(None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_serial_less_rows_always_create() {
        let fix = fixture();
        let rows = vec![asset_row(&fix, 2, None, "In use")];

        commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();
        commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();
        assert_eq!(fix.db.list_assets(None, None).unwrap().len(), 2);
    }

    #[test]
    fn test_partial_failure_commits_valid_rows() {
        let fix = fixture();
        let mut rows: Vec<NormalizedRow> = (0..10)
            .map(|i| asset_row(&fix, i + 2, Some(&format!("SN-{}", i)), "In use"))
            .collect();
        // Row 5 references a status that does not exist
        rows[4] = asset_row(&fix, 6, Some("SN-4"), "Broken");

        let results = commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();
        let failed: Vec<_> = results
            .iter()
            .filter(|r| !r.outcome.is_success())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].line, 6);
        match &failed[0].outcome {
            RowOutcome::Error(msg) => {
                assert!(msg.contains("status"));
                assert!(msg.contains("Broken"));
            }
            other => panic!("expected error outcome, got {:?}", other),
        }
        assert_eq!(fix.db.list_assets(None, None).unwrap().len(), 9);
    }

    #[test]
    fn test_flagged_row_persists_nothing() {
        let fix = fixture();
        let mut row = asset_row(&fix, 2, Some("SN-1"), "In use");
        row.issues.push(RowIssue {
            column: "ram_gb".to_string(),
            value: "abc".to_string(),
            message: "'abc' is not a number".to_string(),
        });

        let results = commit_rows(&fix.db, "tester", Some(fix.type_id), &[row]).unwrap();
        assert_eq!(results[0].outcome.label(), "error");
        assert!(fix.db.list_assets(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_field_values_written_on_success() {
        let fix = fixture();
        let rows = vec![asset_row(&fix, 2, Some("SN-1"), "In use")];
        commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();

        let assets = fix.db.list_assets(None, None).unwrap();
        let values = fix.db.field_values_for(assets[0].id).unwrap();
        assert_eq!(values, vec![("ram_gb".to_string(), "16".to_string(), None)]);
    }

    #[test]
    fn test_audit_entries_per_successful_row() {
        let fix = fixture();
        let rows = vec![asset_row(&fix, 2, Some("SN-1"), "In use")];
        commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();
        commit_rows(&fix.db, "tester", Some(fix.type_id), &rows).unwrap();

        let entries = fix.db.list_audit(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].operation, "import.update");
        assert!(entries[0].before.is_some());
        assert_eq!(entries[1].operation, "import.create");
    }

    #[test]
    fn test_unknown_manufacturer_fails_row() {
        let fix = fixture();
        let mut row = asset_row(&fix, 2, Some("SN-1"), "In use");
        if let CoreFields::Assets(core) = &mut row.core {
            core.manufacturer = Some("Dell".to_string());
            core.model = Some("Latitude".to_string());
        }

        let results = commit_rows(&fix.db, "tester", Some(fix.type_id), &[row]).unwrap();
        match &results[0].outcome {
            RowOutcome::Error(msg) => assert!(msg.contains("manufacturer")),
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_contract_upsert_by_number() {
        let db = Database::open_in_memory().unwrap();
        let row = NormalizedRow {
            line: 2,
            core: CoreFields::Contracts(ContractCore {
                name: "Support".to_string(),
                number: "CT-1".to_string(),
                ..Default::default()
            }),
            custom: Vec::new(),
            issues: Vec::new(),
        };

        let first = commit_rows(&db, "tester", None, std::slice::from_ref(&row)).unwrap();
        assert_eq!(first[0].outcome, RowOutcome::Created);
        let second = commit_rows(&db, "tester", None, &[row]).unwrap();
        assert_eq!(second[0].outcome, RowOutcome::Updated);
    }

    #[test]
    fn test_provider_upsert_by_name() {
        let db = Database::open_in_memory().unwrap();
        let row = NormalizedRow {
            line: 2,
            core: CoreFields::Providers(ProviderCore {
                name: "Acme".to_string(),
                email: Some("sales@acme.example".to_string()),
                ..Default::default()
            }),
            custom: Vec::new(),
            issues: Vec::new(),
        };

        let first = commit_rows(&db, "tester", None, std::slice::from_ref(&row)).unwrap();
        assert_eq!(first[0].outcome, RowOutcome::Created);
        let second = commit_rows(&db, "tester", None, &[row]).unwrap();
        assert_eq!(second[0].outcome, RowOutcome::Updated);
    }
}
