//! Row commands: list, get, upsert, patch, delete

use super::{print_json, CommandResult, GlobalOptions};
use clap::Args;
use ledgerdesk_core::model::{Entity, Record};
use serde_json::Value;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Table name, e.g. products or saleItems
    pub table: String,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    pub table: String,
    pub id: String,
}

#[derive(Debug, Args)]
pub struct UpsertArgs {
    pub table: String,
    /// JSON object including an "id" field
    pub json: String,
}

#[derive(Debug, Args)]
pub struct PatchArgs {
    pub table: String,
    pub id: String,
    /// JSON object with the columns to change
    pub json: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub table: String,
    pub id: String,
}

fn parse_record(json: &str) -> Result<Record, Box<dyn std::error::Error>> {
    let value: Value = serde_json::from_str(json)?;
    Ok(Record::from_value(value)?)
}

pub fn list(options: &GlobalOptions, args: ListArgs) -> CommandResult {
    let entity: Entity = args.table.parse()?;
    let db = options.open_database()?;

    let mut rows = db.list(entity)?;
    rows.sort_by(|a, b| a.id().cmp(&b.id()));

    print_json(&Value::Array(rows.into_iter().map(Record::into_value).collect()))
}

pub fn get(options: &GlobalOptions, args: GetArgs) -> CommandResult {
    let entity: Entity = args.table.parse()?;
    let db = options.open_database()?;

    match db.get_by_id(entity, &args.id)? {
        Some(row) => print_json(&row.into_value()),
        None => Err(format!("{} '{}' not found", entity, args.id).into()),
    }
}

pub fn upsert(options: &GlobalOptions, args: UpsertArgs) -> CommandResult {
    let entity: Entity = args.table.parse()?;
    let record = parse_record(&args.json)?;
    let mut db = options.open_database()?;

    db.upsert(entity, &record)?;
    db.close()?;
    Ok(())
}

pub fn patch(options: &GlobalOptions, args: PatchArgs) -> CommandResult {
    let entity: Entity = args.table.parse()?;
    let patch = parse_record(&args.json)?;
    let mut db = options.open_database()?;

    db.update_fields(entity, &args.id, &patch)?;
    db.close()?;
    Ok(())
}

pub fn delete(options: &GlobalOptions, args: DeleteArgs) -> CommandResult {
    let entity: Entity = args.table.parse()?;
    let mut db = options.open_database()?;

    db.delete(entity, &args.id)?;
    db.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_requires_object() {
        assert!(parse_record(r#"{"id":"p1"}"#).is_ok());
        assert!(parse_record("[1,2]").is_err());
        assert!(parse_record("not json").is_err());
    }
}
