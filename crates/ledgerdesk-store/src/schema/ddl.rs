//! DDL generation from entity descriptors

use ledgerdesk_core::model::{Entity, EntityDescriptor, IndexDef};

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name)
}

/// `CREATE TABLE IF NOT EXISTS` for one entity
pub fn create_table_sql(descriptor: &EntityDescriptor) -> String {
    let columns: Vec<String> = descriptor
        .columns
        .iter()
        .map(|c| {
            if c.name == "id" {
                format!("{} TEXT PRIMARY KEY NOT NULL", quote_ident(c.name))
            } else {
                format!("{} {}", quote_ident(c.name), c.ty.sql_type())
            }
        })
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(descriptor.table),
        columns.join(",\n    ")
    )
}

/// `CREATE INDEX IF NOT EXISTS` for one declared index
pub fn create_index_sql(table: &str, index: &IndexDef) -> String {
    let target = match index {
        IndexDef::Column { column, .. } => quote_ident(column),
        IndexDef::Year { column, .. } => format!("substr({}, 1, 4)", quote_ident(column)),
    };
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
        quote_ident(index.name()),
        quote_ident(table),
        target
    )
}

/// Every DDL statement of the schema: all tables first, then all indexes
pub fn schema_statements() -> Vec<String> {
    let tables = Entity::ALL
        .iter()
        .map(|e| create_table_sql(e.descriptor()));
    let indexes = Entity::ALL.iter().flat_map(|e| {
        let d = e.descriptor();
        d.indexes.iter().map(move |i| create_index_sql(d.table, i))
    });
    tables.chain(indexes).collect()
}
