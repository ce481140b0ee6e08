//! Schema manager
//!
//! The relational schema is generated from the entity descriptors and
//! materialized with `CREATE ... IF NOT EXISTS` on every open. There is
//! no version table: existing tables and rows are never altered.

mod ddl;
mod manager;

pub(crate) use ddl::quote_ident;
pub use ddl::{create_index_sql, create_table_sql, schema_statements};
pub use manager::{ensure_schema, index_names, table_names};
