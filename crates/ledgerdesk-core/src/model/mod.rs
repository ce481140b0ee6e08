//! Entity model: the closed set of tables and the record shape stored in them

pub mod entity;
pub mod record;

pub use entity::{
    ColumnDef, ColumnType, Entity, EntityDescriptor, IndexDef, BOOL_FIELDS, JSON_FIELDS,
};
pub use record::Record;
