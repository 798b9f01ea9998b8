//! Schema model & algebra

pub mod column;
pub mod columngroup;
pub mod columnset;
#[allow(clippy::module_inception)]
pub mod schema;

pub use column::{Column, ColumnType};
pub use columngroup::{ColumnGroup, GroupMember};
pub use columnset::{ColumnSet, ColumnSetError};
pub use schema::{Schema, SchemaConflict, SchemaMember};
