// ============================================================================
// crudsql Library
// ============================================================================

extern crate self as crudsql;

pub mod builder;
pub mod config;
pub mod core;
pub mod dialect;
pub mod executor;
pub mod facade;
pub mod global;
pub mod identity;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod prelude;

// Re-export main types for convenience
pub use builder::{InsertStatement, KeySource, SqlBuilder, Statement};
pub use config::CrudConfig;
pub use core::{CrudError, FromValue, IntoValue, Params, Result, Row, Value};
pub use dialect::{Dialect, DialectProfile, QuoteStyle};
pub use executor::Executor;
pub use facade::Crud;
pub use global::{dialect, set_column_name_resolver, set_dialect, set_table_name_resolver};
pub use identity::sequential_uuid;
pub use metadata::{FieldDescriptor, FieldKind, FieldMarkers, MetadataCache, ModelDescriptor};
pub use model::{Filter, InsertKey, Key, KeyFamily, Model};
pub use naming::{
    ColumnNameResolver, DefaultColumnNameResolver, DefaultTableNameResolver, TableNameResolver,
};

// Derive macros share their names with the traits they implement
pub use crudsql_derive::{Filter, Model};
