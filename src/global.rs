//! The process default builder used by [`Crud::new`](crate::Crud::new).
//!
//! Every setter swaps in a whole new [`SqlBuilder`]; callers that already
//! hold a snapshot keep rendering with the configuration they started with.

use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;

use crate::builder::SqlBuilder;
use crate::config::CrudConfig;
use crate::dialect::DialectProfile;
use crate::naming::{ColumnNameResolver, TableNameResolver};

lazy_static! {
    static ref DEFAULT_BUILDER: RwLock<Arc<SqlBuilder>> = RwLock::new(Arc::new(SqlBuilder::default()));
}

/// Snapshot of the current default builder.
pub fn builder() -> Arc<SqlBuilder> {
    DEFAULT_BUILDER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the default builder with one built from `config`.
pub fn configure(config: CrudConfig) {
    tracing::info!(dialect = %config.dialect.name, "default configuration replaced");
    let builder = Arc::new(config.build());
    *DEFAULT_BUILDER
        .write()
        .unwrap_or_else(PoisonError::into_inner) = builder;
}

fn reconfigure(change: impl FnOnce(CrudConfig) -> CrudConfig) {
    let mut current = DEFAULT_BUILDER.write().unwrap_or_else(PoisonError::into_inner);
    let config = change(current.config().clone());
    *current = Arc::new(config.build());
}

/// Switches the default dialect, keeping the naming strategies.
pub fn set_dialect(dialect: impl Into<DialectProfile>) {
    let dialect = dialect.into();
    tracing::info!(dialect = %dialect.name, "default dialect changed");
    reconfigure(|config| config.dialect(dialect));
}

/// Name of the default dialect, e.g. `"SQLServer"`.
pub fn dialect() -> String {
    builder().dialect().name.clone()
}

pub fn set_table_name_resolver(resolver: impl TableNameResolver + 'static) {
    reconfigure(|config| config.table_name_resolver(resolver));
}

pub fn set_column_name_resolver(resolver: impl ColumnNameResolver + 'static) {
    reconfigure(|config| config.column_name_resolver(resolver));
}
