use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::builder::SqlBuilder;
use crate::dialect::{Dialect, DialectProfile};
use crate::naming::{
    ColumnNameResolver, DefaultColumnNameResolver, DefaultTableNameResolver, TableNameResolver,
};

/// Statement generation configuration
///
/// Everything a [`SqlBuilder`] fixes for its lifetime: the dialect, the
/// naming strategies and the command timeout handed to the executor.
#[derive(Clone)]
pub struct CrudConfig {
    /// Active dialect profile
    pub dialect: DialectProfile,

    /// Table naming strategy
    pub table_resolver: Arc<dyn TableNameResolver>,

    /// Column naming strategy
    pub column_resolver: Arc<dyn ColumnNameResolver>,

    /// Default command timeout passed with every statement
    pub command_timeout: Option<Duration>,
}

impl CrudConfig {
    /// Create a configuration for a dialect with the default naming strategies
    pub fn new(dialect: impl Into<DialectProfile>) -> Self {
        Self {
            dialect: dialect.into(),
            table_resolver: Arc::new(DefaultTableNameResolver),
            column_resolver: Arc::new(DefaultColumnNameResolver),
            command_timeout: None,
        }
    }

    /// Set the dialect
    pub fn dialect(mut self, dialect: impl Into<DialectProfile>) -> Self {
        self.dialect = dialect.into();
        self
    }

    /// Set the table name resolver
    pub fn table_name_resolver(mut self, resolver: impl TableNameResolver + 'static) -> Self {
        self.table_resolver = Arc::new(resolver);
        self
    }

    /// Set the column name resolver
    pub fn column_name_resolver(mut self, resolver: impl ColumnNameResolver + 'static) -> Self {
        self.column_resolver = Arc::new(resolver);
        self
    }

    /// Set the command timeout
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> SqlBuilder {
        SqlBuilder::new(self)
    }
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

impl fmt::Debug for CrudConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrudConfig")
            .field("dialect", &self.dialect.name)
            .field("command_timeout", &self.command_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CrudConfig::new(Dialect::MySql).command_timeout(Duration::from_secs(5));
        assert_eq!(config.dialect.name, "MySQL");
        assert_eq!(config.command_timeout, Some(Duration::from_secs(5)));

        let config = config.dialect(Dialect::Sqlite);
        assert_eq!(config.dialect, Dialect::Sqlite.profile());
    }

    #[test]
    fn test_default_is_sql_server() {
        assert_eq!(CrudConfig::default().dialect.name, "SQLServer");
    }
}
