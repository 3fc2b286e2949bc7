//! Everything an application needs to map models and run statements.
//!
//! ```
//! use crudsql::prelude::*;
//!
//! #[derive(Debug, Default, Model)]
//! struct Tag {
//!     id: i32,
//!     label: String,
//! }
//!
//! let builder = CrudConfig::new(Dialect::Sqlite).build();
//! let statement = builder.get::<Tag>(7).unwrap();
//! assert_eq!(statement.sql, r#"SELECT "id", "label" FROM "Tag" WHERE "id" = @id"#);
//! ```

pub use crate::{
    Crud, CrudConfig, CrudError, Dialect, DialectProfile, Executor, Filter, FromValue, IntoValue,
    Key, Model, Params, Result, Row, SqlBuilder, Statement, Value,
};
