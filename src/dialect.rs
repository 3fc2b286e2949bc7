//! SQL syntax differences between the supported database families.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{CrudError, Result};

/// Supported database families. `SqlServer` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dialect {
    #[default]
    #[serde(rename = "SQLServer")]
    SqlServer,
    #[serde(rename = "PostgreSQL")]
    PostgreSql,
    #[serde(rename = "SQLite")]
    Sqlite,
    #[serde(rename = "MySQL")]
    MySql,
}

impl Dialect {
    pub const ALL: [Dialect; 4] = [Self::SqlServer, Self::PostgreSql, Self::Sqlite, Self::MySql];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SqlServer => "SQLServer",
            Self::PostgreSql => "PostgreSQL",
            Self::Sqlite => "SQLite",
            Self::MySql => "MySQL",
        }
    }

    pub fn profile(&self) -> DialectProfile {
        match self {
            Self::PostgreSql => DialectProfile {
                name: self.name().into(),
                quote: QuoteStyle::DoubleQuote,
                identity_sql: "SELECT LASTVAL() AS id".into(),
                paged_list_sql: Some(LIMIT_OFFSET_PAGED_SQL.into()),
            },
            Self::Sqlite => DialectProfile {
                name: self.name().into(),
                quote: QuoteStyle::DoubleQuote,
                identity_sql: "SELECT LAST_INSERT_ROWID() AS id".into(),
                paged_list_sql: Some(LIMIT_OFFSET_PAGED_SQL.into()),
            },
            Self::MySql => DialectProfile {
                name: self.name().into(),
                quote: QuoteStyle::Backtick,
                identity_sql: "SELECT LAST_INSERT_ID() AS id".into(),
                paged_list_sql: Some(
                    "SELECT {SelectColumns} FROM {TableName} {WhereClause} ORDER BY {OrderBy} LIMIT {Offset},{RowsPerPage}"
                        .into(),
                ),
            },
            Self::SqlServer => DialectProfile {
                name: self.name().into(),
                quote: QuoteStyle::Brackets,
                identity_sql: "SELECT CAST(SCOPE_IDENTITY() AS BIGINT) AS [id]".into(),
                paged_list_sql: Some(
                    "SELECT * FROM (SELECT ROW_NUMBER() OVER(ORDER BY {OrderBy}) AS PagedNumber, {SelectColumns} FROM {TableName} {WhereClause}) AS u WHERE PagedNumber BETWEEN (({PageNumber}-1) * {RowsPerPage} + 1) AND ({PageNumber} * {RowsPerPage})"
                        .into(),
                ),
            },
        }
    }
}

const LIMIT_OFFSET_PAGED_SQL: &str = "SELECT {SelectColumns} FROM {TableName} {WhereClause} ORDER BY {OrderBy} LIMIT {RowsPerPage} OFFSET (({PageNumber}-1) * {RowsPerPage})";

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = CrudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "sql server" | "mssql" => Ok(Self::SqlServer),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::MySql),
            _ => Err(CrudError::UnknownDialect(s.to_string())),
        }
    }
}

/// How bare identifiers are wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    /// `[Name]`
    Brackets,
    /// `"Name"`
    DoubleQuote,
    /// `` `Name` ``
    Backtick,
    /// Identifiers are emitted as-is.
    None,
}

/// Immutable description of one database family's syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DialectProfile {
    pub name: String,
    pub quote: QuoteStyle,
    /// Appended after an insert to fetch a database-generated key as column `id`.
    pub identity_sql: String,
    /// Template with `{SelectColumns}`, `{TableName}`, `{WhereClause}`,
    /// `{OrderBy}`, `{PageNumber}`, `{RowsPerPage}` and `{Offset}` placeholders.
    /// `None` when the family cannot page.
    pub paged_list_sql: Option<String>,
}

impl DialectProfile {
    /// A custom profile; paging stays unsupported until a template is set.
    pub fn custom(name: impl Into<String>, quote: QuoteStyle, identity_sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quote,
            identity_sql: identity_sql.into(),
            paged_list_sql: None,
        }
    }

    pub fn with_paged_list_sql(mut self, template: impl Into<String>) -> Self {
        self.paged_list_sql = Some(template.into());
        self
    }

    pub fn encapsulate(&self, identifier: &str) -> String {
        match self.quote {
            QuoteStyle::Brackets => format!("[{}]", identifier),
            QuoteStyle::DoubleQuote => format!("\"{}\"", identifier),
            QuoteStyle::Backtick => format!("`{}`", identifier),
            QuoteStyle::None => identifier.to_string(),
        }
    }
}

impl From<Dialect> for DialectProfile {
    fn from(dialect: Dialect) -> Self {
        dialect.profile()
    }
}
