#![allow(dead_code)]

use std::time::Duration;

use async_trait::async_trait;
use crudsql::{CrudError, Executor, Filter, Model, Params, Result, Row, Value};
use rusqlite::types::{ToSql, Value as SqlValue, ValueRef};
use rusqlite::Connection;

/// In-memory SQLite connection driven through the `Executor` trait.
pub struct SqliteExecutor {
    conn: Connection,
    pub statements: Vec<String>,
    pub last_timeout: Option<Duration>,
}

impl SqliteExecutor {
    pub fn open(schema: &str) -> Self {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema).unwrap();
        Self {
            conn,
            statements: Vec::new(),
            last_timeout: None,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn record(&mut self, sql: &str, timeout: Option<Duration>) {
        self.statements.push(sql.to_string());
        self.last_timeout = timeout;
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::Uuid(u) => SqlValue::Text(u.to_string()),
        Value::Timestamp(ts) => SqlValue::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        Value::Bytes(bytes) => SqlValue::Blob(bytes.clone()),
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    }
}

/// Named values for the parameters `stmt` actually references.
fn bind(stmt: &rusqlite::Statement<'_>, params: &Params) -> Result<Vec<(String, SqlValue)>> {
    let mut values = Vec::new();
    for (name, value) in params.iter() {
        let label = format!("@{}", name);
        if stmt.parameter_index(&label).map_err(CrudError::execution)?.is_some() {
            values.push((label, to_sql(value)));
        }
    }
    Ok(values)
}

fn named(values: &[(String, SqlValue)]) -> Vec<(&str, &dyn ToSql)> {
    values
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

fn run_execute(conn: &Connection, sql: &str, params: &Params) -> Result<u64> {
    let mut stmt = conn.prepare(sql).map_err(CrudError::execution)?;
    let values = bind(&stmt, params)?;
    let changed = stmt
        .execute(named(&values).as_slice())
        .map_err(CrudError::execution)?;
    Ok(changed as u64)
}

/// Runs a `;`-separated batch, returning the rows of its last statement.
fn run_query(conn: &Connection, sql: &str, params: &Params) -> Result<Vec<Row>> {
    let mut statements: Vec<&str> = sql
        .split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    let Some(last) = statements.pop() else {
        return Ok(Vec::new());
    };
    for statement in statements {
        run_execute(conn, statement, params)?;
    }

    let mut stmt = conn.prepare(last).map_err(CrudError::execution)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let values = bind(&stmt, params)?;
    let mut rows = stmt
        .query(named(&values).as_slice())
        .map_err(CrudError::execution)?;

    let mut result = Vec::new();
    while let Some(row) = rows.next().map_err(CrudError::execution)? {
        let mut mapped = Row::default();
        for (index, column) in columns.iter().enumerate() {
            let value = row.get_ref(index).map_err(CrudError::execution)?;
            mapped.push(column.clone(), from_sql(value));
        }
        result.push(mapped);
    }
    Ok(result)
}

#[async_trait]
impl Executor for SqliteExecutor {
    async fn execute(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<u64> {
        self.record(sql, timeout);
        run_execute(&self.conn, sql, params)
    }

    async fn query(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<Vec<Row>> {
        self.record(sql, timeout);
        run_query(&self.conn, sql, params)
    }
}

pub const SCHEMA: &str = "
    CREATE TABLE Users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        age INTEGER NOT NULL
    );
    CREATE TABLE Document (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL
    );
    CREATE TABLE Tag (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL
    );
    CREATE TABLE Contact (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        nickname TEXT
    );
";

#[derive(Debug, Default, Clone, PartialEq, Model)]
#[crud(table = "Users")]
pub struct User {
    #[crud(key)]
    pub id: i64,
    pub name: String,
    pub age: i32,
}

impl User {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            age,
        }
    }
}

#[derive(Filter)]
pub struct ByAge {
    pub age: i32,
}

#[derive(Filter)]
pub struct ByName {
    pub name: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Document {
    pub id: uuid::Uuid,
    pub title: String,
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Tag {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Default, Clone, PartialEq, Model)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub nickname: Option<String>,
}

#[derive(Filter)]
pub struct ByNickname {
    pub nickname: Option<String>,
}
