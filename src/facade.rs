use std::sync::Arc;
use std::time::Duration;

use crate::builder::{KeySource, SqlBuilder};
use crate::core::{CrudError, FromValue, Params, Result, Value};
use crate::executor::Executor;
use crate::global;
use crate::model::{Filter, InsertKey, Key, Model};

/// Async CRUD entry points over an [`Executor`].
///
/// Each call renders its statement with the builder captured at construction
/// and runs it through the executor. Pass a transaction as the executor to
/// make the operations part of it.
pub struct Crud<E> {
    executor: E,
    builder: Arc<SqlBuilder>,
    timeout: Option<Duration>,
}

impl<E: Executor> Crud<E> {
    /// Uses the process default builder as it is right now.
    pub fn new(executor: E) -> Self {
        Self::with_builder(executor, global::builder())
    }

    pub fn with_builder(executor: E, builder: Arc<SqlBuilder>) -> Self {
        Self {
            executor,
            builder,
            timeout: None,
        }
    }

    /// Overrides the builder's default command timeout for every call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn builder(&self) -> &Arc<SqlBuilder> {
        &self.builder
    }

    pub fn executor(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_inner(self) -> E {
        self.executor
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout.or(self.builder.command_timeout())
    }

    async fn fetch<M: Model>(&mut self, sql: &str, params: &Params) -> Result<Vec<M>> {
        let timeout = self.timeout();
        let rows = self.executor.query(sql, params, timeout).await?;
        rows.iter().map(M::from_row).collect()
    }

    async fn count(&mut self, sql: &str, params: &Params) -> Result<u64> {
        let timeout = self.timeout();
        let count = self.executor.query_scalar::<u64>(sql, params, timeout).await?;
        Ok(count.unwrap_or(0))
    }

    async fn run(&mut self, sql: &str, params: &Params) -> Result<u64> {
        let timeout = self.timeout();
        self.executor.execute(sql, params, timeout).await
    }

    /// The entity with the given key, or `None`.
    pub async fn get<M: Model>(&mut self, key: impl Into<Key>) -> Result<Option<M>> {
        let statement = self.builder.get::<M>(key)?;
        let mut rows = self.fetch::<M>(&statement.sql, &statement.params).await?;
        Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
    }

    pub async fn get_list<M: Model, F: Filter>(&mut self, filter: &F) -> Result<Vec<M>> {
        let statement = self.builder.get_list::<M, F>(filter)?;
        self.fetch(&statement.sql, &statement.params).await
    }

    pub async fn get_all<M: Model>(&mut self) -> Result<Vec<M>> {
        let statement = self.builder.get_all::<M>()?;
        self.fetch(&statement.sql, &statement.params).await
    }

    pub async fn get_list_where<M: Model>(&mut self, conditions: &str, params: Params) -> Result<Vec<M>> {
        let statement = self.builder.get_list_where::<M>(conditions, params)?;
        self.fetch(&statement.sql, &statement.params).await
    }

    pub async fn get_list_paged<M: Model>(
        &mut self,
        page: u32,
        rows_per_page: u32,
        conditions: &str,
        order_by: &str,
        params: Params,
    ) -> Result<Vec<M>> {
        let statement =
            self.builder
                .get_list_paged::<M>(page, rows_per_page, conditions, order_by, params)?;
        self.fetch(&statement.sql, &statement.params).await
    }

    /// Inserts the entity and returns its key.
    ///
    /// A database generated key is fetched in the same batch as the insert,
    /// since identity functions such as `SCOPE_IDENTITY()` only see their own
    /// batch, and is written back onto the entity. A freshly assigned
    /// sequential UUID is already on the entity.
    pub async fn insert<K: InsertKey, M: Model>(&mut self, entity: &mut M) -> Result<K> {
        let statement = self.builder.insert::<K, M>(entity)?;

        let key = match statement.key_source {
            KeySource::KeyQuery => {
                let timeout = self.timeout();
                let rows = self
                    .executor
                    .query(&statement.batch_sql(), &statement.insert.params, timeout)
                    .await?;
                let key = rows
                    .first()
                    .and_then(|row| row.value("id"))
                    .cloned()
                    .ok_or_else(|| CrudError::MissingColumn("id".into()))?;
                entity.set_field_value(statement.key_field, key.clone())?;
                key
            }
            KeySource::Entity => {
                self.run(&statement.insert.sql, &statement.insert.params).await?;
                entity.field_value(statement.key_field).unwrap_or(Value::Null)
            }
        };
        <K as FromValue>::from_value(key)
    }

    /// Updates the row matching the entity's key, returning the affected row count.
    pub async fn update<M: Model>(&mut self, entity: &M) -> Result<u64> {
        let statement = self.builder.update(entity)?;
        self.run(&statement.sql, &statement.params).await
    }

    pub async fn delete<M: Model>(&mut self, entity: &M) -> Result<u64> {
        let statement = self.builder.delete(entity)?;
        self.run(&statement.sql, &statement.params).await
    }

    pub async fn delete_by_id<M: Model>(&mut self, key: impl Into<Key>) -> Result<u64> {
        let statement = self.builder.delete_by_id::<M>(key)?;
        self.run(&statement.sql, &statement.params).await
    }

    pub async fn delete_list<M: Model, F: Filter>(&mut self, filter: &F) -> Result<u64> {
        let statement = self.builder.delete_list::<M, F>(filter)?;
        self.run(&statement.sql, &statement.params).await
    }

    pub async fn delete_list_where<M: Model>(&mut self, conditions: &str, params: Params) -> Result<u64> {
        let statement = self.builder.delete_list_where::<M>(conditions, params)?;
        self.run(&statement.sql, &statement.params).await
    }

    pub async fn record_count<M: Model, F: Filter>(&mut self, filter: &F) -> Result<u64> {
        let statement = self.builder.record_count::<M, F>(filter)?;
        self.count(&statement.sql, &statement.params).await
    }

    pub async fn record_count_where<M: Model>(&mut self, conditions: &str, params: Params) -> Result<u64> {
        let statement = self.builder.record_count_where::<M>(conditions, params)?;
        self.count(&statement.sql, &statement.params).await
    }
}
