use std::time::Duration;

use async_trait::async_trait;

use crate::core::{FromValue, Params, Result, Row};

/// Runs rendered statements against a database.
///
/// Connections and open transactions both implement this, so an operation
/// joins a transaction simply by being handed the transaction.
#[async_trait]
pub trait Executor: Send {
    /// Execute a statement, returning the number of affected rows
    async fn execute(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<u64>;

    /// Execute a query, returning rows labelled by column
    async fn query(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<Vec<Row>>;

    /// First column of the first row, `None` when nothing came back
    async fn query_scalar<T>(
        &mut self,
        sql: &str,
        params: &Params,
        timeout: Option<Duration>,
    ) -> Result<Option<T>>
    where
        T: FromValue + Send,
        Self: Sized,
    {
        let rows = self.query(sql, params, timeout).await?;
        match rows.first().and_then(|row| row.value_at(0)) {
            Some(value) => T::from_value(value.clone()).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<'a, E: Executor + ?Sized> Executor for &'a mut E {
    async fn execute(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<u64> {
        (**self).execute(sql, params, timeout).await
    }

    async fn query(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<Vec<Row>> {
        (**self).query(sql, params, timeout).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Box<E> {
    async fn execute(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<u64> {
        (**self).execute(sql, params, timeout).await
    }

    async fn query(&mut self, sql: &str, params: &Params, timeout: Option<Duration>) -> Result<Vec<Row>> {
        (**self).query(sql, params, timeout).await
    }
}
