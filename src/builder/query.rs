use super::{SqlBuilder, Statement, append_conditions};
use crate::core::{CrudError, Params, Result};
use crate::model::{Filter, Key, Model};

impl SqlBuilder {
    /// `SELECT <cols> FROM <table> WHERE <identity predicates>`
    pub fn get<M: Model>(&self, key: impl Into<Key>) -> Result<Statement> {
        let identity = self.require_identity::<M>("Get")?;
        let key = key.into();

        let mut params = Params::new();
        let mut sql = format!(
            "SELECT {} FROM {} WHERE ",
            self.select_columns::<M>(),
            self.table_name::<M>()
        );
        self.key_predicates::<M>(&mut sql, &mut params, &identity, &key)?;
        Ok(self.finish::<M>("Get", sql, params))
    }

    /// Every row matching the filter's fields exactly.
    pub fn get_list<M: Model, F: Filter>(&self, filter: &F) -> Result<Statement> {
        self.require_identity::<M>("GetList")?;

        let mut params = Params::new();
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_columns::<M>(),
            self.table_name::<M>()
        );
        self.filter_clause::<M, F>(&mut sql, &mut params, filter);
        Ok(self.finish::<M>("GetList", sql, params))
    }

    pub fn get_all<M: Model>(&self) -> Result<Statement> {
        self.get_list::<M, ()>(&())
    }

    /// Appends a caller written clause (including its own `WHERE`) verbatim.
    pub fn get_list_where<M: Model>(&self, conditions: &str, params: Params) -> Result<Statement> {
        self.require_identity::<M>("GetList")?;

        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_columns::<M>(),
            self.table_name::<M>()
        );
        append_conditions(&mut sql, conditions);
        Ok(self.finish::<M>("GetList", sql, params))
    }

    /// One page of rows through the dialect's paging template.
    ///
    /// Pages start at 1. A blank `order_by` orders by the first identity column.
    pub fn get_list_paged<M: Model>(
        &self,
        page: u32,
        rows_per_page: u32,
        conditions: &str,
        order_by: &str,
        params: Params,
    ) -> Result<Statement> {
        let dialect = &self.config.dialect;
        let template = dialect
            .paged_list_sql
            .as_deref()
            .ok_or_else(|| CrudError::PagingUnsupported(dialect.name.clone()))?;
        if page == 0 {
            return Err(CrudError::InvalidPage(page));
        }
        let identity = self.require_identity::<M>("GetListPaged")?;

        let order_by = match order_by.trim() {
            "" => self.column_name::<M>(identity[0]).to_string(),
            order_by => order_by.to_string(),
        };
        let offset = u64::from(page - 1) * u64::from(rows_per_page);

        let sql = template
            .replace("{SelectColumns}", &self.select_columns::<M>())
            .replace("{TableName}", &self.table_name::<M>())
            .replace("{WhereClause}", conditions.trim())
            .replace("{OrderBy}", &order_by)
            .replace("{PageNumber}", &page.to_string())
            .replace("{RowsPerPage}", &rows_per_page.to_string())
            .replace("{Offset}", &offset.to_string());
        Ok(self.finish::<M>("GetListPaged", sql, params))
    }

    /// `SELECT COUNT(1) FROM <table>` narrowed by the filter's fields.
    pub fn record_count<M: Model, F: Filter>(&self, filter: &F) -> Result<Statement> {
        let mut params = Params::new();
        let mut sql = format!("SELECT COUNT(1) FROM {}", self.table_name::<M>());
        self.filter_clause::<M, F>(&mut sql, &mut params, filter);
        Ok(self.finish::<M>("RecordCount", sql, params))
    }

    pub fn record_count_where<M: Model>(&self, conditions: &str, params: Params) -> Result<Statement> {
        let mut sql = format!("SELECT COUNT(1) FROM {}", self.table_name::<M>());
        append_conditions(&mut sql, conditions);
        Ok(self.finish::<M>("RecordCount", sql, params))
    }
}
