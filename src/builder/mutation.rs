use super::{Fragment, SqlBuilder, Statement, append_conditions, append_separated};
use crate::core::{CrudError, Params, Result, Value, PARAM_SIGIL};
use crate::identity::sequential_uuid;
use crate::metadata::FieldKind;
use crate::model::{Filter, InsertKey, Key, KeyFamily, Model};

/// Where the key of an inserted row comes from once the insert has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// The `id` column of the first row returned by the key query.
    KeyQuery,
    /// The entity's own identity field, assigned before the insert.
    Entity,
}

/// An insert plus the follow-up query that reports the new key.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub insert: Statement,
    /// Run right after the insert on the same connection.
    pub key_query: Option<String>,
    pub key_source: KeySource,
    /// Identity field that receives or supplies the key.
    pub key_field: &'static str,
}

impl InsertStatement {
    /// Insert and key query as one `;`-separated batch.
    pub fn batch_sql(&self) -> String {
        match &self.key_query {
            Some(query) => format!("{};{}", self.insert.sql, query),
            None => self.insert.sql.clone(),
        }
    }
}

fn family_fits(family: KeyFamily, kind: FieldKind) -> bool {
    match family {
        KeyFamily::Integer => kind == FieldKind::Integer,
        KeyFamily::Uuid | KeyFamily::Text => matches!(kind, FieldKind::Uuid | FieldKind::Text),
    }
}

impl SqlBuilder {
    /// Builds the insert for `entity`, assigning a sequential UUID to an unset
    /// UUID key first.
    ///
    /// `K` is the key type the caller expects back and decides how the key is
    /// obtained; it has to agree with the kind of the first identity field.
    pub fn insert<K: InsertKey, M: Model>(&self, entity: &mut M) -> Result<InsertStatement> {
        let identity = self.require_identity::<M>("Insert")?;
        let key_field = identity[0];
        let model = M::descriptor().name;

        if !matches!(key_field.kind, FieldKind::Integer | FieldKind::Text | FieldKind::Uuid) {
            return Err(CrudError::UnsupportedKeyType {
                model,
                reason: format!(
                    "identity field '{}' is {:?}; only integer, text and uuid keys are supported",
                    key_field.name, key_field.kind
                ),
            });
        }
        if !family_fits(K::FAMILY, key_field.kind) {
            return Err(CrudError::UnsupportedKeyType {
                model,
                reason: format!(
                    "{} key requested for {:?} identity field '{}'",
                    std::any::type_name::<K>(),
                    key_field.kind,
                    key_field.name
                ),
            });
        }

        let current = entity.field_value(key_field.name).unwrap_or(Value::Null);
        let (key_query, key_source) = match K::FAMILY {
            KeyFamily::Uuid => {
                let id = if current.is_empty_key() {
                    let generated = sequential_uuid();
                    let value = match key_field.kind {
                        FieldKind::Text => Value::Text(generated.to_string()),
                        _ => Value::Uuid(generated),
                    };
                    entity.set_field_value(key_field.name, value)?;
                    tracing::trace!(model, key = %generated, "assigned sequential uuid");
                    generated.to_string()
                } else {
                    current.to_string()
                };
                (
                    Some(format!("SELECT '{}' AS id", id.replace('\'', "''"))),
                    KeySource::Entity,
                )
            }
            KeyFamily::Integer if current.is_empty_key() => (
                Some(self.config.dialect.identity_sql.clone()),
                KeySource::KeyQuery,
            ),
            KeyFamily::Integer | KeyFamily::Text => (None, KeySource::Entity),
        };

        let fields = self.metadata.insertable_fields::<M>();
        let columns = self.fragment::<M>(Fragment::InsertColumns, || {
            let mut sql = String::new();
            append_separated(
                &mut sql,
                fields.iter().map(|&field| self.column_name::<M>(field).to_string()),
                ", ",
            );
            sql
        });
        let values = self.fragment::<M>(Fragment::InsertValues, || {
            let mut sql = String::new();
            append_separated(
                &mut sql,
                fields.iter().map(|field| format!("{}{}", PARAM_SIGIL, field.name)),
                ", ",
            );
            sql
        });

        let params: Params = fields
            .iter()
            .map(|field| (field.name, entity.field_value(field.name).unwrap_or(Value::Null)))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name::<M>(),
            columns,
            values
        );

        Ok(InsertStatement {
            insert: self.finish::<M>("Insert", sql, params),
            key_query,
            key_source,
            key_field: key_field.name,
        })
    }

    /// `UPDATE <table> SET ... WHERE <identity predicates>`
    pub fn update<M: Model>(&self, entity: &M) -> Result<Statement> {
        let identity = self.require_identity::<M>("Update")?;
        let fields = self.metadata.updateable_fields::<M>();

        let assignments = self.fragment::<M>(Fragment::UpdateSet, || {
            let mut sql = String::new();
            append_separated(
                &mut sql,
                fields.iter().map(|&field| {
                    format!("{} = {}{}", self.column_name::<M>(field), PARAM_SIGIL, field.name)
                }),
                ", ",
            );
            sql
        });

        let mut params: Params = fields
            .iter()
            .map(|field| (field.name, entity.field_value(field.name).unwrap_or(Value::Null)))
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {} WHERE ",
            self.table_name::<M>(),
            assignments
        );
        self.entity_predicates(&mut sql, &mut params, &identity, entity);
        Ok(self.finish::<M>("Update", sql, params))
    }

    /// Deletes the row matching the entity's identity fields.
    pub fn delete<M: Model>(&self, entity: &M) -> Result<Statement> {
        let identity = self.require_identity::<M>("Delete")?;

        let mut params = Params::new();
        let mut sql = format!("DELETE FROM {} WHERE ", self.table_name::<M>());
        self.entity_predicates(&mut sql, &mut params, &identity, entity);
        Ok(self.finish::<M>("Delete", sql, params))
    }

    pub fn delete_by_id<M: Model>(&self, key: impl Into<Key>) -> Result<Statement> {
        let identity = self.require_identity::<M>("Delete")?;
        let key = key.into();

        let mut params = Params::new();
        let mut sql = format!("DELETE FROM {} WHERE ", self.table_name::<M>());
        self.key_predicates::<M>(&mut sql, &mut params, &identity, &key)?;
        Ok(self.finish::<M>("Delete", sql, params))
    }

    /// Deletes every row matching the filter. An empty filter deletes everything.
    pub fn delete_list<M: Model, F: Filter>(&self, filter: &F) -> Result<Statement> {
        let mut params = Params::new();
        let mut sql = format!("DELETE FROM {}", self.table_name::<M>());
        self.filter_clause::<M, F>(&mut sql, &mut params, filter);
        Ok(self.finish::<M>("DeleteList", sql, params))
    }

    /// Raw-condition bulk delete. Refuses anything without a `WHERE`.
    pub fn delete_list_where<M: Model>(&self, conditions: &str, params: Params) -> Result<Statement> {
        if conditions.trim().is_empty() || !conditions.to_ascii_lowercase().contains("where") {
            return Err(CrudError::DeleteListRequiresWhere);
        }

        let mut sql = format!("DELETE FROM {}", self.table_name::<M>());
        append_conditions(&mut sql, conditions);
        Ok(self.finish::<M>("DeleteList", sql, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_family_compatibility() {
        assert!(family_fits(KeyFamily::Integer, FieldKind::Integer));
        assert!(!family_fits(KeyFamily::Integer, FieldKind::Uuid));
        assert!(family_fits(KeyFamily::Uuid, FieldKind::Text));
        assert!(family_fits(KeyFamily::Text, FieldKind::Uuid));
        assert!(!family_fits(KeyFamily::Text, FieldKind::Integer));
    }

    #[test]
    fn test_batch_sql_joins_key_query() {
        let statement = InsertStatement {
            insert: Statement::new("INSERT INTO t (a) VALUES (@a)", Params::new()),
            key_query: Some("SELECT LASTVAL() AS id".into()),
            key_source: KeySource::KeyQuery,
            key_field: "id",
        };
        assert_eq!(
            statement.batch_sql(),
            "INSERT INTO t (a) VALUES (@a);SELECT LASTVAL() AS id"
        );
    }
}
