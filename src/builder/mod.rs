//! Statement synthesis.
//!
//! A [`SqlBuilder`] fixes one dialect and one pair of naming strategies for
//! its whole lifetime. Resolved names and rendered fragments are memoized in
//! the builder itself, so two builders configured differently never share a
//! fragment. Field eligibility comes from the process-wide
//! [`MetadataCache`].

mod mutation;
mod query;

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub use mutation::{InsertStatement, KeySource};

use crate::config::CrudConfig;
use crate::core::{CrudError, Params, Result, Value, PARAM_SIGIL};
use crate::dialect::DialectProfile;
use crate::metadata::cache::{FieldList, cached_or_compute};
use crate::metadata::{FieldDescriptor, MetadataCache};
use crate::model::{Filter, Key, Model};

/// Rendered SQL text plus the named values it references.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Fragment {
    SelectColumns,
    InsertColumns,
    InsertValues,
    UpdateSet,
}

#[derive(Debug, Default)]
struct FragmentCache {
    tables: RwLock<HashMap<TypeId, Arc<str>>>,
    columns: RwLock<HashMap<(TypeId, &'static str), Arc<str>>>,
    fragments: RwLock<HashMap<(TypeId, Fragment), Arc<str>>>,
    misses: AtomicUsize,
}

/// Generates parameterized statements for [`Model`] types.
pub struct SqlBuilder {
    config: CrudConfig,
    metadata: &'static MetadataCache,
    cache: FragmentCache,
}

impl SqlBuilder {
    pub fn new(config: CrudConfig) -> Self {
        Self::with_metadata(config, MetadataCache::global())
    }

    /// Reads field subsets from `metadata` instead of the process-wide cache.
    pub fn with_metadata(config: CrudConfig, metadata: &'static MetadataCache) -> Self {
        tracing::debug!(dialect = %config.dialect.name, "creating statement builder");
        Self {
            config,
            metadata,
            cache: FragmentCache::default(),
        }
    }

    pub fn dialect(&self) -> &DialectProfile {
        &self.config.dialect
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.config.command_timeout
    }

    /// Number of names and fragments rendered so far by this builder.
    pub fn fragment_misses(&self) -> usize {
        self.cache.misses.load(Ordering::Relaxed)
    }

    /// Resolved, quoted table name of `M`.
    pub fn table_name<M: Model>(&self) -> Arc<str> {
        cached_or_compute(
            &self.cache.tables,
            TypeId::of::<M>(),
            &self.cache.misses,
            || {
                let name = self
                    .config
                    .table_resolver
                    .resolve_table_name(M::descriptor(), &self.config.dialect);
                tracing::trace!(model = M::descriptor().name, table = %name, "resolved table name");
                name.into()
            },
        )
    }

    /// Resolved, quoted column name of one field of `M`.
    pub fn column_name<M: Model>(&self, field: &'static FieldDescriptor) -> Arc<str> {
        cached_or_compute(
            &self.cache.columns,
            (TypeId::of::<M>(), field.name),
            &self.cache.misses,
            || {
                self.config
                    .column_resolver
                    .resolve_column_name(field, &self.config.dialect)
                    .into()
            },
        )
    }

    fn fragment<M: Model>(&self, kind: Fragment, render: impl FnOnce() -> String) -> Arc<str> {
        cached_or_compute(
            &self.cache.fragments,
            (TypeId::of::<M>(), kind),
            &self.cache.misses,
            || {
                tracing::trace!(model = M::descriptor().name, fragment = ?kind, "rendering fragment");
                render().into()
            },
        )
    }

    fn require_identity<M: Model>(&self, operation: &'static str) -> Result<FieldList> {
        let identity = self.metadata.identity_fields::<M>();
        if identity.is_empty() {
            return Err(CrudError::MissingKey {
                operation,
                model: M::descriptor().name,
            });
        }
        Ok(identity)
    }

    /// `col AS name` whenever the resolved column is not the quoted field name,
    /// so rows always come back labelled by field.
    fn select_columns<M: Model>(&self) -> Arc<str> {
        self.fragment::<M>(Fragment::SelectColumns, || {
            let mut sql = String::new();
            let fields = self.metadata.selectable_fields::<M>();
            append_separated(
                &mut sql,
                fields.iter().map(|&field| {
                    let column = self.column_name::<M>(field);
                    let label = self.config.dialect.encapsulate(field.name);
                    if *column == *label {
                        column.to_string()
                    } else {
                        format!("{} AS {}", column, label)
                    }
                }),
                ", ",
            );
            sql
        })
    }

    /// Appends `col = @name` (or `col IS NULL`) for each pair, binding non-null values.
    fn render_predicates(
        &self,
        sql: &mut String,
        params: &mut Params,
        predicates: impl IntoIterator<Item = (Arc<str>, &'static str, Value)>,
    ) {
        let predicates = predicates.into_iter().map(|(column, name, value)| {
            if value.is_null() {
                format!("{} IS NULL", column)
            } else {
                params.insert(name, value);
                format!("{} = {}{}", column, PARAM_SIGIL, name)
            }
        });
        append_separated(sql, predicates, " AND ");
    }

    /// Identity predicates taking their values from an entity.
    fn entity_predicates<M: Model>(
        &self,
        sql: &mut String,
        params: &mut Params,
        identity: &[&'static FieldDescriptor],
        entity: &M,
    ) {
        let predicates = identity.iter().map(|&field| {
            let value = entity.field_value(field.name).unwrap_or(Value::Null);
            (self.column_name::<M>(field), field.name, value)
        });
        self.render_predicates(sql, params, predicates);
    }

    /// Identity predicates taking their values from a caller supplied key.
    fn key_predicates<M: Model>(
        &self,
        sql: &mut String,
        params: &mut Params,
        identity: &[&'static FieldDescriptor],
        key: &Key,
    ) -> Result<()> {
        let values = match key {
            Key::Single(value) => {
                let mut values = Params::new();
                values.insert(identity[0].name, value.clone());
                values
            }
            Key::Composite(values) => values.clone(),
        };

        let mut predicates = Vec::with_capacity(identity.len());
        for &field in identity {
            let value = values.get(field.name).cloned().ok_or_else(|| CrudError::CompositeKey {
                model: M::descriptor().name,
                field: field.name.to_string(),
            })?;
            predicates.push((self.column_name::<M>(field), field.name, value));
        }
        self.render_predicates(sql, params, predicates);
        Ok(())
    }

    /// ` WHERE ...` built from a filter struct; nothing at all for an empty filter.
    fn filter_clause<M: Model, F: Filter>(&self, sql: &mut String, params: &mut Params, filter: &F) {
        let fields = self.metadata.filter_fields::<M, F>();
        if fields.is_empty() {
            return;
        }
        sql.push_str(" WHERE ");
        let predicates = fields.iter().map(|field| {
            let column = match field.model_field {
                Some(model_field) => self.column_name::<M>(model_field),
                None => self.config.dialect.encapsulate(field.name).into(),
            };
            (column, field.name, filter.filter_value(field.name))
        });
        self.render_predicates(sql, params, predicates);
    }

    fn finish<M: Model>(&self, operation: &'static str, sql: String, params: Params) -> Statement {
        tracing::debug!(
            model = M::descriptor().name,
            dialect = %self.config.dialect.name,
            params = params.len(),
            sql = %sql,
            "built {} statement",
            operation
        );
        Statement { sql, params }
    }
}

impl fmt::Debug for SqlBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("config", &self.config)
            .field("fragment_misses", &self.fragment_misses())
            .finish()
    }
}

impl Default for SqlBuilder {
    fn default() -> Self {
        Self::new(CrudConfig::default())
    }
}

/// Pushes every item followed by `separator`, then trims the final separator
/// once if anything was written.
fn append_separated(out: &mut String, items: impl Iterator<Item = String>, separator: &str) {
    let mut rendered = false;
    for item in items {
        out.push_str(&item);
        out.push_str(separator);
        rendered = true;
    }
    if rendered {
        out.truncate(out.len() - separator.len());
    }
}

/// ` {conditions}` for a non-blank raw clause.
fn append_conditions(sql: &mut String, conditions: &str) {
    let conditions = conditions.trim();
    if !conditions.is_empty() {
        sql.push(' ');
        sql.push_str(conditions);
    }
}
