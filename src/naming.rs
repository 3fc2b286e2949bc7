//! Pluggable strategies mapping model types and fields to physical names.

use crate::dialect::DialectProfile;
use crate::metadata::{FieldDescriptor, ModelDescriptor};

/// Maps a model type to the (optionally schema-qualified) table it lives in.
pub trait TableNameResolver: Send + Sync {
    fn resolve_table_name(&self, model: &ModelDescriptor, dialect: &DialectProfile) -> String;
}

/// Maps a field to its column.
pub trait ColumnNameResolver: Send + Sync {
    fn resolve_column_name(&self, field: &FieldDescriptor, dialect: &DialectProfile) -> String;
}

/// Quotes the struct name, or the `#[crud(table = "...", schema = "...")]` override.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTableNameResolver;

impl TableNameResolver for DefaultTableNameResolver {
    fn resolve_table_name(&self, model: &ModelDescriptor, dialect: &DialectProfile) -> String {
        let table = dialect.encapsulate(model.table.unwrap_or(model.name));
        match model.schema.filter(|schema| !schema.is_empty()) {
            Some(schema) => format!("{}.{}", dialect.encapsulate(schema), table),
            None => table,
        }
    }
}

/// Quotes the field name, or the `#[crud(column = "...")]` override.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultColumnNameResolver;

impl ColumnNameResolver for DefaultColumnNameResolver {
    fn resolve_column_name(&self, field: &FieldDescriptor, dialect: &DialectProfile) -> String {
        match field.markers.column {
            Some(column) => {
                tracing::trace!(field = field.name, column, "column name overridden");
                dialect.encapsulate(column)
            }
            None => dialect.encapsulate(field.name),
        }
    }
}

impl<F> TableNameResolver for F
where
    F: Fn(&ModelDescriptor, &DialectProfile) -> String + Send + Sync,
{
    fn resolve_table_name(&self, model: &ModelDescriptor, dialect: &DialectProfile) -> String {
        self(model, dialect)
    }
}

impl<F> ColumnNameResolver for F
where
    F: Fn(&FieldDescriptor, &DialectProfile) -> String + Send + Sync,
{
    fn resolve_column_name(&self, field: &FieldDescriptor, dialect: &DialectProfile) -> String {
        self(field, dialect)
    }
}

/// Lowercases a Rust identifier into snake_case, for resolvers that map
/// `OrderLine` to `order_line`.
pub fn to_snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;
    for ch in input.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_lower = true;
        } else {
            out.push('_');
            prev_lower = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::metadata::{FieldKind, FieldMarkers};

    static ORDERS: ModelDescriptor = ModelDescriptor {
        name: "OrderLine",
        module: "tests",
        table: Some("Orders"),
        schema: Some("sales"),
        fields: &[],
    };

    static PLAIN: ModelDescriptor = ModelDescriptor {
        name: "OrderLine",
        module: "tests",
        table: None,
        schema: None,
        fields: &[],
    };

    #[test]
    fn test_default_table_names() {
        let sql_server = Dialect::SqlServer.profile();
        assert_eq!(
            DefaultTableNameResolver.resolve_table_name(&ORDERS, &sql_server),
            "[sales].[Orders]"
        );
        assert_eq!(
            DefaultTableNameResolver.resolve_table_name(&PLAIN, &Dialect::MySql.profile()),
            "`OrderLine`"
        );
    }

    #[test]
    fn test_column_override() {
        let field = FieldDescriptor::new("name", FieldKind::Text).with_markers(FieldMarkers {
            column: Some("full_name"),
            ..FieldMarkers::NONE
        });
        let profile = Dialect::PostgreSql.profile();
        assert_eq!(
            DefaultColumnNameResolver.resolve_column_name(&field, &profile),
            "\"full_name\""
        );
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |model: &ModelDescriptor, dialect: &DialectProfile| {
            dialect.encapsulate(&to_snake_case(model.name))
        };
        let profile = Dialect::Sqlite.profile();
        assert_eq!(resolver.resolve_table_name(&PLAIN, &profile), "\"order_line\"");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("OrderLine"), "order_line");
        assert_eq!(to_snake_case("userID"), "user_id");
        assert_eq!(to_snake_case("plain"), "plain");
    }
}
