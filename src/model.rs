use uuid::Uuid;

use crate::core::{FromValue, IntoValue, Params, Result, Row, Value};
use crate::metadata::ModelDescriptor;

/// A record type mapped to exactly one table.
///
/// Implemented by `#[derive(Model)]`; the descriptor is a `static` so field
/// markers are never re-inspected at runtime.
///
/// # Example
///
/// ```
/// use crudsql::Model;
///
/// #[derive(Debug, Default, Model)]
/// #[crud(table = "Users")]
/// struct User {
///     #[crud(key)]
///     id: i64,
///     name: String,
///     age: i32,
/// }
///
/// assert_eq!(User::descriptor().table, Some("Users"));
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    fn descriptor() -> &'static ModelDescriptor;

    /// Current value of a column-backed field, `None` for unknown or complex fields.
    fn field_value(&self, field: &str) -> Option<Value>;

    fn set_field_value(&mut self, field: &str, value: Value) -> Result<()>;

    /// Builds an instance from a row produced by this model's select list.
    fn from_row(row: &Row) -> Result<Self>;
}

/// Exact-match conditions: every field becomes `column = @field`, or
/// `column IS NULL` when its value is null.
///
/// Implemented by `#[derive(Filter)]`.
pub trait Filter: Send + Sync + 'static {
    fn filter_fields() -> &'static [&'static str];

    fn filter_value(&self, field: &str) -> Value;

    fn to_params(&self) -> Params {
        Self::filter_fields()
            .iter()
            .map(|&name| (name, self.filter_value(name)))
            .collect()
    }
}

/// No conditions at all.
impl Filter for () {
    fn filter_fields() -> &'static [&'static str] {
        &[]
    }

    fn filter_value(&self, _field: &str) -> Value {
        Value::Null
    }
}

/// Identity value for fetching or deleting by key.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Single(Value),
    /// One value per identity field, looked up by field name.
    Composite(Params),
}

impl Key {
    pub fn composite(params: Params) -> Self {
        Self::Composite(params)
    }

    /// Reads a composite key off a filter struct whose field names match the key fields.
    pub fn of<F: Filter>(filter: &F) -> Self {
        Self::Composite(filter.to_params())
    }
}

macro_rules! impl_key_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Key::Single(value.to_value())
                }
            }
        )*
    };
}

impl_key_from!(i16, i32, i64, u16, u32, u64, String, &str, Uuid);

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key::Single(value)
    }
}

impl From<Params> for Key {
    fn from(params: Params) -> Self {
        Key::Composite(params)
    }
}

/// How the key of a freshly inserted row is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    /// Generated by the database and fetched with the dialect's identity SQL.
    Integer,
    /// Generated client-side as a sequential UUID when unset.
    Uuid,
    /// Always supplied by the caller.
    Text,
}

/// Types an insert may return as the new row's key.
pub trait InsertKey: FromValue + Send + 'static {
    const FAMILY: KeyFamily;
}

macro_rules! impl_insert_key {
    ($family:ident => $($ty:ty),*) => {
        $(
            impl InsertKey for $ty {
                const FAMILY: KeyFamily = KeyFamily::$family;
            }
        )*
    };
}

impl_insert_key!(Integer => i16, u16, i32, u32, i64, u64);
impl_insert_key!(Uuid => Uuid);
impl_insert_key!(Text => String);

impl<T: InsertKey> InsertKey for Option<T> {
    const FAMILY: KeyFamily = T::FAMILY;
}
