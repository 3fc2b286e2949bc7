use super::{CrudError, FromValue, IntoValue, Result, Value};

/// Sigil prefixed to every parameter name in rendered SQL.
pub const PARAM_SIGIL: char = '@';

/// Named parameter bag handed to the executor alongside the SQL text.
///
/// Names are stored without the sigil; they match the field names used in
/// the rendered statement. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style [`Params::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl IntoValue) -> Self {
        self.insert(name, value.to_value());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        let name = name.strip_prefix(PARAM_SIGIL).unwrap_or(name);
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Parameter names with the sigil, as they appear in SQL.
    pub fn sql_names(&self) -> impl Iterator<Item = String> + '_ {
        self.entries
            .iter()
            .map(|(name, _)| format!("{}{}", PARAM_SIGIL, name))
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// One result row: column labels with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push((column.into(), value));
    }

    /// Looks a column up by label, ignoring ASCII case.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, value)| value)
    }

    /// Typed column read used by generated row mappers.
    pub fn get<T: FromValue>(&self, column: &str) -> Result<T> {
        let value = self
            .value(column)
            .cloned()
            .ok_or_else(|| CrudError::MissingColumn(column.to_string()))?;
        T::from_value(value).map_err(|err| match err {
            CrudError::Conversion(msg) => {
                CrudError::Conversion(format!("column '{}': {}", column, msg))
            }
            other => other,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
