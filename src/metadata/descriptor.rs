/// Storage category of a field, derived from its declared Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    Text,
    Uuid,
    Timestamp,
    Date,
    Time,
    Bytes,
    /// A user enum mapped through `IntoValue`/`FromValue`.
    Enumeration,
    /// Structs, collections and anything else that has no column representation.
    Complex,
}

impl FieldKind {
    /// Scalar kinds are rendered into SQL without an explicit opt-in.
    pub const fn is_simple(self) -> bool {
        !matches!(self, Self::Complex)
    }

    /// Kinds whose key values the caller assigns before insert.
    pub const fn is_client_assignable(self) -> bool {
        matches!(self, Self::Text | Self::Uuid)
    }
}

/// Declarative markers attached to a field with `#[crud(...)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldMarkers {
    pub key: bool,
    pub required: bool,
    pub editable: Option<bool>,
    pub read_only: Option<bool>,
    pub ignore_select: bool,
    pub ignore_insert: bool,
    pub ignore_update: bool,
    pub not_mapped: bool,
    pub column: Option<&'static str>,
}

impl FieldMarkers {
    pub const NONE: Self = Self {
        key: false,
        required: false,
        editable: None,
        read_only: None,
        ignore_select: false,
        ignore_insert: false,
        ignore_update: false,
        not_mapped: false,
        column: None,
    };
}

impl Default for FieldMarkers {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    pub markers: FieldMarkers,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            markers: FieldMarkers::NONE,
        }
    }

    pub const fn with_markers(mut self, markers: FieldMarkers) -> Self {
        self.markers = markers;
        self
    }

    /// Fields literally called `id` act as the key when nothing is marked `key`.
    pub fn is_named_id(&self) -> bool {
        self.name.eq_ignore_ascii_case("id")
    }

    pub fn is_read_only(&self) -> bool {
        self.markers.read_only == Some(true)
    }
}

/// Static shape of a model type, emitted once by `#[derive(Model)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelDescriptor {
    /// Struct name, used as the default table name.
    pub name: &'static str,
    /// Module path of the struct, for diagnostics.
    pub module: &'static str,
    pub table: Option<&'static str>,
    pub schema: Option<&'static str>,
    pub fields: &'static [FieldDescriptor],
}

impl ModelDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.module, self.name)
    }
}
