//! Eligibility rules deciding which fields take part in each statement.
//!
//! Everything here is a pure function of the static descriptor, so results
//! can be memoized per type without invalidation.

use super::{FieldDescriptor, ModelDescriptor};

pub type Fields = Vec<&'static FieldDescriptor>;

/// Simple-kind or explicitly editable fields, minus those marked `editable = false`.
pub fn scaffoldable(model: &'static ModelDescriptor) -> Fields {
    model
        .fields
        .iter()
        .filter(|field| field.markers.editable != Some(false))
        .filter(|field| field.kind.is_simple() || field.markers.editable == Some(true))
        .collect()
}

/// Fields marked `key`; when none are, any field named `id`.
pub fn identity(model: &'static ModelDescriptor) -> Fields {
    let keyed: Fields = model.fields.iter().filter(|field| field.markers.key).collect();
    if !keyed.is_empty() {
        return keyed;
    }
    model.fields.iter().filter(|field| field.is_named_id()).collect()
}

pub fn is_insertable(field: &FieldDescriptor) -> bool {
    let markers = &field.markers;
    if markers.key && !field.kind.is_client_assignable() && !markers.required {
        return false;
    }
    if markers.ignore_insert || markers.not_mapped || field.is_read_only() {
        return false;
    }
    if field.is_named_id() && !markers.required && !field.kind.is_client_assignable() {
        return false;
    }
    true
}

pub fn insertable(scaffoldable: &[&'static FieldDescriptor]) -> Fields {
    scaffoldable
        .iter()
        .copied()
        .filter(|field| is_insertable(field))
        .collect()
}

pub fn is_updateable(field: &FieldDescriptor) -> bool {
    let markers = &field.markers;
    !field.is_named_id()
        && !markers.key
        && !field.is_read_only()
        && !markers.ignore_update
        && !markers.not_mapped
}

pub fn updateable(scaffoldable: &[&'static FieldDescriptor]) -> Fields {
    scaffoldable
        .iter()
        .copied()
        .filter(|field| is_updateable(field))
        .collect()
}

pub fn is_selectable(field: &FieldDescriptor) -> bool {
    !field.markers.ignore_select && !field.markers.not_mapped
}

pub fn selectable(scaffoldable: &[&'static FieldDescriptor]) -> Fields {
    scaffoldable
        .iter()
        .copied()
        .filter(|field| is_selectable(field))
        .collect()
}
