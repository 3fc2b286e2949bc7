//! Static model shape, eligibility rules and their process-wide memo.

pub mod cache;
pub mod classify;
mod descriptor;

pub use cache::{FieldList, FilterField, MetadataCache};
pub use descriptor::{FieldDescriptor, FieldKind, FieldMarkers, ModelDescriptor};
