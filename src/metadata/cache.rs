use std::any::TypeId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;

use super::FieldDescriptor;
use super::classify;
use crate::model::{Filter, Model};

pub type FieldList = Arc<[&'static FieldDescriptor]>;

/// A filter struct field, paired with the model field of the same name if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterField {
    pub name: &'static str,
    pub model_field: Option<&'static FieldDescriptor>,
}

/// Returns the cached value for `key`, computing and publishing it on a miss.
///
/// Concurrent misses may both compute; the classifier output is pure so the
/// last write wins without changing the observed value.
pub(crate) fn cached_or_compute<K, V>(
    map: &RwLock<HashMap<K, V>>,
    key: K,
    misses: &AtomicUsize,
    compute: impl FnOnce() -> V,
) -> V
where
    K: Eq + Hash,
    V: Clone,
{
    if let Some(value) = map
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return value.clone();
    }

    misses.fetch_add(1, Ordering::Relaxed);
    let value = compute();
    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, value.clone());
    value
}

lazy_static! {
    static ref GLOBAL_METADATA: MetadataCache = MetadataCache::new();
}

/// Per-type memo of classifier output. Entries are never evicted.
#[derive(Debug, Default)]
pub struct MetadataCache {
    identity: RwLock<HashMap<TypeId, FieldList>>,
    scaffoldable: RwLock<HashMap<TypeId, FieldList>>,
    insertable: RwLock<HashMap<TypeId, FieldList>>,
    updateable: RwLock<HashMap<TypeId, FieldList>>,
    selectable: RwLock<HashMap<TypeId, FieldList>>,
    filters: RwLock<HashMap<(TypeId, TypeId), Arc<[FilterField]>>>,
    misses: AtomicUsize,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by every builder.
    pub fn global() -> &'static MetadataCache {
        &GLOBAL_METADATA
    }

    pub fn identity_fields<M: Model>(&self) -> FieldList {
        cached_or_compute(&self.identity, TypeId::of::<M>(), &self.misses, || {
            tracing::trace!(model = %M::descriptor().qualified_name(), "resolving identity fields");
            classify::identity(M::descriptor()).into()
        })
    }

    pub fn scaffoldable_fields<M: Model>(&self) -> FieldList {
        cached_or_compute(&self.scaffoldable, TypeId::of::<M>(), &self.misses, || {
            tracing::trace!(model = %M::descriptor().qualified_name(), "resolving scaffoldable fields");
            classify::scaffoldable(M::descriptor()).into()
        })
    }

    pub fn insertable_fields<M: Model>(&self) -> FieldList {
        cached_or_compute(&self.insertable, TypeId::of::<M>(), &self.misses, || {
            classify::insertable(&self.scaffoldable_fields::<M>()).into()
        })
    }

    pub fn updateable_fields<M: Model>(&self) -> FieldList {
        cached_or_compute(&self.updateable, TypeId::of::<M>(), &self.misses, || {
            classify::updateable(&self.scaffoldable_fields::<M>()).into()
        })
    }

    pub fn selectable_fields<M: Model>(&self) -> FieldList {
        cached_or_compute(&self.selectable, TypeId::of::<M>(), &self.misses, || {
            classify::selectable(&self.scaffoldable_fields::<M>()).into()
        })
    }

    /// Matches the fields of filter type `F` against the scaffoldable fields of `M`.
    pub fn filter_fields<M: Model, F: Filter>(&self) -> Arc<[FilterField]> {
        let key = (TypeId::of::<M>(), TypeId::of::<F>());
        cached_or_compute(&self.filters, key, &self.misses, || {
            let scaffoldable = self.scaffoldable_fields::<M>();
            F::filter_fields()
                .iter()
                .map(|&name| FilterField {
                    name,
                    model_field: scaffoldable.iter().copied().find(|field| field.name == name),
                })
                .collect()
        })
    }

    /// Number of computations performed so far; stays flat once every type is warm.
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn cached_types(&self) -> usize {
        self.scaffoldable
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
