//! Deduplication of generated cells by parameter set.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use serde::Serialize;
use slotmap::{Key, SlotMap};

use crate::error::Result;

/// Identifies a generated object by its generator and its serialized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ParamKey {
    kind: &'static str,
    params: String,
}

impl ParamKey {
    pub(crate) fn from_params<T: Serialize>(kind: &'static str, params: &T) -> Result<Self> {
        Ok(Self {
            kind,
            params: serde_json::to_string(params)?,
        })
    }
}

/// The outcome of looking up a parameter set.
#[derive(Debug)]
pub(crate) enum GeneratedCheck<T, I> {
    /// The object was generated before.
    Exists(T),
    /// The object must be generated and stored under the given ID.
    MustGenerate(I),
}

/// Stores generated objects, indexed both by ID and by generation key.
#[derive(Debug)]
pub(crate) struct GenerationMap<K, I: Key, V> {
    keys: HashMap<K, I>,
    values: SlotMap<I, Option<Arc<V>>>,
}

impl<K, I, V> GenerationMap<K, I, V>
where
    K: Hash + Eq,
    I: Key,
{
    pub(crate) fn new() -> Self {
        Self {
            keys: HashMap::new(),
            values: SlotMap::with_key(),
        }
    }

    /// Allocates an ID for an object that is not tied to a generation key.
    pub(crate) fn gen_id(&mut self) -> I {
        self.values.insert(None)
    }

    /// Returns the stored object for `key`, or the ID under which to store it.
    ///
    /// A key whose previous generation never completed hands out the same ID again.
    pub(crate) fn get(&mut self, key: K) -> GeneratedCheck<Arc<V>, I> {
        if let Some(id) = self.keys.get(&key) {
            if let Some(Some(value)) = self.values.get(*id) {
                return GeneratedCheck::Exists(value.clone());
            }
            return GeneratedCheck::MustGenerate(*id);
        }
        let id = self.gen_id();
        self.keys.insert(key, id);
        GeneratedCheck::MustGenerate(id)
    }

    pub(crate) fn set(&mut self, id: I, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if let Some(slot) = self.values.get_mut(id) {
            *slot = Some(value.clone());
        }
        value
    }

    /// Iterates over every stored object, skipping IDs that were never filled.
    pub(crate) fn values(&self) -> impl Iterator<Item = &Arc<V>> {
        self.values.values().filter_map(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use slotmap::new_key_type;

    use super::*;

    new_key_type! {
        struct TestKey;
    }

    #[test]
    fn test_generation_map_dedups() {
        let mut map: GenerationMap<ParamKey, TestKey, usize> = GenerationMap::new();
        let key = ParamKey::from_params("pad", &(50., true)).unwrap();

        let id = match map.get(key.clone()) {
            GeneratedCheck::MustGenerate(id) => id,
            GeneratedCheck::Exists(_) => panic!("empty map returned a value"),
        };
        map.set(id, 7);

        match map.get(key) {
            GeneratedCheck::Exists(v) => assert_eq!(*v, 7),
            GeneratedCheck::MustGenerate(_) => panic!("value was not cached"),
        }
        assert_eq!(map.values().count(), 1);
    }

    #[test]
    fn test_unfinished_generation_reuses_id() {
        let mut map: GenerationMap<ParamKey, TestKey, usize> = GenerationMap::new();
        let key = ParamKey::from_params("device", &20.).unwrap();
        let first = match map.get(key.clone()) {
            GeneratedCheck::MustGenerate(id) => id,
            GeneratedCheck::Exists(_) => unreachable!(),
        };
        let second = match map.get(key) {
            GeneratedCheck::MustGenerate(id) => id,
            GeneratedCheck::Exists(_) => panic!("nothing was stored"),
        };
        assert_eq!(first, second);
        assert_eq!(map.values().count(), 0);
    }
}
