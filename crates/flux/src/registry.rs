//! Type-keyed handler table
//!
//! Maps a type identifier (an action shape or a state type) to exactly one
//! value. Registering under an occupied key replaces the previous value.

use std::any::TypeId;
use std::collections::HashMap;

#[derive(Debug)]
pub struct Registry<V> {
    entries: HashMap<TypeId, V>,
}

impl<V> Registry<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `value` under the key of type `K`, returning the value it replaced
    pub fn register<K: 'static>(&mut self, value: V) -> Option<V> {
        self.register_key(TypeId::of::<K>(), value)
    }

    pub fn register_key(&mut self, key: TypeId, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    pub fn resolve(&self, key: TypeId) -> Option<&V> {
        self.entries.get(&key)
    }

    pub fn unregister<K: 'static>(&mut self) -> Option<V> {
        self.unregister_key(TypeId::of::<K>())
    }

    pub fn unregister_key(&mut self, key: TypeId) -> Option<V> {
        self.entries.remove(&key)
    }

    pub fn unregister_all(&mut self) {
        self.entries.clear();
    }

    pub fn contains<K: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<K>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}
