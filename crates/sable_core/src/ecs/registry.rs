// registry.rs - Type-keyed collection of component stores
//
// Stores are created lazily on first access and live as long as the owning
// world. Generic and type-erased lookups resolve through the same `TypeId`
// key, so both paths always reach the same store instance.

use crate::ecs::{Component, ComponentStore, ComponentType, ErasedStore};
use std::any::TypeId;
use std::collections::HashMap;
use tracing::debug;

pub struct StoreRegistry {
    stores: HashMap<TypeId, Box<dyn ErasedStore>>,
    entity_capacity: usize,
}

impl StoreRegistry {
    /// New stores start with sparse arrays sized to `entity_capacity`.
    pub fn with_entity_capacity(entity_capacity: usize) -> Self {
        Self {
            stores: HashMap::new(),
            entity_capacity,
        }
    }

    /// Typed store lookup without creation.
    pub fn get<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
    }

    pub fn get_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
    }

    pub fn get_or_create<T: Component>(&mut self) -> &mut ComponentStore<T> {
        self.get_or_create_erased(ComponentType::of::<T>())
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .expect("store registered under a TypeId must hold that type")
    }

    /// Non-generic variant used by command replay.
    pub fn get_or_create_erased(&mut self, component: ComponentType) -> &mut dyn ErasedStore {
        let capacity = self.entity_capacity;
        self.stores
            .entry(component.id())
            .or_insert_with(|| {
                debug!(component = component.name(), capacity, "created component store");
                component.new_store(capacity)
            })
            .as_mut()
    }

    pub fn get_erased(&self, component: TypeId) -> Option<&dyn ErasedStore> {
        match self.stores.get(&component) {
            Some(store) => Some(store.as_ref()),
            None => None,
        }
    }

    pub fn get_erased_mut(&mut self, component: TypeId) -> Option<&mut dyn ErasedStore> {
        match self.stores.get_mut(&component) {
            Some(store) => Some(store.as_mut()),
            None => None,
        }
    }

    /// Grow every store's sparse array (and the default for future stores).
    pub fn ensure_entity_capacity(&mut self, capacity: usize) {
        if capacity <= self.entity_capacity {
            return;
        }
        self.entity_capacity = capacity;
        for store in self.stores.values_mut() {
            store.ensure_entity_capacity(capacity);
        }
        debug!(capacity, stores = self.stores.len(), "grew sparse arrays");
    }

    /// Strip an entity index from every store. Returns how many components
    /// were removed.
    pub fn remove_entity(&mut self, index: u32) -> usize {
        self.stores
            .values_mut()
            .map(|store| store.remove_entity(index))
            .filter(|&removed| removed)
            .count()
    }

    pub fn clear_all(&mut self) {
        for store in self.stores.values_mut() {
            store.clear();
        }
    }

    pub fn entity_capacity(&self) -> usize {
        self.entity_capacity
    }

    /// Number of stores created so far.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// `(component name, component count)` for every store, name-sorted.
    pub fn summary(&self) -> Vec<(&'static str, usize)> {
        let mut rows: Vec<_> = self
            .stores
            .values()
            .map(|store| (store.component_name(), store.len()))
            .collect();
        rows.sort_unstable();
        rows
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::with_entity_capacity(0)
    }
}
