// storage.rs - Sparse-set component storage
//
// One store per component type. `sparse[entity_index]` holds the dense slot
// plus one (0 = absent); `dense_entities` and `dense` are parallel, packed
// arrays of the live components. Removal swap-removes so the dense arrays
// never have gaps.

use crate::ecs::{Component, EcsError};
use rayon::prelude::*;
use std::any::Any;

/// Sentinel stored in `sparse` for "no component".
const ABSENT: u32 = 0;

/// Storage for every component of type `T`.
///
/// All operations are O(1) amortized. The dense slices handed out by
/// [`dense_entities`](Self::dense_entities) and
/// [`dense_components`](Self::dense_components) borrow the store, so the
/// borrow checker rejects any add/remove while a scan is in progress.
pub struct ComponentStore<T> {
    sparse: Vec<u32>,
    dense_entities: Vec<u32>,
    dense: Vec<T>,
}

impl<T: Component> ComponentStore<T> {
    pub fn new() -> Self {
        Self::with_entity_capacity(0)
    }

    /// Create a store whose sparse array already addresses `capacity` indices.
    pub fn with_entity_capacity(capacity: usize) -> Self {
        Self {
            sparse: vec![ABSENT; capacity],
            dense_entities: Vec::new(),
            dense: Vec::new(),
        }
    }

    #[inline]
    fn slot_of(&self, index: u32) -> Option<usize> {
        match self.sparse.get(index as usize) {
            Some(&slot) if slot != ABSENT => Some(slot as usize - 1),
            _ => None,
        }
    }

    #[inline]
    pub fn has(&self, index: u32) -> bool {
        self.slot_of(index).is_some()
    }

    /// Attach a default-valued component, or return the existing one untouched.
    pub fn add(&mut self, index: u32) -> &mut T
    where
        T: Default,
    {
        let slot = match self.slot_of(index) {
            Some(slot) => slot,
            None => self.push(index, T::default()),
        };
        &mut self.dense[slot]
    }

    /// Attach or overwrite a component, returning the previous value.
    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        match self.slot_of(index) {
            Some(slot) => Some(std::mem::replace(&mut self.dense[slot], value)),
            None => {
                self.push(index, value);
                None
            }
        }
    }

    fn push(&mut self, index: u32, value: T) -> usize {
        let idx = index as usize;
        if idx >= self.sparse.len() {
            let grown = (self.sparse.len() * 2).max(idx + 1);
            self.sparse.resize(grown, ABSENT);
        }
        self.dense_entities.push(index);
        self.dense.push(value);
        self.sparse[idx] = self.dense.len() as u32;
        self.dense.len() - 1
    }

    pub fn get(&self, index: u32) -> Result<&T, EcsError> {
        let slot = self.slot_of(index).ok_or(EcsError::MissingComponent {
            index,
            component: T::NAME,
        })?;
        Ok(&self.dense[slot])
    }

    pub fn get_mut(&mut self, index: u32) -> Result<&mut T, EcsError> {
        let slot = self.slot_of(index).ok_or(EcsError::MissingComponent {
            index,
            component: T::NAME,
        })?;
        Ok(&mut self.dense[slot])
    }

    /// Detach a component via swap-remove. Absent indices are a no-op.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let slot = self.slot_of(index)?;
        let last = self.dense.len() - 1;
        if slot != last {
            let moved = self.dense_entities[last];
            self.sparse[moved as usize] = slot as u32 + 1;
        }
        self.dense_entities.swap_remove(slot);
        let value = self.dense.swap_remove(slot);
        self.sparse[index as usize] = ABSENT;
        Some(value)
    }

    /// Grow the sparse array to address at least `capacity` indices.
    pub fn ensure_entity_capacity(&mut self, capacity: usize) {
        if capacity > self.sparse.len() {
            self.sparse.resize(capacity, ABSENT);
        }
    }

    #[inline]
    pub fn entity_capacity(&self) -> usize {
        self.sparse.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Entity index owning each dense slot.
    #[inline]
    pub fn dense_entities(&self) -> &[u32] {
        &self.dense_entities
    }

    #[inline]
    pub fn dense_components(&self) -> &[T] {
        &self.dense
    }

    #[inline]
    pub fn dense_components_mut(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Both dense arrays at once, components writable.
    #[inline]
    pub fn dense_mut(&mut self) -> (&[u32], &mut [T]) {
        (&self.dense_entities, &mut self.dense)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.dense_entities.iter().copied().zip(self.dense.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.dense_entities.iter().copied().zip(self.dense.iter_mut())
    }

    /// Run `f` over every component in parallel.
    pub fn par_for_each_mut<F>(&mut self, f: F)
    where
        F: Fn(u32, &mut T) + Send + Sync,
    {
        self.dense_entities
            .par_iter()
            .zip(self.dense.par_iter_mut())
            .for_each(|(&index, value)| f(index, value));
    }

    /// Drop every component, keeping the sparse capacity.
    pub fn clear(&mut self) {
        for &index in &self.dense_entities {
            self.sparse[index as usize] = ABSENT;
        }
        self.dense_entities.clear();
        self.dense.clear();
    }
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentStore`].
///
/// The world and command buffer drive stores through this trait when the
/// concrete component type is not known at the call site.
pub trait ErasedStore: Send + Sync {
    fn component_name(&self) -> &'static str;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn has_entity(&self, index: u32) -> bool;

    fn ensure_entity_capacity(&mut self, capacity: usize);

    /// Returns whether a component was removed.
    fn remove_entity(&mut self, index: u32) -> bool;

    /// Add-or-overwrite from a boxed value of the store's component type.
    fn set_boxed(&mut self, index: u32, value: Box<dyn Any + Send>) -> Result<(), EcsError>;

    fn clear(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedStore for ComponentStore<T> {
    fn component_name(&self) -> &'static str {
        T::NAME
    }

    fn len(&self) -> usize {
        self.dense.len()
    }

    fn has_entity(&self, index: u32) -> bool {
        self.has(index)
    }

    fn ensure_entity_capacity(&mut self, capacity: usize) {
        ComponentStore::ensure_entity_capacity(self, capacity);
    }

    fn remove_entity(&mut self, index: u32) -> bool {
        self.remove(index).is_some()
    }

    fn set_boxed(&mut self, index: u32, value: Box<dyn Any + Send>) -> Result<(), EcsError> {
        let value = value
            .downcast::<T>()
            .map_err(|_| EcsError::ComponentTypeMismatch { component: T::NAME })?;
        self.insert(index, *value);
        Ok(())
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    crate::define_component!(Position);

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Tag(u8);
    crate::define_component!(Tag);

    fn pos(x: f32) -> Position {
        Position { x, y: -x }
    }

    /// Every sparse entry points at a dense slot that points back.
    fn assert_consistent<T: Component>(store: &ComponentStore<T>) {
        assert_eq!(store.dense_entities.len(), store.dense.len());
        let mut seen = HashSet::new();
        for (slot, &index) in store.dense_entities.iter().enumerate() {
            assert!(seen.insert(index), "duplicate dense entity {index}");
            assert_eq!(store.sparse[index as usize] as usize, slot + 1);
        }
        let present = store.sparse.iter().filter(|&&s| s != ABSENT).count();
        assert_eq!(present, store.len());
    }

    #[test]
    fn add_is_idempotent() {
        let mut store = ComponentStore::<Position>::new();
        *store.add(4) = pos(1.0);
        let again = store.add(4);
        assert_eq!(*again, pos(1.0), "second add must not overwrite");
        assert_eq!(store.len(), 1);
        assert_eq!(store.sparse[4], 1);
        assert_consistent(&store);
    }

    #[test]
    fn add_grows_sparse_past_capacity() {
        let mut store = ComponentStore::<Tag>::with_entity_capacity(2);
        store.add(9);
        assert!(store.entity_capacity() >= 10);
        assert!(store.has(9));
        assert!(!store.has(8));
        assert!(!store.has(1000));
    }

    #[test]
    fn get_missing_reports_component_name() {
        let store = ComponentStore::<Position>::new();
        let err = store.get(3).unwrap_err();
        assert_eq!(
            err,
            EcsError::MissingComponent {
                index: 3,
                component: "Position"
            }
        );
    }

    #[test]
    fn remove_middle_relocates_tail() {
        let mut store = ComponentStore::<Position>::new();
        for i in 0..3 {
            *store.add(i) = pos(i as f32);
        }

        assert_eq!(store.remove(1), Some(pos(1.0)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.dense_entities(), &[0, 2]);
        assert_eq!(store.dense_components(), &[pos(0.0), pos(2.0)]);
        assert_eq!(*store.get(2).unwrap(), pos(2.0));
        assert!(!store.has(1));
        assert_consistent(&store);
    }

    #[test]
    fn remove_tail_and_only_element() {
        let mut store = ComponentStore::<Tag>::new();
        store.insert(0, Tag(1));
        store.insert(5, Tag(2));

        assert_eq!(store.remove(5), Some(Tag(2)));
        assert_consistent(&store);
        assert_eq!(store.remove(0), Some(Tag(1)));
        assert!(store.is_empty());
        assert_consistent(&store);
        assert_eq!(store.remove(0), None);
    }

    #[test]
    fn insert_overwrites_in_place() {
        let mut store = ComponentStore::<Tag>::new();
        assert_eq!(store.insert(2, Tag(1)), None);
        assert_eq!(store.insert(2, Tag(7)), Some(Tag(1)));
        assert_eq!(store.len(), 1);
        assert_eq!(*store.get(2).unwrap(), Tag(7));
    }

    #[test]
    fn interleaved_adds_and_removes_track_live_set() {
        let mut store = ComponentStore::<Tag>::new();
        let mut live = HashSet::new();

        // Deterministic pseudo-random walk over 64 indices.
        let mut state: u32 = 0x9e37_79b9;
        for _ in 0..2_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let index = state % 64;
            if state & 0x100 == 0 {
                store.insert(index, Tag(index as u8));
                live.insert(index);
            } else {
                assert_eq!(store.remove(index).is_some(), live.remove(&index));
            }
        }

        assert_consistent(&store);
        let dense: HashSet<u32> = store.dense_entities().iter().copied().collect();
        assert_eq!(dense, live);
        for index in 0..64 {
            assert_eq!(store.has(index), live.contains(&index));
        }
        for (index, tag) in store.iter() {
            assert_eq!(tag.0 as u32, index);
        }
    }

    #[test]
    fn ensure_capacity_leaves_dense_untouched() {
        let mut store = ComponentStore::<Tag>::new();
        store.insert(1, Tag(1));
        store.ensure_entity_capacity(128);
        assert_eq!(store.entity_capacity(), 128);
        assert_eq!(store.len(), 1);
        store.ensure_entity_capacity(4);
        assert_eq!(store.entity_capacity(), 128, "never shrinks");
    }

    #[test]
    fn par_for_each_mut_visits_every_component() {
        let mut store = ComponentStore::<Position>::new();
        for i in 0..100 {
            store.insert(i, pos(0.0));
        }
        store.par_for_each_mut(|index, p| p.x = index as f32);
        for (index, p) in store.iter() {
            assert_eq!(p.x, index as f32);
        }
    }

    #[test]
    fn dense_mut_pairs_owners_with_values() {
        let mut store = ComponentStore::<Position>::new();
        for i in [9, 2, 5] {
            store.insert(i, pos(0.0));
        }
        store.remove(2);

        let (owners, values) = store.dense_mut();
        assert_eq!(owners.len(), values.len());
        for (&index, p) in owners.iter().zip(values.iter_mut()) {
            p.x = index as f32 * 10.0;
        }

        assert_eq!(store.get(9).unwrap().x, 90.0);
        assert_eq!(store.get(5).unwrap().x, 50.0);
        assert_consistent(&store);
    }

    #[test]
    fn clear_resets_membership() {
        let mut store = ComponentStore::<Tag>::new();
        store.insert(3, Tag(3));
        store.insert(7, Tag(7));
        store.clear();
        assert!(store.is_empty());
        assert!(!store.has(3));
        assert!(!store.has(7));
        assert_consistent(&store);
    }

    #[test]
    fn erased_set_rejects_wrong_type() {
        let mut store: Box<dyn ErasedStore> = Box::new(ComponentStore::<Tag>::new());
        store.set_boxed(1, Box::new(Tag(4))).unwrap();
        assert!(store.has_entity(1));

        let err = store.set_boxed(2, Box::new(pos(1.0))).unwrap_err();
        assert_eq!(err, EcsError::ComponentTypeMismatch { component: "Tag" });
        assert!(!store.has_entity(2));

        assert!(store.remove_entity(1));
        assert!(!store.remove_entity(1));
    }
}
