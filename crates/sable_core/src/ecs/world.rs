// world.rs - Entity allocation plus the component store registry

use crate::config::WorldConfig;
use crate::ecs::{
    Component, ComponentStore, ComponentType, EcsError, Entity, EntityAllocator, ErasedStore,
    StoreRegistry,
};
use std::any::{Any, TypeId};
use tracing::{debug, trace};

/// The main ECS world: owns every entity and every component store.
///
/// Structural changes (create/destroy, add/remove) must not happen while a
/// pass is scanning a store's dense arrays; passes record them into a
/// [`CommandBuffer`](crate::CommandBuffer) instead and the buffer is flushed
/// against the world once the scan is over.
pub struct World {
    entities: EntityAllocator,
    stores: StoreRegistry,
}

impl World {
    /// Create an empty world with the default capacity hint.
    pub fn new() -> Self {
        Self::from_config(&WorldConfig::default())
    }

    /// Create an empty world sized for `initial_entity_capacity` entities.
    pub fn with_capacity(initial_entity_capacity: usize) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(initial_entity_capacity),
            stores: StoreRegistry::with_entity_capacity(initial_entity_capacity),
        }
    }

    pub fn from_config(config: &WorldConfig) -> Self {
        debug!(
            capacity = config.initial_entity_capacity,
            "creating world"
        );
        Self::with_capacity(config.initial_entity_capacity)
    }

    // -- Entity lifecycle --

    /// Create an entity, reusing a destroyed index when one is available.
    pub fn create_entity(&mut self) -> Entity {
        let (entity, grown) = self.entities.allocate();
        if let Some(capacity) = grown {
            self.stores.ensure_entity_capacity(capacity);
        }
        trace!(%entity, "created entity");
        entity
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Destroy an entity and strip all of its components.
    ///
    /// Every outstanding handle to it becomes stale. Returns `false` if the
    /// handle was already dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        let removed = self.stores.remove_entity(entity.index());
        self.entities.free(entity);
        trace!(%entity, removed, "destroyed entity");
        true
    }

    /// Destroy every live entity.
    pub fn clear(&mut self) {
        for entity in self.entities.live() {
            self.entities.free(entity);
        }
        self.stores.clear_all();
        debug!("cleared world");
    }

    /// Current live handle for an entity index, e.g. one read out of a
    /// store's dense entity array.
    pub fn handle_at(&self, index: u32) -> Option<Entity> {
        self.entities.handle_at(index)
    }

    /// Every live handle, in index order.
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.live()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Indices addressable without growing the generation table.
    pub fn entity_capacity(&self) -> usize {
        self.entities.capacity()
    }

    fn ensure_alive(&self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleHandle { entity })
        }
    }

    // -- Component operations --

    /// Attach a default-valued component, or return the one already there.
    pub fn add<T: Component + Default>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        Ok(self.stores.get_or_create::<T>().add(entity.index()))
    }

    /// Attach or overwrite a component, returning the previous value.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, EcsError> {
        self.ensure_alive(entity)?;
        Ok(self.stores.get_or_create::<T>().insert(entity.index(), value))
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.ensure_alive(entity)?;
        match self.stores.get::<T>() {
            Some(store) => store.get(entity.index()),
            None => Err(EcsError::MissingComponent {
                index: entity.index(),
                component: T::NAME,
            }),
        }
    }

    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.ensure_alive(entity)?;
        match self.stores.get_mut::<T>() {
            Some(store) => store.get_mut(entity.index()),
            None => Err(EcsError::MissingComponent {
                index: entity.index(),
                component: T::NAME,
            }),
        }
    }

    /// `false` for dead handles rather than an error.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
            && self
                .stores
                .get::<T>()
                .is_some_and(|store| store.has(entity.index()))
    }

    /// Detach a component. Dead handles and absent components are no-ops.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.stores.get_mut::<T>()?.remove(entity.index())
    }

    // -- Store access --

    /// Read-only store lookup; `None` if no component of this type was ever added.
    pub fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores.get::<T>()
    }

    pub fn get_or_create_store<T: Component>(&mut self) -> &mut ComponentStore<T> {
        self.stores.get_or_create::<T>()
    }

    /// Same store as [`get_or_create_store`](Self::get_or_create_store), reached
    /// through the component's runtime type.
    pub fn get_or_create_store_by_type(&mut self, component: ComponentType) -> &mut dyn ErasedStore {
        self.stores.get_or_create_erased(component)
    }

    pub fn stores(&self) -> &StoreRegistry {
        &self.stores
    }

    /// Visit every `T` with the live handle that owns it.
    pub fn for_each_mut<T, F>(&mut self, mut f: F)
    where
        T: Component,
        F: FnMut(Entity, &mut T),
    {
        let Some(store) = self.stores.get_mut::<T>() else {
            return;
        };
        for (index, value) in store.iter_mut() {
            if let Some(entity) = self.entities.handle_at(index) {
                f(entity, value);
            }
        }
    }

    // -- Type-erased paths used by command replay --

    /// Add-or-overwrite from a boxed value. Returns `Ok(false)` for a dead handle.
    pub(crate) fn set_boxed(
        &mut self,
        entity: Entity,
        component: ComponentType,
        value: Box<dyn Any + Send>,
    ) -> Result<bool, EcsError> {
        if !self.entities.is_alive(entity) {
            return Ok(false);
        }
        self.stores
            .get_or_create_erased(component)
            .set_boxed(entity.index(), value)?;
        Ok(true)
    }

    /// Returns whether a live entity lost a component.
    pub(crate) fn remove_by_type(&mut self, entity: Entity, component: TypeId) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }
        self.stores
            .get_erased_mut(component)
            .is_some_and(|store| store.remove_entity(entity.index()))
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Position(Vec2);
    crate::define_component!(Position);

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Velocity(Vec2);
    crate::define_component!(Velocity);

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Label(String);
    crate::define_component!(Label);

    #[test]
    fn created_entity_is_alive_until_destroyed() {
        let mut world = World::with_capacity(4);
        let keep = world.create_entity();

        for _ in 0..10 {
            let other = world.create_entity();
            assert!(world.is_alive(keep));
            world.destroy_entity(other);
            assert!(world.is_alive(keep));
        }

        assert!(world.destroy_entity(keep));
        assert!(!world.is_alive(keep));
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn reused_index_invalidates_old_handle() {
        let mut world = World::with_capacity(4);
        let old = world.create_entity();
        world.destroy_entity(old);

        let new = world.create_entity();
        assert_eq!(new.index(), old.index());
        assert_ne!(new.generation(), old.generation());
        assert!(!world.is_alive(old));
        assert!(world.is_alive(new));

        world.destroy_entity(new);
        assert!(!world.is_alive(old));
        assert!(!world.is_alive(new));
    }

    #[test]
    fn destroy_is_a_noop_on_dead_handles() {
        let mut world = World::new();
        let e = world.create_entity();
        assert!(world.destroy_entity(e));
        assert!(!world.destroy_entity(e));
        let next = world.create_entity();
        assert!(!world.destroy_entity(e), "stale handle must not kill the reuser");
        assert!(world.is_alive(next));
    }

    #[test]
    fn swap_remove_keeps_first_and_third() {
        let mut world = World::new();
        let entities: Vec<Entity> = (0..3).map(|_| world.create_entity()).collect();
        for (i, &e) in entities.iter().enumerate() {
            world.add::<Position>(e).unwrap().0 = Vec2::splat(i as f32);
        }

        world.remove::<Position>(entities[1]);

        let store = world.store::<Position>().unwrap();
        assert_eq!(store.dense_components().len(), 2);
        let mut values: Vec<f32> = store.dense_components().iter().map(|p| p.0.x).collect();
        values.sort_by(f32::total_cmp);
        assert_eq!(values, vec![0.0, 2.0]);
        let mut owners = store.dense_entities().to_vec();
        owners.sort_unstable();
        assert_eq!(owners, vec![entities[0].index(), entities[2].index()]);
    }

    #[test]
    fn add_and_get_fail_on_stale_handle() {
        let mut world = World::new();
        let e = world.create_entity();
        world.destroy_entity(e);

        assert_eq!(
            world.add::<Position>(e).unwrap_err(),
            EcsError::StaleHandle { entity: e }
        );
        assert!(matches!(
            world.get::<Position>(e),
            Err(EcsError::StaleHandle { .. })
        ));
        assert!(!world.has::<Position>(e));
        assert_eq!(world.remove::<Position>(e), None);
    }

    #[test]
    fn get_missing_component_is_an_error() {
        let mut world = World::new();
        let e = world.create_entity();
        assert_eq!(
            world.get::<Velocity>(e).unwrap_err(),
            EcsError::MissingComponent {
                index: e.index(),
                component: "Velocity"
            }
        );

        let other = world.create_entity();
        world.add::<Velocity>(other).unwrap();
        assert!(matches!(
            world.get_mut::<Velocity>(e),
            Err(EcsError::MissingComponent { .. })
        ));
    }

    #[test]
    fn add_returns_existing_component() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add::<Label>(e).unwrap().0.push_str("crate");
        assert_eq!(world.add::<Label>(e).unwrap().0, "crate");
        assert_eq!(world.store::<Label>().unwrap().len(), 1);
    }

    #[test]
    fn destroy_strips_every_store() {
        let mut world = World::new();
        let e = world.create_entity();
        world.insert(e, Position(Vec2::ONE)).unwrap();
        world.insert(e, Velocity(Vec2::X)).unwrap();

        world.destroy_entity(e);
        let reuse = world.create_entity();
        assert_eq!(reuse.index(), e.index());
        assert!(!world.has::<Position>(reuse));
        assert!(!world.has::<Velocity>(reuse));
        assert!(world.store::<Position>().unwrap().is_empty());
    }

    #[test]
    fn growth_keeps_stores_addressable() {
        let mut world = World::with_capacity(1);
        let first = world.create_entity();
        world.add::<Position>(first).unwrap();

        let later: Vec<Entity> = (0..40).map(|_| world.create_entity()).collect();
        assert!(world.entity_capacity() >= 41);
        assert!(world.store::<Position>().unwrap().entity_capacity() >= world.entity_capacity());

        for &e in &later {
            world.insert(e, Position(Vec2::Y)).unwrap();
        }
        assert_eq!(world.store::<Position>().unwrap().len(), 41);
    }

    #[test]
    fn typed_and_erased_store_access_agree() {
        let mut world = World::new();
        let e = world.create_entity();
        world.insert(e, Velocity(Vec2::X)).unwrap();

        let erased = world.get_or_create_store_by_type(ComponentType::of::<Velocity>());
        assert!(erased.has_entity(e.index()));
        assert_eq!(world.stores().len(), 1);

        world.get_or_create_store::<Velocity>().insert(e.index(), Velocity(Vec2::Y));
        assert_eq!(world.get::<Velocity>(e).unwrap().0, Vec2::Y);
    }

    #[test]
    fn for_each_mut_passes_live_handles() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        world.insert(a, Position(Vec2::ZERO)).unwrap();
        world.insert(b, Position(Vec2::ZERO)).unwrap();
        world.insert(a, Velocity(Vec2::new(1.0, 2.0))).unwrap();

        let mut seen = Vec::new();
        world.for_each_mut::<Position, _>(|entity, pos| {
            pos.0 += Vec2::ONE;
            seen.push(entity);
        });
        seen.sort_by_key(|e| e.index());
        assert_eq!(seen, vec![a, b]);
        assert_eq!(world.get::<Position>(b).unwrap().0, Vec2::ONE);
    }

    #[test]
    fn handle_at_resolves_dense_indices() {
        let mut world = World::new();
        let a = world.create_entity();
        world.add::<Position>(a).unwrap();
        let index = world.store::<Position>().unwrap().dense_entities()[0];
        assert_eq!(world.handle_at(index), Some(a));
        world.destroy_entity(a);
        assert_eq!(world.handle_at(index), None);
    }

    #[test]
    fn clear_kills_everything() {
        let mut world = World::new();
        let handles: Vec<Entity> = (0..5).map(|_| world.create_entity()).collect();
        for &e in &handles {
            world.add::<Position>(e).unwrap();
        }
        world.clear();
        assert_eq!(world.entity_count(), 0);
        assert!(world.entities().is_empty());
        assert!(handles.iter().all(|&e| !world.is_alive(e)));
        assert!(world.store::<Position>().unwrap().is_empty());
    }
}
