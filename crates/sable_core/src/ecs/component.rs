// component.rs - Component trait and runtime type descriptors
//
// Components are identified by their Rust `TypeId`. `ComponentType` carries
// that identity plus a store factory so type-erased callers (command replay)
// can create a store without naming the concrete type.

use crate::ecs::{ComponentStore, ErasedStore};
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Trait for data that can be attached to entities.
///
/// Implementors must be `Send + Sync` so dense arrays can be walked in
/// parallel. Use [`define_component!`](crate::define_component) to implement it.
pub trait Component: 'static + Sized + Send + Sync {
    /// Human-readable name for logging and error messages.
    const NAME: &'static str;
}

/// Helper macro to implement Component trait.
///
/// # Example
/// ```ignore
/// #[derive(Clone, Copy, Default)]
/// struct Position { x: f32, y: f32 }
///
/// define_component!(Position);
/// define_component!(Velocity, "velocity");
/// ```
#[macro_export]
macro_rules! define_component {
    ($ty:ty) => {
        $crate::define_component!($ty, stringify!($ty));
    };
    ($ty:ty, $name:expr) => {
        impl $crate::ecs::Component for $ty {
            const NAME: &'static str = $name;
        }
    };
}

/// Runtime identity of a component type.
///
/// Equality and hashing use only the `TypeId`.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    new_store: fn(usize) -> Box<dyn ErasedStore>,
}

impl ComponentType {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: T::NAME,
            new_store: new_store::<T>,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build an empty store for this type whose sparse array can address
    /// `entity_capacity` indices.
    pub(crate) fn new_store(&self, entity_capacity: usize) -> Box<dyn ErasedStore> {
        (self.new_store)(entity_capacity)
    }
}

fn new_store<T: Component>(entity_capacity: usize) -> Box<dyn ErasedStore> {
    Box::new(ComponentStore::<T>::with_entity_capacity(entity_capacity))
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentType").field(&self.name).finish()
    }
}
