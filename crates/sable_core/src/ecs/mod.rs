//! Entity Component System core types.
//!
//! Entities are generational handles, components live in one sparse-set
//! store per type, and structural changes requested mid-iteration go
//! through a [`CommandBuffer`] that is flushed once the read pass is over.

mod commands;
mod component;
mod entity;
mod error;
mod registry;
mod storage;
mod world;

pub use commands::{Command, CommandBuffer, FlushReport};
pub use component::{Component, ComponentType};
pub use entity::{Entity, EntityAllocator, Generation};
pub use error::EcsError;
pub use registry::StoreRegistry;
pub use storage::{ComponentStore, ErasedStore};
pub use world::World;
