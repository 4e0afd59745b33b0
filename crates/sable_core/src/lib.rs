//! Sable Engine Core
//!
//! The data-oriented runtime every other engine layer consumes:
//! - Entity/component registry with generational handles
//! - Sparse-set component stores
//! - Deferred structural mutation (command buffers)
//! - Queued, type-keyed event bus
//! - Fixed-step pass scheduling

pub mod config;
pub mod ecs;
pub mod events;
pub mod schedule;
pub mod time;

pub use config::WorldConfig;
pub use ecs::{CommandBuffer, Component, EcsError, Entity, FlushReport, World};
pub use events::{EventBus, EventQueue, Subscription};
pub use schedule::{RenderPass, Schedule, ScheduleError, StepContext, StepReport, UpdatePass};
pub use time::StepClock;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
