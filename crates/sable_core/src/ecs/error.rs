use crate::ecs::Entity;
use thiserror::Error;

/// Contract violations raised by the world, its stores and command replay.
///
/// None of these are recoverable runtime conditions: they mean the caller
/// addressed something that is not there.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("entity {entity} is not alive (stale handle)")]
    StaleHandle { entity: Entity },

    #[error("entity index {index} has no {component} component")]
    MissingComponent {
        index: u32,
        component: &'static str,
    },

    #[error("boxed value does not match the {component} store")]
    ComponentTypeMismatch { component: &'static str },
}
