//! World configuration

use serde::{Deserialize, Serialize};

/// Sizing hints for a [`World`](crate::World).
///
/// Nothing here is a hard limit: the generation table and every sparse array
/// grow on demand past the initial capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Initial size of the generation table and of each store's sparse array.
    pub initial_entity_capacity: usize,
}

impl WorldConfig {
    pub const DEFAULT_ENTITY_CAPACITY: usize = 1024;
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            initial_entity_capacity: Self::DEFAULT_ENTITY_CAPACITY,
        }
    }
}
