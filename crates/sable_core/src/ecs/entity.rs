//! Entity handle with generational index
//!
//! Entities are lightweight handles (8 bytes) that reference data in the World.
//! The generation counter prevents use-after-free bugs.

use std::fmt;
use tracing::trace;

pub type Generation = u32;

/// Entity handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Slot in the generation table and every store's sparse array
/// - Generation: Incremented on entity destruction (prevents use-after-free)
///
/// Example:
/// ```ignore
/// let entity = world.create_entity();
/// world.destroy_entity(entity);
/// assert!(!world.is_alive(entity)); // generation mismatch
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Entity {
    index: u32,
    generation: Generation,
}

impl Entity {
    pub(crate) const fn new(index: u32, generation: Generation) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Serialize to 64-bit integer (for networking/save files)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Deserialize from 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.index, self.generation)
    }
}

/// Index allocation, recycling and the generation table.
///
/// `generations` holds one entry per index ever minted, so "within table
/// bounds" means "minted". `capacity` is the addressable size every
/// component store is kept grown to; it doubles when a freshly minted index
/// falls outside it.
#[derive(Debug)]
pub struct EntityAllocator {
    generations: Vec<Generation>,
    occupied: Vec<bool>,
    free: Vec<u32>,
    capacity: usize,
    alive: usize,
}

impl EntityAllocator {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            occupied: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            alive: 0,
        }
    }

    /// Allocate a handle, preferring recycled indices.
    ///
    /// Returns the handle and, when the addressable capacity had to grow, the
    /// new capacity so the caller can grow every store's sparse array.
    pub fn allocate(&mut self) -> (Entity, Option<usize>) {
        self.alive += 1;

        if let Some(index) = self.free.pop() {
            self.occupied[index as usize] = true;
            let generation = self.generations[index as usize];
            trace!(index, generation, "recycled entity index");
            return (Entity::new(index, generation), None);
        }

        let index = self.generations.len();
        self.generations.push(0);
        self.occupied.push(true);

        let grown = if index >= self.capacity {
            self.capacity = (self.capacity * 2).max(index + 1);
            Some(self.capacity)
        } else {
            None
        };

        (Entity::new(index as u32, 0), grown)
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index as usize;
        idx < self.generations.len()
            && self.generations[idx] == entity.generation
            && self.occupied[idx]
    }

    /// Retire a live handle: bump its generation and queue the index for
    /// reuse. Returns `false` (and changes nothing) for a dead handle.
    pub fn free(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let slot = &mut self.generations[entity.index as usize];
        *slot = slot.wrapping_add(1);
        self.occupied[entity.index as usize] = false;
        self.free.push(entity.index);
        self.alive -= 1;
        true
    }

    /// Current live handle for `index`, if that index is in use.
    pub fn handle_at(&self, index: u32) -> Option<Entity> {
        if !*self.occupied.get(index as usize)? {
            return None;
        }
        Some(Entity::new(index, self.generations[index as usize]))
    }

    /// Every live handle, in index order.
    pub fn live(&self) -> Vec<Entity> {
        (0..self.generations.len() as u32)
            .filter_map(|index| self.handle_at(index))
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.alive
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct indices ever minted (peak concurrent entities).
    pub fn minted(&self) -> usize {
        self.generations.len()
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
