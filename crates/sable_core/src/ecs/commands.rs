// commands.rs - Deferred structural mutation
//
// Passes that scan dense arrays record destroy/set/remove intents here and the
// schedule replays them against the world once no scan is in progress.

use crate::ecs::{Component, ComponentType, EcsError, Entity, World};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, trace, warn};

/// A recorded structural change.
pub enum Command {
    Destroy(Entity),
    /// Add-or-overwrite a component.
    Set {
        entity: Entity,
        component: ComponentType,
        value: Box<dyn Any + Send>,
    },
    Remove {
        entity: Entity,
        component: ComponentType,
    },
}

impl Command {
    pub fn entity(&self) -> Entity {
        match self {
            Command::Destroy(entity) => *entity,
            Command::Set { entity, .. } | Command::Remove { entity, .. } => *entity,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Destroy(entity) => f.debug_tuple("Destroy").field(entity).finish(),
            Command::Set {
                entity, component, ..
            } => f
                .debug_struct("Set")
                .field("entity", entity)
                .field("component", &component.name())
                .finish_non_exhaustive(),
            Command::Remove { entity, component } => f
                .debug_struct("Remove")
                .field("entity", entity)
                .field("component", &component.name())
                .finish(),
        }
    }
}

/// Outcome of a successful [`CommandBuffer::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Commands that reached the world.
    pub applied: usize,
    /// Commands dropped because their entity was queued for destruction or
    /// already dead.
    pub skipped: usize,
}

/// Insertion-ordered log of structural changes.
///
/// Destruction dominates: once an entity index is queued for destruction,
/// every other command on that index in the same buffer is skipped at flush,
/// whether it was recorded before or after the destroy.
#[derive(Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    pending_destroy: HashSet<u32>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entity for destruction. Repeat requests for the same index
    /// are coalesced into the first.
    pub fn destroy(&mut self, entity: Entity) {
        if self.pending_destroy.insert(entity.index()) {
            self.commands.push(Command::Destroy(entity));
        } else {
            trace!(%entity, "destroy already queued");
        }
    }

    /// Queue an add-or-overwrite of `value` on `entity`.
    pub fn set<T: Component>(&mut self, entity: Entity, value: T) {
        self.commands.push(Command::Set {
            entity,
            component: ComponentType::of::<T>(),
            value: Box::new(value),
        });
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) {
        self.commands.push(Command::Remove {
            entity,
            component: ComponentType::of::<T>(),
        });
    }

    /// Append a prebuilt command. Destroys go through the same coalescing as
    /// [`destroy`](Self::destroy).
    pub fn push(&mut self, command: Command) {
        match command {
            Command::Destroy(entity) => self.destroy(entity),
            other => self.commands.push(other),
        }
    }

    pub fn is_pending_destroy(&self, entity: Entity) -> bool {
        self.pending_destroy.contains(&entity.index())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Drop everything without applying it.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.pending_destroy.clear();
    }

    /// Replay the log against `world` in insertion order.
    ///
    /// The buffer is empty afterwards even when replay fails part way; a
    /// type mismatch stops the replay and is returned as the error.
    pub fn flush(&mut self, world: &mut World) -> Result<FlushReport, EcsError> {
        let commands = std::mem::take(&mut self.commands);
        let doomed = std::mem::take(&mut self.pending_destroy);
        let mut report = FlushReport::default();

        for command in commands {
            match command {
                Command::Destroy(entity) => {
                    if world.destroy_entity(entity) {
                        report.applied += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
                Command::Set { entity, .. } | Command::Remove { entity, .. }
                    if doomed.contains(&entity.index()) =>
                {
                    trace!(%entity, "skipping command on entity queued for destruction");
                    report.skipped += 1;
                }
                Command::Set {
                    entity,
                    component,
                    value,
                } => match world.set_boxed(entity, component, value) {
                    Ok(true) => report.applied += 1,
                    Ok(false) => report.skipped += 1,
                    Err(err) => {
                        warn!(%entity, error = %err, "command flush aborted");
                        return Err(err);
                    }
                },
                Command::Remove { entity, component } => {
                    if world.remove_by_type(entity, component.id()) {
                        report.applied += 1;
                    } else {
                        report.skipped += 1;
                    }
                }
            }
        }

        if report.applied + report.skipped > 0 {
            debug!(
                applied = report.applied,
                skipped = report.skipped,
                "flushed command buffer"
            );
        }
        Ok(report)
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("commands", &self.commands)
            .field("pending_destroy", &self.pending_destroy.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Health(i32);
    crate::define_component!(Health);

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Shield(i32);
    crate::define_component!(Shield);

    #[test]
    fn destroy_then_set_leaves_nothing_behind() {
        let mut world = World::new();
        let x = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.destroy(x);
        commands.set(x, Health(10));
        let report = commands.flush(&mut world).unwrap();

        assert!(!world.is_alive(x));
        assert!(world.store::<Health>().is_none_or(|s| s.is_empty()));
        assert_eq!(report, FlushReport { applied: 1, skipped: 1 });
    }

    #[test]
    fn destroy_dominates_earlier_set() {
        let mut world = World::new();
        let x = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.set(x, Health(3));
        commands.destroy(x);
        commands.flush(&mut world).unwrap();

        assert!(!world.is_alive(x));
        let reuse = world.create_entity();
        assert!(!world.has::<Health>(reuse));
    }

    #[test]
    fn duplicate_destroys_are_coalesced() {
        let mut world = World::new();
        let x = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.destroy(x);
        commands.destroy(x);
        assert_eq!(commands.len(), 1);
        assert!(commands.is_pending_destroy(x));

        let report = commands.flush(&mut world).unwrap();
        assert_eq!(report.applied, 1);
        assert!(commands.is_empty());
        assert!(!commands.is_pending_destroy(x));
    }

    #[test]
    fn set_and_remove_replay_in_order() {
        let mut world = World::new();
        let e = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.set(e, Health(1));
        commands.set(e, Health(2));
        commands.set(e, Shield(5));
        commands.remove::<Shield>(e);
        let report = commands.flush(&mut world).unwrap();

        assert_eq!(report, FlushReport { applied: 4, skipped: 0 });
        assert_eq!(*world.get::<Health>(e).unwrap(), Health(2));
        assert!(!world.has::<Shield>(e));
    }

    #[test]
    fn stale_targets_are_skipped() {
        let mut world = World::new();
        let e = world.create_entity();
        world.destroy_entity(e);
        let mut commands = CommandBuffer::new();

        commands.set(e, Health(1));
        commands.remove::<Health>(e);
        commands.destroy(e);
        let report = commands.flush(&mut world).unwrap();

        assert_eq!(report, FlushReport { applied: 0, skipped: 3 });
    }

    #[test]
    fn commands_on_other_entities_survive_a_destroy() {
        let mut world = World::new();
        let doomed = world.create_entity();
        let keep = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.destroy(doomed);
        commands.set(keep, Shield(7));
        commands.flush(&mut world).unwrap();

        assert_eq!(world.get::<Shield>(keep).unwrap().0, 7);
    }

    #[test]
    fn mismatched_payload_fails_and_still_clears() {
        let mut world = World::new();
        let e = world.create_entity();
        let other = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.push(Command::Set {
            entity: e,
            component: ComponentType::of::<Health>(),
            value: Box::new(Shield(1)),
        });
        commands.set(e, Shield(2));
        commands.destroy(other);

        let err = commands.flush(&mut world).unwrap_err();
        assert_eq!(err, EcsError::ComponentTypeMismatch { component: "Health" });
        assert!(commands.is_empty());
        assert!(!commands.is_pending_destroy(other));
        // Replay stopped at the failing command.
        assert!(world.is_alive(other));
        assert!(!world.has::<Shield>(e));
    }

    #[test]
    fn mismatched_payload_on_doomed_entity_is_skipped() {
        let mut world = World::new();
        let e = world.create_entity();
        let mut commands = CommandBuffer::new();

        commands.push(Command::Set {
            entity: e,
            component: ComponentType::of::<Health>(),
            value: Box::new(Shield(1)),
        });
        commands.destroy(e);

        let report = commands.flush(&mut world).unwrap();
        assert_eq!(report, FlushReport { applied: 1, skipped: 1 });
        assert!(!world.is_alive(e));
        assert!(commands.is_empty());
    }

    #[test]
    fn flush_of_empty_buffer_is_a_noop() {
        let mut world = World::new();
        let mut commands = CommandBuffer::new();
        assert_eq!(commands.flush(&mut world).unwrap(), FlushReport::default());
    }

    #[test]
    fn clear_discards_without_applying() {
        let mut world = World::new();
        let e = world.create_entity();
        let mut commands = CommandBuffer::new();
        commands.destroy(e);
        commands.clear();
        commands.flush(&mut world).unwrap();
        assert!(world.is_alive(e));
    }

    #[test]
    fn debug_lists_component_names() {
        let mut world = World::new();
        let e = world.create_entity();
        let mut commands = CommandBuffer::new();
        commands.set(e, Health(1));
        let text = format!("{commands:?}");
        assert!(text.contains("Health"));
        assert_eq!(commands.iter().next().map(Command::entity), Some(e));
    }
}
