//! Demo simulation passes
//!
//! Particles are spawned at the origin with a random heading, drift, and are
//! destroyed when their lifetime runs out. Each destruction is announced with
//! an [`Expired`] event.

use crate::settings::RuntimeSettings;
use glam::Vec2;
use sable_core::{
    define_component, EcsError, Entity, EventBus, RenderPass, Schedule, ScheduleError,
    StepContext, Subscription, UpdatePass, World,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position(pub Vec2);
define_component!(Position);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec2);
define_component!(Velocity);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lifetime {
    pub remaining: u32,
}
define_component!(Lifetime);

/// Published when a particle's lifetime reaches zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expired {
    pub entity: Entity,
    pub position: Vec2,
}

const PARTICLE_SPEED: f32 = 4.0;

/// Creates `per_step` particles each step.
pub struct SpawnPass {
    per_step: u32,
    lifetime: u32,
    rng: u32,
}

impl SpawnPass {
    pub fn new(per_step: u32, lifetime: u32) -> Self {
        Self {
            per_step,
            lifetime,
            rng: 0x9E37_79B9,
        }
    }

    // xorshift32, deterministic across runs
    fn next_angle(&mut self) -> f32 {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        (self.rng as f32 / u32::MAX as f32) * std::f32::consts::TAU
    }
}

impl UpdatePass for SpawnPass {
    fn name(&self) -> &str {
        "spawn"
    }

    fn update(&mut self, ctx: &mut StepContext<'_>, _dt: f32) -> Result<(), EcsError> {
        for _ in 0..self.per_step {
            let heading = Vec2::from_angle(self.next_angle());
            let entity = ctx.world.create_entity();
            ctx.world.insert(entity, Position(Vec2::ZERO))?;
            ctx.world.insert(entity, Velocity(heading * PARTICLE_SPEED))?;
            ctx.world.insert(
                entity,
                Lifetime {
                    remaining: self.lifetime,
                },
            )?;
        }
        Ok(())
    }
}

/// Integrates positions. Non-structural, so it writes straight to the store.
#[derive(Default)]
pub struct MovePass {
    deltas: Vec<(u32, Vec2)>,
}

impl UpdatePass for MovePass {
    fn name(&self) -> &str {
        "move"
    }

    fn update(&mut self, ctx: &mut StepContext<'_>, dt: f32) -> Result<(), EcsError> {
        let Some(velocities) = ctx.world.store::<Velocity>() else {
            return Ok(());
        };
        self.deltas.clear();
        self.deltas
            .extend(velocities.iter().map(|(index, velocity)| (index, velocity.0 * dt)));

        let positions = ctx.world.get_or_create_store::<Position>();
        for &(index, delta) in &self.deltas {
            if let Ok(position) = positions.get_mut(index) {
                position.0 += delta;
            }
        }
        Ok(())
    }
}

/// Counts lifetimes down and queues destruction of expired particles.
pub struct ExpirePass;

impl UpdatePass for ExpirePass {
    fn name(&self) -> &str {
        "expire"
    }

    fn update(&mut self, ctx: &mut StepContext<'_>, _dt: f32) -> Result<(), EcsError> {
        ctx.world
            .get_or_create_store::<Lifetime>()
            .par_for_each_mut(|_, life| life.remaining = life.remaining.saturating_sub(1));

        let world = &*ctx.world;
        let Some(lifetimes) = world.store::<Lifetime>() else {
            return Ok(());
        };
        for (index, life) in lifetimes.iter() {
            if life.remaining > 0 {
                continue;
            }
            let Some(entity) = world.handle_at(index) else {
                continue;
            };
            let position = world
                .get::<Position>(entity)
                .map(|p| p.0)
                .unwrap_or_default();
            ctx.commands.destroy(entity);
            ctx.events.publish(Expired { entity, position });
        }
        Ok(())
    }
}

/// Logs the live population every `every` frames.
pub struct CensusPass {
    every: u64,
    frames: u64,
    last_count: usize,
}

impl CensusPass {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
            last_count: 0,
        }
    }

    pub fn last_count(&self) -> usize {
        self.last_count
    }
}

impl RenderPass for CensusPass {
    fn name(&self) -> &str {
        "census"
    }

    fn render(&mut self, world: &World, alpha: f32) {
        self.frames += 1;
        self.last_count = world.entity_count();
        if self.frames % self.every == 0 {
            info!(frame = self.frames, live = self.last_count, "census");
        } else {
            debug!(frame = self.frames, live = self.last_count, alpha, "census");
        }
    }
}

/// Subscribe a counter to [`Expired`] events.
pub fn count_expirations(events: &mut EventBus) -> (Subscription, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&count);
    let subscription = events.subscribe::<Expired, _>(move |_, _| {
        sink.fetch_add(1, Ordering::Relaxed);
    });
    (subscription, count)
}

/// Spawn, move and expire, plus a census once per simulated second.
pub fn build_schedule(settings: &RuntimeSettings) -> Result<Schedule, ScheduleError> {
    let mut schedule = Schedule::new();
    schedule.add_update(SpawnPass::new(settings.spawn_per_step, settings.lifetime_steps))?;
    schedule.add_update(MovePass::default())?;
    schedule.add_update(ExpirePass)?;
    schedule.add_render(CensusPass::new(u64::from(settings.tick_rate_hz)))?;
    Ok(schedule)
}
