// schedule.rs - Ordered update/render passes and the per-step sequence
//
// One step: every update pass in registration order, then the command buffer
// flush, then the event bus flush, then every render pass. Passes get their
// world, buffer and bus through `StepContext`, never from global state.

use crate::ecs::{CommandBuffer, EcsError, FlushReport, World};
use crate::events::EventBus;
use sable_metrics::{time_scope, Counter, PassProfiler};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

/// Everything an update pass may touch during a step.
pub struct StepContext<'a> {
    pub world: &'a mut World,
    /// Structural changes requested while scanning stores.
    pub commands: &'a mut CommandBuffer,
    pub events: &'a mut EventBus,
}

/// Simulation logic run once per step.
///
/// Component values may be read and written directly through `ctx.world`.
/// Destroy/set/remove requested while iterating a store's dense arrays must
/// go through `ctx.commands` instead.
pub trait UpdatePass {
    fn name(&self) -> &str;

    fn update(&mut self, ctx: &mut StepContext<'_>, dt: f32) -> Result<(), EcsError>;
}

/// Read-only presentation run after the flushes.
pub trait RenderPass {
    fn name(&self) -> &str;

    /// `alpha` is the fraction of a tick elapsed since the last update.
    fn render(&mut self, world: &World, alpha: f32);
}

/// Errors that can occur while registering a pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("pass '{name}' is already registered")]
    DuplicatePass { name: String },
}

/// What one [`Schedule::step`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub update_passes: usize,
    pub commands: FlushReport,
    pub handler_invocations: usize,
    pub render_passes: usize,
}

#[derive(Default)]
pub struct Schedule {
    update_passes: Vec<(String, Box<dyn UpdatePass>)>,
    render_passes: Vec<(String, Box<dyn RenderPass>)>,
    names: HashSet<String>,
    profiler: PassProfiler,
    counters: Counter,
    steps: u64,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_update<P: UpdatePass + 'static>(&mut self, pass: P) -> Result<(), ScheduleError> {
        let name = self.claim_name(pass.name())?;
        debug!(pass = %name, "registered update pass");
        self.update_passes.push((name, Box::new(pass)));
        Ok(())
    }

    pub fn add_render<P: RenderPass + 'static>(&mut self, pass: P) -> Result<(), ScheduleError> {
        let name = self.claim_name(pass.name())?;
        debug!(pass = %name, "registered render pass");
        self.render_passes.push((name, Box::new(pass)));
        Ok(())
    }

    fn claim_name(&mut self, name: &str) -> Result<String, ScheduleError> {
        if !self.names.insert(name.to_string()) {
            return Err(ScheduleError::DuplicatePass {
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }

    /// Run one step.
    ///
    /// A failing update pass aborts the step: the remaining passes and both
    /// flushes are skipped, and the command buffer is discarded so no
    /// half-recorded step leaks into the next one.
    pub fn step(
        &mut self,
        world: &mut World,
        commands: &mut CommandBuffer,
        events: &mut EventBus,
        dt: f32,
        alpha: f32,
    ) -> Result<StepReport, EcsError> {
        let mut report = StepReport::default();
        let mut ctx = StepContext {
            world,
            commands,
            events,
        };

        for (name, pass) in &mut self.update_passes {
            let result = time_scope!(self.profiler, name.as_str(), { pass.update(&mut ctx, dt) });
            if let Err(err) = result {
                warn!(pass = %name, error = %err, "update pass failed, discarding step");
                ctx.commands.clear();
                return Err(err);
            }
            report.update_passes += 1;
        }

        let StepContext {
            world,
            commands,
            events,
        } = ctx;

        report.commands = time_scope!(self.profiler, "flush.commands", {
            commands.flush(&mut *world)
        })?;
        report.handler_invocations =
            time_scope!(self.profiler, "flush.events", { events.flush() });

        for (name, pass) in &mut self.render_passes {
            time_scope!(self.profiler, name.as_str(), { pass.render(&*world, alpha) });
            report.render_passes += 1;
        }

        self.steps += 1;
        self.counters.add("commands.applied", report.commands.applied);
        self.counters.add("commands.skipped", report.commands.skipped);
        self.counters.add("events.invocations", report.handler_invocations);
        Ok(report)
    }

    pub fn update_pass_names(&self) -> impl Iterator<Item = &str> {
        self.update_passes.iter().map(|(name, _)| name.as_str())
    }

    pub fn render_pass_names(&self) -> impl Iterator<Item = &str> {
        self.render_passes.iter().map(|(name, _)| name.as_str())
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn profiler(&self) -> &PassProfiler {
        &self.profiler
    }

    pub fn counters(&self) -> &Counter {
        &self.counters
    }
}
