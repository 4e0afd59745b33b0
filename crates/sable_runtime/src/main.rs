//! Sable Engine Runtime
//!
//! Headless driver: loads settings, builds a world and the demo schedule, and
//! runs a fixed number of steps.
//!
//! Usage: `sable [settings.json]`

mod demo;
mod settings;

use anyhow::Result;
use sable_core::{CommandBuffer, EventBus, FlushReport, Schedule, StepClock, World};
use sable_metrics::FrameTimer;
use settings::RuntimeSettings;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "sable_runtime=info,sable_core=info";

/// Totals for a finished run.
#[derive(Debug, Default)]
struct RunSummary {
    steps: u64,
    commands: FlushReport,
    handler_invocations: usize,
    expired: usize,
    live: usize,
    stores: Vec<(&'static str, usize)>,
}

fn run(settings: &RuntimeSettings, frame_timer: &mut FrameTimer) -> Result<(RunSummary, Schedule)> {
    let mut world = World::from_config(&settings.world);
    let mut commands = CommandBuffer::new();
    let mut events = EventBus::new();
    let (_subscription, expired) = demo::count_expirations(&mut events);
    let mut schedule = demo::build_schedule(settings)?;
    let mut clock = StepClock::new(settings.tick_rate_hz);
    let mut summary = RunSummary::default();

    while clock.tick_count() < u64::from(settings.steps) {
        frame_timer.begin();
        // Headless: feed exactly one tick of time per frame.
        let ticks = clock.advance(clock.tick_duration());
        for _ in 0..ticks {
            let report = schedule.step(
                &mut world,
                &mut commands,
                &mut events,
                clock.dt(),
                clock.alpha(),
            )?;
            summary.commands.applied += report.commands.applied;
            summary.commands.skipped += report.commands.skipped;
            summary.handler_invocations += report.handler_invocations;
        }
        frame_timer.end();
    }

    summary.steps = clock.tick_count();
    summary.expired = expired.load(Ordering::Relaxed);
    summary.live = world.entity_count();
    summary.stores = world.stores().summary();
    Ok((summary, schedule))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Sable Engine v{}", sable_core::VERSION);

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = RuntimeSettings::load(path.as_deref())?;
    info!(?settings, "loaded settings");

    let mut frame_timer = FrameTimer::new(120);
    let (summary, schedule) = run(&settings, &mut frame_timer)?;

    info!(
        steps = summary.steps,
        live = summary.live,
        expired = summary.expired,
        applied = summary.commands.applied,
        skipped = summary.commands.skipped,
        handler_invocations = summary.handler_invocations,
        "run complete"
    );
    for (component, count) in &summary.stores {
        info!(component, count, "component store");
    }
    let (min_ms, max_ms) = frame_timer.frame_time_range_ms();
    info!(
        fps = frame_timer.fps(),
        frame_ms = frame_timer.frame_time_ms(),
        min_ms,
        max_ms,
        "frame timing"
    );
    for (pass, timing) in schedule.profiler().slowest().into_iter().take(5) {
        info!(
            pass,
            total_ms = timing.total.as_secs_f64() * 1000.0,
            calls = timing.calls,
            "pass timing"
        );
    }

    Ok(())
}
