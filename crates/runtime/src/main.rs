#![deny(clippy::all, clippy::pedantic)]
//! # Physics Runtime
//!
//! Headless driver for the physics worker. Loads a scene (or the built-in
//! ground-and-ball scene), starts the worker thread and steps it in lock
//! step, logging progress through `tracing`.

mod scene;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use physics::{BodyState, Command, Event, Settings, WorkerHandle};

use crate::scene::Scene;

/// How long to wait for the worker before giving up.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(version, about = "Step a rigid-body scene on the physics worker")]
struct Args {
    /// JSON scene file; defaults to a ball dropped onto a ground slab.
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Number of STEP commands to send.
    #[arg(long, default_value_t = 300)]
    steps: u32,
    /// Delta time per step, in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Log body states every N steps (0 disables).
    #[arg(long, default_value_t = 60)]
    report_every: u32,
    /// Print the final snapshot to stdout as JSON.
    #[arg(long)]
    dump: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let scene = match &args.scene {
        Some(path) => Scene::load(path)?,
        None => Scene::ground_and_ball(),
    };
    tracing::info!(
        bodies = scene.bodies.len(),
        constraints = scene.constraints.len(),
        "Scene loaded"
    );

    let worker = physics::worker::spawn(Settings::default())?;
    for command in scene.commands() {
        worker.send(command)?;
    }
    worker.send(Command::Start)?;
    wait_for(&worker, |event| matches!(event, Event::Started))?;

    tracing::info!(steps = args.steps, dt = args.dt, "Starting simulation loop");
    let mut last = Vec::new();
    for i in 1..=args.steps {
        worker.send(Command::Step { delta_time: args.dt })?;
        let (bodies, statistics) =
            match wait_for(&worker, |event| matches!(event, Event::PhysicsUpdate { .. }))? {
                Event::PhysicsUpdate { bodies, statistics } => (bodies, statistics),
                other => bail!("unexpected worker event {other:?}"),
            };
        if args.report_every > 0 && i % args.report_every == 0 {
            tracing::info!(
                step = i,
                awake = statistics.awake_count,
                sleeping = statistics.sleeping_count,
                contacts = statistics.contact_count,
                "Step complete"
            );
            report(&bodies);
        }
        last = bodies;
    }

    worker.send(Command::GetStatistics)?;
    let finished = wait_for(&worker, |event| matches!(event, Event::Statistics(_)))?;
    if let Event::Statistics(stats) = finished {
        tracing::info!(
            total_steps = stats.total_steps,
            bodies = stats.body_count,
            sleeping = stats.sleeping_count,
            "Simulation finished"
        );
    }
    worker.shutdown()?;

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&last)?);
    }
    Ok(())
}

/// Receive events until one matches `want`. Errors from the worker are
/// logged; a STOPPED event before the match means the worker gave up.
fn wait_for(worker: &WorkerHandle, want: impl Fn(&Event) -> bool) -> Result<Event> {
    loop {
        let Some(event) = worker.recv_timeout(RESPONSE_TIMEOUT)? else {
            bail!("physics worker did not respond within {RESPONSE_TIMEOUT:?}");
        };
        if want(&event) {
            return Ok(event);
        }
        match event {
            Event::Error { message } => tracing::warn!("Worker error: {message}"),
            Event::Stopped => bail!("physics worker stopped unexpectedly"),
            other => tracing::debug!(?other, "Worker event"),
        }
    }
}

fn report(bodies: &[BodyState]) {
    for body in bodies {
        tracing::info!(
            id = body.id.0,
            x = body.position.x,
            y = body.position.y,
            z = body.position.z,
            sleeping = body.sleeping,
            "Body"
        );
    }
}
