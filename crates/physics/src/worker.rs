//! # Physics Worker
//!
//! [`Orchestrator`] maps each [`Command`] to the [`Event`]s it produces and
//! owns the Stopped/Running state. [`spawn`] runs an orchestrator on its
//! own thread behind a pair of channels; commands are handled one at a
//! time, so a step is never interleaved with a mutation.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::PhysicsError;
use crate::messages::{Command, Event};
use crate::settings::Settings;
use crate::simulation::PhysicsSim;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WorkerState {
    #[default]
    Stopped,
    Running,
}

#[derive(Default)]
pub struct Orchestrator {
    sim: PhysicsSim,
    state: WorkerState,
}

impl Orchestrator {
    #[must_use]
    pub fn new(sim: PhysicsSim) -> Self {
        Self {
            sim,
            state: WorkerState::Stopped,
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    #[must_use]
    pub fn sim(&self) -> &PhysicsSim {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut PhysicsSim {
        &mut self.sim
    }

    /// Apply one command and return the events it produced, in order.
    pub fn handle(&mut self, command: Command) -> Vec<Event> {
        match command {
            Command::Start => {
                self.state = WorkerState::Running;
                info!("physics started");
                vec![Event::Started]
            }
            Command::Stop => {
                self.state = WorkerState::Stopped;
                info!("physics stopped");
                vec![Event::Stopped]
            }
            Command::Step { delta_time } => self.step(delta_time),
            Command::AddBody { spec } => match self.sim.add_body(&spec) {
                Ok(id) => vec![Event::BodyAdded { id }],
                Err(e) => rejected(&e),
            },
            Command::RemoveBody { id } => match self.sim.remove_body(id) {
                Some(cascaded) => cascaded
                    .into_iter()
                    .map(|id| Event::ConstraintRemoved { id })
                    .chain(std::iter::once(Event::BodyRemoved { id }))
                    .collect(),
                None => {
                    debug!(%id, "remove for unknown body ignored");
                    Vec::new()
                }
            },
            Command::UpdateBody { id, patch } => match self.sim.update_body(id, &patch) {
                Ok(true) => Vec::new(),
                Ok(false) => {
                    debug!(%id, "update for unknown body ignored");
                    Vec::new()
                }
                Err(e) => rejected(&e),
            },
            Command::AddConstraint { spec } => match self.sim.add_constraint(&spec) {
                Ok(id) => vec![Event::ConstraintAdded { id }],
                Err(e) => rejected(&e),
            },
            Command::RemoveConstraint { id } => {
                if self.sim.remove_constraint(id) {
                    vec![Event::ConstraintRemoved { id }]
                } else {
                    debug!(%id, "remove for unknown constraint ignored");
                    Vec::new()
                }
            }
            Command::SetSettings { patch } => match self.sim.update_settings(&patch) {
                Ok(()) => Vec::new(),
                Err(e) => rejected(&e),
            },
            Command::GetStatistics => vec![Event::Statistics(self.sim.statistics())],
            Command::Reset => {
                self.sim.reset();
                vec![Event::ResetComplete]
            }
        }
    }

    fn step(&mut self, delta_time: f32) -> Vec<Event> {
        if self.state == WorkerState::Stopped {
            debug!(delta_time, "step while stopped dropped");
            return Vec::new();
        }
        match self.sim.step(delta_time) {
            Ok(()) => vec![Event::PhysicsUpdate {
                bodies: self.sim.snapshot(),
                statistics: self.sim.statistics(),
            }],
            Err(e) if e.is_fatal() => {
                error!(error = %e, "step failed, stopping");
                self.state = WorkerState::Stopped;
                vec![
                    Event::Error {
                        message: e.to_string(),
                    },
                    Event::Stopped,
                ]
            }
            Err(e) => rejected(&e),
        }
    }
}

fn rejected(e: &PhysicsError) -> Vec<Event> {
    warn!(error = %e, "command rejected");
    vec![Event::Error {
        message: e.to_string(),
    }]
}

/// Host-side end of a worker thread.
pub struct WorkerHandle {
    commands: Sender<Command>,
    events: Receiver<Event>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// # Errors
    ///
    /// Returns [`PhysicsError::WorkerDisconnected`] if the worker has exited.
    pub fn send(&self, command: Command) -> Result<(), PhysicsError> {
        self.commands
            .send(command)
            .map_err(|_| PhysicsError::WorkerDisconnected)
    }

    /// Next event, waiting at most `timeout`. `None` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::WorkerDisconnected`] once the worker has
    /// exited and every event has been received.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Event>, PhysicsError> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PhysicsError::WorkerDisconnected),
        }
    }

    /// Every event already queued, without blocking.
    #[must_use]
    pub fn drain(&self) -> Vec<Event> {
        self.events.try_iter().collect()
    }

    /// Close the command channel and wait for the worker to finish the
    /// command it is on. Returns the events it emitted that were not read.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::WorkerDisconnected`] if the worker panicked.
    pub fn shutdown(self) -> Result<Vec<Event>, PhysicsError> {
        let Self {
            commands,
            events,
            thread,
        } = self;
        drop(commands);
        thread.join().map_err(|_| PhysicsError::WorkerDisconnected)?;
        Ok(events.try_iter().collect())
    }
}

/// Start a worker thread with a fresh simulation.
///
/// # Errors
///
/// Returns [`PhysicsError::InvalidSettings`] for bad settings, or
/// [`PhysicsError::WorkerSpawn`] if the thread could not be started.
pub fn spawn(settings: Settings) -> Result<WorkerHandle, PhysicsError> {
    let orchestrator = Orchestrator::new(PhysicsSim::with_settings(settings)?);
    let (command_tx, command_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("physics-worker".into())
        .spawn(move || run(orchestrator, &command_rx, &event_tx))
        .map_err(|e| PhysicsError::WorkerSpawn(e.to_string()))?;
    Ok(WorkerHandle {
        commands: command_tx,
        events: event_rx,
        thread,
    })
}

fn run(mut orchestrator: Orchestrator, commands: &Receiver<Command>, events: &Sender<Event>) {
    info!("physics worker started");
    for command in commands {
        for event in orchestrator.handle(command) {
            if events.send(event).is_err() {
                info!("event receiver dropped, worker exiting");
                return;
            }
        }
    }
    info!("physics worker exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, BodySpec};
    use crate::constraint::{ConstraintId, ConstraintSpec};
    use crate::types::Vec3;

    #[test]
    fn step_is_ignored_until_started() {
        let mut orchestrator = Orchestrator::default();
        assert!(orchestrator.handle(Command::Step { delta_time: 0.016 }).is_empty());
        assert_eq!(orchestrator.handle(Command::Start), vec![Event::Started]);
        let events = orchestrator.handle(Command::Step { delta_time: 0.016 });
        assert!(matches!(events.as_slice(), [Event::PhysicsUpdate { .. }]));
    }

    #[test]
    fn removing_a_body_cascades_constraints() {
        let mut orchestrator = Orchestrator::default();
        for id in 0..2 {
            let spec =
                BodySpec::sphere(id, 0.5).with_position(Vec3::new(id as f32 * 2.0, 0.0, 0.0));
            orchestrator.handle(Command::AddBody { spec });
        }
        let spec = ConstraintSpec::distance(7, BodyId(0), BodyId(1), 2.0);
        assert_eq!(
            orchestrator.handle(Command::AddConstraint { spec }),
            vec![Event::ConstraintAdded { id: ConstraintId(7) }]
        );
        assert_eq!(
            orchestrator.handle(Command::RemoveBody { id: BodyId(1) }),
            vec![
                Event::ConstraintRemoved { id: ConstraintId(7) },
                Event::BodyRemoved { id: BodyId(1) },
            ]
        );
        assert!(orchestrator.handle(Command::RemoveBody { id: BodyId(1) }).is_empty());
    }

    #[test]
    fn invalid_body_reports_error_and_keeps_running() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.handle(Command::Start);
        let events = orchestrator.handle(Command::AddBody {
            spec: BodySpec::sphere(0, 0.5).with_mass(-1.0),
        });
        assert!(matches!(events.as_slice(), [Event::Error { .. }]));
        assert_eq!(orchestrator.state(), WorkerState::Running);
        assert!(orchestrator.sim().body(BodyId(0)).is_none());
    }

    #[test]
    fn invalid_settings_stop_the_worker() {
        let mut orchestrator = Orchestrator::default();
        orchestrator.handle(Command::Start);
        orchestrator.sim_mut().settings_mut().solver_iterations = 0;
        let events = orchestrator.handle(Command::Step { delta_time: 0.016 });
        assert!(matches!(events.as_slice(), [Event::Error { .. }, Event::Stopped]));
        assert_eq!(orchestrator.state(), WorkerState::Stopped);
    }

    #[test]
    fn thread_round_trip() {
        let worker = spawn(Settings::default()).unwrap();
        worker.send(Command::Start).unwrap();
        worker.send(Command::AddBody { spec: BodySpec::sphere(1, 0.5) }).unwrap();
        worker.send(Command::Step { delta_time: 1.0 / 60.0 }).unwrap();
        worker.send(Command::GetStatistics).unwrap();
        let events = worker.shutdown().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], Event::Started);
        assert_eq!(events[1], Event::BodyAdded { id: BodyId(1) });
        let Event::Statistics(stats) = &events[3] else {
            panic!("expected STATISTICS, got {:?}", events[3]);
        };
        assert_eq!(stats.body_count, 1);
        assert_eq!(stats.total_steps, 1);
    }
}
