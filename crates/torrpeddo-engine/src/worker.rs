#![allow(clippy::redundant_pub_crate)]

use std::collections::BTreeSet;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use torrpeddo_events::{Event, EventBus};

use crate::command::EngineCommand;
use crate::session::EngineSession;

const SESSION_COMPONENT: &str = "session";

/// Drive `session` until every command sender is dropped.
pub(crate) fn spawn(
    events: EventBus,
    mut commands: mpsc::Receiver<EngineCommand>,
    session: Box<dyn EngineSession>,
    tick_interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut worker = Worker::new(events, session);
        let mut poll = tokio::time::interval(tick_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();
        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(command) => worker.handle(command),
                        None => break,
                    }
                }
                now = poll.tick() => {
                    let elapsed = now.saturating_duration_since(last_tick);
                    last_tick = now;
                    worker.advance(elapsed);
                }
            }
        }
        info!("engine worker stopped");
    })
}

struct Worker {
    events: EventBus,
    session: Box<dyn EngineSession>,
    health: BTreeSet<String>,
}

impl Worker {
    fn new(events: EventBus, session: Box<dyn EngineSession>) -> Self {
        Self {
            events,
            session,
            health: BTreeSet::new(),
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        let operation = command.operation();
        let delivered = match command {
            EngineCommand::Register {
                request,
                respond_to,
            } => respond_to.send(self.session.register(&request)).is_ok(),
            EngineCommand::Status { handle, respond_to } => {
                respond_to.send(self.session.status(handle)).is_ok()
            }
            EngineCommand::Pause { handle, respond_to } => {
                respond_to.send(self.session.pause(handle)).is_ok()
            }
            EngineCommand::Resume { handle, respond_to } => {
                respond_to.send(self.session.resume(handle)).is_ok()
            }
            EngineCommand::SetAutoManaged {
                handle,
                enabled,
                respond_to,
            } => respond_to
                .send(self.session.set_auto_managed(handle, enabled))
                .is_ok(),
            EngineCommand::Unregister { handle, respond_to } => {
                respond_to.send(self.session.unregister(handle)).is_ok()
            }
        };
        if !delivered {
            warn!(operation, "engine reply dropped by caller");
        }
    }

    fn advance(&mut self, elapsed: std::time::Duration) {
        match self.session.advance(elapsed) {
            Ok(()) => self.mark_recovered(SESSION_COMPONENT),
            Err(err) => {
                let detail = format!("{err:#}");
                self.mark_degraded(SESSION_COMPONENT, &detail);
            }
        }
    }

    fn mark_degraded(&mut self, component: &str, detail: &str) {
        if self.health.insert(component.to_string()) {
            let degraded = self.health.iter().cloned().collect::<Vec<_>>();
            let _ = self.events.publish(Event::HealthChanged { degraded });
            warn!(component, detail = %detail, "engine component degraded");
        } else {
            warn!(component, detail = %detail, "engine component still degraded");
        }
    }

    fn mark_recovered(&mut self, component: &str) {
        if self.health.remove(component) {
            let degraded = self.health.iter().cloned().collect::<Vec<_>>();
            let _ = self.events.publish(Event::HealthChanged { degraded });
            info!(component, "engine component recovered");
        }
    }
}
