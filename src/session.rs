//! Single-writer layout session.
//!
//! One tokio task owns the fleet and the interaction controller. Callers talk to it
//! through a cloneable [`SessionHandle`]; every command carries a oneshot reply. The
//! same task drives the frame loop and publishes snapshots to subscribers.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use utoipa::ToSchema;

use crate::controls::ControlChange;
use crate::fleet::{Fleet, LayoutConfig, UnitEdit};
use crate::geometry::{Ray, ray_cast};
use crate::interaction::{EditSurfaceRequest, InteractionController};
use crate::model::{UnitId, ValidationError};
use crate::snapshot::LayoutSnapshot;

/// Frames per second used when the configured rate is unusable.
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

const COMMAND_BUFFER: usize = 64;
const FRAME_BUFFER: usize = 16;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("layout session has stopped")]
    Stopped,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// What the pointer is over: an id resolved by the presentation layer, or a ray the
/// session resolves against the placed units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerTarget {
    Hit(Option<UnitId>),
    Ray(Ray),
}

/// Outcome of a pointer or edit event.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct InteractionResponse {
    pub hovered: Option<UnitId>,
    pub selected: Option<UnitId>,
    /// Absent for pure hover events.
    pub edit_surface: Option<EditSurfaceRequest>,
    pub layout: LayoutSnapshot,
}

enum Command {
    Snapshot {
        reply: oneshot::Sender<LayoutSnapshot>,
    },
    Control {
        change: ControlChange,
        reply: oneshot::Sender<Result<LayoutSnapshot, ValidationError>>,
    },
    PointerMove {
        target: PointerTarget,
        reply: oneshot::Sender<InteractionResponse>,
    },
    PointerDown {
        target: PointerTarget,
        inside_edit_surface: bool,
        reply: oneshot::Sender<InteractionResponse>,
    },
    EditSelected {
        edit: UnitEdit,
        reply: oneshot::Sender<Result<InteractionResponse, ValidationError>>,
    },
}

/// Cloneable access to a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    frames: broadcast::Sender<LayoutSnapshot>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Snapshot { .. } => "Snapshot",
            Command::Control { .. } => "Control",
            Command::PointerMove { .. } => "PointerMove",
            Command::PointerDown { .. } => "PointerDown",
            Command::EditSelected { .. } => "EditSelected",
        };
        f.write_str(name)
    }
}

impl SessionHandle {
    pub async fn snapshot(&self) -> Result<LayoutSnapshot, SessionError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn apply_control(&self, change: ControlChange) -> Result<LayoutSnapshot, SessionError> {
        Ok(self
            .request(|reply| Command::Control { change, reply })
            .await??)
    }

    pub async fn pointer_move(
        &self,
        target: PointerTarget,
    ) -> Result<InteractionResponse, SessionError> {
        self.request(|reply| Command::PointerMove { target, reply })
            .await
    }

    pub async fn pointer_down(
        &self,
        target: PointerTarget,
        inside_edit_surface: bool,
    ) -> Result<InteractionResponse, SessionError> {
        self.request(|reply| Command::PointerDown {
            target,
            inside_edit_surface,
            reply,
        })
        .await
    }

    pub async fn edit_selected(&self, edit: UnitEdit) -> Result<InteractionResponse, SessionError> {
        Ok(self
            .request(|reply| Command::EditSelected { edit, reply })
            .await??)
    }

    /// Receives one snapshot per frame while subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<LayoutSnapshot> {
        self.frames.subscribe()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Stopped)?;
        response.await.map_err(|_| SessionError::Stopped)
    }
}

/// Builds the fleet and starts the session task on the current runtime.
///
/// The task ends once every handle has been dropped.
pub fn spawn(config: LayoutConfig, frame_rate: f64) -> Result<SessionHandle, ValidationError> {
    let fleet = Fleet::new(config)?;
    let frame_rate = if frame_rate.is_finite() && frame_rate > 0.0 {
        frame_rate
    } else {
        tracing::warn!(
            "⚠️ Frame rate {} is unusable. Using {}.",
            frame_rate,
            DEFAULT_FRAME_RATE
        );
        DEFAULT_FRAME_RATE
    };

    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (frames, _) = broadcast::channel(FRAME_BUFFER);
    let session = Session {
        fleet,
        interaction: InteractionController::new(),
    };
    tokio::spawn(run(
        session,
        receiver,
        frames.clone(),
        Duration::from_secs_f64(1.0 / frame_rate),
    ));
    tracing::info!(
        "🚚 Layout session started: {} units, {} fps",
        config.initial_count,
        frame_rate
    );
    Ok(SessionHandle { commands, frames })
}

async fn run(
    mut session: Session,
    mut commands: mpsc::Receiver<Command>,
    frames: broadcast::Sender<LayoutSnapshot>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => session.handle(command),
                None => break,
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                session.fleet.update(now.duration_since(last_frame).as_secs_f64());
                last_frame = now;
                if frames.receiver_count() > 0 {
                    // a lagging subscriber only misses frames
                    let _ = frames.send(session.snapshot());
                }
            }
        }
    }
    tracing::info!("🛑 Layout session stopped");
}

struct Session {
    fleet: Fleet,
    interaction: InteractionController,
}

impl Session {
    fn handle(&mut self, command: Command) {
        tracing::trace!(?command, "session command");
        // a dropped receiver means the caller gave up; nothing to report
        match command {
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Control { change, reply } => {
                let _ = reply.send(self.apply_control(&change));
            }
            Command::PointerMove { target, reply } => {
                let hit = self.resolve(target);
                self.interaction.pointer_move(&mut self.fleet, hit);
                let _ = reply.send(self.respond(None));
            }
            Command::PointerDown {
                target,
                inside_edit_surface,
                reply,
            } => {
                let hit = self.resolve(target);
                let request = self
                    .interaction
                    .pointer_down(&mut self.fleet, hit, inside_edit_surface);
                let _ = reply.send(self.respond(Some(request)));
            }
            Command::EditSelected { edit, reply } => {
                let result = self
                    .interaction
                    .edit_selected(&mut self.fleet, &edit)
                    .map(|request| self.respond(Some(request)));
                let _ = reply.send(result);
            }
        }
    }

    fn apply_control(&mut self, change: &ControlChange) -> Result<LayoutSnapshot, ValidationError> {
        change.apply(&mut self.fleet)?;
        self.interaction.reconcile(&mut self.fleet);
        Ok(self.snapshot())
    }

    fn resolve(&self, target: PointerTarget) -> Option<UnitId> {
        match target {
            PointerTarget::Hit(hit) => hit,
            PointerTarget::Ray(ray) => ray_cast(self.fleet.placed(), &ray),
        }
    }

    fn respond(&self, edit_surface: Option<EditSurfaceRequest>) -> InteractionResponse {
        InteractionResponse {
            hovered: self.interaction.hovered(),
            selected: self.interaction.selected(),
            edit_surface,
            layout: self.snapshot(),
        }
    }

    fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot::capture(&self.fleet, &self.interaction)
    }
}
