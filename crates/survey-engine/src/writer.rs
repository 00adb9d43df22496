//! Write-behind persistence queue.
//!
//! Every in-memory mutation enqueues a [`WriteOp`]; a spawned task drains
//! the queue and applies each op to the stores. In-memory state is the
//! source of truth and is mutated before the write is enqueued, so a crash
//! between mutation and flush loses that mutation. Failed writes are
//! logged, handed to the optional failure hook, and never rolled back
//! (at-least-once, no compensation).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use survey_core::models::{Drone, Mission};

use crate::persistence::{FleetStore, MissionStore};

/// A single durability operation.
#[derive(Debug, Clone)]
pub enum WriteOp {
    PutMission(Box<Mission>),
    DeleteMission(String),
    TrimMissions { location: String, keep: usize },
    SaveFleet(Vec<Drone>),
}

/// Called with every op that failed to persist.
pub type FailureHook = Arc<dyn Fn(&WriteOp, &anyhow::Error) + Send + Sync>;

/// Fire-and-forget sender side of the queue. Cheap to clone; sends never
/// block and never report success.
#[derive(Clone)]
pub struct PersistHandle {
    tx: Option<mpsc::UnboundedSender<WriteOp>>,
}

impl PersistHandle {
    /// A handle that drops every write. For previews and unit tests that
    /// don't care about durability.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn put_mission(&self, mission: &Mission) {
        self.send(WriteOp::PutMission(Box::new(mission.clone())));
    }

    pub fn delete_mission(&self, id: &str) {
        self.send(WriteOp::DeleteMission(id.to_string()));
    }

    pub fn trim_missions(&self, location: &str, keep: usize) {
        self.send(WriteOp::TrimMissions {
            location: location.to_string(),
            keep,
        });
    }

    pub fn save_fleet(&self, fleet: &[Drone]) {
        self.send(WriteOp::SaveFleet(fleet.to_vec()));
    }

    fn send(&self, op: WriteOp) {
        let Some(tx) = &self.tx else {
            return;
        };
        if tx.send(op).is_err() {
            warn!("persistence writer is gone, dropping write");
        }
    }
}

/// Spawn the drain task over the given stores.
///
/// The task exits once every [`PersistHandle`] clone is dropped and the
/// queue is drained; awaiting the returned handle gives a best-effort
/// flush on shutdown.
pub fn spawn_writer(
    mission_store: Arc<dyn MissionStore>,
    fleet_store: Arc<dyn FleetStore>,
    on_failure: Option<FailureHook>,
) -> (PersistHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_writer(rx, mission_store, fleet_store, on_failure));
    (PersistHandle { tx: Some(tx) }, task)
}

async fn run_writer(
    mut rx: mpsc::UnboundedReceiver<WriteOp>,
    mission_store: Arc<dyn MissionStore>,
    fleet_store: Arc<dyn FleetStore>,
    on_failure: Option<FailureHook>,
) {
    while let Some(op) = rx.recv().await {
        if let Err(err) = apply(&op, mission_store.as_ref(), fleet_store.as_ref()).await {
            warn!("persistence write failed: {err}");
            if let Some(hook) = &on_failure {
                hook(&op, &err);
            }
        }
    }
    tracing::debug!("persistence writer drained, shutting down");
}

async fn apply(
    op: &WriteOp,
    mission_store: &dyn MissionStore,
    fleet_store: &dyn FleetStore,
) -> anyhow::Result<()> {
    match op {
        WriteOp::PutMission(mission) => mission_store.put(mission).await,
        WriteOp::DeleteMission(id) => mission_store.delete(id).await.map(|_| ()),
        WriteOp::TrimMissions { location, keep } => mission_store
            .retention_trim(location, *keep)
            .await
            .map(|_| ()),
        WriteOp::SaveFleet(fleet) => fleet_store.save(fleet).await,
    }
}
