//! The durable workflow runtime.
//!
//! Each entity (one ticket, one organization, the webhook singleton) is
//! owned by exactly one long-lived task with an unbounded signal mailbox.
//! Signals are applied strictly in arrival order against a scratch copy
//! of the state; only a successful cycle commits, so a failed cycle
//! leaves the last committed state queryable. After a configured number
//! of updates the task hands off to a fresh execution, persisting a
//! snapshot and incrementing its run number, but never before the
//! mailbox is drained.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tw_domain::error::{Error, Result};

use crate::snapshot::{Snapshot, SnapshotStore};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Workflow trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One entity-kind's update logic, shared by every workflow instance of
/// that kind.
///
/// `apply` receives a scratch copy of the committed state; the runtime
/// commits it only when `apply` returns `Ok`.
#[async_trait::async_trait]
pub trait EntityWorkflow: Send + Sync + 'static {
    type State: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static;
    type Signal: Send + 'static;

    /// Entity kind label used in logs.
    const ENTITY: &'static str;

    async fn apply(&self, state: &mut Self::State, signal: Self::Signal) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct WorkflowHandle<S, G> {
    signal_tx: mpsc::UnboundedSender<G>,
    state_rx: watch::Receiver<S>,
    error_rx: watch::Receiver<Option<String>>,
    join: JoinHandle<()>,
}

/// All live workflow instances of one entity kind, keyed by workflow id.
pub struct WorkflowRegistry<W: EntityWorkflow> {
    workflow: Arc<W>,
    store: Arc<dyn SnapshotStore>,
    handoff_threshold: u32,
    shutdown: CancellationToken,
    handles: Mutex<HashMap<String, WorkflowHandle<W::State, W::Signal>>>,
}

impl<W: EntityWorkflow> WorkflowRegistry<W> {
    pub fn new(workflow: W, store: Arc<dyn SnapshotStore>, handoff_threshold: u32) -> Self {
        Self {
            workflow: Arc::new(workflow),
            store,
            handoff_threshold: handoff_threshold.max(1),
            shutdown: CancellationToken::new(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Deliver `signal` to the workflow, starting it first if it is not
    /// running. Signals to the same workflow id are applied in the order
    /// they were sent.
    pub fn signal_with_start(&self, workflow_id: &str, signal: W::Signal) -> Result<()> {
        let mut handles = self.handles.lock();
        let handle = handles
            .entry(workflow_id.to_owned())
            .or_insert_with(|| self.spawn(workflow_id));
        if handle.join.is_finished() || handle.signal_tx.is_closed() {
            *handle = self.spawn(workflow_id);
        }
        handle
            .signal_tx
            .send(signal)
            .map_err(|_| Error::Other(format!("workflow {workflow_id} is not accepting signals")))
    }

    /// Read the last committed state without disturbing the workflow.
    /// `None` when the workflow has never been started in this process.
    pub fn query(&self, workflow_id: &str) -> Option<W::State> {
        self.handles
            .lock()
            .get(workflow_id)
            .map(|h| h.state_rx.borrow().clone())
    }

    /// Error message of the most recent update cycle, cleared by the next
    /// successful one.
    pub fn last_error(&self, workflow_id: &str) -> Option<String> {
        self.handles
            .lock()
            .get(workflow_id)
            .and_then(|h| h.error_rx.borrow().clone())
    }

    /// Stop every workflow: pending signals are drained, final snapshots
    /// written, then all tasks are awaited.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles: Vec<(String, WorkflowHandle<W::State, W::Signal>)> =
            self.handles.lock().drain().collect();
        for (workflow_id, handle) in handles {
            if handle.join.await.is_err() {
                tracing::error!(workflow = %workflow_id, entity = W::ENTITY, "workflow task panicked");
            }
        }
    }

    fn spawn(&self, workflow_id: &str) -> WorkflowHandle<W::State, W::Signal> {
        let (initial, run) = match self.store.load(workflow_id) {
            Ok(Some(snapshot)) => match serde_json::from_value::<W::State>(snapshot.state) {
                Ok(state) => (state, snapshot.run),
                Err(err) => {
                    tracing::error!(
                        workflow = workflow_id,
                        entity = W::ENTITY,
                        error = %err,
                        "snapshot did not deserialize, starting fresh"
                    );
                    (W::State::default(), 0)
                }
            },
            Ok(None) => (W::State::default(), 0),
            Err(err) => {
                tracing::error!(
                    workflow = workflow_id,
                    entity = W::ENTITY,
                    error = %err,
                    "snapshot load failed, starting fresh"
                );
                (W::State::default(), 0)
            }
        };

        tracing::debug!(workflow = workflow_id, entity = W::ENTITY, run, "starting workflow");

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let (error_tx, error_rx) = watch::channel(None);

        let join = tokio::spawn(run_workflow(
            self.workflow.clone(),
            workflow_id.to_owned(),
            self.store.clone(),
            self.handoff_threshold,
            self.shutdown.clone(),
            initial,
            run,
            signal_rx,
            state_tx,
            error_tx,
        ));

        WorkflowHandle {
            signal_tx,
            state_rx,
            error_rx,
            join,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

enum ExecutionOutcome {
    /// Update threshold reached and mailbox empty: snapshot, bump the run
    /// number, start a fresh execution with a zeroed counter.
    Handoff,
    /// Shutdown requested: drained, ready for a final snapshot.
    Cancelled,
    /// Every sender dropped; nothing can signal this workflow again.
    Detached,
}

#[allow(clippy::too_many_arguments)]
async fn run_workflow<W: EntityWorkflow>(
    workflow: Arc<W>,
    workflow_id: String,
    store: Arc<dyn SnapshotStore>,
    handoff_threshold: u32,
    shutdown: CancellationToken,
    mut state: W::State,
    mut run: u64,
    mut rx: mpsc::UnboundedReceiver<W::Signal>,
    state_tx: watch::Sender<W::State>,
    error_tx: watch::Sender<Option<String>>,
) {
    loop {
        let outcome = run_execution(
            workflow.as_ref(),
            &workflow_id,
            handoff_threshold,
            &shutdown,
            &mut state,
            &mut rx,
            &state_tx,
            &error_tx,
        )
        .await;

        match outcome {
            ExecutionOutcome::Handoff => {
                run += 1;
                persist(store.as_ref(), &workflow_id, &state, run);
                tracing::info!(
                    workflow = %workflow_id,
                    entity = W::ENTITY,
                    run,
                    "handing off to a new execution"
                );
            }
            ExecutionOutcome::Cancelled => {
                persist(store.as_ref(), &workflow_id, &state, run);
                tracing::debug!(workflow = %workflow_id, entity = W::ENTITY, "workflow stopped");
                return;
            }
            ExecutionOutcome::Detached => return,
        }
    }
}

/// One execution: apply signals until the handoff threshold is reached
/// and nothing is left in the mailbox.
///
/// The threshold alone never ends an execution; signals already delivered
/// keep being consumed past it, so a handoff cannot strand one.
#[allow(clippy::too_many_arguments)]
async fn run_execution<W: EntityWorkflow>(
    workflow: &W,
    workflow_id: &str,
    handoff_threshold: u32,
    shutdown: &CancellationToken,
    state: &mut W::State,
    rx: &mut mpsc::UnboundedReceiver<W::Signal>,
    state_tx: &watch::Sender<W::State>,
    error_tx: &watch::Sender<Option<String>>,
) -> ExecutionOutcome {
    let mut updates: u32 = 0;

    while updates < handoff_threshold || !rx.is_empty() {
        let signal = tokio::select! {
            biased;
            maybe = rx.recv() => match maybe {
                Some(signal) => signal,
                None => return ExecutionOutcome::Detached,
            },
            _ = shutdown.cancelled() => {
                // Drain whatever is already queued before stopping.
                while let Ok(signal) = rx.try_recv() {
                    apply_one(workflow, workflow_id, state, signal, state_tx, error_tx).await;
                }
                return ExecutionOutcome::Cancelled;
            }
        };

        apply_one(workflow, workflow_id, state, signal, state_tx, error_tx).await;
        updates += 1;
    }

    ExecutionOutcome::Handoff
}

async fn apply_one<W: EntityWorkflow>(
    workflow: &W,
    workflow_id: &str,
    state: &mut W::State,
    signal: W::Signal,
    state_tx: &watch::Sender<W::State>,
    error_tx: &watch::Sender<Option<String>>,
) {
    let mut scratch = state.clone();
    match workflow.apply(&mut scratch, signal).await {
        Ok(()) => {
            *state = scratch;
            let _ = state_tx.send(state.clone());
            let _ = error_tx.send(None);
        }
        Err(err) => {
            tracing::error!(
                workflow = workflow_id,
                entity = W::ENTITY,
                error = %err,
                "update cycle failed, keeping last committed state"
            );
            let _ = error_tx.send(Some(err.to_string()));
        }
    }
}

fn persist<S: Serialize>(store: &dyn SnapshotStore, workflow_id: &str, state: &S, run: u64) {
    let value = match serde_json::to_value(state) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(workflow = workflow_id, error = %err, "state did not serialize");
            return;
        }
    };
    if let Err(err) = store.save(workflow_id, &Snapshot { run, state: value }) {
        tracing::error!(workflow = workflow_id, error = %err, "snapshot write failed");
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemorySnapshotStore;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct CounterState {
        values: Vec<u32>,
    }

    /// Appends each signal value; a zero signal fails the cycle.
    struct CounterWorkflow;

    #[async_trait::async_trait]
    impl EntityWorkflow for CounterWorkflow {
        type State = CounterState;
        type Signal = u32;
        const ENTITY: &'static str = "counter";

        async fn apply(&self, state: &mut CounterState, signal: u32) -> Result<()> {
            if signal == 0 {
                // Mutate the scratch copy before failing to prove the
                // runtime discards it.
                state.values.clear();
                return Err(Error::InvalidArgument("zero signal".into()));
            }
            state.values.push(signal);
            Ok(())
        }
    }

    fn registry(threshold: u32) -> WorkflowRegistry<CounterWorkflow> {
        WorkflowRegistry::new(
            CounterWorkflow,
            Arc::new(MemorySnapshotStore::default()),
            threshold,
        )
    }

    async fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn signals_apply_in_order() {
        let registry = registry(100);
        for value in 1..=5 {
            registry.signal_with_start("counter-1", value).unwrap();
        }
        wait_for(|| registry.query("counter-1").is_some_and(|s| s.values.len() == 5)).await;
        assert_eq!(registry.query("counter-1").unwrap().values, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn workflows_are_isolated_by_id() {
        let registry = registry(100);
        registry.signal_with_start("counter-a", 1).unwrap();
        registry.signal_with_start("counter-b", 2).unwrap();
        wait_for(|| {
            registry.query("counter-a").is_some_and(|s| !s.values.is_empty())
                && registry.query("counter-b").is_some_and(|s| !s.values.is_empty())
        })
        .await;
        assert_eq!(registry.query("counter-a").unwrap().values, vec![1]);
        assert_eq!(registry.query("counter-b").unwrap().values, vec![2]);
    }

    #[tokio::test]
    async fn failed_cycle_keeps_committed_state() {
        let registry = registry(100);
        registry.signal_with_start("counter-1", 7).unwrap();
        wait_for(|| registry.query("counter-1").is_some_and(|s| s.values == vec![7])).await;

        registry.signal_with_start("counter-1", 0).unwrap();
        wait_for(|| registry.last_error("counter-1").is_some()).await;
        // The failed cycle's scratch mutation never landed.
        assert_eq!(registry.query("counter-1").unwrap().values, vec![7]);

        // A later success clears the error and commits.
        registry.signal_with_start("counter-1", 8).unwrap();
        wait_for(|| registry.query("counter-1").is_some_and(|s| s.values == vec![7, 8])).await;
        assert!(registry.last_error("counter-1").is_none());
    }

    #[tokio::test]
    async fn handoff_snapshots_and_bumps_run_number() {
        let store = Arc::new(MemorySnapshotStore::default());
        let registry = WorkflowRegistry::new(CounterWorkflow, store.clone() as Arc<dyn SnapshotStore>, 3);

        for value in 1..=7 {
            registry.signal_with_start("counter-1", value).unwrap();
        }
        // 7 updates with a threshold of 3: the first execution drains all
        // queued signals past the threshold, then hands off exactly once.
        wait_for(|| {
            store
                .load("counter-1")
                .unwrap()
                .is_some_and(|snapshot| snapshot.run == 1)
        })
        .await;

        let snapshot = store.load("counter-1").unwrap().unwrap();
        let state: CounterState = serde_json::from_value(snapshot.state).unwrap();
        assert_eq!(state.values, vec![1, 2, 3, 4, 5, 6, 7]);

        // Post-handoff the workflow keeps accepting signals.
        registry.signal_with_start("counter-1", 8).unwrap();
        wait_for(|| registry.query("counter-1").is_some_and(|s| s.values.len() == 8)).await;
    }

    #[tokio::test]
    async fn shutdown_drains_pending_and_persists() {
        let store = Arc::new(MemorySnapshotStore::default());
        let registry = WorkflowRegistry::new(CounterWorkflow, store.clone() as Arc<dyn SnapshotStore>, 100);

        for value in 1..=20 {
            registry.signal_with_start("counter-1", value).unwrap();
        }
        registry.shutdown().await;

        let snapshot = store.load("counter-1").unwrap().unwrap();
        let state: CounterState = serde_json::from_value(snapshot.state).unwrap();
        assert_eq!(state.values.len(), 20, "no signal may be lost at shutdown");
    }

    #[tokio::test]
    async fn snapshot_is_restored_on_start() {
        let store = Arc::new(MemorySnapshotStore::default());
        store
            .save(
                "counter-1",
                &Snapshot {
                    run: 4,
                    state: serde_json::json!({"values": [10, 11]}),
                },
            )
            .unwrap();

        let registry = WorkflowRegistry::new(CounterWorkflow, store.clone() as Arc<dyn SnapshotStore>, 100);
        registry.signal_with_start("counter-1", 12).unwrap();
        wait_for(|| registry.query("counter-1").is_some_and(|s| s.values.len() == 3)).await;
        assert_eq!(registry.query("counter-1").unwrap().values, vec![10, 11, 12]);
    }

    #[tokio::test]
    async fn query_of_unknown_workflow_is_none() {
        let registry = registry(100);
        assert!(registry.query("counter-never-started").is_none());
    }
}
