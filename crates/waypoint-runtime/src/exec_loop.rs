// exec_loop.rs — ExecutionLoop: the background tick worker.
//
// One worker thread repeats at a fixed interval:
//   1. snapshot the ready goals in priority order (lock held only for
//      the snapshot)
//   2. dispatch every registered hook to every ready goal, outside the
//      lock — a hook error fails that goal and that goal only
//   3. recompute: status resolution, expiry sweep, reprioritization,
//      escalation sweep, in that order
//
// Lifecycle is a two-state machine: stopped → running (start) → stopped
// (stop). The stop signal travels over an mpsc channel the worker polls
// as its ticker, so shutdown is deterministic: the in-flight tick always
// finishes, and `stop()` waits for it up to a bounded join timeout
// before detaching.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;

use waypoint_graph::{
    ExpiryReaper, GoalGraph, PriorityConfig, PriorityScheduler, StatusResolver,
};

use crate::config::LoopConfig;
use crate::error::RuntimeError;
use crate::hooks::{Handler, HookRegistry};

/// Everything a tick needs — shared between the owning handle and the
/// worker thread.
struct LoopCore {
    graph: Arc<GoalGraph>,
    hooks: RwLock<HookRegistry>,
    resolver: StatusResolver,
    scheduler: PriorityScheduler,
    reaper: ExpiryReaper,
}

impl LoopCore {
    /// One tick: dispatch, then recompute.
    fn tick(&self) {
        let ready = self.scheduler.ready_list(&self.graph);
        let dispatched = ready.len();

        if dispatched > 0 {
            let hooks = self
                .hooks
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for goal in &ready {
                for (name, hook) in hooks.iter() {
                    if let Err(error) = hook.on_goal(goal) {
                        tracing::warn!(goal_id = %goal.id, hook = name, %error, "hook failed");
                        self.graph
                            .record_hook_failure(goal.id, name, &error.to_string());
                    }
                }
            }
        }

        let transitions = self.resolver.resolve(&self.graph);
        let expired = self.reaper.sweep(&self.graph);
        self.scheduler.reprioritize(&self.graph);
        let escalations = self.graph.escalation_sweep();

        tracing::debug!(dispatched, transitions, expired, escalations, "tick complete");
    }
}

/// Handle for the running worker.
struct Worker {
    stop_tx: mpsc::Sender<()>,
    done_rx: mpsc::Receiver<()>,
    handle: thread::JoinHandle<()>,
}

/// The background process that drives the goal graph.
pub struct ExecutionLoop {
    core: Arc<LoopCore>,
    config: LoopConfig,
    worker: Mutex<Option<Worker>>,
}

impl ExecutionLoop {
    pub fn new(graph: Arc<GoalGraph>, config: LoopConfig) -> Self {
        Self::with_priority(graph, config, PriorityConfig::default())
    }

    /// Construct with explicit priority-policy tunables.
    pub fn with_priority(
        graph: Arc<GoalGraph>,
        config: LoopConfig,
        priority: PriorityConfig,
    ) -> Self {
        Self {
            core: Arc::new(LoopCore {
                graph,
                hooks: RwLock::new(HookRegistry::new()),
                resolver: StatusResolver::new(),
                scheduler: PriorityScheduler::new(priority),
                reaper: ExpiryReaper::new(),
            }),
            config,
            worker: Mutex::new(None),
        }
    }

    /// Register a hook. Hooks registered after `start()` take effect
    /// from the next tick.
    pub fn register_hook(&self, name: impl Into<String>, handler: impl Handler + 'static) {
        self.core
            .hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(name, handler);
    }

    /// The graph this loop drives.
    pub fn graph(&self) -> &Arc<GoalGraph> {
        &self.core.graph
    }

    /// Run exactly one tick on the calling thread. This is the same code
    /// path the worker runs — useful for deterministic tests and
    /// single-step operation.
    pub fn run_once(&self) {
        self.core.tick();
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start the background worker. The first tick runs immediately.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();
        let core = Arc::clone(&self.core);
        let interval = self.config.tick_interval();

        let handle = thread::Builder::new()
            .name("waypoint-loop".to_string())
            .spawn(move || {
                tracing::info!("execution loop started");
                loop {
                    core.tick();
                    // The stop channel doubles as the ticker: a timeout
                    // means "run the next tick", a message (or a dropped
                    // sender) means "exit after the current one".
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::info!("execution loop stopped");
                let _ = done_tx.send(());
            })?;

        *worker = Some(Worker {
            stop_tx,
            done_rx,
            handle,
        });
        Ok(())
    }

    /// Signal the worker to exit after the in-flight tick and wait for
    /// it up to the configured join timeout. On overrun the worker is
    /// detached and left to finish on its own.
    pub fn stop(&self) -> Result<(), RuntimeError> {
        let worker = {
            let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
            slot.take().ok_or(RuntimeError::NotRunning)?
        };

        let _ = worker.stop_tx.send(());
        match worker.done_rx.recv_timeout(self.config.join_timeout()) {
            Ok(()) => {
                let _ = worker.handle.join();
            }
            Err(_) => {
                tracing::warn!("worker did not exit within the join timeout, detaching");
            }
        }
        Ok(())
    }
}
