//! Per-target scheduling
//!
//! The Scheduler runs one independent task per [`ReconciliationTarget`]:
//!
//! ```text
//!                  ┌─────────────┐
//!                  │  Scheduler  │
//!                  └─────────────┘
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!   ┌────────────┐ ┌────────────┐ ┌────────────┐
//!   │ target #1  │ │ target #2  │ │ target #N  │   reconcile ─► sleep ─► reconcile ...
//!   └────────────┘ └────────────┘ └────────────┘
//!          └──────────────┼──────────────┘
//!                         ▼
//!              shared Arc<Reconciler>
//! ```
//!
//! Each task reconciles immediately, then (in repeating mode) sleeps for the
//! interval and reconciles again until shutdown. Tasks share no mutable
//! state and never wait on each other. On shutdown the sleep is interrupted;
//! a cycle already in flight runs to completion.
//!
//! Each cycle runs as its own task. A panicking collaborator loses that one
//! cycle; the target keeps its schedule and tries again after the interval.

use crate::config::{DdnsConfig, ReconciliationTarget};
use crate::error::{Error, Result};
use crate::reconciler::{Reconciler, UpdateOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

/// Default capacity of the scheduler event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events emitted by the Scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// All target tasks have been launched
    Started {
        targets_count: usize,
    },

    /// One target finished one cycle
    CycleCompleted {
        hostname: String,
        outcome: UpdateOutcome,
    },

    /// Scheduler stopped
    Stopped {
        reason: String,
    },
}

/// Runs the reconciler for every target, once or forever
///
/// ## Lifecycle
///
/// 1. Create with [`Scheduler::new()`] or [`Scheduler::from_config()`]
/// 2. Start with [`Scheduler::run()`]
/// 3. Single pass: returns once every target produced one outcome.
///    Repeating: returns after a shutdown signal and all tasks exited.
pub struct Scheduler {
    /// Shared decision procedure
    reconciler: Arc<Reconciler>,

    /// One task per target
    targets: Vec<ReconciliationTarget>,

    /// Sleep between cycles of the same target
    interval: Duration,

    /// Repeat forever instead of a single pass
    repeat: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SchedulerEvent>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Returns
    ///
    /// A tuple of (scheduler, event_receiver) where event_receiver yields
    /// scheduler events. Dropping the receiver is allowed.
    pub fn new(
        reconciler: Arc<Reconciler>,
        targets: Vec<ReconciliationTarget>,
        interval: Duration,
        repeat: bool,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        if targets.is_empty() {
            return Err(Error::config("No targets configured"));
        }

        if interval.is_zero() {
            return Err(Error::config("Interval must be > 0"));
        }

        if let Some(target) = targets.iter().find(|t| t.ttl_seconds == 0) {
            return Err(Error::config(format!(
                "TTL for {} must be > 0",
                target.hostname
            )));
        }

        let (tx, rx) = mpsc::channel(DEFAULT_EVENT_CHANNEL_CAPACITY);

        let scheduler = Self {
            reconciler,
            targets,
            interval,
            repeat,
            event_tx: tx,
        };

        Ok((scheduler, rx))
    }

    /// Create a scheduler from a validated configuration
    pub fn from_config(
        reconciler: Arc<Reconciler>,
        config: &DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<SchedulerEvent>)> {
        config.validate()?;
        Self::new(
            reconciler,
            config.targets(),
            config.interval(),
            config.keep_alive,
        )
    }

    /// Run until done (single pass) or until CTRL-C (repeating)
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run with an explicit shutdown signal
    ///
    /// Repeating mode stops when `shutdown_rx` fires or its sender is
    /// dropped. `None` falls back to CTRL-C.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut tasks = JoinSet::new();

        for target in &self.targets {
            tasks.spawn(run_target(
                Arc::clone(&self.reconciler),
                target.clone(),
                self.interval,
                self.repeat,
                stop_rx.clone(),
                self.event_tx.clone(),
            ));
        }

        info!(
            targets = self.targets.len(),
            repeat = self.repeat,
            interval_secs = self.interval.as_secs(),
            "All target tasks launched"
        );
        emit(
            &self.event_tx,
            SchedulerEvent::Started {
                targets_count: self.targets.len(),
            },
        );

        let mut reason = if self.repeat {
            "All target tasks exited"
        } else {
            "Single pass complete"
        };

        if self.repeat {
            let shutdown = wait_for_shutdown(shutdown_rx);
            tokio::pin!(shutdown);

            loop {
                tokio::select! {
                    joined = tasks.join_next() => match joined {
                        Some(result) => log_join(result),
                        None => break,
                    },

                    _ = &mut shutdown => {
                        info!("Shutdown signal received, waiting for in-flight cycles");
                        reason = "Shutdown signal";
                        let _ = stop_tx.send(true);
                        break;
                    }
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            log_join(result);
        }

        info!(reason, "Scheduler stopped");
        emit(
            &self.event_tx,
            SchedulerEvent::Stopped {
                reason: reason.to_string(),
            },
        );

        Ok(())
    }
}

/// Cycle loop of a single target
async fn run_target(
    reconciler: Arc<Reconciler>,
    target: ReconciliationTarget,
    interval: Duration,
    repeat: bool,
    mut stop_rx: watch::Receiver<bool>,
    event_tx: mpsc::Sender<SchedulerEvent>,
) {
    loop {
        match run_cycle(&reconciler, &target).await {
            Ok(outcome) => {
                info!(
                    hostname = %target.hostname,
                    outcome = outcome.label(),
                    "Cycle finished: {}",
                    outcome
                );
                emit(
                    &event_tx,
                    SchedulerEvent::CycleCompleted {
                        hostname: target.hostname.clone(),
                        outcome,
                    },
                );
            }
            Err(e) => {
                error!(
                    hostname = %target.hostname,
                    error = %e,
                    "Cycle aborted"
                );
            }
        }

        if !repeat || *stop_rx.borrow() {
            break;
        }

        info!(
            hostname = %target.hostname,
            "Sleeping for {} seconds",
            interval.as_secs()
        );

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop_rx.changed() => {
                debug!(hostname = %target.hostname, "Stop requested during sleep");
                break;
            }
        }
    }
}

/// Run one cycle on its own task so a panic stays inside that cycle
async fn run_cycle(
    reconciler: &Arc<Reconciler>,
    target: &ReconciliationTarget,
) -> std::result::Result<UpdateOutcome, JoinError> {
    let reconciler = Arc::clone(reconciler);
    let target = target.clone();
    tokio::spawn(async move { reconciler.reconcile(&target).await }).await
}

async fn wait_for_shutdown(shutdown_rx: Option<oneshot::Receiver<()>>) {
    match shutdown_rx {
        Some(rx) => {
            let _ = rx.await;
        }
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

fn log_join(result: std::result::Result<(), JoinError>) {
    if let Err(e) = result {
        error!("Target task terminated abnormally: {}", e);
    }
}

fn emit(event_tx: &mpsc::Sender<SchedulerEvent>, event: SchedulerEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!("Event channel full, dropping event");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            // Nobody is listening.
        }
    }
}
