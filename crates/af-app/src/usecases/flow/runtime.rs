//! Single-consumer event loop around [`FlowController`].
//!
//! Every collaborator callback becomes a [`FlowInput`] on one channel, so
//! exactly one handler runs at a time and state needs no locking. Tasks a
//! handler defers are posted to the back of the same channel, which makes
//! them run on a later turn against fully updated state.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, debug_span, info, info_span, warn, Instrument};

use af_core::flow::{FlowInput, IdentityPair, ScheduledTask};

use super::controller::FlowController;

#[derive(Debug)]
enum Envelope {
    Input(FlowInput),
    /// A passwordless lookup ended; `None` when it failed.
    LookupFinished(Option<FlowInput>),
    Barrier(oneshot::Sender<()>),
    Settle(oneshot::Sender<()>),
}

/// Cloneable sender side of a running [`FlowRuntime`].
#[derive(Debug, Clone)]
pub struct FlowHandle {
    tx: UnboundedSender<Envelope>,
}

impl FlowHandle {
    pub fn send(&self, input: FlowInput) -> Result<()> {
        let name = input.name();
        self.tx
            .send(Envelope::Input(input))
            .map_err(|_| anyhow!("flow runtime stopped, dropped {name}"))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(FlowInput::Shutdown)
    }

    /// Resolves once every input sent before it has been handled.
    ///
    /// Inputs the handlers deferred to later turns may still be queued.
    pub async fn barrier(&self) -> Result<()> {
        self.wait_for(Envelope::Barrier).await
    }

    /// Like [`barrier`](Self::barrier), but also waits until no passwordless
    /// lookup is in flight.
    pub async fn settle(&self) -> Result<()> {
        self.wait_for(Envelope::Settle).await
    }

    async fn wait_for(&self, envelope: fn(oneshot::Sender<()>) -> Envelope) -> Result<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(envelope(done_tx))
            .map_err(|_| anyhow!("flow runtime stopped"))?;
        done_rx
            .await
            .map_err(|_| anyhow!("flow runtime stopped before answering"))
    }
}

pub struct FlowRuntime {
    controller: FlowController,
    input_rx: UnboundedReceiver<Envelope>,
    // Weak so that dropping every handle ends the loop.
    loopback: WeakUnboundedSender<Envelope>,
    lookups_in_flight: usize,
    settle_waiters: Vec<oneshot::Sender<()>>,
    shutting_down: bool,
}

impl FlowRuntime {
    pub fn new(controller: FlowController) -> (Self, FlowHandle) {
        let (tx, input_rx) = mpsc::unbounded_channel();
        let runtime = Self {
            controller,
            input_rx,
            loopback: tx.downgrade(),
            lookups_in_flight: 0,
            settle_waiters: Vec::new(),
            shutting_down: false,
        };
        (runtime, FlowHandle { tx })
    }

    pub fn controller(&self) -> &FlowController {
        &self.controller
    }

    /// Process inputs until shutdown or until every handle is dropped.
    ///
    /// Returns the controller so callers can inspect the final state.
    pub async fn start(mut self) -> FlowController {
        info!("flow runtime started");
        while !self.shutting_down {
            match self.input_rx.recv().await {
                Some(Envelope::Input(input)) => self.handle_input(input),
                Some(Envelope::LookupFinished(input)) => {
                    self.lookups_in_flight = self.lookups_in_flight.saturating_sub(1);
                    if let Some(input) = input {
                        self.handle_input(input);
                    }
                    self.release_settled();
                }
                Some(Envelope::Barrier(done)) => {
                    let _ = done.send(());
                }
                Some(Envelope::Settle(done)) => {
                    self.settle_waiters.push(done);
                    self.release_settled();
                }
                None => {
                    debug!("all flow handles dropped");
                    break;
                }
            }
        }
        info!("flow runtime stopped");
        self.controller
    }

    fn handle_input(&mut self, input: FlowInput) {
        if matches!(input, FlowInput::Shutdown) {
            info!("flow runtime shutting down");
            self.shutting_down = true;
            return;
        }

        let span = info_span!(
            "flow.runtime.dispatch",
            input = input.name(),
            cycle = self.controller.cycle()
        );
        let _enter = span.enter();
        if let Err(err) = self.controller.handle(input) {
            warn!(error = %err, "flow input rejected");
        }
        self.drain_scheduled();
    }

    fn release_settled(&mut self) {
        if self.lookups_in_flight > 0 {
            return;
        }
        for done in self.settle_waiters.drain(..) {
            let _ = done.send(());
        }
    }

    fn drain_scheduled(&mut self) {
        for task in self.controller.take_scheduled() {
            debug!(?task, "deferring task to a later turn");
            match task {
                ScheduledTask::ConfirmPassword { .. } => self.post(FlowInput::Scheduled(task)),
                ScheduledTask::QueryPasswordless { cycle, pair } => {
                    self.spawn_passwordless_lookup(cycle, pair)
                }
            }
        }
    }

    fn post(&self, input: FlowInput) {
        match self.loopback.upgrade() {
            Some(tx) => {
                if tx.send(Envelope::Input(input)).is_err() {
                    debug!("runtime closed before deferred input");
                }
            }
            None => debug!(input = input.name(), "no flow handle left for deferred input"),
        }
    }

    fn spawn_passwordless_lookup(&mut self, cycle: u64, pair: IdentityPair) {
        if !self.controller.is_current_cycle(cycle) {
            return;
        }
        let Some(query) = self.controller.passwordless_query() else {
            return;
        };
        let Some(tx) = self.loopback.upgrade() else {
            return;
        };

        self.lookups_in_flight += 1;
        let span = debug_span!("flow.runtime.passwordless_lookup", cycle);
        tokio::spawn(
            async move {
                let resolved = match query.is_passwordless(&pair.email, &pair.gaia_id).await {
                    Ok(is_passwordless) => Some(FlowInput::PasswordlessResolved {
                        pair,
                        is_passwordless,
                    }),
                    // The pair stays marked in flight, so the cycle keeps
                    // waiting until the identity changes or a reload.
                    Err(err) => {
                        warn!(error = %err, "passwordless lookup failed");
                        None
                    }
                };
                let _ = tx.send(Envelope::LookupFinished(resolved));
            }
            .instrument(span),
        );
    }
}
