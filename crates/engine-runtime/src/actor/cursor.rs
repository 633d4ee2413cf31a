use crate::{
    actor::{
        actor::{Actor, ActorContext},
        messages::{CursorMsg, StepReply},
    },
    error::ActorError,
};
use async_trait::async_trait;
use engine_core::{cursor::CursorState, error::CursorError, metrics::Metrics};
use model::pagination::cursor::CursorSnapshot;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Store-side half of a cursor.
///
/// Owns the [`CursorState`] and answers mirror requests one at a time.
/// Whenever the counts may have changed without the mirror asking (store
/// mutation, locale change, filter or target change) a fresh snapshot is
/// pushed on `outbound`.
pub struct CursorActor {
    state: Option<CursorState>,
    seq: u64,
    outbound: mpsc::UnboundedSender<CursorSnapshot>,
    metrics: Metrics,
    /// Stops the task that forwards store events into this mailbox.
    forwarder: CancellationToken,
}

impl CursorActor {
    pub fn new(
        state: CursorState,
        outbound: mpsc::UnboundedSender<CursorSnapshot>,
        metrics: Metrics,
        forwarder: CancellationToken,
    ) -> Self {
        Self {
            state: Some(state),
            seq: 0,
            outbound,
            metrics,
            forwarder,
        }
    }

    fn state(&mut self) -> Result<&mut CursorState, CursorError> {
        self.state.as_mut().ok_or(CursorError::Disconnected)
    }

    fn snapshot(&mut self) -> Result<CursorSnapshot, CursorError> {
        let calc = self.state()?.calculate()?;
        self.seq += 1;
        Ok(CursorSnapshot {
            seq: self.seq,
            total: calc.total,
            position: calc.position,
            revision: calc.revision,
            locale: calc.locale,
            alphabet: calc.alphabet,
        })
    }

    fn push(&mut self, ctx: &ActorContext) {
        match self.snapshot() {
            Ok(snapshot) => {
                debug!(
                    cursor = %ctx.name(),
                    seq = snapshot.seq,
                    total = snapshot.total,
                    position = snapshot.position,
                    revision = %snapshot.revision,
                    "pushing cursor snapshot"
                );
                if self.outbound.send(snapshot).is_err() {
                    debug!(cursor = %ctx.name(), "mirror gone, snapshot dropped");
                }
            }
            Err(CursorError::Disconnected) => {}
            Err(err) => warn!(cursor = %ctx.name(), error = %err, "failed to recalculate cursor"),
        }
    }
}

#[async_trait]
impl Actor<CursorMsg> for CursorActor {
    async fn on_start(&mut self, ctx: &ActorContext) -> Result<(), ActorError> {
        info!(cursor = %ctx.name(), "cursor actor started");
        Ok(())
    }

    async fn handle(&mut self, msg: CursorMsg, ctx: &ActorContext) -> Result<(), ActorError> {
        match msg {
            CursorMsg::Step {
                request,
                revision,
                cancel,
                reply,
            } => {
                let outcome = self
                    .state()
                    .and_then(|state| state.step(request, revision.as_deref(), &cancel))
                    .and_then(|result| {
                        let snapshot = self.snapshot()?;
                        Ok(StepReply { result, snapshot })
                    });

                if let Err(err) = &outcome {
                    if err.is_out_of_sync() {
                        self.metrics.increment_out_of_sync(1);
                    }
                    debug!(cursor = %ctx.name(), error = %err, "step not applied");
                }
                let _ = reply.send(outcome);
            }

            CursorMsg::Calculate { reply } => {
                let _ = reply.send(self.snapshot());
            }

            CursorMsg::SetFilter { filter, reply } => {
                let outcome = self.state().map(|state| state.set_filter(filter));
                let applied = outcome.is_ok();
                let _ = reply.send(outcome);
                if applied {
                    self.push(ctx);
                }
            }

            CursorMsg::SetAlphabeticIndex {
                index,
                locale,
                reply,
            } => {
                let outcome = self
                    .state()
                    .and_then(|state| state.set_target_alphabetic_index(index, locale.as_ref()));
                let applied = outcome.is_ok();
                let _ = reply.send(outcome);
                if applied {
                    self.push(ctx);
                }
            }

            CursorMsg::StoreMutated(event) => {
                debug!(
                    cursor = %ctx.name(),
                    revision = %event.revision,
                    locale = %event.locale,
                    "store mutated"
                );
                self.push(ctx);
            }

            CursorMsg::Free { reply } => {
                if let Some(state) = self.state.take() {
                    state.free();
                }
                self.forwarder.cancel();
                let _ = reply.send(());
            }
        }

        Ok(())
    }

    async fn on_stop(&mut self, ctx: &ActorContext) -> Result<(), ActorError> {
        self.forwarder.cancel();
        info!(cursor = %ctx.name(), "cursor actor stopped");
        Ok(())
    }
}
