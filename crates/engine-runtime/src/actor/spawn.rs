use crate::actor::{Actor, ActorContext, ActorRef};
use std::fmt::Debug;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::{Instrument, debug, error, info_span};

/// Runs `actor` on `runtime` inside an `actor` span named after it.
///
/// Messages are handled one at a time in arrival order; a failed message
/// is logged and the loop carries on. The loop ends once every `ActorRef`
/// has been dropped, and `on_stop` then runs exactly once.
pub fn spawn_actor<M, A>(
    runtime: &Handle,
    name: impl Into<String>,
    mailbox_capacity: usize,
    mut actor: A,
) -> (ActorRef<M>, JoinHandle<()>)
where
    A: Actor<M>,
    M: Send + Debug + 'static,
{
    let name = name.into();
    let span = info_span!("actor", name = %name);
    let ctx = ActorContext::new(name.clone());
    let (tx, mut mailbox) = mpsc::channel::<M>(mailbox_capacity.max(1));

    let run = async move {
        if let Err(err) = actor.on_start(&ctx).await {
            error!(?err, "start hook failed, actor not running");
            return;
        }

        let mut handled = 0u64;
        while let Some(msg) = mailbox.recv().await {
            if let Err(err) = actor.handle(msg, &ctx).await {
                error!(?err, "message failed");
            }
            handled += 1;
        }

        if let Err(err) = actor.on_stop(&ctx).await {
            error!(?err, "stop hook failed");
        }
        debug!(handled, "mailbox closed");
    };

    (ActorRef::new(name, tx), runtime.spawn(run.instrument(span)))
}
