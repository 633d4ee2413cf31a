use collation::Locale;
use engine_core::error::CursorError;
use model::{
    events::store::StoreMutated,
    filter::Filter,
    pagination::{
        cursor::CursorSnapshot,
        step::{StepRequest, StepResult},
    },
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

pub type Reply<T> = oneshot::Sender<Result<T, CursorError>>;

/// Outcome of a successful step together with the counts it left behind.
#[derive(Debug, Clone)]
pub struct StepReply {
    pub result: StepResult,
    pub snapshot: CursorSnapshot,
}

/// Messages for a store-side cursor actor.
#[derive(Debug)]
pub enum CursorMsg {
    /// Advance and/or fetch. `revision` is the store revision the caller
    /// last saw; a mismatch is answered with `OutOfSync`.
    Step {
        request: StepRequest,
        revision: Option<String>,
        cancel: CancellationToken,
        reply: Reply<StepReply>,
    },

    /// Recompute total, position and alphabet.
    Calculate { reply: Reply<CursorSnapshot> },

    /// Replace the filter. New counts are pushed afterwards.
    SetFilter {
        filter: Option<Filter>,
        reply: Reply<()>,
    },

    /// Jump to an alphabet label. `locale` is the locale the label was
    /// taken from. New counts are pushed afterwards.
    SetAlphabeticIndex {
        index: usize,
        locale: Option<Locale>,
        reply: Reply<()>,
    },

    /// The owning store changed.
    StoreMutated(Arc<StoreMutated>),

    /// Release the cursor. Every later request is answered with
    /// `Disconnected`.
    Free { reply: oneshot::Sender<()> },
}
