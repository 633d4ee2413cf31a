use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Exit status after Ctrl-C, as a shell reports a SIGINT death.
pub const INTERRUPTED: u8 = 130;

/// Cancels in-flight cursor steps on Ctrl-C or SIGTERM.
///
/// Browsing checks [`Interrupt::token`] between pages; a step already in
/// the store sees the same token and returns `Cancelled` without moving.
#[derive(Clone, Default)]
pub struct Interrupt {
    token: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl Interrupt {
    /// Starts listening. Signals that cannot be hooked are logged and
    /// ignored, so browsing still works without them.
    pub fn listen(&self) {
        let token = self.token.clone();
        let fired = self.fired.clone();

        tokio::spawn(async move {
            let ctrl_c = async {
                if let Err(err) = signal::ctrl_c().await {
                    warn!(error = %err, "cannot watch for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };

            #[cfg(unix)]
            let terminate = async {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(err) => {
                        warn!(error = %err, "cannot watch for SIGTERM");
                        std::future::pending::<()>().await;
                    }
                }
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            let signal = tokio::select! {
                _ = ctrl_c => "SIGINT",
                _ = terminate => "SIGTERM",
            };
            info!(signal, "interrupted, cancelling cursor steps");

            fired.store(true, Ordering::SeqCst);
            token.cancel();
        });
    }

    pub fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Status for a run that ended early because of this interrupt.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(INTERRUPTED)
    }
}
