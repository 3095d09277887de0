//! Operator interruption handling.

use log::debug;
use tokio_util::sync::CancellationToken;

/// Spawns a task that cancels the returned token on Ctrl-C.
///
/// The probe loop races its inter-request sleep against this token, so an
/// interruption ends the run gracefully with a summary instead of killing the
/// process mid-line. Must be called from within a Tokio runtime.
pub fn spawn_interrupt_listener() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        debug!("Received Ctrl-C, requesting graceful stop");
                        cancel.cancel();
                    }
                    // Without a signal handler the run simply cannot be
                    // interrupted gracefully; it still halts on its own.
                    Err(e) => debug!("Unable to listen for Ctrl-C: {e}"),
                }
            }
            _ = cancel.cancelled() => {}
        }
    });
    token
}
