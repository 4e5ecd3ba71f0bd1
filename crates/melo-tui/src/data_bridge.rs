//! Data bridge: forwards discover state changes into the action loop.

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use melo_core::ViewState;

use crate::action::Action;

/// Send the current state, then every later transition, as
/// [`Action::StateChanged`] until cancelled or the controller goes away.
pub async fn spawn_data_bridge(
    mut state: watch::Receiver<ViewState>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let initial = state.borrow_and_update().clone();
    let _ = action_tx.send(Action::StateChanged(initial));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = state.borrow_and_update().clone();
                debug!(state = %Action::StateChanged(next.clone()), "dispatching");
                if action_tx.send(Action::StateChanged(next)).is_err() {
                    break;
                }
            }
        }
    }

    debug!("data bridge shut down");
}
