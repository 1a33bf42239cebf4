use tokio::sync::watch;
use tracing::info;

/// Whether the user currently holds a usable session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SignedIn,
    SignedOut,
}

/// Broadcasts session transitions to whoever drives the UI.
///
/// A `SignedOut` transition is the cue to send the user back to the login screen.
#[derive(Clone)]
pub struct SessionSignal {
    tx: watch::Sender<SessionState>,
}

impl SessionSignal {
    pub fn new(initial: SessionState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> SessionState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn signed_in(&self) {
        self.publish(SessionState::SignedIn);
    }

    pub fn signed_out(&self) {
        self.publish(SessionState::SignedOut);
    }

    fn publish(&self, state: SessionState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!(?state, "session state changed");
        }
    }
}
