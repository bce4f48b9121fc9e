//! Pause / resume / stop state machine gating the chunk loop.
//!
//! The status lives in a `tokio::sync::watch` channel: every transition is
//! an atomic compare-and-set on the channel value, and the suspended chunk
//! loop simply waits for the value to leave `Paused`.

use tokio::sync::watch;
use tracing::debug;
use vodup_protocol::TransferStatus;

use crate::TransferError;

/// Single source of truth for a controller's [`TransferStatus`].
#[derive(Debug)]
pub struct TransferStateMachine {
    status: watch::Sender<TransferStatus>,
}

impl Default for TransferStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStateMachine {
    /// Creates a machine in `Idle`.
    pub fn new() -> Self {
        let (status, _) = watch::channel(TransferStatus::Idle);
        Self { status }
    }

    /// Current status.
    pub fn status(&self) -> TransferStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<TransferStatus> {
        self.status.subscribe()
    }

    /// Begins a new session.
    ///
    /// Rejected while another session is uploading or paused. Without
    /// credentials the machine moves to `Error` and the start fails.
    pub fn start(&self, authenticated: bool) -> Result<(), TransferError> {
        let mut outcome = Ok(());
        self.status.send_if_modified(|s| {
            if s.is_active() {
                outcome = Err(TransferError::SessionActive);
                return false;
            }
            let next = if authenticated {
                TransferStatus::Uploading
            } else {
                outcome = Err(TransferError::AuthenticationMissing);
                TransferStatus::Error
            };
            debug!(from = %s, to = %next, "transfer status changed");
            *s = next;
            true
        });
        outcome
    }

    fn transition(&self, from: &[TransferStatus], to: TransferStatus) -> bool {
        self.status.send_if_modified(|s| {
            if !from.contains(s) {
                return false;
            }
            debug!(from = %s, to = %to, "transfer status changed");
            *s = to;
            true
        })
    }

    /// `Uploading` → `Paused`.
    pub fn pause(&self) -> bool {
        self.transition(&[TransferStatus::Uploading], TransferStatus::Paused)
    }

    /// `Paused` → `Uploading`.
    pub fn resume(&self) -> bool {
        self.transition(&[TransferStatus::Paused], TransferStatus::Uploading)
    }

    /// `Uploading` | `Paused` → `Stopped`.
    pub fn stop(&self) -> bool {
        self.transition(
            &[TransferStatus::Uploading, TransferStatus::Paused],
            TransferStatus::Stopped,
        )
    }

    /// `Uploading` | `Paused` → `Completed`, once the finalize phases succeeded.
    ///
    /// Finalize runs past the last checkpoint, so a pause that arrives
    /// during it is overtaken by completion.
    pub fn complete(&self) -> bool {
        self.transition(
            &[TransferStatus::Uploading, TransferStatus::Paused],
            TransferStatus::Completed,
        )
    }

    /// `Uploading` | `Paused` → `Error`.
    ///
    /// A stopped session stays `Stopped` even if an in-flight call fails
    /// afterwards.
    pub fn fail(&self) -> bool {
        self.transition(
            &[TransferStatus::Uploading, TransferStatus::Paused],
            TransferStatus::Error,
        )
    }

    /// Waits until the status is no longer `Paused` and returns it.
    pub async fn wait_while_paused(&self) -> TransferStatus {
        let mut rx = self.status.subscribe();
        match rx.wait_for(|s| *s != TransferStatus::Paused).await {
            Ok(status) => *status,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.status(),
        }
    }
}
