//! DispatcherHandle - public API for the dispatcher actor

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::commands::{Command, DispatchCommand};

/// Handle for sending control changes through the dispatcher
///
/// Cheap to clone. Sends are fire-and-forget; once the actor has stopped
/// they are dropped with a debug log.
#[derive(Clone, Debug)]
pub struct DispatcherHandle {
    cmd_tx: mpsc::UnboundedSender<DispatchCommand>,
}

impl DispatcherHandle {
    /// Create a new handle with the given command sender
    pub fn new(cmd_tx: mpsc::UnboundedSender<DispatchCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Queue a control change
    pub fn send(&self, controller: u8, value: u8, repeat: bool) {
        let command = Command {
            controller,
            value,
            repeat,
        };
        if self.cmd_tx.send(DispatchCommand::Send(command)).is_err() {
            debug!("Dispatcher stopped, dropping CC {} = {}", controller, value);
        }
    }

    /// Stop the actor and wait until it has released its port and repeats
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(DispatchCommand::Shutdown { done: done_tx })
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }

    /// Whether the actor is still accepting commands
    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }
}
