//! Messages accepted by the dispatcher actor

use tokio::sync::oneshot;

/// One outbound control change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// CC number (0-127)
    pub controller: u8,
    /// CC value (0-127); 255 means "neutral" and is never transmitted
    pub value: u8,
    /// Keep re-sending this value until the repeat budget runs out
    pub repeat: bool,
}

/// Commands for the dispatcher actor
#[derive(Debug)]
pub enum DispatchCommand {
    /// Send (and optionally repeat) a control change
    ///
    /// Fire-and-forget: the sender never waits.
    Send(Command),

    /// Stop the actor
    ///
    /// Pending repeats are dropped and the output port is closed before
    /// `done` fires.
    Shutdown {
        /// Acknowledged once the actor has released everything
        done: oneshot::Sender<()>,
    },
}
