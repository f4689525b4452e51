//! Transport substitution through the local music player
//!
//! When enabled, the four transport buttons control Music.app instead of
//! emitting control changes.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::controls::{TRANSPORT_NEXT, TRANSPORT_PLAY, TRANSPORT_PREVIOUS, TRANSPORT_STOP};

/// Seconds skipped by previous/next
pub const SEEK_SECONDS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportAction {
    Previous,
    Next,
    Stop,
    Play,
}

impl TransportAction {
    /// Action bound to a transport button id
    pub fn for_button(id: usize) -> Option<Self> {
        match id {
            TRANSPORT_PREVIOUS => Some(Self::Previous),
            TRANSPORT_NEXT => Some(Self::Next),
            TRANSPORT_STOP => Some(Self::Stop),
            TRANSPORT_PLAY => Some(Self::Play),
            _ => None,
        }
    }

    /// AppleScript statement sent to the player
    fn script(self) -> String {
        match self {
            Self::Previous => format!(
                "set player position to (player position -{})",
                SEEK_SECONDS
            ),
            Self::Next => format!(
                "set player position to (player position +{})",
                SEEK_SECONDS
            ),
            Self::Stop => "pause".to_string(),
            Self::Play => "playpause".to_string(),
        }
    }
}

#[async_trait]
pub trait MediaKeys: Send + Sync {
    async fn send(&self, action: TransportAction) -> Result<()>;
}

/// Drives Music.app with `osascript`
#[derive(Debug, Clone)]
pub struct MusicAppKeys {
    application: String,
}

impl MusicAppKeys {
    pub fn new() -> Self {
        Self {
            application: "Music".to_string(),
        }
    }
}

impl Default for MusicAppKeys {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaKeys for MusicAppKeys {
    async fn send(&self, action: TransportAction) -> Result<()> {
        let script = format!(
            "tell application \"{}\" to {}",
            self.application,
            action.script()
        );
        debug!(?action, "osascript -e '{}'", script);

        let output = Command::new("osascript")
            .arg("-e")
            .arg(&script)
            .output()
            .await
            .context("Failed to run osascript")?;

        if !output.status.success() {
            bail!(
                "osascript exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every action instead of running it
    #[derive(Clone, Default)]
    pub struct RecordingKeys {
        pub actions: Arc<Mutex<Vec<TransportAction>>>,
    }

    impl RecordingKeys {
        pub fn actions(&self) -> Vec<TransportAction> {
            self.actions.lock().clone()
        }
    }

    #[async_trait]
    impl MediaKeys for RecordingKeys {
        async fn send(&self, action: TransportAction) -> Result<()> {
            self.actions.lock().push(action);
            Ok(())
        }
    }
}
