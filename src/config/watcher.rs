//! Configuration file watcher for hot-reload support
//!
//! The parent directory is watched rather than the file itself so that
//! editors saving through a rename are still picked up. Bursts of file system
//! events collapse into one reload once the file has been quiet for
//! [`RELOAD_DEBOUNCE`], and a reload that parses to the running
//! configuration is not delivered.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Quiet period required before the file is re-read
pub const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);

/// Delivers a new [`AppConfig`] each time the file changes to a valid,
/// different configuration
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Load the config (creating it with defaults if missing) and start
    /// watching it
    pub async fn new(config_path: PathBuf) -> Result<(Self, AppConfig)> {
        let initial_config = AppConfig::load_or_create(&config_path)
            .await
            .context("Failed to load initial config")?;

        let watch_dir = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = config_path.file_name().map(ToOwned::to_owned);

        // notify calls back on its own thread; only forward a wake-up
        let (touch_tx, touch_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if touches_config(&event, file_name.as_ref()) => {
                debug!("Config file event: {:?}", event.kind);
                let _ = touch_tx.send(());
            }
            Ok(_) => {}
            Err(e) => error!("Config watch error: {}", e),
        })?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", watch_dir.display()))?;

        let (tx, rx) = mpsc::channel(10);
        tokio::spawn(reload_loop(
            config_path.clone(),
            initial_config.clone(),
            touch_rx,
            tx,
        ));

        info!("Watching {} for changes", config_path.display());

        Ok((
            Self {
                _watcher: watcher,
                rx,
            },
            initial_config,
        ))
    }

    /// Wait for the next config update
    /// Returns None if the watcher has been closed
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}

fn touches_config(event: &Event, file_name: Option<&OsString>) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == file_name.map(OsString::as_os_str))
}

/// Re-read the file after each quiet burst of events until the watcher goes away
async fn reload_loop(
    path: PathBuf,
    mut current: AppConfig,
    mut touch_rx: mpsc::UnboundedReceiver<()>,
    tx: mpsc::Sender<AppConfig>,
) {
    while touch_rx.recv().await.is_some() {
        loop {
            match tokio::time::timeout(RELOAD_DEBOUNCE, touch_rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        if let Some(config) = reload(&path, &current).await {
            info!("Configuration reloaded");
            current = config.clone();
            if tx.send(config).await.is_err() {
                debug!("Config receiver dropped, stopping reload loop");
                return;
            }
        }
    }
}

/// The file's configuration, if it is valid and differs from `current`
async fn reload(path: &Path, current: &AppConfig) -> Option<AppConfig> {
    match AppConfig::load(path).await {
        Ok(config) if config == *current => {
            debug!("Config file touched without changes");
            None
        }
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Failed to reload config (keeping old config): {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_watcher_reload() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("shuttle-midi.yaml");

        fs::write(
            &config_path,
            "midi:\n  control_device: \"Loopback\"\ndisplay:\n  enabled: true\n",
        )?;

        let (mut watcher, config) = ConfigWatcher::new(config_path.clone()).await?;
        assert_eq!(config.midi.control_device, "Loopback");
        assert!(config.display.enabled);

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(
            &config_path,
            "midi:\n  control_device: \"Loopback\"\ndisplay:\n  enabled: false\n",
        )?;

        let new_config = tokio::time::timeout(Duration::from_secs(2), watcher.next_config()).await?;

        if let Some(new_config) = new_config {
            assert!(!new_config.display.enabled);
            assert_eq!(config.changes(&new_config).display_enabled, Some(false));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_unchanged_content_is_not_redelivered() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("shuttle-midi.yaml");
        let contents = "midi:\n  control_device: \"Loopback\"\n";
        fs::write(&config_path, contents)?;

        let (mut watcher, _config) = ConfigWatcher::new(config_path.clone()).await?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(&config_path, contents)?;

        let next = tokio::time::timeout(Duration::from_millis(600), watcher.next_config()).await;
        assert!(next.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_other_files_in_directory_are_ignored() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("shuttle-midi.yaml");

        let (mut watcher, _config) = ConfigWatcher::new(config_path.clone()).await?;

        tokio::time::sleep(Duration::from_millis(100)).await;
        fs::write(temp_dir.path().join("other.yaml"), "midi: {}\n")?;

        let next = tokio::time::timeout(Duration::from_millis(600), watcher.next_config()).await;
        assert!(next.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_file_is_created() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("shuttle-midi.yaml");

        let (_watcher, config) = ConfigWatcher::new(config_path.clone()).await?;

        assert_eq!(config, AppConfig::default());
        assert!(config_path.exists());
        Ok(())
    }
}
