//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Notice every save of the config file, in-place or atomic rename
//! - Reload and validate the file after each burst of changes
//! - Forward only configurations that pass validation
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: a rename over the file
//!   replaces its inode and would silently end a file watch
//! - Events for other files in the directory are dropped by file name

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RedirectorConfig;

/// Quiet period after a change before the file is read.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RedirectorConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RedirectorConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive; dropping it
    /// stops the reload task.
    ///
    /// Must be called from within a tokio runtime. Only configurations that
    /// load and validate are sent; anything else is logged and the current
    /// configuration stays in place.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name: OsString = self
            .path
            .file_name()
            .map(ToOwned::to_owned)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
        let dir = watch_dir(&self.path);

        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &file_name) => {
                    let _ = change_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default(),
        )?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        tokio::spawn(reload_on_change(self.path.clone(), change_rx, self.update_tx));

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Returns true if `event` creates, writes or renames onto `file_name`.
fn touches(event: &Event, file_name: &OsStr) -> bool {
    (event.kind.is_create() || event.kind.is_modify())
        && event.paths.iter().any(|p| p.file_name() == Some(file_name))
}

async fn reload_on_change(
    path: PathBuf,
    mut changes: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<RedirectorConfig>,
) {
    while changes.recv().await.is_some() {
        // One save can emit several events; fold them into one reload.
        tokio::time::sleep(SETTLE_DELAY).await;
        while changes.try_recv().is_ok() {}

        tracing::info!(path = %path.display(), "Config file changed, reloading");
        match load_config(&path) {
            Ok(config) => {
                if updates.send(config).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
            }
        }
    }
}
