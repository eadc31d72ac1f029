//! Service source watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// A watcher that monitors the service source for changes.
pub struct SourceWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<()>,
}

impl SourceWatcher {
    /// Create a new SourceWatcher.
    ///
    /// Returns the watcher and a receiver that yields once per relevant change.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                change_tx,
            },
            change_rx,
        )
    }

    /// Start watching in a background thread. The returned watcher must be
    /// kept alive for notifications to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.change_tx;

        // Editors replace files rather than write in place, so a flat file is
        // watched through its parent directory.
        let file_name = (!self.path.is_dir())
            .then(|| self.path.file_name().map(|n| n.to_os_string()))
            .flatten();
        let (root, mode) = match &file_name {
            Some(_) => (
                self.path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or(Path::new("."))
                    .to_path_buf(),
                RecursiveMode::NonRecursive,
            ),
            None => (self.path.clone(), RecursiveMode::Recursive),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                        return;
                    }
                    let relevant = match &file_name {
                        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name.as_os_str())),
                        None => true,
                    };
                    if relevant {
                        tracing::debug!(paths = ?event.paths, "Service source change detected");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&root, mode)?;

        tracing::info!(path = ?self.path, "Service source watcher started");
        Ok(watcher)
    }
}
