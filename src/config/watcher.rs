//! Configuration file watcher for hot reload.
//!
//! Watches the parent directory so that a file replaced by rename is still
//! picked up.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let (dir, file_name) = watch_target(&self.path)?;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_config_event(&event, &file_name) => {
                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match load_config(&path) {
                        Ok(new_config) => {
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, dir = ?dir, "Config watcher started");
        Ok(watcher)
    }
}

/// Directory to watch and the file name to react to.
fn watch_target(path: &Path) -> Result<(PathBuf, OsString), notify::Error> {
    let file_name = path
        .file_name()
        .ok_or_else(|| notify::Error::path_not_found().add_path(path.to_path_buf()))?
        .to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}

/// A write, create or rename that touches the config file.
fn is_config_event(event: &Event, file_name: &OsStr) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, EventKind, ModifyKind, RemoveKind, RenameMode};

    #[test]
    fn test_watch_target_uses_parent_dir() {
        let (dir, name) = watch_target(Path::new("/etc/filter/request-filter.toml")).unwrap();
        assert_eq!(dir, PathBuf::from("/etc/filter"));
        assert_eq!(name, "request-filter.toml");

        let (dir, name) = watch_target(Path::new("request-filter.toml")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "request-filter.toml");

        assert!(watch_target(Path::new("/")).is_err());
    }

    #[test]
    fn test_events_filtered_by_file_name() {
        let name = OsStr::new("request-filter.toml");

        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/etc/filter/.request-filter.toml.tmp"))
            .add_path(PathBuf::from("/etc/filter/request-filter.toml"));
        assert!(is_config_event(&renamed, name));

        let written = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/etc/filter/request-filter.toml"));
        assert!(is_config_event(&written, name));

        let created = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/etc/filter/request-filter.toml"));
        assert!(is_config_event(&created, name));

        let sibling = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(PathBuf::from("/etc/filter/other.toml"));
        assert!(!is_config_event(&sibling, name));

        let removed = Event::new(EventKind::Remove(RemoveKind::File))
            .add_path(PathBuf::from("/etc/filter/request-filter.toml"));
        assert!(!is_config_event(&removed, name));
    }

    #[tokio::test]
    async fn test_reload_after_atomic_rename() {
        let dir = std::env::temp_dir().join(format!("request-filter-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("request-filter.toml");
        std::fs::write(&path, "[filter]\nip_filters = [\"10.0.0.1\"]\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _watcher = watcher.run().unwrap();

        let tmp = dir.join(".request-filter.toml.tmp");
        std::fs::write(&tmp, "[filter]\nip_filters = [\"10.0.0.2\"]\n").unwrap();
        std::fs::rename(&tmp, &path).unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let config = updates.recv().await.unwrap();
                if config.filter.ip_filters == Some(vec!["10.0.0.2".to_string()]) {
                    return config;
                }
            }
        })
        .await
        .unwrap();
        assert!(config.filter.validate_on_load);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
