use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, trace};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch directory '{0}' does not exist or is not a directory")]
    MissingDir(PathBuf),

    #[error("failed to subscribe to directory events: {0}")]
    Subscribe(#[from] notify::Error),
}

/// Live subscription on the watch directory. Dropping it removes the watch
/// and closes the event channel, which ends the rotator's event loop.
#[derive(Debug)]
pub struct DirWatcher {
    _watcher: RecommendedWatcher,
}

/// Subscribes to file-appearance events (entry created, entry moved into the
/// directory) and forwards each event's basename into `tx`.
///
/// Events are forwarded in delivery order without coalescing. Filtering by
/// name happens downstream in the classifier; this layer only drops events
/// that carry no basename or are not arrivals.
pub fn watch_dir(dir: &Path, tx: mpsc::Sender<String>) -> Result<DirWatcher, WatchError> {
    if !dir.is_dir() {
        return Err(WatchError::MissingDir(dir.to_path_buf()));
    }

    let mut watcher =
        notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                if !is_arrival(&event.kind) {
                    return;
                }
                for path in &event.paths {
                    let name = match path.file_name().and_then(|n| n.to_str()) {
                        Some(name) => name.to_string(),
                        None => continue,
                    };
                    trace!(name = %name, "directory event");
                    // blocking_send: this callback runs on the notify thread,
                    // never on the runtime.
                    if tx.blocking_send(name).is_err() {
                        // Receiver dropped; the daemon is shutting down.
                        return;
                    }
                }
            }
            Err(e) => error!(error = %e, "watch event stream failed"),
        })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;

    Ok(DirWatcher { _watcher: watcher })
}

fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(
                RenameMode::To | RenameMode::Both | RenameMode::Any
            ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::CreateKind;

    #[test]
    fn test_arrival_kinds() {
        assert!(is_arrival(&EventKind::Create(CreateKind::File)));
        assert!(is_arrival(&EventKind::Modify(ModifyKind::Name(
            RenameMode::To
        ))));
        assert!(!is_arrival(&EventKind::Remove(
            notify::event::RemoveKind::File
        )));
        assert!(!is_arrival(&EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Content
        ))));
    }

    #[test]
    fn test_missing_dir_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let err = watch_dir(Path::new("/nonexistent/bakrot-test"), tx).unwrap_err();
        assert!(matches!(err, WatchError::MissingDir(_)));
    }
}
