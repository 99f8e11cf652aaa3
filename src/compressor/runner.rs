use crate::compressor::archiver::{run_archiver, ArchiveError, ArchivePlan};
use crate::config::ArchiveConfig;
use crate::coord::Coordinator;
use crate::rotator::ring::GenerationRing;
use crate::stream::{StreamId, StreamRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

/// The compressor worker: woken by the rotator, packages one pending
/// stream's generations 1..N into a timestamped archive, supersedes that
/// stream's previous archive, removes the packaged originals, and settles
/// any head slot that filled while the compression ran.
pub struct Compressor {
    watch_dir: PathBuf,
    depth: usize,
    registry: Arc<StreamRegistry>,
    coord: Arc<Coordinator>,
    archive: ArchiveConfig,
    /// Most recent archive produced per stream. Owned by this worker only.
    last_archive: Vec<Option<PathBuf>>,
}

impl Compressor {
    pub fn new(
        watch_dir: PathBuf,
        depth: usize,
        registry: Arc<StreamRegistry>,
        coord: Arc<Coordinator>,
        archive: ArchiveConfig,
    ) -> Self {
        let last_archive = vec![None; registry.len()];
        Self {
            watch_dir,
            depth,
            registry,
            coord,
            archive,
            last_archive,
        }
    }

    /// Wakeup loop. Fires `ready` on entry; one wakeup handles one pending
    /// stream. Ends when the token channel closes or shutdown fires.
    pub async fn run(
        mut self,
        mut tokens: mpsc::Receiver<StreamId>,
        mut shutdown: watch::Receiver<bool>,
        ready: oneshot::Sender<()>,
    ) {
        info!("compressor started");
        let _ = ready.send(());
        loop {
            tokio::select! {
                maybe_token = tokens.recv() => match maybe_token {
                    Some(_) => self.drain_one().await,
                    None => {
                        info!("wakeup channel closed, compressor stopping");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shutdown requested, compressor stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Handle one wakeup: claim the first stream with pending compression
    /// state, package it, then settle. A wakeup with no pending stream is
    /// stale and ignored.
    pub async fn drain_one(&mut self) {
        let coord = Arc::clone(&self.coord);

        let claimed = {
            let mut states = coord.generations.lock().await;
            let found = states.iter_mut().enumerate().find_map(|(idx, state)| {
                if state.pending_compression {
                    state.pending_compression = false;
                    Some((idx, state.terminal_path.take()))
                } else {
                    None
                }
            });
            // Raise the flag before the claim lock is released: a sealed
            // event must never observe a free generation lock with the flag
            // still down, or its shift would rename the captured terminal
            // out from under the packaging below.
            if matches!(found, Some((_, Some(_)))) {
                self.coord.set_zip_active(true);
            }
            found
        };

        let (stream, terminal) = match claimed {
            Some((stream, Some(terminal))) => (stream, terminal),
            Some((stream, None)) => {
                warn!(stream = %self.registry.base(stream), "pending stream without terminal path");
                return;
            }
            None => {
                debug!("stale wakeup, no stream pending");
                return;
            }
        };

        {
            let _guard = coord.generations.lock().await;
            match self.package_stream(stream, &terminal).await {
                Ok(archive) => {
                    info!(
                        stream = %self.registry.base(stream),
                        archive = %archive.display(),
                        "archive produced"
                    );
                }
                Err(e) => {
                    error!(
                        stream = %self.registry.base(stream),
                        terminal = %terminal.display(),
                        error = %e,
                        "archival failed"
                    );
                }
            }
        }
        self.settle().await;
        self.coord.set_zip_active(false);
    }

    /// Package generations 1..N of one stream. Caller holds the generation
    /// lock.
    async fn package_stream(
        &mut self,
        stream: StreamId,
        terminal: &Path,
    ) -> Result<PathBuf, ArchiveError> {
        let plan = ArchivePlan::from_terminal(terminal)?;
        let members = plan.collect_members();
        if members.is_empty() {
            return Err(ArchiveError::NoMembers(plan.stem.clone()));
        }

        if self.archive.delete_previous {
            if let Some(prev) = self.last_archive[stream].as_ref() {
                if prev.exists() {
                    match fs::remove_file(prev) {
                        Ok(()) => info!(path = %prev.display(), "removed superseded archive"),
                        Err(e) => {
                            warn!(path = %prev.display(), error = %e, "failed to remove superseded archive")
                        }
                    }
                }
            }
        }

        run_archiver(&self.archive.program, &plan, &members).await?;

        self.last_archive[stream] = Some(plan.archive_path.clone());

        if self.archive.remove_originals {
            for member in &members {
                let path = plan.dir.join(member);
                match fs::remove_file(&path) {
                    Ok(()) => debug!(path = %path.display(), "removed packaged generation"),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to remove packaged generation")
                    }
                }
            }
        }

        Ok(plan.archive_path)
    }

    /// Move any head slot that filled during the compression into the now
    /// empty G1, for every stream, with watcher dispatch fenced off.
    pub async fn settle(&self) {
        let coord = Arc::clone(&self.coord);
        let _gate = coord.watcher_gate.lock().await;
        let _guard = coord.generations.lock().await;

        for base in self.registry.iter() {
            let ring = GenerationRing::new(&self.watch_dir, base, self.depth);
            match ring.settle_head() {
                Ok(true) => debug!(stream = %base, "settled fresh head forward"),
                Ok(false) => {}
                Err(e) => warn!(stream = %base, error = %e, "settle shift failed"),
            }
        }
    }

    /// Most recent archive produced for a stream, if any.
    pub fn last_archive(&self, stream: StreamId) -> Option<&PathBuf> {
        self.last_archive[stream].as_ref()
    }
}
