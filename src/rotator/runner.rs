use crate::coord::Coordinator;
use crate::rotator::ring::GenerationRing;
use crate::stream::{classify, Classification, StreamId, StreamRegistry};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

/// The rotator worker: consumes classified directory events, ingests sealed
/// segments into G0, and shifts generations forward under the generation
/// lock, signaling the compressor whenever a shift fills the terminal slot.
pub struct Rotator {
    watch_dir: PathBuf,
    depth: usize,
    registry: Arc<StreamRegistry>,
    coord: Arc<Coordinator>,
    compress_tx: mpsc::Sender<StreamId>,
}

impl Rotator {
    pub fn new(
        watch_dir: PathBuf,
        depth: usize,
        registry: Arc<StreamRegistry>,
        coord: Arc<Coordinator>,
        compress_tx: mpsc::Sender<StreamId>,
    ) -> Self {
        Self {
            watch_dir,
            depth,
            registry,
            coord,
            compress_tx,
        }
    }

    /// Event loop. Fires `ready` on entry; ends when the watcher channel
    /// closes or shutdown fires.
    pub async fn run(
        self,
        mut events: mpsc::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
        ready: oneshot::Sender<()>,
    ) {
        info!("rotator started");
        let _ = ready.send(());
        loop {
            tokio::select! {
                maybe_name = events.recv() => match maybe_name {
                    Some(name) => self.dispatch(&name).await,
                    None => {
                        info!("event channel closed, rotator stopping");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("shutdown requested, rotator stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Classify and handle one directory event under the watcher gate.
    pub async fn dispatch(&self, name: &str) {
        let _gate = self.coord.watcher_gate.lock().await;

        match classify(&self.registry, name) {
            Classification::Sealed { stream } => self.handle_sealed(stream, name).await,
            Classification::Marker { stream } => self.handle_marker(stream, name).await,
            Classification::SelfStaged { .. } => {
                debug!(name = %name, "ignoring self-staged name");
            }
            Classification::Derivative => {
                debug!(name = %name, "ignoring derivative artifact");
            }
            Classification::NotSealed | Classification::Unregistered => {}
        }
    }

    /// Ingest one sealed segment. While a compression runs only G0 may
    /// change (append or stage, no shift); otherwise the existing ring is
    /// shifted forward and the segment lands in the freed G0 slot.
    async fn handle_sealed(&self, stream: StreamId, name: &str) {
        let seg_path = self.watch_dir.join(name);
        if !seg_path.exists() {
            warn!(path = %seg_path.display(), "sealed segment vanished before ingest, skipping");
            return;
        }

        let ring = self.ring(stream);

        if self.coord.zip_active() {
            // Compression owns generations 1..N; only G0 may change. The
            // shift is deferred to the compressor's settle pass.
            if ring.head_path().exists() {
                match ring.append_segment(&seg_path) {
                    Ok(bytes) => {
                        info!(path = %seg_path.display(), bytes, "appended segment during compression")
                    }
                    Err(e) => {
                        error!(path = %seg_path.display(), error = %e, "append during compression failed")
                    }
                }
            } else {
                match ring.ingest_rename(&seg_path) {
                    Ok(()) => {
                        info!(path = %seg_path.display(), "staged segment as head during compression")
                    }
                    Err(e) => {
                        error!(path = %seg_path.display(), error = %e, "segment rename failed")
                    }
                }
            }
            return;
        }

        let newly_pending = {
            let mut states = self.coord.generations.lock().await;

            // Shift first so the previous head survives as G1; a no-op on an
            // empty ring. The segment then takes the freed G0 slot.
            let filled = ring.shift();

            match ring.ingest_rename(&seg_path) {
                Ok(()) => {
                    debug!(path = %seg_path.display(), head = %ring.head_path().display(), "ingested segment")
                }
                Err(e) => {
                    // The ring stays in its shifted (legal) state; the next
                    // event re-establishes G0.
                    error!(path = %seg_path.display(), error = %e, "segment rename failed")
                }
            }

            match filled {
                Some(terminal) => {
                    let state = &mut states[stream];
                    let newly = !state.pending_compression;
                    state.terminal_path = Some(terminal);
                    state.pending_compression = true;
                    newly
                }
                None => false,
            }
        };

        if newly_pending {
            self.signal_compressor(stream);
        }
    }

    /// Dummy path: no ingest. Shift if G0 exists, then delete the marker.
    async fn handle_marker(&self, stream: StreamId, name: &str) {
        let ring = self.ring(stream);

        let newly_pending = {
            let mut states = self.coord.generations.lock().await;
            if ring.head_path().exists() {
                match ring.shift() {
                    Some(terminal) => {
                        let state = &mut states[stream];
                        let newly = !state.pending_compression;
                        state.terminal_path = Some(terminal);
                        state.pending_compression = true;
                        newly
                    }
                    None => false,
                }
            } else {
                false
            }
        };

        if newly_pending {
            self.signal_compressor(stream);
        }

        let marker = self.watch_dir.join(name);
        match fs::remove_file(&marker) {
            Ok(()) => debug!(path = %marker.display(), "removed settle marker"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %marker.display(), error = %e, "failed to remove settle marker"),
        }
    }

    fn signal_compressor(&self, stream: StreamId) {
        debug!(stream = %self.registry.base(stream), "terminal generation filled");
        // The token is a wakeup only; pending_compression under the
        // generation lock is authoritative, so a full channel is safe.
        if self.compress_tx.try_send(stream).is_err() {
            warn!(stream = %self.registry.base(stream), "compressor wakeup channel full, token dropped");
        }
    }

    fn ring(&self, stream: StreamId) -> GenerationRing {
        GenerationRing::new(&self.watch_dir, self.registry.base(stream), self.depth)
    }
}
