use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// Per-stream compression bookkeeping. Mutated only while the generation
/// lock is held.
#[derive(Debug, Default)]
pub struct StreamState {
    /// A terminal generation of this stream is awaiting packaging.
    pub pending_compression: bool,
    /// Path of the terminal slot captured when compression was requested.
    pub terminal_path: Option<PathBuf>,
}

/// Shared state coupling the rotator and compressor workers.
pub struct Coordinator {
    /// Set while a compression is in progress. Read by the rotator to choose
    /// append-vs-rotate; relaxed ordering is sufficient because the
    /// generation lock orders all ring mutations.
    zip_active: AtomicBool,

    /// The generation lock. Guards the per-stream states below and the
    /// on-disk generation namespace: every rename, remove, create, or
    /// open-for-append of a generation file happens under this lock, except
    /// the rotator's G0-only paths taken while `zip_active` is set (the
    /// compressor never touches G0 outside the watcher gate).
    pub generations: Mutex<Vec<StreamState>>,

    /// Taken by the rotator around every event dispatch; the compressor
    /// holds it while settling fresh G0 slots after packaging.
    pub watcher_gate: Mutex<()>,
}

impl Coordinator {
    pub fn new(num_streams: usize) -> Self {
        let states = (0..num_streams).map(|_| StreamState::default()).collect();
        Self {
            zip_active: AtomicBool::new(false),
            generations: Mutex::new(states),
            watcher_gate: Mutex::new(()),
        }
    }

    pub fn zip_active(&self) -> bool {
        self.zip_active.load(Ordering::Relaxed)
    }

    pub fn set_zip_active(&self, active: bool) {
        self.zip_active.store(active, Ordering::Relaxed);
    }
}
