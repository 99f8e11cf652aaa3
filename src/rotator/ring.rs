use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One stream's bounded ring of numbered generations.
///
/// Generations live at `<stem>.log.<k>` for `k` in `0..=depth`. The ring
/// holds a contiguous prefix of generations; the rotator's shift moves every
/// present slot one position up, dropping the oldest when the ring is full.
#[derive(Debug, Clone)]
pub struct GenerationRing {
    stem: PathBuf,
    depth: usize,
}

impl GenerationRing {
    pub fn new(watch_dir: &Path, base: &str, depth: usize) -> Self {
        Self {
            stem: watch_dir.join(base),
            depth,
        }
    }

    pub fn generation_path(&self, k: usize) -> PathBuf {
        let mut name = self.stem.as_os_str().to_os_string();
        name.push(format!(".log.{}", k));
        PathBuf::from(name)
    }

    /// G0, the slot sealed segments are ingested into.
    pub fn head_path(&self) -> PathBuf {
        self.generation_path(0)
    }

    /// GN, whose creation triggers archival.
    pub fn terminal_path(&self) -> PathBuf {
        self.generation_path(self.depth)
    }

    /// Ingest a sealed segment by renaming it into G0.
    pub fn ingest_rename(&self, segment: &Path) -> io::Result<()> {
        fs::rename(segment, self.head_path())
    }

    /// Ingest a sealed segment by appending its bytes onto the tail of G0,
    /// removing the segment once the full length has transferred.
    ///
    /// The destination is opened for plain write and positioned at the end
    /// rather than opened with O_APPEND: the kernel's file-to-file copy path
    /// rejects append-mode descriptors.
    pub fn append_segment(&self, segment: &Path) -> io::Result<u64> {
        let mut src = File::open(segment)?;
        let expected = src.metadata()?.len();

        let mut dest = OpenOptions::new().write(true).open(self.head_path())?;
        dest.seek(SeekFrom::End(0))?;

        let copied = io::copy(&mut src, &mut dest)?;
        if copied != expected {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short transfer: {} of {} bytes", copied, expected),
            ));
        }

        fs::remove_file(segment)?;
        Ok(copied)
    }

    /// Shift every present generation one slot up: remove GN if present,
    /// then rename Gk to Gk+1 from k = depth-1 down to 0. The backward order
    /// guarantees no slot is overwritten.
    ///
    /// Individual rename failures are logged and skipped; a partially
    /// shifted ring is legal and is repaired by subsequent shifts. Returns
    /// the terminal path when this shift filled slot N.
    ///
    /// Caller must hold the generation lock.
    pub fn shift(&self) -> Option<PathBuf> {
        let terminal = self.terminal_path();
        if terminal.exists() {
            match fs::remove_file(&terminal) {
                Ok(()) => debug!(path = %terminal.display(), "removed oldest generation"),
                Err(e) => {
                    warn!(path = %terminal.display(), error = %e, "failed to remove oldest generation")
                }
            }
        }

        let mut filled_terminal = None;
        for k in (0..self.depth).rev() {
            let from = self.generation_path(k);
            if !from.exists() {
                continue;
            }
            let to = self.generation_path(k + 1);
            match fs::rename(&from, &to) {
                Ok(()) => {
                    if k + 1 == self.depth {
                        filled_terminal = Some(to);
                    }
                }
                Err(e) => {
                    warn!(
                        from = %from.display(),
                        to = %to.display(),
                        error = %e,
                        "generation rename failed"
                    );
                }
            }
        }

        filled_terminal
    }

    /// Move a fresh G0 into the empty G1 slot after a compression. Skipped
    /// when G1 is still occupied (originals kept on disk).
    ///
    /// Caller must hold the generation lock.
    pub fn settle_head(&self) -> io::Result<bool> {
        let head = self.head_path();
        if !head.exists() {
            return Ok(false);
        }
        let next = self.generation_path(1);
        if next.exists() {
            debug!(path = %next.display(), "settle skipped, slot occupied");
            return Ok(false);
        }
        fs::rename(&head, &next)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ring(dir: &TempDir) -> GenerationRing {
        GenerationRing::new(dir.path(), "ipstrc", 5)
    }

    fn touch(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_generation_paths() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        assert_eq!(ring.head_path(), dir.path().join("ipstrc.log.0"));
        assert_eq!(ring.terminal_path(), dir.path().join("ipstrc.log.5"));
    }

    #[test]
    fn test_ingest_rename_moves_segment() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        let seg = dir.path().join("ipstrc.100.bak");
        touch(&seg, "payload");

        ring.ingest_rename(&seg).unwrap();

        assert!(!seg.exists());
        assert_eq!(fs::read_to_string(ring.head_path()).unwrap(), "payload");
    }

    #[test]
    fn test_append_preserves_order_and_removes_source() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        touch(&ring.head_path(), "first;");
        let seg = dir.path().join("ipstrc.101.bak");
        touch(&seg, "second");

        let copied = ring.append_segment(&seg).unwrap();

        assert_eq!(copied, 6);
        assert!(!seg.exists());
        assert_eq!(fs::read_to_string(ring.head_path()).unwrap(), "first;second");
    }

    #[test]
    fn test_shift_moves_contiguous_prefix() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        touch(&ring.generation_path(0), "g0");
        touch(&ring.generation_path(1), "g1");
        touch(&ring.generation_path(2), "g2");

        let terminal = ring.shift();

        assert!(terminal.is_none());
        assert!(!ring.generation_path(0).exists());
        assert_eq!(fs::read_to_string(ring.generation_path(1)).unwrap(), "g0");
        assert_eq!(fs::read_to_string(ring.generation_path(2)).unwrap(), "g1");
        assert_eq!(fs::read_to_string(ring.generation_path(3)).unwrap(), "g2");
    }

    #[test]
    fn test_shift_reports_terminal_fill() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        for k in 0..5 {
            touch(&ring.generation_path(k), &format!("g{}", k));
        }

        let terminal = ring.shift();

        assert_eq!(terminal, Some(ring.terminal_path()));
        assert_eq!(fs::read_to_string(ring.terminal_path()).unwrap(), "g4");
        assert!(!ring.head_path().exists());
    }

    #[test]
    fn test_shift_drops_oldest_when_full() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        for k in 0..=5 {
            touch(&ring.generation_path(k), &format!("g{}", k));
        }

        let terminal = ring.shift();

        assert_eq!(terminal, Some(ring.terminal_path()));
        // Old G5 is gone; old G4 took its place.
        assert_eq!(fs::read_to_string(ring.terminal_path()).unwrap(), "g4");
    }

    #[test]
    fn test_shift_tolerates_holes() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        touch(&ring.generation_path(0), "g0");
        touch(&ring.generation_path(3), "g3");

        let terminal = ring.shift();

        assert!(terminal.is_none());
        assert_eq!(fs::read_to_string(ring.generation_path(1)).unwrap(), "g0");
        assert_eq!(fs::read_to_string(ring.generation_path(4)).unwrap(), "g3");
    }

    #[test]
    fn test_settle_head_moves_into_free_slot() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        touch(&ring.head_path(), "fresh");

        assert!(ring.settle_head().unwrap());
        assert!(!ring.head_path().exists());
        assert_eq!(fs::read_to_string(ring.generation_path(1)).unwrap(), "fresh");
    }

    #[test]
    fn test_settle_head_skips_occupied_slot() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        touch(&ring.head_path(), "fresh");
        touch(&ring.generation_path(1), "kept");

        assert!(!ring.settle_head().unwrap());
        assert!(ring.head_path().exists());
        assert_eq!(fs::read_to_string(ring.generation_path(1)).unwrap(), "kept");
    }

    #[test]
    fn test_settle_head_noop_without_head() {
        let dir = TempDir::new().unwrap();
        let ring = ring(&dir);
        assert!(!ring.settle_head().unwrap());
    }
}
