use chrono::Local;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("terminal generation '{0}' has no parseable numeric suffix")]
    MalformedTerminal(String),

    #[error("no generation files to package for '{0}'")]
    NoMembers(String),

    #[error("io error during archival: {0}")]
    Io(#[from] std::io::Error),

    #[error("archiver exited with {0}")]
    ArchiverFailed(std::process::ExitStatus),
}

/// A packaging plan derived from a captured terminal generation path.
///
/// `<dir>/<base>.log.<N>` yields stem `<base>.log`, member candidates
/// `<base>.log.1` .. `<base>.log.N`, and the archive target
/// `<dir>/<base>.log_<YYYY-MM-DD_HH-MM-SS>.tar.gz`.
#[derive(Debug, Clone)]
pub struct ArchivePlan {
    pub dir: PathBuf,
    pub stem: String,
    pub max_index: usize,
    pub archive_path: PathBuf,
}

impl ArchivePlan {
    pub fn from_terminal(terminal: &Path) -> Result<Self, ArchiveError> {
        let name = terminal
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArchiveError::MalformedTerminal(terminal.display().to_string()))?;

        let (stem, suffix) = name
            .rsplit_once('.')
            .ok_or_else(|| ArchiveError::MalformedTerminal(name.to_string()))?;

        let max_index: usize = suffix
            .parse()
            .map_err(|_| ArchiveError::MalformedTerminal(name.to_string()))?;

        let dir = terminal.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        let archive_path = dir.join(archive_file_name(stem, &archive_timestamp()));

        Ok(Self {
            dir,
            stem: stem.to_string(),
            max_index,
            archive_path,
        })
    }

    /// Member filenames (not paths) for generations 1..=N that exist on
    /// disk. Missing generations are skipped.
    pub fn collect_members(&self) -> Vec<String> {
        (1..=self.max_index)
            .map(|k| format!("{}.{}", self.stem, k))
            .filter(|name| self.dir.join(name).exists())
            .collect()
    }
}

pub fn archive_timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

fn archive_file_name(stem: &str, timestamp: &str) -> String {
    format!("{}_{}.tar.gz", stem, timestamp)
}

/// Invoke the external archiver. Member names are passed relative to the
/// watch directory via the archiver's change-directory argument, so archive
/// entries carry filenames only.
pub async fn run_archiver(
    program: &str,
    plan: &ArchivePlan,
    members: &[String],
) -> Result<(), ArchiveError> {
    let status = Command::new(program)
        .arg("-czf")
        .arg(&plan.archive_path)
        .arg("-C")
        .arg(&plan.dir)
        .args(members)
        .status()
        .await?;

    if !status.success() {
        return Err(ArchiveError::ArchiverFailed(status));
    }
    Ok(())
}
