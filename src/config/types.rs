use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory watched for sealed segments. Must exist and be writable.
    #[serde(default = "default_watch_dir")]
    pub watch_dir: PathBuf,

    /// Ordered registry of stream base names. A segment name is matched
    /// against these in order; the first containing match wins.
    #[serde(default = "default_streams")]
    pub streams: Vec<String>,

    /// Ring depth N: generations run from `<base>.log.0` to `<base>.log.N`.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub events: EventConfig,
}

fn default_watch_dir() -> PathBuf {
    PathBuf::from("var/log/")
}

fn default_streams() -> Vec<String> {
    ["ipstrc", "pdtrc", "ipmgr", "inttrc"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_generations() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_dir: default_watch_dir(),
            streams: default_streams(),
            max_generations: default_max_generations(),
            archive: ArchiveConfig::default(),
            events: EventConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Delete a stream's previous archive when a new one is produced.
    #[serde(default = "default_true")]
    pub delete_previous: bool,

    /// Remove packaged generation files after a successful archive.
    #[serde(default = "default_true")]
    pub remove_originals: bool,

    /// External archiver program. Invoked as
    /// `<program> -czf <archive> -C <watch_dir> <member names...>`.
    #[serde(default = "default_archiver_program")]
    pub program: String,
}

fn default_true() -> bool {
    true
}

fn default_archiver_program() -> String {
    "tar".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            delete_previous: true,
            remove_originals: true,
            program: default_archiver_program(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Capacity of the watcher-to-rotator event channel.
    #[serde(default = "default_buffer_limit")]
    pub buffer_limit: usize,
}

fn default_buffer_limit() -> usize {
    1024
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            buffer_limit: default_buffer_limit(),
        }
    }
}
