pub mod archiver;
pub mod runner;

pub use archiver::{ArchiveError, ArchivePlan};
pub use runner::Compressor;
