use super::types::Config;
use crate::config::expand_tilde;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    use std::io::Read;

    let mut file = File::open(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut yaml_string = String::new();
    file.read_to_string(&mut yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut config: Config = serde_yaml::from_str(&yaml_string).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        ))
    })?;

    config.watch_dir = expand_tilde(&config.watch_dir);

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.streams.is_empty() {
        errors.push("streams: at least one stream base name is required".to_string());
    }

    for base in &config.streams {
        if base.is_empty() {
            errors.push("streams: base names must be non-empty".to_string());
        }
        if base.contains('.') || base.contains('/') {
            errors.push(format!(
                "streams: base name '{}' must not contain '.' or '/'",
                base
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for base in &config.streams {
        if !seen.insert(base.as_str()) {
            errors.push(format!("streams: duplicate base name '{}'", base));
        }
    }

    if config.max_generations < 1 {
        errors.push("max_generations: must be at least 1".to_string());
    }

    if config.events.buffer_limit < 1 {
        errors.push("events.buffer_limit: must be at least 1".to_string());
    }

    if config.archive.program.trim().is_empty() {
        errors.push("archive.program: must be non-empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = write_config("{}");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.watch_dir, std::path::PathBuf::from("var/log/"));
        assert_eq!(config.streams, vec!["ipstrc", "pdtrc", "ipmgr", "inttrc"]);
        assert_eq!(config.max_generations, 5);
        assert!(config.archive.delete_previous);
        assert!(config.archive.remove_originals);
        assert_eq!(config.archive.program, "tar");
    }

    #[test]
    fn test_explicit_fields_override_defaults() {
        let file = write_config(
            "watch_dir: /tmp/logs\nstreams: [apptrc]\nmax_generations: 3\narchive:\n  delete_previous: false\n",
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.watch_dir, std::path::PathBuf::from("/tmp/logs"));
        assert_eq!(config.streams, vec!["apptrc"]);
        assert_eq!(config.max_generations, 3);
        assert!(!config.archive.delete_previous);
        // Unset sibling keeps its default
        assert!(config.archive.remove_originals);
    }

    #[test]
    fn test_empty_streams_rejected() {
        let file = write_config("streams: []\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("at least one stream"));
    }

    #[test]
    fn test_dotted_base_name_rejected() {
        let file = write_config("streams: [\"app.trc\"]\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("must not contain"));
    }

    #[test]
    fn test_duplicate_base_name_rejected() {
        let file = write_config("streams: [ipstrc, ipstrc]\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_zero_ring_depth_rejected() {
        let file = write_config("max_generations: 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }
}
