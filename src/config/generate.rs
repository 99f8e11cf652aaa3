pub fn generate_starter_config() -> String {
    r#"# =============================================================================
# BAKROT CONFIGURATION
# =============================================================================
# bakrot watches a single directory for sealed log segments named
# <base>.<token>.bak, rotates them through a bounded ring of numbered
# generations (<base>.log.0 .. <base>.log.N), and packages full rings into
# timestamped tar.gz archives.
#
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/bakrot/config.yml
#   3. /etc/bakrot/config.yml
#
# Every key is optional; omitted keys take the defaults shown here.

# Directory watched for sealed segments. Must exist and be writable.
watch_dir: var/log/

# Ordered registry of stream base names. Segment names are matched against
# these in order; the first containing match wins.
streams:
  - ipstrc
  - pdtrc
  - ipmgr
  - inttrc

# Ring depth N. Generations run from <base>.log.0 to <base>.log.N; filling
# slot N triggers archival of generations 1..N.
max_generations: 5

archive:
  # Delete a stream's previous archive when a new one is produced.
  delete_previous: true
  # Remove packaged generation files after a successful archive.
  remove_originals: true
  # External archiver program, invoked as:
  #   <program> -czf <archive> -C <watch_dir> <member names...>
  program: tar

events:
  # Capacity of the watcher-to-rotator event channel.
  buffer_limit: 1024
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;

    #[test]
    fn test_starter_config_parses_to_defaults() {
        let yaml = generate_starter_config();
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        let defaults = Config::default();

        assert_eq!(config.watch_dir, defaults.watch_dir);
        assert_eq!(config.streams, defaults.streams);
        assert_eq!(config.max_generations, defaults.max_generations);
        assert_eq!(config.archive.delete_previous, defaults.archive.delete_previous);
        assert_eq!(config.archive.remove_originals, defaults.archive.remove_originals);
        assert_eq!(config.archive.program, defaults.archive.program);
        assert_eq!(config.events.buffer_limit, defaults.events.buffer_limit);
    }
}
