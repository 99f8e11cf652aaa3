use super::registry::{StreamId, StreamRegistry};

/// Token that marks a zero-byte settle marker (`<base>.dummy.bak`). Markers
/// trigger a shift without ingesting any bytes and are deleted afterwards.
pub const DUMMY_TOKEN: &str = "dummy";

/// Outcome of classifying a basename observed in the watch directory.
///
/// Classification is purely lexical; it never touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Name does not contain `.bak`.
    NotSealed,
    /// Name contains `.bak.` — an artifact of an external rotation tool
    /// (e.g. `pdtrc.bak.1`, `pdtrc.bak.1.gz`).
    Derivative,
    /// Exactly `<base>.bak`: the reserved self-staged name, never ingested.
    SelfStaged { stream: StreamId },
    /// `<base>.dummy.bak` settle marker.
    Marker { stream: StreamId },
    /// A sealed segment for a registered stream, ready for rotation.
    Sealed { stream: StreamId },
    /// A `.bak` name matching no registered base.
    Unregistered,
}

pub fn classify(registry: &StreamRegistry, name: &str) -> Classification {
    if !name.contains(".bak") {
        return Classification::NotSealed;
    }

    if name.contains(".bak.") {
        return Classification::Derivative;
    }

    let stream = match registry.match_name(name) {
        Some(id) => id,
        None => return Classification::Unregistered,
    };

    let base = registry.base(stream);
    if name == format!("{}.bak", base) {
        return Classification::SelfStaged { stream };
    }
    if name == format!("{}.{}.bak", base, DUMMY_TOKEN) {
        return Classification::Marker { stream };
    }

    Classification::Sealed { stream }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StreamRegistry {
        StreamRegistry::new(vec![
            "ipstrc".to_string(),
            "pdtrc".to_string(),
            "ipmgr".to_string(),
            "inttrc".to_string(),
        ])
    }

    #[test]
    fn test_sealed_segment_dispatched() {
        let reg = registry();
        assert_eq!(
            classify(&reg, "ipstrc.1234567890.bak"),
            Classification::Sealed { stream: 0 }
        );
        assert_eq!(
            classify(&reg, "inttrc.99.bak"),
            Classification::Sealed { stream: 3 }
        );
    }

    #[test]
    fn test_non_bak_ignored() {
        let reg = registry();
        assert_eq!(classify(&reg, "ipstrc.log"), Classification::NotSealed);
        assert_eq!(classify(&reg, "ipstrc.log.3"), Classification::NotSealed);
        assert_eq!(classify(&reg, "random.txt"), Classification::NotSealed);
    }

    #[test]
    fn test_derivative_ignored() {
        let reg = registry();
        assert_eq!(classify(&reg, "pdtrc.bak.1"), Classification::Derivative);
        assert_eq!(classify(&reg, "pdtrc.bak.1.gz"), Classification::Derivative);
        // Derivative check precedes registry matching
        assert_eq!(classify(&reg, "unknown.bak.7"), Classification::Derivative);
    }

    #[test]
    fn test_self_staged_ignored() {
        let reg = registry();
        assert_eq!(
            classify(&reg, "ipstrc.bak"),
            Classification::SelfStaged { stream: 0 }
        );
        assert_eq!(
            classify(&reg, "ipmgr.bak"),
            Classification::SelfStaged { stream: 2 }
        );
    }

    #[test]
    fn test_marker_recognized() {
        let reg = registry();
        assert_eq!(
            classify(&reg, "pdtrc.dummy.bak"),
            Classification::Marker { stream: 1 }
        );
    }

    #[test]
    fn test_unregistered_base() {
        let reg = registry();
        assert_eq!(classify(&reg, "other.123.bak"), Classification::Unregistered);
    }

    #[test]
    fn test_first_match_in_registry_order() {
        let reg = StreamRegistry::new(vec!["trc".to_string(), "ipstrc".to_string()]);
        assert_eq!(
            classify(&reg, "ipstrc.1.bak"),
            Classification::Sealed { stream: 0 }
        );
    }

    #[test]
    fn test_token_need_not_be_numeric() {
        let reg = registry();
        // Any non-empty dot-free token seals a segment.
        assert_eq!(
            classify(&reg, "ipstrc.final.bak"),
            Classification::Sealed { stream: 0 }
        );
    }
}
