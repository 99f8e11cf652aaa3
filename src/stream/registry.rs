/// Index of a stream in the registry. Stable for the life of the process.
pub type StreamId = usize;

/// Fixed ordered table of stream base names.
///
/// Matching is by substring containment in registry order: a name that
/// contains more than one base is attributed to the first match.
#[derive(Debug, Clone)]
pub struct StreamRegistry {
    bases: Vec<String>,
}

impl StreamRegistry {
    pub fn new(bases: Vec<String>) -> Self {
        Self { bases }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn base(&self, id: StreamId) -> &str {
        &self.bases[id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.bases.iter().map(|s| s.as_str())
    }

    /// First registered base contained in `name`, if any.
    pub fn match_name(&self, name: &str) -> Option<StreamId> {
        self.bases.iter().position(|base| name.contains(base.as_str()))
    }
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
    fn test_match_by_containment() {
        let reg = registry();
        assert_eq!(reg.match_name("ipstrc.1234.bak"), Some(0));
        assert_eq!(reg.match_name("pdtrc.1234.bak"), Some(1));
        assert_eq!(reg.match_name("unrelated.bak"), None);
    }

    #[test]
    fn test_first_match_wins() {
        let reg = StreamRegistry::new(vec!["trc".to_string(), "ipstrc".to_string()]);
        // "ipstrc..." contains both bases; registry order decides.
        assert_eq!(reg.match_name("ipstrc.1.bak"), Some(0));
    }
}
