use sitewalk_config::Normalization;
use std::collections::HashSet;
use url::Url;

/// Locations visited during one run. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct VisitTracker {
    policy: Normalization,
    visited: HashSet<String>,
}

impl VisitTracker {
    pub fn new(policy: Normalization) -> Self {
        Self {
            policy,
            visited: HashSet::new(),
        }
    }

    pub fn seen(&self, location: &str) -> bool {
        self.visited.contains(&self.key(location))
    }

    /// Record `location`; returns `false` if it was already present.
    pub fn mark(&mut self, location: &str) -> bool {
        let key = self.key(location);
        self.visited.insert(key)
    }

    pub fn len(&self) -> usize {
        self.visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }

    fn key(&self, location: &str) -> String {
        match self.policy {
            Normalization::Exact => location.to_string(),
            Normalization::Lenient => lenient_key(location),
        }
    }
}

/// Drops the fragment and a trailing slash on a non-root path.
fn lenient_key(location: &str) -> String {
    let Ok(mut url) = Url::parse(location) else {
        return location.trim_end_matches('/').to_string();
    };
    url.set_fragment(None);
    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }
    url.to_string()
}
