//! Output directory layout for one run.
use regex::Regex;
use sitewalk_common::file_timestamp;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn unsafe_chars() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").ok()).as_ref()
}

/// `name` with every non-alphanumeric character replaced by `_`.
pub fn sanitize_name(name: &str) -> String {
    match unsafe_chars() {
        Some(re) => re.replace_all(name, "_").into_owned(),
        None => name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect(),
    }
}

/// Files produced by one run, all stamped with the run's start time.
#[derive(Debug, Clone)]
pub struct RunArtifacts {
    dir: PathBuf,
    stamp: String,
}

impl RunArtifacts {
    /// Create `dir` if needed and fix the run timestamp.
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        Self::with_stamp(dir, file_timestamp())
    }

    pub fn with_stamp(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            stamp: stamp.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// `<kind>_<stamp>.csv`
    pub fn table(&self, kind: &str) -> PathBuf {
        self.dir.join(format!("{kind}_{}.csv", self.stamp))
    }

    /// `<name>_<stamp>.html`
    pub fn markup(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.html", sanitize_name(name), self.stamp))
    }

    /// `<name>_<stamp>.png`
    pub fn capture(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.png", sanitize_name(name), self.stamp))
    }
}
