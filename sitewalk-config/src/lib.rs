//! Loader for run configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: built-in defaults, the YAML file(s) or inline
//! snippets in the order they were added, then `SITEWALK__SECTION__KEY`
//! environment variables. String values may reference `${VAR}` placeholders,
//! which are expanded after merging.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitewalkConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub settle: SettleConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub visits: VisitsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Visit every target and extract structured items.
    #[default]
    Scrape,
    /// Exercise every clickable element reachable from the base location.
    Explore,
    /// Walk named site sections from the base location.
    Sections,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_base_location")]
    pub base_location: String,
    /// Locations visited by `scrape`; defaults to the base location alone.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Section names walked by `sections`.
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            base_location: default_base_location(),
            targets: Vec::new(),
            sections: default_sections(),
        }
    }
}

impl RunConfig {
    /// Targets to visit, falling back to the base location.
    pub fn effective_targets(&self) -> Vec<String> {
        if self.targets.is_empty() {
            vec![self.base_location.clone()]
        } else {
            self.targets.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StealthLevel {
    Lightweight,
    #[default]
    Balanced,
    Maximum,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    /// Upper bound for the initial document-ready wait.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    #[serde(default)]
    pub stealth: StealthLevel,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: false,
            window_width: default_window_width(),
            window_height: default_window_height(),
            ready_timeout_secs: default_ready_timeout_secs(),
            stealth: StealthLevel::default(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_links")]
    pub max_links: usize,
    #[serde(default = "default_max_elements_per_page")]
    pub max_elements_per_page: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_max_scroll_cycles")]
    pub max_scroll_cycles: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_links: default_max_links(),
            max_elements_per_page: default_max_elements_per_page(),
            max_pages: default_max_pages(),
            max_scroll_cycles: default_max_scroll_cycles(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SettleStrategy {
    /// Sleep for the configured delay.
    #[default]
    Fixed,
    /// Poll the DOM size until two samples agree, bounded by the delay.
    Stable,
}

/// Settle delays in milliseconds, one per kind of page-changing action.
#[derive(Debug, Clone, Deserialize)]
pub struct SettleConfig {
    #[serde(default)]
    pub strategy: SettleStrategy,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,
    #[serde(default = "default_click_ms")]
    pub click_ms: u64,
    #[serde(default = "default_click_navigate_ms")]
    pub click_navigate_ms: u64,
    #[serde(default = "default_hover_ms")]
    pub hover_ms: u64,
    #[serde(default = "default_overlay_ms")]
    pub overlay_ms: u64,
    #[serde(default = "default_pagination_ms")]
    pub pagination_ms: u64,
    #[serde(default = "default_scroll_ms")]
    pub scroll_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            strategy: SettleStrategy::default(),
            poll_interval_ms: default_poll_interval_ms(),
            navigation_ms: default_navigation_ms(),
            click_ms: default_click_ms(),
            click_navigate_ms: default_click_navigate_ms(),
            hover_ms: default_hover_ms(),
            overlay_ms: default_overlay_ms(),
            pagination_ms: default_pagination_ms(),
            scroll_ms: default_scroll_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SafetyConfig {
    /// Tokens that make an element unsafe to click when found in its text or
    /// class attribute. Matched case-insensitively.
    #[serde(default = "default_deny_tokens")]
    pub deny_tokens: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            deny_tokens: default_deny_tokens(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Locations are compared byte for byte.
    #[default]
    Exact,
    /// Fragments and a trailing path slash are ignored.
    Lenient,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitsConfig {
    #[serde(default)]
    pub normalization: Normalization,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Save page markup and a screenshot at the end of the run.
    #[serde(default = "default_true")]
    pub snapshots: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            snapshots: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub stderr: bool,
    #[serde(default)]
    pub json: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: true,
            json: false,
            filter: default_filter(),
        }
    }
}

fn default_base_location() -> String {
    "https://www.greenchef.com/".into()
}
fn default_sections() -> Vec<String> {
    [
        "Our Plans",
        "How it works",
        "Our values",
        "Gift cards",
        "Nutrition guide",
        "Weekly Menu",
        "Recipes",
        "Keto",
        "Plant-based",
        "Mediterranean",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    900
}
fn default_ready_timeout_secs() -> u64 {
    30
}
fn default_max_links() -> usize {
    20
}
fn default_max_elements_per_page() -> usize {
    10
}
fn default_max_pages() -> usize {
    5
}
fn default_max_scroll_cycles() -> usize {
    10
}
fn default_poll_interval_ms() -> u64 {
    250
}
fn default_navigation_ms() -> u64 {
    2000
}
fn default_click_ms() -> u64 {
    2000
}
fn default_click_navigate_ms() -> u64 {
    3000
}
fn default_hover_ms() -> u64 {
    500
}
fn default_overlay_ms() -> u64 {
    1000
}
fn default_pagination_ms() -> u64 {
    3000
}
fn default_scroll_ms() -> u64 {
    1500
}
fn default_deny_tokens() -> Vec<String> {
    vec!["delete".into(), "remove".into(), "cancel".into()]
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_filter() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct SitewalkConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SitewalkConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SitewalkConfigLoader {
    /// Start with an empty source list; `SITEWALK__` env overrides are applied
    /// on top of whatever files are added.
    ///
    /// ```
    /// use sitewalk_config::{RunMode, SitewalkConfigLoader};
    ///
    /// let config = SitewalkConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nrun:\n  mode: explore")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.run.mode, RunMode::Explore);
    /// assert_eq!(config.limits.max_pages, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a required YAML/TOML/JSON file; the format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so a run can rely on env and defaults.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge the sources, apply env overrides, expand `${VAR}` placeholders and
    /// deserialize into [`SitewalkConfig`].
    ///
    /// ```
    /// use sitewalk_config::SitewalkConfigLoader;
    ///
    /// unsafe { std::env::set_var("SHOP_ROOT", "https://shop.example"); }
    ///
    /// let config = SitewalkConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// run:
    ///   base_location: "${SHOP_ROOT}/"
    ///   targets:
    ///     - "${SHOP_ROOT}/menus"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.run.base_location, "https://shop.example/");
    /// assert_eq!(config.run.targets, vec!["https://shop.example/menus"]);
    ///
    /// unsafe { std::env::remove_var("SHOP_ROOT"); }
    /// ```
    pub fn load(self) -> Result<SitewalkConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("SITEWALK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SitewalkConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
