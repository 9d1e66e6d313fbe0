//! Sequences visits, discovery, interaction and extraction over one session.
//!
//! [`Explorer`] owns every piece of run state: the session, the visited set,
//! the attempt counter and the output recorders. Nothing is global, so two
//! explorers over two sessions never interfere.
//!
//! Error handling follows one rule: only the caller decides whether a run can
//! start. Once running, stale handles and failed interactions become failed
//! outcomes, sink failures are logged, and a location that cannot be opened is
//! skipped in favour of the next one.
use crate::artifacts::RunArtifacts;
use crate::cascade::{SelectorCascade, catalog};
use crate::executor::{InteractionExecutor, scripted_click};
use crate::item::{ExtractedItem, ItemExtractor};
use crate::locator::{ElementLocator, identity_key};
use crate::outcome::InteractionOutcome;
use crate::pagination::PaginationWalker;
use crate::recorder::{ExtractionRecorder, OutputSink};
use crate::safety::SafetyClassifier;
use crate::session::{BrowserSession, SessionResult};
use crate::settle::{SettlePoint, Settler};
use crate::visits::VisitTracker;
use serde::Serialize;
use sitewalk_common::RunId;
use sitewalk_config::{LimitsConfig, RunMode, SitewalkConfig};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

mod explore;
mod scrape;
mod sections;

/// Where the explorer is in its per-location cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    VisitingLocation,
    DiscoveringElements,
    Interacting,
    Extracting,
    Paginating,
}

/// Run parameters taken from the configuration.
#[derive(Debug, Clone)]
pub struct ExplorerSettings {
    pub mode: RunMode,
    pub base_location: String,
    pub targets: Vec<String>,
    pub sections: Vec<String>,
    pub limits: LimitsConfig,
    pub ready_timeout: Duration,
    pub snapshots: bool,
}

impl ExplorerSettings {
    pub fn from_config(config: &SitewalkConfig) -> Self {
        Self {
            mode: config.run.mode,
            base_location: config.run.base_location.clone(),
            targets: config.run.effective_targets(),
            sections: config.run.sections.clone(),
            limits: config.limits.clone(),
            ready_timeout: Duration::from_secs(config.browser.ready_timeout_secs),
            snapshots: config.output.snapshots,
        }
    }
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub visited: usize,
    pub outcomes: u64,
    pub failed: u64,
    pub items_kept: u64,
    pub items_dropped: u64,
    pub pages: usize,
    pub artifacts: usize,
    pub sink_failures: u64,
    pub location_failures: usize,
}

/// How discovered candidates are told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keying {
    /// `id:`, `class:`, `text:` or `tag:` identity.
    Identity,
    /// Resolved same-site `href`; candidates without one are dropped.
    Href,
}

/// A live element found during discovery.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<E> {
    pub element: E,
    pub key: String,
    /// Resolved target for link-like candidates.
    pub target: Option<String>,
}

/// Drives one browser session through a run.
pub struct Explorer<S: BrowserSession> {
    session: S,
    settings: ExplorerSettings,
    locator: ElementLocator,
    safety: SafetyClassifier,
    executor: InteractionExecutor,
    settler: Settler,
    visits: VisitTracker,
    extractor: ItemExtractor,
    pagination: PaginationWalker,
    seen_items: HashSet<String>,
    interactions: Option<ExtractionRecorder<InteractionOutcome>>,
    items: Option<ExtractionRecorder<ExtractedItem>>,
    artifacts: Option<RunArtifacts>,
    phase: Phase,
    summary: RunSummary,
    run_id: RunId,
}

impl<S: BrowserSession> Explorer<S> {
    pub fn new(session: S, config: &SitewalkConfig) -> Self {
        let settings = ExplorerSettings::from_config(config);
        let settler = Settler::from_config(&config.settle);
        Self {
            session,
            locator: ElementLocator::new(),
            safety: SafetyClassifier::new(&config.safety.deny_tokens),
            executor: InteractionExecutor::new(settler.clone()),
            pagination: PaginationWalker::new(settings.limits.max_pages, settler.clone()),
            settler,
            visits: VisitTracker::new(config.visits.normalization),
            extractor: ItemExtractor::new(),
            seen_items: HashSet::new(),
            interactions: None,
            items: None,
            artifacts: None,
            phase: Phase::Idle,
            summary: RunSummary::default(),
            run_id: RunId::new(),
            settings,
        }
    }

    /// Replace the settle behaviour of every component.
    pub fn with_settler(mut self, settler: Settler) -> Self {
        self.executor = InteractionExecutor::new(settler.clone());
        self.pagination = PaginationWalker::new(self.settings.limits.max_pages, settler.clone());
        self.settler = settler;
        self
    }

    pub fn with_interaction_sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.interactions = Some(ExtractionRecorder::new(sink));
        self
    }

    pub fn with_item_sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.items = Some(ExtractionRecorder::new(sink));
        self
    }

    pub fn with_artifacts(mut self, artifacts: RunArtifacts) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn settings(&self) -> &ExplorerSettings {
        &self.settings
    }

    pub fn visits(&self) -> &VisitTracker {
        &self.visits
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Run the configured mode to completion.
    pub async fn run(&mut self) -> RunSummary {
        let mode = self.settings.mode;
        info!(target: "sitewalk.visit", run_id = %self.run_id, ?mode, "run.start");
        match mode {
            RunMode::Scrape => self.run_scrape().await,
            RunMode::Explore => self.run_explore().await,
            RunMode::Sections => self.run_sections().await,
        }
        self.enter(Phase::Idle);
        let summary = self.summary.clone();
        info!(
            target: "sitewalk.visit",
            run_id = %self.run_id,
            visited = summary.visited,
            outcomes = summary.outcomes,
            failed = summary.failed,
            items = summary.items_kept,
            pages = summary.pages,
            artifacts = summary.artifacts,
            sink_failures = summary.sink_failures,
            "run.finished"
        );
        summary
    }

    /// Hand back the session, e.g. to close it.
    pub fn into_session(self) -> S {
        self.session
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!(target: "sitewalk.visit", from = ?self.phase, to = ?phase, "phase");
            self.phase = phase;
        }
    }

    /// Open `location` unless it was already visited.
    ///
    /// Returns `Ok(false)` for a skipped location. Navigation and ready-wait
    /// failures are returned; overlay dismissal is best-effort.
    pub async fn visit(&mut self, location: &str) -> SessionResult<bool> {
        if self.visits.seen(location) {
            debug!(target: "sitewalk.visit", location, "visit.skip_seen");
            return Ok(false);
        }
        self.enter(Phase::VisitingLocation);
        info!(target: "sitewalk.visit", location, "visit.start");
        self.session.navigate(location).await?;
        self.session.wait_ready(self.settings.ready_timeout).await?;
        self.dismiss_overlays().await;
        self.visits.mark(location);
        self.summary.visited += 1;
        self.settler.settle(&self.session, SettlePoint::Navigation).await;
        Ok(true)
    }

    /// Account for a location a click already brought us to.
    ///
    /// Returns `true` when the location is new.
    pub(crate) fn adopt(&mut self, location: &str) -> bool {
        if !self.visits.mark(location) {
            return false;
        }
        self.summary.visited += 1;
        info!(target: "sitewalk.visit", location, "visit.adopted");
        true
    }

    /// Navigate back to `origin` without the visited-set check.
    pub(crate) async fn return_to(&mut self, origin: &str) -> SessionResult<()> {
        if self.session.current_location().await.ok().as_deref() == Some(origin) {
            return Ok(());
        }
        debug!(target: "sitewalk.visit", origin, "visit.return");
        self.session.navigate(origin).await?;
        self.session.wait_ready(self.settings.ready_timeout).await?;
        self.settler.settle(&self.session, SettlePoint::Navigation).await;
        Ok(())
    }

    async fn dismiss_overlays(&mut self) {
        let cascade = catalog::close_overlay();
        let Some(found) = self.locator.locate(&self.session, &cascade, None).await else {
            return;
        };
        let closed = match self.session.click(&found.element).await {
            Ok(()) => true,
            Err(_) => scripted_click(&self.session, &found.element).await.is_ok(),
        };
        if closed {
            debug!(target: "sitewalk.visit", strategy = found.strategy, "overlay.dismissed");
            self.settler.settle(&self.session, SettlePoint::Overlay).await;
        }
    }

    /// Live elements matched by any strategy of `cascades`, deduplicated.
    pub(crate) async fn discover(
        &mut self,
        cascades: &[SelectorCascade],
        keying: Keying,
    ) -> Vec<Candidate<S::Element>> {
        self.enter(Phase::DiscoveringElements);
        let base = self.current_base().await;
        let mut keys = HashSet::new();
        let mut found = Vec::new();
        for cascade in cascades {
            for element in self.locator.collect(&self.session, cascade, None).await {
                if !matches!(self.session.is_live(&element).await, Ok(true)) {
                    continue;
                }
                let (key, target) = match keying {
                    Keying::Identity => (identity_key(&self.session, &element).await, None),
                    Keying::Href => {
                        let href = self.session.attribute(&element, "href").await;
                        let Some(target) = href
                            .ok()
                            .flatten()
                            .and_then(|h| same_site(base.as_ref()?, &h))
                        else {
                            continue;
                        };
                        (format!("href:{target}"), Some(target))
                    }
                };
                if keys.insert(key.clone()) {
                    found.push(Candidate {
                        element,
                        key,
                        target,
                    });
                }
            }
        }
        debug!(target: "sitewalk.visit", candidates = found.len(), ?keying, "discover");
        found
    }

    async fn current_base(&self) -> Option<Url> {
        let current = self.session.current_location().await.ok();
        current
            .and_then(|c| Url::parse(&c).ok())
            .or_else(|| Url::parse(&self.settings.base_location).ok())
    }

    /// Append an outcome to the interaction sink and the counters.
    pub(crate) fn record(&mut self, outcome: InteractionOutcome) {
        self.summary.outcomes += 1;
        if !outcome.succeeded {
            self.summary.failed += 1;
        }
        let Some(recorder) = self.interactions.as_mut() else {
            return;
        };
        if let Err(err) = recorder.record(&outcome) {
            self.summary.sink_failures += 1;
            warn!(target: "sitewalk.record", attempt = outcome.attempt_id, error = %err, "record.outcome_failed");
        }
    }

    /// Keep `item` if it is meaningful and new.
    pub(crate) fn record_item(&mut self, item: ExtractedItem) -> bool {
        if !item.is_meaningful() || !self.seen_items.insert(item.fingerprint()) {
            self.summary.items_dropped += 1;
            return false;
        }
        self.summary.items_kept += 1;
        if let Some(recorder) = self.items.as_mut() {
            if let Err(err) = recorder.record(&item) {
                self.summary.sink_failures += 1;
                warn!(target: "sitewalk.record", title = %item.title, error = %err, "record.item_failed");
            }
        }
        true
    }

    /// Save the current document markup and a screen capture as `name`.
    pub async fn save_snapshots(&mut self, name: &str) -> usize {
        let Some(artifacts) = self.artifacts.clone() else {
            return 0;
        };
        if !self.settings.snapshots {
            return 0;
        }
        let mut saved = 0;
        match self.session.page_source().await {
            Ok(markup) => match tokio::fs::write(artifacts.markup(name), markup).await {
                Ok(()) => {
                    self.summary.artifacts += 1;
                    saved += 1;
                }
                Err(err) => warn!(target: "sitewalk.record", name, error = %err, "snapshot.markup_failed"),
            },
            Err(err) => warn!(target: "sitewalk.record", name, error = %err, "snapshot.markup_unavailable"),
        }
        saved += self.save_capture(&artifacts, name).await;
        saved
    }

    pub(crate) async fn save_capture(&mut self, artifacts: &RunArtifacts, name: &str) -> usize {
        match self.session.screenshot().await {
            Ok(png) => match tokio::fs::write(artifacts.capture(name), png).await {
                Ok(()) => {
                    self.summary.artifacts += 1;
                    info!(target: "sitewalk.record", name, "snapshot.saved");
                    1
                }
                Err(err) => {
                    warn!(target: "sitewalk.record", name, error = %err, "snapshot.capture_failed");
                    0
                }
            },
            Err(err) => {
                warn!(target: "sitewalk.record", name, error = %err, "snapshot.capture_unavailable");
                0
            }
        }
    }
}

/// `href` resolved against `base`, if it stays on the same host over http(s).
pub(crate) fn same_site(base: &Url, href: &str) -> Option<String> {
    let resolved = base.join(href.trim()).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    (resolved.host_str() == base.host_str()).then(|| resolved.to_string())
}
