use super::{Candidate, Explorer, Keying, Phase};
use crate::cascade::{SelectorCascade, catalog};
use crate::outcome::Category;
use crate::session::{BrowserSession, Query, ScriptArg};
use std::collections::HashSet;
use tracing::{debug, info, warn};

const FOCUS: &str = "arguments[0].focus();";
const PROBE_EMAIL: &str = "test@example.com";

/// What to do with each candidate of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exercise {
    /// Hover, then click when safe.
    Element,
    /// Hover, then click when safe and the target is unvisited.
    Link,
    /// Hover, then click when safe; unsafe buttons get a skipped outcome.
    Button,
    /// Navigation menu entry; same policy as links.
    Nav,
    /// Element on a section page; only those with text are exercised.
    PageElement,
}

impl Exercise {
    fn labels(&self) -> (&'static str, &'static str) {
        match self {
            Self::Element => ("Element Hover", "Element Click"),
            Self::Link => ("Link Hover", "Link Click"),
            Self::Button => ("Button Hover", "Button Click"),
            Self::Nav => ("Navigation Hover", "Navigation Click"),
            Self::PageElement => ("Page Element Hover", "Page Element Click"),
        }
    }
}

impl<S: BrowserSession> Explorer<S> {
    /// Exercise everything reachable from the base location.
    pub(crate) async fn run_explore(&mut self) {
        let base = self.settings.base_location.clone();
        if let Err(err) = self.visit(&base).await {
            self.summary.location_failures += 1;
            warn!(target: "sitewalk.visit", location = %base, error = %err, "visit.failed");
            return;
        }
        let limits = self.settings.limits.clone();
        self.explore_clickables(&base, limits.max_elements_per_page).await;
        self.explore_links(&base, limits.max_links).await;
        self.explore_buttons(&base, limits.max_elements_per_page).await;
        self.explore_forms(&base).await;
        self.explore_navigation(&base, limits.max_links).await;
        self.save_snapshots("explore").await;
    }

    pub async fn explore_clickables(&mut self, origin: &str, limit: usize) -> usize {
        self.sweep(origin, &[catalog::clickable()], Keying::Identity, Exercise::Element, limit)
            .await
    }

    pub async fn explore_links(&mut self, origin: &str, limit: usize) -> usize {
        self.sweep(origin, &[catalog::links()], Keying::Href, Exercise::Link, limit)
            .await
    }

    pub async fn explore_buttons(&mut self, origin: &str, limit: usize) -> usize {
        self.sweep(origin, &[catalog::buttons()], Keying::Identity, Exercise::Button, limit)
            .await
    }

    pub async fn explore_navigation(&mut self, origin: &str, limit: usize) -> usize {
        self.sweep(origin, &[catalog::navigation()], Keying::Href, Exercise::Nav, limit)
            .await
    }

    /// Exercise up to `limit` unique candidates found by `cascades` on `origin`.
    ///
    /// A click that navigates invalidates every other handle, so the sweep
    /// returns to `origin`, rediscovers, and carries on with the keys it has
    /// not handled yet. Returns the number of candidates handled.
    pub(crate) async fn sweep(
        &mut self,
        origin: &str,
        cascades: &[SelectorCascade],
        keying: Keying,
        kind: Exercise,
        limit: usize,
    ) -> usize {
        if let Err(err) = self.return_to(origin).await {
            warn!(target: "sitewalk.visit", origin, error = %err, "sweep.origin_unavailable");
            return 0;
        }
        let mut handled: HashSet<String> = HashSet::new();
        'rediscover: loop {
            let candidates = self.discover(cascades, keying).await;
            for candidate in candidates {
                if handled.len() >= limit {
                    break 'rediscover;
                }
                if !handled.insert(candidate.key.clone()) {
                    continue;
                }
                if !self.exercise(kind, &candidate).await {
                    continue;
                }
                if let Err(err) = self.return_to(origin).await {
                    warn!(target: "sitewalk.visit", origin, error = %err, "sweep.return_failed");
                    break 'rediscover;
                }
                continue 'rediscover;
            }
            break;
        }
        info!(target: "sitewalk.interact", origin, ?kind, handled = handled.len(), "sweep.done");
        handled.len()
    }

    /// Hover and maybe click one candidate; `true` if the page navigated away.
    pub(crate) async fn exercise(&mut self, kind: Exercise, candidate: &Candidate<S::Element>) -> bool {
        self.enter(Phase::Interacting);
        let (hover_label, click_label) = kind.labels();
        let element = &candidate.element;

        if kind == Exercise::PageElement {
            match self.session.text(element).await {
                Ok(text) if !text.trim().is_empty() => {}
                _ => return false,
            }
        }

        let hovered = self.executor.hover(&self.session, element, hover_label).await;
        self.record(hovered);

        if !self.safety.is_safe_to_trigger(&self.session, element).await {
            debug!(target: "sitewalk.interact", key = %candidate.key, "click.unsafe");
            if kind == Exercise::Button {
                let location = self.session.current_location().await.unwrap_or_default();
                let text = self.session.text(element).await.unwrap_or_default();
                let skipped = self.executor.skipped(
                    Category::Click,
                    click_label,
                    text.trim(),
                    &location,
                    "skipped: potentially unsafe",
                );
                self.record(skipped);
            }
            return false;
        }

        if matches!(kind, Exercise::Link | Exercise::Nav) {
            if let Some(target) = &candidate.target {
                if self.visits.seen(target) {
                    debug!(target: "sitewalk.interact", %target, "click.already_visited");
                    return false;
                }
            }
        }

        let report = self.executor.click(&self.session, element, click_label).await;
        let navigated_to = report.navigated_to.clone();
        self.record(report.outcome);
        match navigated_to {
            Some(location) => {
                self.adopt(&location);
                true
            }
            None => false,
        }
    }

    /// Focus text inputs, fill email inputs, pick the second option of selects.
    pub async fn explore_forms(&mut self, origin: &str) -> usize {
        if let Err(err) = self.return_to(origin).await {
            warn!(target: "sitewalk.visit", origin, error = %err, "forms.origin_unavailable");
            return 0;
        }
        let limit = self.settings.limits.max_elements_per_page;
        let mut exercised = 0;

        let inputs = self.discover(&[catalog::text_inputs()], Keying::Identity).await;
        self.enter(Phase::Interacting);
        for input in inputs.into_iter().take(limit) {
            let element = input.element;
            if let Err(err) = self
                .session
                .run_script(FOCUS, vec![ScriptArg::Element(element.clone())])
                .await
            {
                debug!(target: "sitewalk.interact", key = %input.key, error = %err, "input.focus_failed");
                continue;
            }
            let kind = self
                .session
                .attribute(&element, "type")
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            if kind.eq_ignore_ascii_case("email") {
                let outcome = self
                    .executor
                    .fill(&self.session, &element, "Email Input", PROBE_EMAIL)
                    .await;
                self.record(outcome);
                exercised += 1;
            }
        }

        let selects = self.discover(&[catalog::selects()], Keying::Identity).await;
        self.enter(Phase::Interacting);
        for select in selects.into_iter().take(limit) {
            let options = self
                .session
                .find(&Query::css("option"), Some(&select.element))
                .await
                .map(|o| o.len())
                .unwrap_or(0);
            if options <= 1 {
                continue;
            }
            let outcome = self
                .executor
                .select(&self.session, &select.element, "Select Option", 1)
                .await;
            self.record(outcome);
            exercised += 1;
        }
        exercised
    }
}
