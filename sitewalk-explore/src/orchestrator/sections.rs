use super::explore::Exercise;
use super::{Candidate, Explorer, Keying, Phase};
use crate::cascade::catalog;
use crate::session::BrowserSession;
use tracing::{debug, info, warn};

/// Paragraphs at or below this many characters are not worth recording.
const MIN_PARAGRAPH_CHARS: usize = 20;

impl<S: BrowserSession> Explorer<S> {
    /// Walk every configured section from the base location.
    pub(crate) async fn run_sections(&mut self) {
        let base = self.settings.base_location.clone();
        if let Err(err) = self.visit(&base).await {
            self.summary.location_failures += 1;
            warn!(target: "sitewalk.visit", location = %base, error = %err, "visit.failed");
            return;
        }
        for name in self.settings.sections.clone() {
            self.test_section(&base, &name).await;
        }
    }

    /// Reach the section called `name` from `base` and exercise its page.
    ///
    /// Returns `false` when no entry point for the section exists.
    pub async fn test_section(&mut self, base: &str, name: &str) -> bool {
        if let Err(err) = self.return_to(base).await {
            self.summary.location_failures += 1;
            warn!(target: "sitewalk.visit", section = name, error = %err, "section.base_unavailable");
            return false;
        }
        let Some(entry) = self.find_section_entry(name).await else {
            info!(target: "sitewalk.visit", section = name, "section.not_found");
            return false;
        };

        self.enter(Phase::Interacting);
        let hovered = self
            .executor
            .hover(&self.session, &entry.element, &format!("Section Hover: {name}"))
            .await;
        self.record(hovered);

        let already_visited = entry
            .target
            .as_deref()
            .is_some_and(|target| self.visits.seen(target));
        if already_visited {
            debug!(target: "sitewalk.visit", section = name, "section.already_visited");
        } else if self.safety.is_safe_to_trigger(&self.session, &entry.element).await {
            let report = self
                .executor
                .click_navigate(&self.session, &entry.element, &format!("Section Navigate: {name}"))
                .await;
            let navigated_to = report.navigated_to.clone();
            self.record(report.outcome);
            if let Some(location) = navigated_to {
                self.adopt(&location);
            }
        }

        let here = match self.session.current_location().await {
            Ok(here) => here,
            Err(err) => {
                self.summary.location_failures += 1;
                warn!(target: "sitewalk.visit", section = name, error = %err, "section.location_unavailable");
                return true;
            }
        };
        let limit = self.settings.limits.max_elements_per_page;
        self.sweep(&here, &[catalog::page_elements()], Keying::Identity, Exercise::PageElement, limit)
            .await;
        self.scrape_page_data(&here).await;
        if let Some(artifacts) = self.artifacts.clone() {
            self.save_capture(&artifacts, name).await;
        }
        true
    }

    /// A link, then a navigation entry, then a button whose text mentions `name`.
    async fn find_section_entry(&mut self, name: &str) -> Option<Candidate<S::Element>> {
        let needle = name.to_lowercase();
        let sources = [
            (catalog::links(), Keying::Href),
            (catalog::navigation(), Keying::Href),
            (catalog::buttons(), Keying::Identity),
        ];
        for (cascade, keying) in sources {
            for candidate in self.discover(std::slice::from_ref(&cascade), keying).await {
                let Ok(text) = self.session.text(&candidate.element).await else {
                    continue;
                };
                if text.to_lowercase().contains(&needle) {
                    debug!(target: "sitewalk.visit", section = name, source = cascade.name(), "section.entry");
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Record headings, paragraphs, links and images of the current page.
    pub async fn scrape_page_data(&mut self, location: &str) -> usize {
        self.enter(Phase::Extracting);
        let limit = self.settings.limits.max_elements_per_page;
        let mut rows = Vec::new();

        for heading in self.locator.collect(&self.session, &catalog::headings(), None).await {
            if rows.len() >= limit {
                break;
            }
            let (Ok(tag), Ok(text)) = (
                self.session.tag_name(&heading).await,
                self.session.text(&heading).await,
            ) else {
                continue;
            };
            let text = text.trim();
            if !text.is_empty() {
                rows.push(("Heading", tag.to_ascii_lowercase(), text.to_string()));
            }
        }

        let mut paragraphs = 0;
        for paragraph in self.locator.collect(&self.session, &catalog::paragraphs(), None).await {
            if paragraphs >= limit {
                break;
            }
            let Ok(text) = self.session.text(&paragraph).await else {
                continue;
            };
            let text = text.trim();
            if text.chars().count() > MIN_PARAGRAPH_CHARS {
                rows.push(("Paragraph", "p".to_string(), text.to_string()));
                paragraphs += 1;
            }
        }

        let mut links = 0;
        for link in self.locator.collect(&self.session, &catalog::links(), None).await {
            if links >= limit {
                break;
            }
            let (Ok(text), Ok(Some(href))) = (
                self.session.text(&link).await,
                self.session.attribute(&link, "href").await,
            ) else {
                continue;
            };
            let text = text.trim();
            if !text.is_empty() {
                rows.push(("Link", text.to_string(), href));
                links += 1;
            }
        }

        let mut images = 0;
        for image in self.locator.collect(&self.session, &catalog::image(), None).await {
            if images >= limit {
                break;
            }
            let (Ok(Some(src)), Ok(Some(alt))) = (
                self.session.attribute(&image, "src").await,
                self.session.attribute(&image, "alt").await,
            ) else {
                continue;
            };
            if !alt.trim().is_empty() {
                rows.push(("Image", alt.trim().to_string(), src));
                images += 1;
            }
        }

        let recorded = rows.len();
        for (label, subject, value) in rows {
            let outcome = self.executor.scraped(label, &subject, &value, location);
            self.record(outcome);
        }
        info!(target: "sitewalk.record", location, rows = recorded, "scrape.page_data");
        recorded
    }
}
