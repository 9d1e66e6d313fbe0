use super::{Explorer, Phase};
use crate::cascade::catalog;
use crate::pagination::PaginationHost;
use crate::session::BrowserSession;
use crate::settle::SettlePoint;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

const DOCUMENT_HEIGHT: &str = "return document.body.scrollHeight;";
const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0);";

impl<S: BrowserSession> Explorer<S> {
    /// Visit every target, extract items, follow pagination.
    pub(crate) async fn run_scrape(&mut self) {
        for target in self.settings.targets.clone() {
            match self.visit(&target).await {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    self.summary.location_failures += 1;
                    warn!(target: "sitewalk.visit", location = %target, error = %err, "visit.failed");
                    continue;
                }
            }
            self.scroll_for_lazy_content().await;
            let kept = self.extract_items(&target).await;
            info!(target: "sitewalk.visit", location = %target, items = kept, "scrape.page");

            self.enter(Phase::Paginating);
            let walker = self.pagination.clone();
            let report = walker.walk::<S, _>(self, &target).await;
            self.summary.pages += report.pages;
            info!(
                target: "sitewalk.paginate",
                location = %target,
                pages = report.pages,
                items = report.items,
                stop = ?report.stop,
                "paginate.done"
            );
        }
        self.save_snapshots("page").await;
    }

    /// Scroll to the bottom until the document stops growing, then back up.
    pub async fn scroll_for_lazy_content(&mut self) -> usize {
        let mut cycles = 0;
        let mut height = self.document_height().await;
        while cycles < self.settings.limits.max_scroll_cycles {
            if let Err(err) = self.session.run_script(SCROLL_TO_BOTTOM, Vec::new()).await {
                debug!(target: "sitewalk.visit", error = %err, "scroll.failed");
                break;
            }
            cycles += 1;
            self.settler.settle(&self.session, SettlePoint::Scroll).await;
            let grown = self.document_height().await;
            if grown.is_none() || grown == height {
                break;
            }
            height = grown;
        }
        if let Err(err) = self.session.run_script(SCROLL_TO_TOP, Vec::new()).await {
            debug!(target: "sitewalk.visit", error = %err, "scroll.reset_failed");
        }
        debug!(target: "sitewalk.visit", cycles, "scroll.done");
        cycles
    }

    async fn document_height(&self) -> Option<u64> {
        self.session
            .run_script(DOCUMENT_HEIGHT, Vec::new())
            .await
            .ok()
            .as_ref()
            .and_then(Value::as_u64)
    }

    /// Extract items from every live content container on the current page.
    ///
    /// Returns the number of items kept.
    pub async fn extract_items(&mut self, source_location: &str) -> usize {
        self.enter(Phase::Extracting);
        let containers = self
            .locator
            .collect(&self.session, &catalog::content(), None)
            .await;
        let mut kept = 0;
        for container in containers {
            if !matches!(self.session.is_live(&container).await, Ok(true)) {
                continue;
            }
            match self
                .extractor
                .extract(&self.session, &container, source_location)
                .await
            {
                Ok(item) => {
                    if self.record_item(item) {
                        kept += 1;
                    }
                }
                Err(err) => {
                    debug!(target: "sitewalk.record", error = %err, "item.skipped");
                }
            }
        }
        kept
    }
}

#[async_trait]
impl<S: BrowserSession> PaginationHost<S> for Explorer<S> {
    fn session(&self) -> &S {
        &self.session
    }

    async fn extract_page(&mut self, location: &str) -> usize {
        self.extract_items(location).await
    }
}
