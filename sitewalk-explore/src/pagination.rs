//! Following "next" controls across result pages.
use crate::cascade::{SelectorCascade, catalog};
use crate::executor::scripted_click;
use crate::locator::ElementLocator;
use crate::session::BrowserSession;
use crate::settle::{SettlePoint, Settler};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Default ceiling on pages walked from one base location.
pub const DEFAULT_MAX_PAGES: usize = 5;

/// The extraction step re-run on every page reached.
#[async_trait]
pub trait PaginationHost<S: BrowserSession>: Send {
    fn session(&self) -> &S;

    /// Extract from the current document, tagged with `location`.
    async fn extract_page(&mut self, location: &str) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationStop {
    /// No next control on the last page reached.
    Exhausted,
    /// The page ceiling was hit.
    Ceiling,
    /// The next control could not be triggered.
    ClickFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationReport {
    /// Extraction passes performed after the first page.
    pub pages: usize,
    pub items: usize,
    pub stop: PaginationStop,
}

#[derive(Debug, Clone)]
pub struct PaginationWalker {
    cascade: SelectorCascade,
    max_pages: usize,
    settler: Settler,
    locator: ElementLocator,
}

impl PaginationWalker {
    pub fn new(max_pages: usize, settler: Settler) -> Self {
        Self::with_cascade(catalog::next_page(), max_pages, settler)
    }

    pub fn with_cascade(cascade: SelectorCascade, max_pages: usize, settler: Settler) -> Self {
        Self {
            cascade,
            max_pages,
            settler,
            locator: ElementLocator::new(),
        }
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub async fn walk<S, H>(&self, host: &mut H, base_location: &str) -> PaginationReport
    where
        S: BrowserSession,
        H: PaginationHost<S> + ?Sized,
    {
        let mut report = PaginationReport {
            pages: 0,
            items: 0,
            stop: PaginationStop::Ceiling,
        };
        for _ in 0..self.max_pages {
            let session = host.session();
            let Some(next) = self.locator.locate(session, &self.cascade, None).await else {
                debug!(target: "sitewalk.paginate", base = base_location, pages = report.pages, "no next control");
                report.stop = PaginationStop::Exhausted;
                return report;
            };
            if let Err(err) = scripted_click(session, &next.element).await {
                warn!(target: "sitewalk.paginate", base = base_location, error = %err, "next control failed");
                report.stop = PaginationStop::ClickFailed(err.to_string());
                return report;
            }
            self.settler.settle(session, SettlePoint::Pagination).await;

            report.pages += 1;
            let location = page_location(base_location, report.pages + 1);
            let found = host.extract_page(&location).await;
            report.items += found;
            info!(target: "sitewalk.paginate", page = %location, items = found, "page extracted");
        }
        report
    }
}

/// `base?page=n`, or `base&page=n` when `base` already has a query.
pub fn page_location(base: &str, page: usize) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}page={page}")
}
