//! Waiting for a page to stop changing after an action.
use crate::session::BrowserSession;
use sitewalk_config::{SettleConfig, SettleStrategy};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::debug;

const DOM_SIZE_PROBE: &str = "return document.getElementsByTagName('*').length;";

/// Kinds of page-changing actions, each with its own settle budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePoint {
    Navigation,
    Click,
    ClickNavigate,
    Hover,
    Overlay,
    Pagination,
    Scroll,
}

/// How a settle wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// Nothing to wait for.
    Immediate,
    /// Two consecutive DOM samples agreed.
    Stable,
    /// The whole budget was spent.
    Elapsed,
}

#[derive(Debug, Clone)]
pub struct Settler {
    strategy: SettleStrategy,
    poll_interval: Duration,
    delays: SettleConfig,
}

impl Settler {
    pub fn from_config(config: &SettleConfig) -> Self {
        Self {
            strategy: config.strategy,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            delays: config.clone(),
        }
    }

    /// A settler that never waits.
    pub fn immediate() -> Self {
        Self::from_config(&SettleConfig {
            strategy: SettleStrategy::Fixed,
            poll_interval_ms: 1,
            navigation_ms: 0,
            click_ms: 0,
            click_navigate_ms: 0,
            hover_ms: 0,
            overlay_ms: 0,
            pagination_ms: 0,
            scroll_ms: 0,
        })
    }

    pub fn budget(&self, point: SettlePoint) -> Duration {
        let ms = match point {
            SettlePoint::Navigation => self.delays.navigation_ms,
            SettlePoint::Click => self.delays.click_ms,
            SettlePoint::ClickNavigate => self.delays.click_navigate_ms,
            SettlePoint::Hover => self.delays.hover_ms,
            SettlePoint::Overlay => self.delays.overlay_ms,
            SettlePoint::Pagination => self.delays.pagination_ms,
            SettlePoint::Scroll => self.delays.scroll_ms,
        };
        Duration::from_millis(ms)
    }

    /// Wait after `point` according to the configured strategy.
    pub async fn settle<S: BrowserSession>(&self, session: &S, point: SettlePoint) -> Settled {
        let budget = self.budget(point);
        if budget.is_zero() {
            return Settled::Immediate;
        }
        match self.strategy {
            SettleStrategy::Fixed => {
                sleep(budget).await;
                Settled::Elapsed
            }
            SettleStrategy::Stable => self.until_stable(session, budget).await,
        }
    }

    async fn until_stable<S: BrowserSession>(&self, session: &S, budget: Duration) -> Settled {
        let deadline = Instant::now() + budget;
        let Some(mut last) = dom_size(session).await else {
            sleep(budget).await;
            return Settled::Elapsed;
        };
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Settled::Elapsed;
            }
            sleep(self.poll_interval.min(deadline - now)).await;
            match dom_size(session).await {
                Some(size) if size == last => return Settled::Stable,
                Some(size) => last = size,
                None => {
                    sleep(deadline.saturating_duration_since(Instant::now())).await;
                    return Settled::Elapsed;
                }
            }
        }
    }
}

async fn dom_size<S: BrowserSession>(session: &S) -> Option<u64> {
    match session.run_script(DOM_SIZE_PROBE, vec![]).await {
        Ok(value) => value.as_u64(),
        Err(err) => {
            debug!(target: "sitewalk.settle", error = %err, "dom probe failed");
            None
        }
    }
}
