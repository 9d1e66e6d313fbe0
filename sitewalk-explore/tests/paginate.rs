mod common;

use async_trait::async_trait;
use common::{MockSession, el};
use sitewalk_explore::pagination::{PaginationHost, PaginationStop, PaginationWalker};
use sitewalk_explore::settle::Settler;

const BASE: &str = "https://shop.test/recipes";

fn page(n: usize) -> String {
    format!("https://shop.test/recipes/p{n}")
}

/// Pages 1..=`count`; every page but the last has a "Next" button.
fn paged_site(count: usize) -> MockSession {
    common::init_test_tracing();
    let mut session = MockSession::new();
    for n in 1..=count {
        let mut nodes = vec![el("h2").text(&format!("Recipe {n}"))];
        if n < count {
            nodes.push(el("button").text("Next").navigates(&page(n + 1)));
        }
        session = session.page(&page(n), nodes);
    }
    session.open(&page(1));
    session
}

struct CountingHost {
    session: MockSession,
    seen: Vec<(String, String)>,
}

#[async_trait]
impl PaginationHost<MockSession> for CountingHost {
    fn session(&self) -> &MockSession {
        &self.session
    }

    async fn extract_page(&mut self, location: &str) -> usize {
        let actual = self.session.location().unwrap_or_default();
        self.seen.push((location.to_string(), actual));
        1
    }
}

fn host(session: MockSession) -> CountingHost {
    CountingHost {
        session,
        seen: Vec::new(),
    }
}

#[tokio::test]
async fn stops_when_next_control_disappears() {
    let mut host = host(paged_site(4));

    let report = PaginationWalker::new(5, Settler::immediate())
        .walk(&mut host, BASE)
        .await;

    assert_eq!(report.pages, 3);
    assert_eq!(report.items, 3);
    assert_eq!(report.stop, PaginationStop::Exhausted);
    assert_eq!(
        host.seen,
        vec![
            (format!("{BASE}?page=2"), page(2)),
            (format!("{BASE}?page=3"), page(3)),
            (format!("{BASE}?page=4"), page(4)),
        ]
    );
}

#[tokio::test]
async fn no_next_control_means_no_passes() {
    let mut host = host(paged_site(1));

    let report = PaginationWalker::new(5, Settler::immediate())
        .walk(&mut host, BASE)
        .await;

    assert_eq!(report.pages, 0);
    assert_eq!(report.stop, PaginationStop::Exhausted);
    assert!(host.seen.is_empty());
}

#[tokio::test]
async fn ceiling_bounds_endless_pagination() {
    let mut host = host(paged_site(12));

    let report = PaginationWalker::new(5, Settler::immediate())
        .walk(&mut host, BASE)
        .await;

    assert_eq!(report.pages, 5);
    assert_eq!(report.stop, PaginationStop::Ceiling);
    assert_eq!(host.session.location().as_deref(), Some(page(6).as_str()));
}

#[tokio::test]
async fn click_failure_ends_the_walk() {
    common::init_test_tracing();
    let session = MockSession::new().page(
        &page(1),
        vec![el("a").class("pagination-next").text("Next").script_click_fails()],
    );
    session.open(&page(1));
    let mut host = host(session);

    let report = PaginationWalker::new(5, Settler::immediate())
        .walk(&mut host, BASE)
        .await;

    assert_eq!(report.pages, 0);
    assert!(matches!(report.stop, PaginationStop::ClickFailed(_)));
}
