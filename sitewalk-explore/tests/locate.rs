mod common;

use common::{MockSession, el};
use sitewalk_explore::cascade::{SelectorCascade, SelectorStrategy, catalog};
use sitewalk_explore::locator::{ElementLocator, identity_key};

const HOME: &str = "https://shop.test/";

fn open(nodes: Vec<common::Node>) -> MockSession {
    common::init_test_tracing();
    let session = MockSession::new().page(HOME, nodes);
    session.open(HOME);
    session
}

#[tokio::test]
async fn later_strategies_are_not_queried_after_a_match() {
    let session = open(vec![
        el("h2").text("Keto Bowl"),
        el("div").class("title").text("Not this one"),
    ]);

    let found = ElementLocator::new()
        .locate(&session, &catalog::title(), None)
        .await
        .expect("h2 should match");

    assert_eq!(found.strategy, 1);
    assert_eq!(session.journal().queries, vec!["css:h1", "css:h2"]);
}

#[tokio::test]
async fn hidden_and_disabled_matches_fall_through() {
    let session = open(vec![
        el("h1").text("Hidden").hidden(),
        el("h2").text("Disabled").disabled(),
        el("h3").text("Shown"),
    ]);

    let found = ElementLocator::new()
        .locate(&session, &catalog::title(), None)
        .await
        .expect("h3 should match");

    assert_eq!(found.strategy, 2);
    assert_eq!(session.journal().queries.len(), 3);
}

#[tokio::test]
async fn exhausted_cascade_is_none_not_an_error() {
    let session = open(vec![el("p").text("nothing to see")]);
    let cascade = catalog::close_overlay();

    let found = ElementLocator::new().locate(&session, &cascade, None).await;

    assert!(found.is_none());
    assert_eq!(session.journal().queries.len(), cascade.len());
}

#[tokio::test]
async fn stale_scope_yields_none() {
    let session = open(vec![el("div").class("card").child(el("h3").text("Bowl"))]);
    let card = session.handle(".card");
    session.open(HOME);

    let found = ElementLocator::new()
        .locate(&session, &catalog::title(), Some(&card))
        .await;

    assert!(found.is_none());
}

#[tokio::test]
async fn text_strategies_match_on_contained_text() {
    let session = open(vec![
        el("a").text("Previous"),
        el("a").id("more").text("Show More"),
    ]);
    let cascade = SelectorCascade::new(
        "next",
        vec![
            SelectorStrategy::class("pagination-next"),
            SelectorStrategy::text(&["button", "a"], &["Next", "More"]),
        ],
    );

    let found = ElementLocator::new()
        .locate(&session, &cascade, None)
        .await
        .expect("text match");

    assert_eq!(found.strategy, 1);
    assert_eq!(identity_key(&session, &found.element).await, "id:more");
}

#[tokio::test]
async fn first_text_skips_empty_matches() {
    let session = open(vec![el("div").class("card").child(el("h1")).child(el("h2").text("  Keto Bowl  "))]);
    let card = session.handle(".card");
    let locator = ElementLocator::new();

    assert_eq!(
        locator.first_text(&session, &catalog::title(), Some(&card)).await,
        "Keto Bowl"
    );
    assert_eq!(
        locator.first_text(&session, &catalog::price(), Some(&card)).await,
        ""
    );
}

#[tokio::test]
async fn identity_keys_prefer_id_then_class_then_text_then_tag() {
    let long = "A very long link text that keeps going";
    let session = open(vec![
        el("a").id("x").class("nav").href("/a").text("Shop"),
        el("a").class("delete-btn").text("Delete"),
        el("a").text(long),
        el("span"),
    ]);
    let keys = [
        identity_key(&session, &session.handle("#x")).await,
        identity_key(&session, &session.handle(".delete-btn")).await,
        identity_key(&session, &session.handles("a")[2]).await,
        identity_key(&session, &session.handle("span")).await,
    ];

    assert_eq!(keys[0], "id:x");
    assert_eq!(keys[1], "class:delete-btn");
    assert_eq!(keys[2], format!("text:{}", &long[..20]));
    assert_eq!(keys[3], "tag:span");
}

#[tokio::test]
async fn identity_key_of_stale_handle_is_unknown() {
    let session = open(vec![el("a").id("x")]);
    let handle = session.handle("#x");
    session.open(HOME);

    assert_eq!(identity_key(&session, &handle).await, "unknown");
}
