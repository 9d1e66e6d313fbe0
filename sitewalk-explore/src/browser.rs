use crate::session::{BrowserSession, Query, ScriptArg, SessionResult};
use async_trait::async_trait;
use fantoccini::Locator;
use serde_json::Value;
use sitewalk_drivers::sitewalk_browser::page::{SitewalkElement, SitewalkPage};
use std::time::Duration;

/// [`BrowserSession`] backed by the fantoccini driver.
pub struct FantocciniSession {
    page: SitewalkPage,
}

impl FantocciniSession {
    pub fn new(page: SitewalkPage) -> Self {
        Self { page }
    }
}

fn locator(query: &Query) -> Locator<'_> {
    match query {
        Query::Css(s) => Locator::Css(s),
        Query::XPath(s) => Locator::XPath(s),
    }
}

#[async_trait]
impl BrowserSession for FantocciniSession {
    type Element = SitewalkElement;

    async fn navigate(&self, location: &str) -> SessionResult<()> {
        self.page.goto(location).await
    }

    async fn wait_ready(&self, timeout: Duration) -> SessionResult<()> {
        self.page.wait_for_body(timeout).await
    }

    async fn current_location(&self) -> SessionResult<String> {
        self.page.current_url().await
    }

    async fn page_title(&self) -> SessionResult<String> {
        self.page.title().await
    }

    async fn page_source(&self) -> SessionResult<String> {
        self.page.source().await
    }

    async fn screenshot(&self) -> SessionResult<Vec<u8>> {
        self.page.screenshot().await
    }

    async fn find(
        &self,
        query: &Query,
        scope: Option<&Self::Element>,
    ) -> SessionResult<Vec<Self::Element>> {
        match scope {
            Some(element) => element.find_all(locator(query)).await,
            None => self.page.find_all(locator(query)).await,
        }
    }

    async fn run_script(
        &self,
        code: &str,
        args: Vec<ScriptArg<Self::Element>>,
    ) -> SessionResult<Value> {
        let args = args
            .into_iter()
            .map(|arg| match arg {
                ScriptArg::Element(element) => element.to_script_arg(),
                ScriptArg::Value(value) => Ok(value),
            })
            .collect::<SessionResult<Vec<_>>>()?;
        self.page.execute(code, args).await
    }

    async fn tag_name(&self, element: &Self::Element) -> SessionResult<String> {
        element.tag_name().await
    }

    async fn text(&self, element: &Self::Element) -> SessionResult<String> {
        element.text().await
    }

    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> SessionResult<Option<String>> {
        element.attr(name).await
    }

    async fn is_displayed(&self, element: &Self::Element) -> SessionResult<bool> {
        element.is_displayed().await
    }

    async fn is_enabled(&self, element: &Self::Element) -> SessionResult<bool> {
        element.is_enabled().await
    }

    async fn click(&self, element: &Self::Element) -> SessionResult<()> {
        element.click().await
    }

    async fn hover(&self, element: &Self::Element) -> SessionResult<()> {
        self.page.hover(element).await
    }

    async fn clear(&self, element: &Self::Element) -> SessionResult<()> {
        element.clear().await
    }

    async fn type_text(&self, element: &Self::Element, text: &str) -> SessionResult<()> {
        element.send_keys(text).await
    }

    async fn select_index(&self, element: &Self::Element, index: usize) -> SessionResult<()> {
        element.select_by_index(index).await
    }
}
