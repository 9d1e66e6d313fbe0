//! The browser capability the engine runs against.
//!
//! Everything the engine does to a page goes through [`BrowserSession`], so a
//! run can be driven by WebDriver ([`crate::browser::FantocciniSession`]) or by
//! a scripted in-memory document in tests.
use async_trait::async_trait;
use serde_json::Value;
use sitewalk_common::SessionError;
use std::fmt;
use std::time::Duration;

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// A compiled element query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Css(String),
    XPath(String),
}

impl Query {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// Argument handed to an in-page script.
#[derive(Debug, Clone)]
pub enum ScriptArg<E> {
    Element(E),
    Value(Value),
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Live handle to a DOM node; may go stale whenever the document changes.
    type Element: Clone + Send + Sync;

    async fn navigate(&self, location: &str) -> SessionResult<()>;

    /// Wait for a minimal document-ready signal.
    async fn wait_ready(&self, timeout: Duration) -> SessionResult<()>;

    async fn current_location(&self) -> SessionResult<String>;

    async fn page_title(&self) -> SessionResult<String>;

    async fn page_source(&self) -> SessionResult<String>;

    async fn screenshot(&self) -> SessionResult<Vec<u8>>;

    /// All matches of `query` in the document, or below `scope` when given.
    async fn find(
        &self,
        query: &Query,
        scope: Option<&Self::Element>,
    ) -> SessionResult<Vec<Self::Element>>;

    async fn run_script(
        &self,
        code: &str,
        args: Vec<ScriptArg<Self::Element>>,
    ) -> SessionResult<Value>;

    async fn tag_name(&self, element: &Self::Element) -> SessionResult<String>;

    /// Rendered text of the element.
    async fn text(&self, element: &Self::Element) -> SessionResult<String>;

    async fn attribute(&self, element: &Self::Element, name: &str)
    -> SessionResult<Option<String>>;

    async fn is_displayed(&self, element: &Self::Element) -> SessionResult<bool>;

    async fn is_enabled(&self, element: &Self::Element) -> SessionResult<bool>;

    /// Native (WebDriver-level) click.
    async fn click(&self, element: &Self::Element) -> SessionResult<()>;

    /// Move the pointer onto the element.
    async fn hover(&self, element: &Self::Element) -> SessionResult<()>;

    async fn clear(&self, element: &Self::Element) -> SessionResult<()>;

    async fn type_text(&self, element: &Self::Element, text: &str) -> SessionResult<()>;

    /// Select the option at `index` of a `<select>` element.
    async fn select_index(&self, element: &Self::Element, index: usize) -> SessionResult<()>;

    /// Visible and enabled.
    async fn is_live(&self, element: &Self::Element) -> SessionResult<bool> {
        Ok(self.is_displayed(element).await? && self.is_enabled(element).await?)
    }
}
