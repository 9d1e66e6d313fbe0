//! Cascade evaluation against a live document.
use crate::cascade::SelectorCascade;
use crate::session::BrowserSession;
use tracing::debug;

/// Number of text characters used by a text-based identity key.
const IDENTITY_TEXT_CHARS: usize = 20;

/// A cascade hit and the index of the strategy that produced it.
#[derive(Debug, Clone)]
pub struct Located<E> {
    pub element: E,
    pub strategy: usize,
}

/// Resolves logical hints into elements by walking selector cascades.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementLocator;

impl ElementLocator {
    pub fn new() -> Self {
        Self
    }

    /// First visible and enabled element, trying strategies in order.
    ///
    /// A strategy that matches nothing, or whose query fails, falls through to
    /// the next one. Later strategies are never queried once one matches.
    pub async fn locate<S: BrowserSession>(
        &self,
        session: &S,
        cascade: &SelectorCascade,
        scope: Option<&S::Element>,
    ) -> Option<Located<S::Element>> {
        for (index, strategy) in cascade.strategies().iter().enumerate() {
            let query = strategy.to_query();
            let candidates = match session.find(&query, scope).await {
                Ok(found) => found,
                Err(err) => {
                    debug!(target: "sitewalk.locate", cascade = cascade.name(), %query, error = %err, "strategy failed");
                    continue;
                }
            };
            for element in candidates {
                match session.is_live(&element).await {
                    Ok(true) => {
                        debug!(target: "sitewalk.locate", cascade = cascade.name(), %query, "match");
                        return Some(Located {
                            element,
                            strategy: index,
                        });
                    }
                    Ok(false) => {}
                    Err(err) => {
                        debug!(target: "sitewalk.locate", %query, error = %err, "candidate skipped");
                    }
                }
            }
        }
        None
    }

    /// Trimmed text of the first strategy whose first match has any.
    ///
    /// Empty string when nothing resolves.
    pub async fn first_text<S: BrowserSession>(
        &self,
        session: &S,
        cascade: &SelectorCascade,
        scope: Option<&S::Element>,
    ) -> String {
        for strategy in cascade.strategies() {
            let Some(element) = self.first_match(session, &strategy.to_query(), scope).await else {
                continue;
            };
            if let Ok(text) = session.text(&element).await {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
        String::new()
    }

    /// Trimmed `attribute` of the first strategy whose first match carries it.
    pub async fn first_attribute<S: BrowserSession>(
        &self,
        session: &S,
        cascade: &SelectorCascade,
        scope: Option<&S::Element>,
        attribute: &str,
    ) -> String {
        for strategy in cascade.strategies() {
            let Some(element) = self.first_match(session, &strategy.to_query(), scope).await else {
                continue;
            };
            if let Ok(Some(value)) = session.attribute(&element, attribute).await {
                let value = value.trim();
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }
        String::new()
    }

    /// Every match of every strategy, in cascade order, without filtering.
    pub async fn collect<S: BrowserSession>(
        &self,
        session: &S,
        cascade: &SelectorCascade,
        scope: Option<&S::Element>,
    ) -> Vec<S::Element> {
        let mut all = Vec::new();
        for strategy in cascade.strategies() {
            let query = strategy.to_query();
            match session.find(&query, scope).await {
                Ok(found) => all.extend(found),
                Err(err) => {
                    debug!(target: "sitewalk.locate", %query, error = %err, "collect query failed");
                }
            }
        }
        all
    }

    async fn first_match<S: BrowserSession>(
        &self,
        session: &S,
        query: &crate::session::Query,
        scope: Option<&S::Element>,
    ) -> Option<S::Element> {
        session
            .find(query, scope)
            .await
            .ok()
            .and_then(|found| found.into_iter().next())
    }
}

/// Identity used to avoid exercising the same element twice.
///
/// `id:<id>`, else `class:<class>`, else `text:<first 20 chars>`, else
/// `tag:<tag>`; `unknown` when the element cannot be inspected.
pub async fn identity_key<S: BrowserSession>(session: &S, element: &S::Element) -> String {
    match try_identity_key(session, element).await {
        Ok(key) => key,
        Err(_) => "unknown".to_string(),
    }
}

async fn try_identity_key<S: BrowserSession>(
    session: &S,
    element: &S::Element,
) -> crate::session::SessionResult<String> {
    if let Some(id) = session.attribute(element, "id").await? {
        if !id.is_empty() {
            return Ok(format!("id:{id}"));
        }
    }
    if let Some(class) = session.attribute(element, "class").await? {
        if !class.is_empty() {
            return Ok(format!("class:{class}"));
        }
    }
    let text = session.text(element).await?;
    if !text.is_empty() {
        let prefix: String = text.chars().take(IDENTITY_TEXT_CHARS).collect();
        return Ok(format!("text:{prefix}"));
    }
    Ok(format!("tag:{}", session.tag_name(element).await?))
}
