use crate::sitewalk_browser::stealth::{StealthProfile, StealthScripts};
use fantoccini::actions::{InputSource, MouseActions, PointerAction};
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{elements::Element, Client, Locator};
use serde_json::Value;
use sitewalk_common::SessionError;
use std::time::Duration;
use tracing::debug;

type PageResult<T> = std::result::Result<T, SessionError>;

/// Map a WebDriver failure onto the session error taxonomy.
pub fn classify(err: CmdError) -> SessionError {
    match &err {
        CmdError::Standard(wd) => match wd.error {
            ErrorStatus::StaleElementReference => SessionError::StaleReference,
            ErrorStatus::NoSuchElement => SessionError::NotFound(wd.message.to_string()),
            ErrorStatus::ElementNotInteractable
            | ErrorStatus::ElementClickIntercepted
            | ErrorStatus::InvalidElementState
            | ErrorStatus::MoveTargetOutOfBounds => {
                SessionError::Interaction(wd.message.to_string())
            }
            ErrorStatus::JavascriptError | ErrorStatus::ScriptTimeout => {
                SessionError::Script(wd.message.to_string())
            }
            ErrorStatus::InvalidSessionId | ErrorStatus::SessionNotCreated => {
                SessionError::Unavailable(wd.message.to_string())
            }
            _ => SessionError::Interaction(err.to_string()),
        },
        _ => SessionError::Unavailable(err.to_string()),
    }
}

/// Document-level wrapper around the shared WebDriver client.
#[derive(Clone)]
pub struct SitewalkPage {
    client: Client,
    stealth: StealthProfile,
}

impl SitewalkPage {
    pub fn new(client: Client, stealth: StealthProfile) -> Self {
        Self { client, stealth }
    }

    pub(crate) fn into_client(self) -> Client {
        self.client
    }

    /// Navigate to `url` and apply the profile's evasion scripts.
    pub async fn goto(&self, url: &str) -> PageResult<()> {
        self.client
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                location: url.to_string(),
                reason: e.to_string(),
            })?;

        for script in StealthScripts::for_profile(self.stealth) {
            // Evasions are cosmetic; a page with a strict CSP may refuse them.
            if let Err(err) = self.client.execute(script, vec![]).await {
                debug!(target: "sitewalk.driver", error = %err, "evasion script rejected");
            }
        }
        Ok(())
    }

    /// Wait until a `body` element exists, bounded by `timeout`.
    pub async fn wait_for_body(&self, timeout: Duration) -> PageResult<()> {
        self.client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css("body"))
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Navigation {
                location: "<current>".to_string(),
                reason: format!("document not ready: {e}"),
            })
    }

    pub async fn current_url(&self) -> PageResult<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(classify)
    }

    pub async fn title(&self) -> PageResult<String> {
        self.client.title().await.map_err(classify)
    }

    /// Return the full page HTML source.
    pub async fn source(&self) -> PageResult<String> {
        self.client.source().await.map_err(classify)
    }

    /// PNG screenshot of the viewport.
    pub async fn screenshot(&self) -> PageResult<Vec<u8>> {
        self.client.screenshot().await.map_err(classify)
    }

    /// Find zero or more elements in the document.
    pub async fn find_all(&self, locator: Locator<'_>) -> PageResult<Vec<SitewalkElement>> {
        let elements = self.client.find_all(locator).await.map_err(classify)?;
        Ok(elements.into_iter().map(SitewalkElement::new).collect())
    }

    /// Run a script; elements must already be serialized into `args`.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> PageResult<Value> {
        self.client.execute(script, args).await.map_err(classify)
    }

    /// Move the pointer onto `element`.
    pub async fn hover(&self, element: &SitewalkElement) -> PageResult<()> {
        let actions = MouseActions::new("sitewalk-pointer".to_string()).then(
            PointerAction::MoveToElement {
                element: element.element.clone(),
                duration: Some(Duration::from_millis(100)),
                x: Default::default(),
                y: Default::default(),
            },
        );
        self.client.perform_actions(actions).await.map_err(classify)?;
        self.client.release_actions().await.map_err(classify)
    }
}

/// Element wrapper whose operations report [`SessionError`]s.
#[derive(Clone)]
pub struct SitewalkElement {
    element: Element,
}

impl SitewalkElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Find zero or more descendants.
    pub async fn find_all(&self, locator: Locator<'_>) -> PageResult<Vec<SitewalkElement>> {
        let elements = self.element.find_all(locator).await.map_err(classify)?;
        Ok(elements.into_iter().map(SitewalkElement::new).collect())
    }

    /// Serialized reference usable as a script argument.
    pub fn to_script_arg(&self) -> PageResult<Value> {
        serde_json::to_value(&self.element).map_err(|e| SessionError::Script(e.to_string()))
    }

    pub async fn tag_name(&self) -> PageResult<String> {
        self.element.tag_name().await.map_err(classify)
    }

    /// Rendered text.
    pub async fn text(&self) -> PageResult<String> {
        self.element.text().await.map_err(classify)
    }

    pub async fn attr(&self, name: &str) -> PageResult<Option<String>> {
        self.element.attr(name).await.map_err(classify)
    }

    pub async fn is_displayed(&self) -> PageResult<bool> {
        self.element.is_displayed().await.map_err(classify)
    }

    pub async fn is_enabled(&self) -> PageResult<bool> {
        self.element.is_enabled().await.map_err(classify)
    }

    /// Native WebDriver click.
    pub async fn click(&self) -> PageResult<()> {
        self.element.click().await.map_err(classify)
    }

    pub async fn clear(&self) -> PageResult<()> {
        self.element.clear().await.map_err(classify)
    }

    pub async fn send_keys(&self, text: &str) -> PageResult<()> {
        self.element.send_keys(text).await.map_err(classify)
    }

    pub async fn select_by_index(&self, index: usize) -> PageResult<()> {
        self.element.select_by_index(index).await.map_err(classify)
    }
}
