use crate::sitewalk_browser::{
    page::SitewalkPage,
    stealth::{build_stealth_arguments, LaunchShape, StealthProfile},
};
use anyhow::{Context, Result};
use fantoccini::ClientBuilder;
use serde_json::json;
use tracing::info;
use webdriver::capabilities::Capabilities;

/// Connection settings for a WebDriver endpoint.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// e.g. `http://localhost:9515` for a local chromedriver.
    pub webdriver_url: String,
    pub stealth: StealthProfile,
    pub shape: LaunchShape,
}

/// Owns the WebDriver session for one run.
pub struct SitewalkDriver {
    page: SitewalkPage,
}

impl SitewalkDriver {
    /// Open a new session on a running WebDriver service.
    ///
    /// Failure here is fatal for a run: there is nothing to explore without a
    /// session.
    pub async fn connect(settings: &DriverSettings) -> Result<Self> {
        let args = build_stealth_arguments(settings.stealth, &settings.shape);

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&settings.webdriver_url)
            .await
            .with_context(|| format!("failed to open a session on {}", settings.webdriver_url))?;

        info!(
            target: "sitewalk.driver",
            url = %settings.webdriver_url,
            headless = settings.shape.headless,
            "webdriver session opened"
        );

        Ok(Self {
            page: SitewalkPage::new(client, settings.stealth),
        })
    }

    /// Page handle shared by every component of the run.
    pub fn page(&self) -> &SitewalkPage {
        &self.page
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.page.into_client().close().await?;
        Ok(())
    }
}
