use anyhow::{Context, Result};
use sitewalk_common::SitewalkError;
use sitewalk_config::{SitewalkConfig, StealthLevel};
use sitewalk_drivers::sitewalk_browser::{
    driver::{DriverSettings, SitewalkDriver},
    stealth::{LaunchShape, StealthProfile},
};
use sitewalk_explore::artifacts::RunArtifacts;
use sitewalk_explore::browser::FantocciniSession;
use sitewalk_explore::item::ExtractedItem;
use sitewalk_explore::outcome::InteractionOutcome;
use sitewalk_explore::recorder::{CsvSink, Record};
use sitewalk_explore::{Explorer, RunSummary};
use std::fs::File;
use tracing::{info, warn};
use url::Url;

struct Outputs {
    artifacts: RunArtifacts,
    interactions: CsvSink<File>,
    items: CsvSink<File>,
}

fn stealth_profile(level: StealthLevel) -> StealthProfile {
    match level {
        StealthLevel::Lightweight => StealthProfile::Lightweight,
        StealthLevel::Balanced => StealthProfile::Balanced,
        StealthLevel::Maximum => StealthProfile::Maximum,
    }
}

fn driver_settings(cfg: &SitewalkConfig) -> DriverSettings {
    DriverSettings {
        webdriver_url: cfg.browser.webdriver_url.clone(),
        stealth: stealth_profile(cfg.browser.stealth),
        shape: LaunchShape {
            window: (cfg.browser.window_width, cfg.browser.window_height),
            headless: cfg.browser.headless,
            user_agent: cfg.browser.user_agent.clone(),
        },
    }
}

fn check(cfg: &SitewalkConfig) -> sitewalk_common::Result<()> {
    let base = &cfg.run.base_location;
    Url::parse(base).map_err(|e| SitewalkError::Config(format!("run.base_location {base:?}: {e}")))?;
    if let Some(bad) = cfg
        .run
        .effective_targets()
        .into_iter()
        .find(|t| Url::parse(t).is_err())
    {
        return Err(SitewalkError::Config(format!("run.targets entry {bad:?} is not a URL")));
    }
    Ok(())
}

fn open_outputs(cfg: &SitewalkConfig) -> sitewalk_common::Result<Outputs> {
    let artifacts = RunArtifacts::create(&cfg.output.dir)?;
    let interactions =
        CsvSink::<File>::create(&artifacts.table("interactions"), InteractionOutcome::header())?;
    let items = CsvSink::<File>::create(&artifacts.table("items"), ExtractedItem::header())?;
    Ok(Outputs {
        artifacts,
        interactions,
        items,
    })
}

async fn connect(cfg: &SitewalkConfig) -> sitewalk_common::Result<SitewalkDriver> {
    SitewalkDriver::connect(&driver_settings(cfg))
        .await
        .map_err(SitewalkError::Init)
}

fn write_summary(artifacts: &RunArtifacts, summary: &RunSummary) -> Result<()> {
    let path = artifacts
        .dir()
        .join(format!("summary_{}.json", artifacts.stamp()));
    let file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

/// Connect, run the configured mode to completion and close the session.
///
/// Only setup failures are returned; everything after the first navigation is
/// absorbed by the explorer and shows up in the summary.
pub async fn run(cfg: SitewalkConfig) -> Result<()> {
    check(&cfg)?;
    let Outputs {
        artifacts,
        interactions,
        items,
    } = open_outputs(&cfg)
        .with_context(|| format!("failed to prepare output in {}", cfg.output.dir.display()))?;
    let driver = connect(&cfg).await?;
    let session = FantocciniSession::new(driver.page().clone());

    let mut explorer = Explorer::new(session, &cfg)
        .with_interaction_sink(Box::new(interactions))
        .with_item_sink(Box::new(items))
        .with_artifacts(artifacts.clone());
    info!(
        target: "sitewalk.app",
        run_id = %explorer.run_id(),
        mode = ?cfg.run.mode,
        base = %cfg.run.base_location,
        out = %artifacts.dir().display(),
        "app.start"
    );

    let summary = explorer.run().await;
    drop(explorer);

    if let Err(e) = write_summary(&artifacts, &summary) {
        warn!(target: "sitewalk.app", error = %e, "summary.write_failed");
    }
    if let Err(e) = driver.close().await {
        warn!(target: "sitewalk.app", error = %e, "driver.close_failed");
    }

    info!(
        target: "sitewalk.app",
        visited = summary.visited,
        outcomes = summary.outcomes,
        failed = summary.failed,
        items = summary.items_kept,
        "app.done"
    );
    Ok(())
}
