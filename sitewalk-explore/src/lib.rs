//! Element discovery, interaction and extraction over a browser session.
//!
//! - Browser capability trait and fantoccini-backed implementation (`session`, `browser`)
//! - Selector cascades and their evaluation (`cascade`, `locator`)
//! - Click safety heuristic (`safety`) and settle waits (`settle`)
//! - Single interactions and their outcomes (`executor`, `outcome`)
//! - Visited set, pagination and item extraction (`visits`, `pagination`, `item`)
//! - Result rows and run artifacts (`recorder`, `artifacts`)
//! - The run state machine (`orchestrator`)

pub mod artifacts;
pub mod browser;
pub mod cascade;
pub mod executor;
pub mod item;
pub mod locator;
pub mod orchestrator;
pub mod outcome;
pub mod pagination;
pub mod recorder;
pub mod safety;
pub mod session;
pub mod settle;
pub mod visits;

pub use orchestrator::{Explorer, ExplorerSettings, Phase, RunSummary};
pub use session::{BrowserSession, Query, ScriptArg, SessionResult};
