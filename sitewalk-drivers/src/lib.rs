//! Driver layer for browser automation.
//!
//! This crate owns the WebDriver connection and exposes thin page/element
//! wrappers whose errors are already classified into
//! [`sitewalk_common::SessionError`].
//!
//! - [`sitewalk_browser::driver::SitewalkDriver`]: WebDriver client wrapper
//! - [`sitewalk_browser::page::SitewalkPage`]: document-level helpers
//! - [`sitewalk_browser::page::SitewalkElement`]: element-level helpers
//! - [`sitewalk_browser::stealth`]: stealth profiles and JS evasions
pub mod sitewalk_browser;
