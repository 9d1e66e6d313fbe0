//! Immutable records of attempted interactions and extractions.
use sitewalk_common::row_timestamp;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Hover,
    Click,
    ClickNavigate,
    Scrape,
    Input,
    Select,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Click => "click",
            Self::ClickNavigate => "click_navigate",
            Self::Scrape => "scrape",
            Self::Input => "input",
            Self::Select => "select",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which click mechanism took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Native,
    Scripted,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Scripted => "script",
        }
    }
}

/// One attempted interaction or extraction, success or failure.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionOutcome {
    pub attempt_id: u64,
    pub category: Category,
    pub label: String,
    pub subject_text: String,
    /// Resulting location for clicks, extracted value for scrapes and inputs.
    pub result: String,
    pub succeeded: bool,
    pub error_detail: String,
    pub location_before: String,
    pub timestamp: String,
    pub mechanism: Option<Trigger>,
}

impl InteractionOutcome {
    pub(crate) fn new(attempt_id: u64, category: Category, label: impl Into<String>) -> Self {
        Self {
            attempt_id,
            category,
            label: label.into(),
            subject_text: String::new(),
            result: String::new(),
            succeeded: false,
            error_detail: String::new(),
            location_before: String::new(),
            timestamp: row_timestamp(),
            mechanism: None,
        }
    }

    pub(crate) fn subject(mut self, text: impl Into<String>) -> Self {
        self.subject_text = text.into();
        self
    }

    pub(crate) fn at(mut self, location: impl Into<String>) -> Self {
        self.location_before = location.into();
        self
    }

    pub(crate) fn success(mut self, result: impl Into<String>) -> Self {
        self.succeeded = true;
        self.result = result.into();
        self
    }

    pub(crate) fn failure(mut self, error: impl fmt::Display) -> Self {
        self.succeeded = false;
        self.result = "FAILED".to_string();
        self.error_detail = error.to_string();
        self
    }

    pub(crate) fn via(mut self, trigger: Trigger) -> Self {
        self.mechanism = Some(trigger);
        self
    }
}

/// Outcome of a click plus the location it led to, when it changed.
#[derive(Debug, Clone)]
pub struct ClickReport {
    pub outcome: InteractionOutcome,
    pub navigated_to: Option<String>,
}

impl ClickReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.succeeded
    }
}
