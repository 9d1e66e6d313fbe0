//! Single interactions against one element, each producing an outcome.
use crate::outcome::{Category, ClickReport, InteractionOutcome, Trigger};
use crate::session::{BrowserSession, ScriptArg, SessionResult};
use crate::settle::{SettlePoint, Settler};
use tracing::{debug, info, warn};

const SCRIPTED_CLICK: &str = "arguments[0].click();";

/// Click `element` from inside the page, bypassing pointer hit-testing.
pub async fn scripted_click<S: BrowserSession>(
    session: &S,
    element: &S::Element,
) -> SessionResult<()> {
    session
        .run_script(SCRIPTED_CLICK, vec![ScriptArg::Element(element.clone())])
        .await
        .map(|_| ())
}

/// Performs hovers, clicks and form inputs, numbering every attempt.
///
/// None of the operations return an error: every failure, stale handles
/// included, ends up in the returned outcome.
#[derive(Debug)]
pub struct InteractionExecutor {
    attempts: u64,
    settler: Settler,
}

impl InteractionExecutor {
    pub fn new(settler: Settler) -> Self {
        Self {
            attempts: 0,
            settler,
        }
    }

    /// Number of attempt ids handed out so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    fn next_id(&mut self) -> u64 {
        self.attempts += 1;
        self.attempts
    }

    pub async fn hover<S: BrowserSession>(
        &mut self,
        session: &S,
        element: &S::Element,
        label: &str,
    ) -> InteractionOutcome {
        let location = session.current_location().await.unwrap_or_default();
        let outcome = InteractionOutcome::new(self.next_id(), Category::Hover, label).at(&location);

        let text = match session.text(element).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                debug!(target: "sitewalk.interact", label, error = %err, "hover target unreadable");
                return outcome.failure(err);
            }
        };
        let outcome = outcome.subject(&text);

        match session.hover(element).await {
            Ok(()) => {
                self.settler.settle(session, SettlePoint::Hover).await;
                debug!(target: "sitewalk.interact", label, text = %text, "hovered");
                outcome.success("Hovered")
            }
            Err(err) => {
                debug!(target: "sitewalk.interact", label, error = %err, "hover failed");
                outcome.failure(err)
            }
        }
    }

    /// Click with the short settle; reports the new location if it changed.
    pub async fn click<S: BrowserSession>(
        &mut self,
        session: &S,
        element: &S::Element,
        label: &str,
    ) -> ClickReport {
        self.trigger(session, element, label, Category::Click, SettlePoint::Click)
            .await
    }

    /// Click expected to navigate; waits the longer navigation settle.
    pub async fn click_navigate<S: BrowserSession>(
        &mut self,
        session: &S,
        element: &S::Element,
        label: &str,
    ) -> ClickReport {
        self.trigger(
            session,
            element,
            label,
            Category::ClickNavigate,
            SettlePoint::ClickNavigate,
        )
        .await
    }

    async fn trigger<S: BrowserSession>(
        &mut self,
        session: &S,
        element: &S::Element,
        label: &str,
        category: Category,
        point: SettlePoint,
    ) -> ClickReport {
        let before = session.current_location().await.unwrap_or_default();
        let outcome = InteractionOutcome::new(self.next_id(), category, label).at(&before);

        let text = match session.text(element).await {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                debug!(target: "sitewalk.interact", label, error = %err, "click target unreadable");
                return ClickReport {
                    outcome: outcome.failure(err),
                    navigated_to: None,
                };
            }
        };
        let mut outcome = outcome.subject(&text);

        let mechanism = match session.click(element).await {
            Ok(()) => Trigger::Native,
            Err(native) => {
                debug!(target: "sitewalk.interact", label, error = %native, "native click failed; trying script");
                match scripted_click(session, element).await {
                    Ok(()) => Trigger::Scripted,
                    Err(scripted) => {
                        warn!(target: "sitewalk.interact", label, error = %scripted, "click failed");
                        return ClickReport {
                            outcome: outcome.failure(scripted),
                            navigated_to: None,
                        };
                    }
                }
            }
        };
        if mechanism == Trigger::Scripted {
            outcome.label.push_str(" (JS)");
        }

        self.settler.settle(session, point).await;

        let after = match session.current_location().await {
            Ok(after) => after,
            Err(err) => {
                warn!(target: "sitewalk.interact", label, error = %err, "location unreadable after click");
                return ClickReport {
                    outcome: outcome.via(mechanism).success(before),
                    navigated_to: None,
                };
            }
        };
        let navigated_to = (after != before).then(|| after.clone());
        if let Some(target) = &navigated_to {
            info!(target: "sitewalk.interact", label, from = %before, to = %target, "click navigated");
        }
        ClickReport {
            outcome: outcome.via(mechanism).success(after),
            navigated_to,
        }
    }

    /// Clear, type `value`, read it back, then clear again.
    pub async fn fill<S: BrowserSession>(
        &mut self,
        session: &S,
        element: &S::Element,
        label: &str,
        value: &str,
    ) -> InteractionOutcome {
        let location = session.current_location().await.unwrap_or_default();
        let outcome = InteractionOutcome::new(self.next_id(), Category::Input, label)
            .at(location)
            .subject(value);
        match fill_and_read(session, element, value).await {
            Ok(read_back) => outcome.success(read_back),
            Err(err) => {
                debug!(target: "sitewalk.interact", label, error = %err, "input failed");
                outcome.failure(err)
            }
        }
    }

    /// Select the option at `index` and record its text.
    pub async fn select<S: BrowserSession>(
        &mut self,
        session: &S,
        element: &S::Element,
        label: &str,
        index: usize,
    ) -> InteractionOutcome {
        let location = session.current_location().await.unwrap_or_default();
        let outcome = InteractionOutcome::new(self.next_id(), Category::Select, label)
            .at(location)
            .subject(format!("option {index}"));
        match select_and_read(session, element, index).await {
            Ok(chosen) => outcome.success(chosen),
            Err(err) => {
                debug!(target: "sitewalk.interact", label, error = %err, "select failed");
                outcome.failure(err)
            }
        }
    }

    /// A successful extraction of `value` from `subject`.
    pub fn scraped(
        &mut self,
        label: &str,
        subject: &str,
        value: &str,
        location: &str,
    ) -> InteractionOutcome {
        InteractionOutcome::new(self.next_id(), Category::Scrape, label)
            .at(location)
            .subject(subject)
            .success(value)
    }

    /// An attempt that was deliberately not carried out.
    pub fn skipped(
        &mut self,
        category: Category,
        label: &str,
        subject: &str,
        location: &str,
        reason: &str,
    ) -> InteractionOutcome {
        let mut outcome = InteractionOutcome::new(self.next_id(), category, label)
            .at(location)
            .subject(subject);
        outcome.result = "SKIPPED".to_string();
        outcome.error_detail = reason.to_string();
        outcome
    }
}

async fn fill_and_read<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    value: &str,
) -> SessionResult<String> {
    session.clear(element).await?;
    session.type_text(element, value).await?;
    let read_back = session
        .attribute(element, "value")
        .await?
        .unwrap_or_default();
    session.clear(element).await?;
    Ok(read_back)
}

async fn select_and_read<S: BrowserSession>(
    session: &S,
    element: &S::Element,
    index: usize,
) -> SessionResult<String> {
    session.select_index(element, index).await?;
    let checked = session
        .find(&crate::session::Query::css("option:checked"), Some(element))
        .await?;
    match checked.first() {
        Some(option) => Ok(session.text(option).await?.trim().to_string()),
        None => Ok(String::new()),
    }
}
