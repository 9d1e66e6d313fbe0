//! Best-effort guard against clicking destructive controls.
//!
//! The check is a keyword heuristic over the element's text and class
//! attribute. It catches the obvious cases ("Delete", `class="remove-item"`)
//! and nothing else; it is not a guarantee that a click is harmless.
use crate::session::{BrowserSession, SessionResult};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SafetyClassifier {
    deny_tokens: Vec<String>,
}

impl Default for SafetyClassifier {
    fn default() -> Self {
        Self::new(["delete", "remove", "cancel"])
    }
}

impl SafetyClassifier {
    pub fn new<I, T>(deny_tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self {
            deny_tokens: deny_tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Whether `element` may be clicked. Inspection errors count as unsafe.
    pub async fn is_safe_to_trigger<S: BrowserSession>(
        &self,
        session: &S,
        element: &S::Element,
    ) -> bool {
        match self.inspect(session, element).await {
            Ok(safe) => safe,
            Err(err) => {
                debug!(target: "sitewalk.safety", error = %err, "inspection failed; treating as unsafe");
                false
            }
        }
    }

    async fn inspect<S: BrowserSession>(
        &self,
        session: &S,
        element: &S::Element,
    ) -> SessionResult<bool> {
        let tag = session.tag_name(element).await?;
        let text = session.text(element).await?;
        let class = session.attribute(element, "class").await?.unwrap_or_default();
        let role = session.attribute(element, "role").await?.unwrap_or_default();
        Ok(self.verdict(&tag, &text, &class, &role))
    }

    /// The decision itself, on already-read element properties.
    pub fn verdict(&self, tag: &str, text: &str, class: &str, role: &str) -> bool {
        if self.is_denied(text) || self.is_denied(class) {
            return false;
        }
        let tag = tag.to_ascii_lowercase();
        let role = role.trim().to_ascii_lowercase();
        tag == "a" || tag == "button" || role == "link" || role == "button"
    }

    fn is_denied(&self, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        self.deny_tokens.iter().any(|t| haystack.contains(t.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_tokens_match_any_case() {
        let safety = SafetyClassifier::default();
        for text in ["Delete", "DELETE account", "remove", "ReMoVe item", "Cancel order"] {
            assert!(!safety.verdict("button", text, "", ""), "{text} should be unsafe");
        }
        for class in ["btn delete-btn", "Remove-Link", "CANCEL"] {
            assert!(!safety.verdict("a", "Go", class, ""), "{class} should be unsafe");
        }
    }

    #[test]
    fn only_links_and_buttons_are_triggered() {
        let safety = SafetyClassifier::default();
        assert!(safety.verdict("a", "Shop", "", ""));
        assert!(safety.verdict("BUTTON", "Order", "primary", ""));
        assert!(safety.verdict("div", "Open", "", "button"));
        assert!(safety.verdict("span", "Menus", "", "link"));
        assert!(!safety.verdict("div", "Open", "", ""));
        assert!(!safety.verdict("input", "", "", ""));
    }

    #[test]
    fn custom_deny_list_replaces_defaults() {
        let safety = SafetyClassifier::new(["Unsubscribe", "  "]);
        assert!(safety.verdict("a", "Delete", "", ""));
        assert!(!safety.verdict("a", "unsubscribe now", "", ""));
    }
}
