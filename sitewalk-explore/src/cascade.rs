//! Selector strategies and the ordered cascades built from them.
use crate::session::Query;

/// How an attribute value is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrMatch {
    Equals,
    Contains,
}

/// One way of finding candidate elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorStrategy {
    /// Every element with this tag.
    ByTag(String),
    ById(String),
    /// Exact class token (`.price`).
    ByClass(String),
    /// Class attribute containing a fragment (`[class*='price']`).
    ByClassPattern(String),
    /// Attribute test, optionally restricted to a tag.
    ByAttribute {
        tag: Option<String>,
        name: String,
        op: AttrMatch,
        value: Option<String>,
    },
    /// Elements of `tags` whose text contains any of `needles`.
    ByText { tags: Vec<String>, needles: Vec<String> },
    /// A structural CSS pattern (descendant combinators and the like).
    ByStructure(String),
}

impl SelectorStrategy {
    pub fn tag(tag: &str) -> Self {
        Self::ByTag(tag.to_string())
    }

    pub fn id(id: &str) -> Self {
        Self::ById(id.to_string())
    }

    pub fn class(class: &str) -> Self {
        Self::ByClass(class.to_string())
    }

    pub fn class_pattern(fragment: &str) -> Self {
        Self::ByClassPattern(fragment.to_string())
    }

    /// `[name]` or `tag[name]`.
    pub fn has_attr(tag: Option<&str>, name: &str) -> Self {
        Self::ByAttribute {
            tag: tag.map(String::from),
            name: name.to_string(),
            op: AttrMatch::Equals,
            value: None,
        }
    }

    pub fn attr_eq(tag: Option<&str>, name: &str, value: &str) -> Self {
        Self::ByAttribute {
            tag: tag.map(String::from),
            name: name.to_string(),
            op: AttrMatch::Equals,
            value: Some(value.to_string()),
        }
    }

    pub fn attr_contains(tag: Option<&str>, name: &str, value: &str) -> Self {
        Self::ByAttribute {
            tag: tag.map(String::from),
            name: name.to_string(),
            op: AttrMatch::Contains,
            value: Some(value.to_string()),
        }
    }

    pub fn text(tags: &[&str], needles: &[&str]) -> Self {
        Self::ByText {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            needles: needles.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn structure(css: &str) -> Self {
        Self::ByStructure(css.to_string())
    }

    /// Compile into the query a session understands.
    pub fn to_query(&self) -> Query {
        match self {
            Self::ByTag(tag) => Query::css(tag.clone()),
            Self::ById(id) => Query::css(format!("#{id}")),
            Self::ByClass(class) => Query::css(format!(".{class}")),
            Self::ByClassPattern(fragment) => {
                Query::css(format!("[class*={}]", css_string(fragment)))
            }
            Self::ByAttribute {
                tag,
                name,
                op,
                value,
            } => {
                let tag = tag.as_deref().unwrap_or("");
                let test = match (op, value) {
                    (_, None) => name.clone(),
                    (AttrMatch::Equals, Some(v)) => format!("{name}={}", css_string(v)),
                    (AttrMatch::Contains, Some(v)) => format!("{name}*={}", css_string(v)),
                };
                Query::css(format!("{tag}[{test}]"))
            }
            Self::ByText { tags, needles } => {
                let predicate = needles
                    .iter()
                    .map(|n| format!("contains(., {})", xpath_string(n)))
                    .collect::<Vec<_>>()
                    .join(" or ");
                let expr = tags
                    .iter()
                    .map(|t| format!("//{t}[{predicate}]"))
                    .collect::<Vec<_>>()
                    .join(" | ");
                Query::xpath(expr)
            }
            Self::ByStructure(css) => Query::css(css.clone()),
        }
    }
}

fn css_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn xpath_string(value: &str) -> String {
    if value.contains('\'') {
        format!("\"{value}\"")
    } else {
        format!("'{value}'")
    }
}

/// Ordered strategies for one logical hint; the first live match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorCascade {
    name: &'static str,
    strategies: Vec<SelectorStrategy>,
}

impl SelectorCascade {
    pub fn new(name: &'static str, strategies: Vec<SelectorStrategy>) -> Self {
        Self { name, strategies }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn strategies(&self) -> &[SelectorStrategy] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// The cascades the engine ships with.
pub mod catalog {
    use super::{SelectorCascade, SelectorStrategy as S};

    /// Class names, class fragments and test hooks for one item field.
    fn field(name: &'static str, classes: &[&str], fragment: &str) -> SelectorCascade {
        let mut strategies: Vec<S> = classes.iter().map(|c| S::class(c)).collect();
        strategies.push(S::class_pattern(fragment));
        strategies.push(S::attr_contains(None, "data-test", fragment));
        strategies.push(S::attr_contains(None, "data-testid", fragment));
        SelectorCascade::new(name, strategies)
    }

    pub fn title() -> SelectorCascade {
        SelectorCascade::new(
            "title",
            vec![
                S::tag("h1"),
                S::tag("h2"),
                S::tag("h3"),
                S::tag("h4"),
                S::class("title"),
                S::class("name"),
                S::class("card-title"),
                S::attr_contains(None, "data-test", "title"),
                S::attr_contains(None, "data-testid", "title"),
            ],
        )
    }

    pub fn description() -> SelectorCascade {
        SelectorCascade::new(
            "description",
            vec![
                S::tag("p"),
                S::class("description"),
                S::class("desc"),
                S::class("summary"),
                S::class("card-description"),
                S::attr_contains(None, "data-test", "description"),
                S::attr_contains(None, "data-testid", "description"),
            ],
        )
    }

    pub fn price() -> SelectorCascade {
        field("price", &["price", "cost", "amount"], "price")
    }

    pub fn calories() -> SelectorCascade {
        field("calories", &["calories", "cal"], "calorie")
    }

    pub fn servings() -> SelectorCascade {
        field("servings", &["servings", "serving"], "serving")
    }

    pub fn cook_time() -> SelectorCascade {
        field("cook_time", &["time", "cook-time", "duration"], "time")
    }

    pub fn difficulty() -> SelectorCascade {
        field("difficulty", &["difficulty", "level"], "difficulty")
    }

    pub fn ingredients() -> SelectorCascade {
        field("ingredients", &["ingredients", "ingredient-list"], "ingredient")
    }

    pub fn tags() -> SelectorCascade {
        field("tags", &["tags", "dietary", "badges"], "tag")
    }

    pub fn link() -> SelectorCascade {
        SelectorCascade::new("link", vec![S::tag("a")])
    }

    pub fn image() -> SelectorCascade {
        SelectorCascade::new("image", vec![S::tag("img")])
    }

    pub fn close_overlay() -> SelectorCascade {
        SelectorCascade::new(
            "close-overlay",
            vec![
                S::attr_eq(Some("button"), "aria-label", "Close"),
                S::structure(".modal .close"),
                S::structure(".modal .close-btn"),
                S::structure(".overlay .close"),
                S::structure(".overlay .close-btn"),
                S::id("onetrust-accept-btn-handler"),
                S::class("cookie"),
                S::class("cookies"),
                S::structure(".cookie-banner button"),
                S::attr_contains(None, "data-test", "close"),
                S::attr_contains(None, "data-testid", "close"),
                S::class("popup-close"),
                S::class("banner-close"),
            ],
        )
    }

    pub fn next_page() -> SelectorCascade {
        SelectorCascade::new(
            "next-page",
            vec![
                S::attr_contains(Some("button"), "aria-label", "Next"),
                S::class("pagination-next"),
                S::class("next-page"),
                S::attr_contains(None, "data-test", "next"),
                S::attr_contains(None, "data-testid", "next"),
                S::text(&["button"], &["Next", "More"]),
                S::text(&["a"], &["Next", "More"]),
            ],
        )
    }

    /// Everything a visitor could plausibly click.
    pub fn clickable() -> SelectorCascade {
        SelectorCascade::new(
            "clickable",
            vec![
                S::has_attr(Some("a"), "href"),
                S::tag("button"),
                S::attr_eq(Some("input"), "type", "button"),
                S::attr_eq(Some("input"), "type", "submit"),
                S::has_attr(None, "onclick"),
                S::attr_eq(None, "role", "button"),
                S::class("btn"),
                S::class("button"),
                S::attr_contains(None, "data-test", "button"),
                S::attr_contains(None, "data-testid", "button"),
                // anchors driven by script handlers rather than href
                S::tag("a"),
            ],
        )
    }

    pub fn links() -> SelectorCascade {
        SelectorCascade::new("links", vec![S::has_attr(Some("a"), "href")])
    }

    pub fn buttons() -> SelectorCascade {
        SelectorCascade::new(
            "buttons",
            vec![
                S::tag("button"),
                S::attr_eq(Some("input"), "type", "button"),
                S::attr_eq(Some("input"), "type", "submit"),
            ],
        )
    }

    pub fn navigation() -> SelectorCascade {
        SelectorCascade::new(
            "navigation",
            vec![
                S::structure("nav a"),
                S::structure(".nav a"),
                S::structure(".navigation a"),
                S::structure(".menu a"),
            ],
        )
    }

    /// Links and buttons on a section page.
    pub fn page_elements() -> SelectorCascade {
        SelectorCascade::new(
            "page-elements",
            vec![S::has_attr(Some("a"), "href"), S::tag("button")],
        )
    }

    pub fn text_inputs() -> SelectorCascade {
        SelectorCascade::new(
            "text-inputs",
            vec![
                S::attr_eq(Some("input"), "type", "text"),
                S::attr_eq(Some("input"), "type", "email"),
                S::attr_eq(Some("input"), "type", "search"),
                S::tag("textarea"),
            ],
        )
    }

    pub fn selects() -> SelectorCascade {
        SelectorCascade::new("selects", vec![S::tag("select")])
    }

    pub fn headings() -> SelectorCascade {
        SelectorCascade::new(
            "headings",
            vec![S::tag("h1"), S::tag("h2"), S::tag("h3"), S::tag("h4")],
        )
    }

    pub fn paragraphs() -> SelectorCascade {
        SelectorCascade::new("paragraphs", vec![S::tag("p")])
    }

    /// Containers that usually hold one recipe, menu entry or product.
    pub fn content() -> SelectorCascade {
        SelectorCascade::new(
            "content",
            vec![
                S::attr_contains(None, "data-test", "recipe"),
                S::attr_contains(None, "data-testid", "recipe"),
                S::attr_contains(Some("article"), "class", "recipe"),
                S::attr_contains(Some("div"), "class", "recipe"),
                S::class("recipe-card"),
                S::class("meal-card"),
                S::class("menu-item"),
                S::attr_contains(Some("a"), "href", "/recipes/"),
                S::class("meal-plan-item"),
                S::class_pattern("menu"),
                S::class_pattern("meal"),
                S::class("product-card"),
                S::class("card"),
                S::class_pattern("product"),
                S::class_pattern("item"),
                S::tag("h1"),
                S::tag("h2"),
                S::tag("h3"),
                S::tag("h4"),
            ],
        )
    }
}
