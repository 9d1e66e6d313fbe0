//! Structured items pulled out of content containers.
use crate::cascade::{SelectorCascade, catalog};
use crate::locator::ElementLocator;
use crate::recorder::{Cell, Record};
use crate::session::{BrowserSession, SessionResult};
use sitewalk_common::row_timestamp;

const HEADING_TAGS: [&str; 4] = ["h1", "h2", "h3", "h4"];

/// Raw field text extracted from one container. Unresolved fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedItem {
    pub title: String,
    pub description: String,
    pub price: String,
    pub calories: String,
    pub servings: String,
    pub cook_time: String,
    pub difficulty: String,
    pub ingredients: String,
    pub tags: String,
    pub category: String,
    pub url: String,
    pub image_url: String,
    pub source_location: String,
    pub scraped_at: String,
}

impl ExtractedItem {
    /// Worth keeping: at least one of title, description or price resolved.
    pub fn is_meaningful(&self) -> bool {
        !(self.title.is_empty() && self.description.is_empty() && self.price.is_empty())
    }

    /// Key used to drop the same card found through several strategies.
    ///
    /// Titled items are keyed by title and link, so a card and its own
    /// heading collapse into one; untitled ones by description and price.
    pub fn fingerprint(&self) -> String {
        if self.title.is_empty() {
            format!("untitled\u{1f}{}\u{1f}{}", self.description, self.price)
        } else {
            format!("titled\u{1f}{}\u{1f}{}", self.title, self.url)
        }
    }
}

/// Category implied by the path segments of `location`.
pub fn category_for(location: &str) -> &'static str {
    let location = location.to_lowercase();
    const RULES: [(&str, &str); 9] = [
        ("keto", "Keto"),
        ("plant-based", "Plant-Based"),
        ("mediterranean", "Mediterranean"),
        ("gluten-free", "Gluten-Free"),
        ("high-protein", "High Protein"),
        ("quick-easy", "Quick & Easy"),
        ("calorie-smart", "Calorie Smart"),
        ("recipes", "Recipes"),
        ("menus", "Menus"),
    ];
    RULES
        .iter()
        .find(|(needle, _)| location.contains(needle))
        .map(|(_, category)| *category)
        .unwrap_or("General")
}

struct FieldCascades {
    title: SelectorCascade,
    description: SelectorCascade,
    price: SelectorCascade,
    calories: SelectorCascade,
    servings: SelectorCascade,
    cook_time: SelectorCascade,
    difficulty: SelectorCascade,
    ingredients: SelectorCascade,
    tags: SelectorCascade,
    link: SelectorCascade,
    image: SelectorCascade,
}

/// Reads every item field from inside a container element.
pub struct ItemExtractor {
    locator: ElementLocator,
    fields: FieldCascades,
}

impl Default for ItemExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemExtractor {
    pub fn new() -> Self {
        Self {
            locator: ElementLocator::new(),
            fields: FieldCascades {
                title: catalog::title(),
                description: catalog::description(),
                price: catalog::price(),
                calories: catalog::calories(),
                servings: catalog::servings(),
                cook_time: catalog::cook_time(),
                difficulty: catalog::difficulty(),
                ingredients: catalog::ingredients(),
                tags: catalog::tags(),
                link: catalog::link(),
                image: catalog::image(),
            },
        }
    }

    /// Extract one item from `container`.
    ///
    /// Fails only when the container itself cannot be inspected; missing
    /// fields are left empty.
    pub async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        container: &S::Element,
        source_location: &str,
    ) -> SessionResult<ExtractedItem> {
        let tag = session.tag_name(container).await?.to_ascii_lowercase();
        let scope = Some(container);
        let f = &self.fields;
        let l = &self.locator;

        let mut title = l.first_text(session, &f.title, scope).await;
        if title.is_empty() && HEADING_TAGS.contains(&tag.as_str()) {
            title = session.text(container).await?.trim().to_string();
        }
        let mut url = l.first_attribute(session, &f.link, scope, "href").await;
        if url.is_empty() && tag == "a" {
            url = session
                .attribute(container, "href")
                .await?
                .unwrap_or_default();
        }

        Ok(ExtractedItem {
            title,
            description: l.first_text(session, &f.description, scope).await,
            price: l.first_text(session, &f.price, scope).await,
            calories: l.first_text(session, &f.calories, scope).await,
            servings: l.first_text(session, &f.servings, scope).await,
            cook_time: l.first_text(session, &f.cook_time, scope).await,
            difficulty: l.first_text(session, &f.difficulty, scope).await,
            ingredients: l.first_text(session, &f.ingredients, scope).await,
            tags: l.first_text(session, &f.tags, scope).await,
            category: category_for(source_location).to_string(),
            url,
            image_url: l.first_attribute(session, &f.image, scope, "src").await,
            source_location: source_location.to_string(),
            scraped_at: row_timestamp(),
        })
    }
}

impl Record for ExtractedItem {
    fn header() -> &'static [&'static str] {
        &[
            "id",
            "title",
            "description",
            "price",
            "calories",
            "servings",
            "cook_time",
            "difficulty",
            "ingredients",
            "dietary_tags",
            "category",
            "url",
            "image_url",
            "scraped_at",
            "source_page",
        ]
    }

    fn cells(&self, row: u64) -> Vec<Cell> {
        vec![
            Cell::Raw(row.to_string()),
            Cell::Text(self.title.clone()),
            Cell::Text(self.description.clone()),
            Cell::Text(self.price.clone()),
            Cell::Text(self.calories.clone()),
            Cell::Text(self.servings.clone()),
            Cell::Text(self.cook_time.clone()),
            Cell::Text(self.difficulty.clone()),
            Cell::Text(self.ingredients.clone()),
            Cell::Text(self.tags.clone()),
            Cell::Raw(self.category.clone()),
            Cell::Raw(self.url.clone()),
            Cell::Raw(self.image_url.clone()),
            Cell::Raw(self.scraped_at.clone()),
            Cell::Raw(self.source_location.clone()),
        ]
    }
}
