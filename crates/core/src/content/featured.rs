use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::editorial::EditorialSummary;
use super::review::ReviewSummary;
use super::venue::VenueSummary;
use super::{urls, Category, ImageRef};

/// A carousel slot on the home page. Exactly one target is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedItem {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub title_override: Option<String>,
    #[serde(default)]
    pub description_override: Option<String>,
    #[serde(default)]
    pub image_override: Option<ImageRef>,
    #[serde(default)]
    pub active_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review: Option<ReviewSummary>,
    #[serde(default)]
    pub venue: Option<VenueSummary>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub collection: Option<EditorialSummary>,
    #[serde(default)]
    pub guide: Option<EditorialSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeaturedType {
    Review,
    Venue,
    Category,
    Collection,
    Guide,
}

impl FeaturedType {
    pub fn label(&self) -> &'static str {
        match self {
            FeaturedType::Review => "Reseña",
            FeaturedType::Venue => "Restaurante",
            FeaturedType::Category => "Categoría",
            FeaturedType::Collection => "Colección",
            FeaturedType::Guide => "Guía",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeaturedTarget<'a> {
    Review(&'a ReviewSummary),
    Venue(&'a VenueSummary),
    Category(&'a Category),
    Collection(&'a EditorialSummary),
    Guide(&'a EditorialSummary),
}

impl FeaturedTarget<'_> {
    pub fn kind(&self) -> FeaturedType {
        match self {
            FeaturedTarget::Review(_) => FeaturedType::Review,
            FeaturedTarget::Venue(_) => FeaturedType::Venue,
            FeaturedTarget::Category(_) => FeaturedType::Category,
            FeaturedTarget::Collection(_) => FeaturedType::Collection,
            FeaturedTarget::Guide(_) => FeaturedType::Guide,
        }
    }
}

/// What the carousel renders for one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturedCard {
    pub label: &'static str,
    pub title: String,
    pub description: Option<String>,
    pub image: Option<ImageRef>,
    pub href: String,
}

impl FeaturedItem {
    /// The referenced document. `None` when the reference dangles (the
    /// target was deleted or unpublished) or, against the schema, several
    /// targets are set.
    pub fn target(&self) -> Option<FeaturedTarget<'_>> {
        let targets = [
            self.review.as_ref().map(FeaturedTarget::Review),
            self.venue.as_ref().map(FeaturedTarget::Venue),
            self.category.as_ref().map(FeaturedTarget::Category),
            self.collection.as_ref().map(FeaturedTarget::Collection),
            self.guide.as_ref().map(FeaturedTarget::Guide),
        ];
        let mut set = targets.into_iter().flatten();
        match (set.next(), set.next()) {
            (Some(target), None) => Some(target),
            _ => None,
        }
    }

    /// Inside the active window: `active_from <= now < active_until`, with
    /// missing bounds open.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active_from.map_or(true, |from| from <= now)
            && self.active_until.map_or(true, |until| now < until)
    }

    pub fn card(&self) -> Option<FeaturedCard> {
        let target = self.target()?;
        let (title, description, image, href) = match target {
            FeaturedTarget::Review(r) => (r.title.clone(), r.tldr.clone(), r.image.clone(), r.url()),
            FeaturedTarget::Venue(v) => (v.title.clone(), v.description.clone(), v.image.clone(), v.url()),
            FeaturedTarget::Category(c) => (
                c.title.clone(),
                c.description.clone(),
                None,
                urls::search(&c.title, Some("venues")),
            ),
            FeaturedTarget::Collection(e) | FeaturedTarget::Guide(e) => {
                (e.title.clone(), e.excerpt.clone(), e.image.clone(), e.url())
            }
        };
        Some(FeaturedCard {
            label: target.kind().label(),
            title: self.title_override.clone().unwrap_or(title),
            description: self.description_override.clone().or(description),
            image: self.image_override.clone().or(image),
            href,
        })
    }
}

/// Live slots with a resolvable target, by `order`.
pub fn active_cards(items: &[FeaturedItem], now: DateTime<Utc>) -> Vec<FeaturedCard> {
    let mut live: Vec<&FeaturedItem> = items.iter().filter(|i| i.is_live(now)).collect();
    live.sort_by_key(|i| i.order);
    live.into_iter().filter_map(FeaturedItem::card).collect()
}
