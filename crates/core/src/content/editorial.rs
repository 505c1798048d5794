use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::venue::VenueSummary;
use super::{urls, AuthorRef, CityRef, Faq, ImageRef};
use crate::portable_text::{self, Block};

/// The five structured editorial document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditorialKind {
    Guide,
    List,
    News,
    Offer,
    DishGuide,
}

impl EditorialKind {
    pub const ALL: [EditorialKind; 5] = [
        EditorialKind::Guide,
        EditorialKind::List,
        EditorialKind::News,
        EditorialKind::Offer,
        EditorialKind::DishGuide,
    ];

    pub fn doc_type(&self) -> &'static str {
        match self {
            EditorialKind::Guide => "guide",
            EditorialKind::List => "list",
            EditorialKind::News => "news",
            EditorialKind::Offer => "offer",
            EditorialKind::DishGuide => "dishGuide",
        }
    }

    /// First path segment of the public route.
    pub fn segment(&self) -> &'static str {
        match self {
            EditorialKind::Guide => "guias",
            EditorialKind::List => "listas",
            EditorialKind::News => "noticias",
            EditorialKind::Offer => "ofertas",
            EditorialKind::DishGuide => "platos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditorialKind::Guide => "Guía",
            EditorialKind::List => "Ranking",
            EditorialKind::News => "Noticia",
            EditorialKind::Offer => "Oferta",
            EditorialKind::DishGuide => "Guía de platos",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.segment() == segment)
    }

    pub fn from_doc_type(doc_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.doc_type() == doc_type)
    }
}

impl fmt::Display for EditorialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Counters kept on editorial documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub bookmarks: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoOverrides {
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
}

/// A venue entry inside a guide or ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorialItem {
    pub venue: VenueSummary,
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default)]
    pub highlight: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorialSummary {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: EditorialKind,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stats: Stats,
}

impl EditorialSummary {
    pub fn url(&self) -> String {
        urls::editorial(self.kind, &self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Editorial {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: EditorialKind,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub city: Option<CityRef>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default)]
    pub body: Vec<Block>,
    #[serde(default)]
    pub items: Vec<EditorialItem>,
    #[serde(default)]
    pub faq: Vec<Faq>,
    #[serde(default)]
    pub seo: SeoOverrides,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stats: Stats,
    /// Offers only.
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    /// Dish guides only.
    #[serde(default)]
    pub dish: Option<String>,
    /// News only.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Editorial {
    pub fn url(&self) -> String {
        urls::editorial(self.kind, &self.slug)
    }

    /// Items by `position`, unpositioned ones last in document order.
    pub fn ranked_items(&self) -> Vec<&EditorialItem> {
        let mut items: Vec<&EditorialItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.position.unwrap_or(u32::MAX));
        items
    }

    pub fn reading_time_minutes(&self) -> u32 {
        portable_text::reading_time_minutes(&self.body)
    }

    pub fn offer_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| until < now)
    }
}
