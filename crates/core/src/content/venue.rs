use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::review::{Ratings, ReviewSummary};
use super::{urls, Category, CityRef, Faq, ImageRef, PriceRange};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl Address {
    /// "Cava Baja 35, 28005" style one-liner, skipping missing parts.
    pub fn one_line(&self) -> Option<String> {
        let parts: Vec<&str> = [self.street.as_deref(), self.postal_code.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One opening slot, e.g. Monday to Friday 13:00 to 16:00.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    /// English day names, as schema.org expects.
    pub days: Vec<String>,
    pub opens: String,
    pub closes: String,
}

impl OpeningHours {
    pub fn day_label(day: &str) -> &str {
        match day {
            "Monday" => "lunes",
            "Tuesday" => "martes",
            "Wednesday" => "miércoles",
            "Thursday" => "jueves",
            "Friday" => "viernes",
            "Saturday" => "sábado",
            "Sunday" => "domingo",
            other => other,
        }
    }

    /// "lunes, martes: 13:00–16:00"
    pub fn describe(&self) -> String {
        let days: Vec<&str> = self.days.iter().map(|d| Self::day_label(d)).collect();
        format!("{}: {}–{}", days.join(", "), self.opens, self.closes)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
}

impl SocialLinks {
    pub fn all(&self) -> Vec<&str> {
        [&self.website, &self.instagram, &self.facebook]
            .into_iter()
            .filter_map(|l| l.as_deref())
            .collect()
    }
}

/// Card-sized venue data for listings and search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub city: CityRef,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub latest_ratings: Option<Ratings>,
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
}

impl VenueSummary {
    /// Overall score of the most recent review.
    pub fn rating(&self) -> Option<f64> {
        self.latest_ratings.as_ref().map(Ratings::overall)
    }

    pub fn url(&self) -> String {
        urls::venue(&self.city.slug, &self.slug)
    }

    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub city: CityRef,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub opening_hours: Vec<OpeningHours>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub social: Option<SocialLinks>,
    #[serde(default)]
    pub faq: Vec<Faq>,
    /// Published reviews of this venue, newest first.
    #[serde(default)]
    pub reviews: Vec<ReviewSummary>,
    #[serde(rename = "_updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Venue {
    pub fn url(&self) -> String {
        urls::venue(&self.city.slug, &self.slug)
    }

    pub fn latest_review(&self) -> Option<&ReviewSummary> {
        self.reviews.first()
    }

    pub fn rating(&self) -> Option<f64> {
        self.latest_review().map(|r| r.ratings.overall())
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.title.as_str()).collect()
    }

    /// Gallery position for `?foto=n`, wrapping in both directions.
    pub fn photo_index(&self, requested: i64) -> usize {
        let len = self.images.len() as i64;
        if len == 0 {
            return 0;
        }
        requested.rem_euclid(len) as usize
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub fn venue() -> Venue {
        serde_json::from_value(json!({
            "_id": "venue-casa-lucio",
            "_updatedAt": "2024-05-01T10:00:00Z",
            "title": "Casa Lucio",
            "slug": "casa-lucio",
            "city": {"title": "Madrid", "slug": "madrid"},
            "description": "Taberna castiza famosa por sus huevos rotos.",
            "address": {"street": "Calle Cava Baja 35", "postalCode": "28005", "neighborhood": "La Latina"},
            "geo": {"lat": 40.4125, "lng": -3.7088},
            "phone": "+34 913 65 32 52",
            "priceRange": "€€",
            "categories": [
                {"title": "Cocina castellana", "slug": "castellana"},
                {"title": "Tapas", "slug": "tapas"}
            ],
            "openingHours": [{"days": ["Monday", "Tuesday"], "opens": "13:00", "closes": "16:00"}],
            "images": [
                {"url": "/assets/lucio-1.jpg", "alt": "Huevos rotos"},
                {"url": "/assets/lucio-2.jpg"}
            ],
            "social": {"website": "https://casalucio.es"}
        }))
        .unwrap()
    }
}
