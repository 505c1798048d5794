//! Typed read models decoded from GROQ projections.
//!
//! The projections in [`crate::queries`] omit null attributes, so optional
//! fields here are `Option` or `#[serde(default)]`.

pub mod editorial;
pub mod featured;
pub mod post;
pub mod review;
pub mod venue;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use editorial::{Editorial, EditorialItem, EditorialKind, EditorialSummary, SeoOverrides, Stats};
pub use featured::{FeaturedCard, FeaturedItem, FeaturedTarget, FeaturedType};
pub use post::{Post, PostSummary};
pub use review::{Ratings, Review, ReviewSummary};
pub use venue::{Address, GeoPoint, OpeningHours, SocialLinks, Venue, VenueSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "€")]
    Budget,
    #[serde(rename = "€€")]
    Moderate,
    #[serde(rename = "€€€")]
    Upscale,
    #[serde(rename = "€€€€")]
    Luxury,
}

impl PriceRange {
    pub const ALL: [PriceRange; 4] = [
        PriceRange::Budget,
        PriceRange::Moderate,
        PriceRange::Upscale,
        PriceRange::Luxury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::Budget => "€",
            PriceRange::Moderate => "€€",
            PriceRange::Upscale => "€€€",
            PriceRange::Luxury => "€€€€",
        }
    }

    /// Accepts the euro signs or their count (`"2"`), as used in filter URLs.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .or_else(|| match s {
                "1" => Some(PriceRange::Budget),
                "2" => Some(PriceRange::Moderate),
                "3" => Some(PriceRange::Upscale),
                "4" => Some(PriceRange::Luxury),
                _ => None,
            })
    }

    pub fn level(&self) -> u8 {
        *self as u8 + 1
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl ImageRef {
    pub fn alt_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.alt.as_deref().filter(|a| !a.trim().is_empty()).unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRef {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub venue_count: u64,
    #[serde(default)]
    pub review_count: u64,
}

impl City {
    pub fn to_ref(&self) -> CityRef {
        CityRef {
            title: self.title.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Public URL paths. Slugs are already URL-safe.
pub mod urls {
    use super::EditorialKind;

    pub fn city(city: &str) -> String {
        format!("/{city}")
    }

    pub fn venue(city: &str, slug: &str) -> String {
        format!("/{city}/venue/{slug}")
    }

    pub fn reviews(city: &str) -> String {
        format!("/{city}/reviews")
    }

    pub fn review(city: &str, slug: &str) -> String {
        format!("/{city}/reviews/review/{slug}")
    }

    pub fn blog() -> String {
        "/blog".to_string()
    }

    pub fn post(slug: &str) -> String {
        format!("/blog/{slug}")
    }

    pub fn blog_tag(tag: &str) -> String {
        format!("/blog?tag={}", encode_query(tag))
    }

    pub fn editorial(kind: EditorialKind, slug: &str) -> String {
        format!("/{}/{slug}", kind.segment())
    }

    pub fn search(term: &str, tab: Option<&str>) -> String {
        match tab {
            Some(tab) => format!("/buscar?q={}&type={tab}", encode_query(term)),
            None => format!("/buscar?q={}", encode_query(term)),
        }
    }

    pub fn qr_scan(id: &str) -> String {
        format!("/q/{id}")
    }

    /// `base` + `path`, without doubling the slash.
    pub fn absolute(base: &str, path: &str) -> String {
        format!("{}{}", base.trim_end_matches('/'), path)
    }

    /// Percent-encode a query-string value (spaces as `+`).
    pub fn encode_query(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for byte in value.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                b' ' => out.push('+'),
                _ => out.push_str(&format!("%{byte:02X}")),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_range_round_trips_through_json() {
        let p: PriceRange = serde_json::from_value(json!("€€")).unwrap();
        assert_eq!(p, PriceRange::Moderate);
        assert_eq!(serde_json::to_value(PriceRange::Luxury).unwrap(), json!("€€€€"));
        assert_eq!(PriceRange::parse("3"), Some(PriceRange::Upscale));
        assert_eq!(PriceRange::parse("€€€€€"), None);
        assert_eq!(PriceRange::Budget.level(), 1);
    }

    #[test]
    fn public_urls() {
        assert_eq!(urls::venue("madrid", "casa-lucio"), "/madrid/venue/casa-lucio");
        assert_eq!(urls::review("madrid", "casa-lucio-huevos"), "/madrid/reviews/review/casa-lucio-huevos");
        assert_eq!(urls::editorial(EditorialKind::List, "mejores-tapas"), "/listas/mejores-tapas");
        assert_eq!(urls::search("paella valenciana", Some("venues")), "/buscar?q=paella+valenciana&type=venues");
        assert_eq!(urls::encode_query("caña&ración"), "ca%C3%B1a%26raci%C3%B3n");
        assert_eq!(urls::absolute("https://sobremesa.es/", "/blog"), "https://sobremesa.es/blog");
    }

    #[test]
    fn image_alt_falls_back() {
        let img = ImageRef {
            url: "/assets/a.jpg".into(),
            alt: Some("  ".into()),
            caption: None,
        };
        assert_eq!(img.alt_or("Casa Lucio"), "Casa Lucio");
    }
}
