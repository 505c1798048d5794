//! schema.org JSON-LD builders.
//!
//! Every builder returns an object with `@context` and `@type`; absent
//! data is left out rather than emitted as null.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use super::voice::generate_speakable_summary;
use crate::content::{urls, Faq, Review, Venue};

pub const CONTEXT: &str = "https://schema.org";

/// Site-wide values every builder needs for absolute URLs.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    pub base_url: &'a str,
    pub name: &'a str,
}

impl Site<'_> {
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            urls::absolute(self.base_url, path)
        }
    }

    fn organization(&self) -> Value {
        json!({
            "@type": "Organization",
            "name": self.name,
            "url": self.url("/"),
        })
    }
}

fn node(schema_type: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("@context".into(), Value::String(CONTEXT.into()));
    map.insert("@type".into(), Value::String(schema_type.into()));
    map
}

fn put<T: Into<Value>>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.into());
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn restaurant(venue: &Venue, site: &Site<'_>) -> Value {
    let mut map = node("Restaurant");
    map.insert("name".into(), json!(venue.title));
    map.insert("url".into(), json!(site.url(&venue.url())));
    put(&mut map, "description", non_empty(venue.description.as_deref()));

    if !venue.images.is_empty() {
        let images: Vec<String> = venue.images.iter().map(|i| site.url(&i.url)).collect();
        map.insert("image".into(), json!(images));
    }

    let mut address = Map::new();
    address.insert("@type".into(), json!("PostalAddress"));
    if let Some(a) = &venue.address {
        put(&mut address, "streetAddress", non_empty(a.street.as_deref()));
        put(&mut address, "postalCode", non_empty(a.postal_code.as_deref()));
        put(&mut address, "addressRegion", non_empty(a.region.as_deref()));
    }
    address.insert("addressLocality".into(), json!(venue.city.title));
    address.insert("addressCountry".into(), json!("ES"));
    map.insert("address".into(), Value::Object(address));

    if let Some(geo) = venue.geo {
        map.insert(
            "geo".into(),
            json!({"@type": "GeoCoordinates", "latitude": geo.lat, "longitude": geo.lng}),
        );
    }
    put(&mut map, "telephone", non_empty(venue.phone.as_deref()));
    put(&mut map, "priceRange", venue.price_range.map(|p| p.as_str()));
    if !venue.categories.is_empty() {
        map.insert("servesCuisine".into(), json!(venue.category_names()));
    }
    if !venue.opening_hours.is_empty() {
        let hours: Vec<Value> = venue
            .opening_hours
            .iter()
            .map(|h| {
                json!({
                    "@type": "OpeningHoursSpecification",
                    "dayOfWeek": h.days,
                    "opens": h.opens,
                    "closes": h.closes,
                })
            })
            .collect();
        map.insert("openingHoursSpecification".into(), json!(hours));
    }
    if let Some(social) = &venue.social {
        let links = social.all();
        if !links.is_empty() {
            map.insert("sameAs".into(), json!(links));
        }
    }
    if !venue.reviews.is_empty() {
        let total: f64 = venue.reviews.iter().map(|r| r.ratings.overall()).sum();
        let mean = (total / venue.reviews.len() as f64 * 10.0).round() / 10.0;
        map.insert(
            "aggregateRating".into(),
            json!({
                "@type": "AggregateRating",
                "ratingValue": mean,
                "reviewCount": venue.reviews.len(),
                "bestRating": 10,
                "worstRating": 0,
            }),
        );
    }
    Value::Object(map)
}

pub fn review(review: &Review, site: &Site<'_>) -> Value {
    let venue = &review.venue;
    let mut item = Map::new();
    item.insert("@type".into(), json!("Restaurant"));
    item.insert("name".into(), json!(venue.title));
    item.insert("url".into(), json!(site.url(&venue.url())));
    put(&mut item, "priceRange", venue.price_range.map(|p| p.as_str()));
    put(&mut item, "image", venue.image.as_ref().map(|i| site.url(&i.url)));
    let mut address = Map::new();
    address.insert("@type".into(), json!("PostalAddress"));
    if let Some(a) = &venue.address {
        put(&mut address, "streetAddress", non_empty(a.street.as_deref()));
        put(&mut address, "postalCode", non_empty(a.postal_code.as_deref()));
    }
    address.insert("addressLocality".into(), json!(venue.city.title));
    address.insert("addressCountry".into(), json!("ES"));
    item.insert("address".into(), Value::Object(address));

    let mut map = node("Review");
    map.insert("name".into(), json!(review.title));
    map.insert("url".into(), json!(site.url(&review.url())));
    map.insert("itemReviewed".into(), Value::Object(item));
    map.insert(
        "reviewRating".into(),
        json!({
            "@type": "Rating",
            "ratingValue": review.overall(),
            "bestRating": 10,
            "worstRating": 0,
        }),
    );
    put(&mut map, "reviewBody", non_empty(review.tldr.as_deref()));
    let author = match &review.author {
        Some(a) => json!({"@type": "Person", "name": a.name}),
        None => site.organization(),
    };
    map.insert("author".into(), author);
    map.insert("publisher".into(), site.organization());
    put(&mut map, "datePublished", review.published_at.map(|d| d.to_rfc3339()));
    map.insert("dateModified".into(), json!(review.updated_at.to_rfc3339()));
    map.insert(
        "speakable".into(),
        json!({
            "@type": "SpeakableSpecification",
            "cssSelector": [".speakable-summary", ".review-tldr"],
        }),
    );
    map.insert("abstract".into(), json!(generate_speakable_summary(review)));
    Value::Object(map)
}

/// Inputs shared by blog posts and editorial pages.
#[derive(Debug, Clone)]
pub struct ArticleData<'a> {
    pub headline: &'a str,
    pub description: Option<&'a str>,
    pub path: String,
    pub image: Option<&'a str>,
    pub author: Option<&'a str>,
    pub section: Option<&'a str>,
    pub keywords: &'a [String],
    pub published: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
}

pub fn article(data: &ArticleData<'_>, site: &Site<'_>) -> Value {
    let mut map = node("Article");
    map.insert("headline".into(), json!(super::truncate_at_word(data.headline, 110)));
    put(&mut map, "description", non_empty(data.description));
    let url = site.url(&data.path);
    map.insert("url".into(), json!(url));
    map.insert(
        "mainEntityOfPage".into(),
        json!({"@type": "WebPage", "@id": url}),
    );
    put(&mut map, "image", data.image.map(|i| site.url(i)));
    let author = match data.author {
        Some(name) => json!({"@type": "Person", "name": name}),
        None => site.organization(),
    };
    map.insert("author".into(), author);
    map.insert("publisher".into(), site.organization());
    put(&mut map, "articleSection", data.section);
    if !data.keywords.is_empty() {
        map.insert("keywords".into(), json!(data.keywords.join(", ")));
    }
    put(&mut map, "datePublished", data.published.map(|d| d.to_rfc3339()));
    map.insert("dateModified".into(), json!(data.modified.to_rfc3339()));
    Value::Object(map)
}

/// `crumbs` are `(name, path)` pairs from the home page down.
pub fn breadcrumbs(crumbs: &[(&str, String)], site: &Site<'_>) -> Value {
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(i, (name, path))| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": name,
                "item": site.url(path),
            })
        })
        .collect();
    let mut map = node("BreadcrumbList");
    map.insert("itemListElement".into(), json!(items));
    Value::Object(map)
}

pub fn website(site: &Site<'_>) -> Value {
    let mut map = node("WebSite");
    map.insert("name".into(), json!(site.name));
    map.insert("url".into(), json!(site.url("/")));
    map.insert("inLanguage".into(), json!("es-ES"));
    map.insert(
        "potentialAction".into(),
        json!({
            "@type": "SearchAction",
            "target": {
                "@type": "EntryPoint",
                "urlTemplate": format!("{}?q={{search_term_string}}", site.url("/buscar")),
            },
            "query-input": "required name=search_term_string",
        }),
    );
    Value::Object(map)
}

/// `None` for an empty FAQ list; an empty `FAQPage` is invalid markup.
pub fn faq_page(faqs: &[Faq]) -> Option<Value> {
    if faqs.is_empty() {
        return None;
    }
    let questions: Vec<Value> = faqs
        .iter()
        .map(|f| {
            json!({
                "@type": "Question",
                "name": f.question,
                "acceptedAnswer": {"@type": "Answer", "text": f.answer},
            })
        })
        .collect();
    let mut map = node("FAQPage");
    map.insert("mainEntity".into(), json!(questions));
    Some(Value::Object(map))
}

/// `entries` are `(name, path)` pairs in display order.
pub fn item_list(name: &str, entries: &[(String, String)], site: &Site<'_>) -> Value {
    let items: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (title, path))| {
            json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": title,
                "url": site.url(path),
            })
        })
        .collect();
    let mut map = node("ItemList");
    map.insert("name".into(), json!(name));
    map.insert("numberOfItems".into(), json!(entries.len()));
    map.insert("itemListElement".into(), json!(items));
    Value::Object(map)
}

/// A `<script type="application/ld+json">` element. `</` is escaped so
/// content cannot close the script early.
pub fn to_script(value: &Value) -> String {
    let json = value.to_string().replace("</", "<\\/");
    format!("<script type=\"application/ld+json\">{json}</script>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::review::fixtures::review as review_fixture;
    use crate::content::venue::fixtures::venue;

    const SITE: Site<'static> = Site {
        base_url: "https://sobremesa.es",
        name: "Sobremesa",
    };

    fn assert_schema(value: &Value, expected_type: &str) {
        assert_eq!(value["@context"], CONTEXT);
        assert_eq!(value["@type"], expected_type);
    }

    #[test]
    fn restaurant_has_address_and_hours() {
        let v = restaurant(&venue(), &SITE);
        assert_schema(&v, "Restaurant");
        assert_eq!(v["url"], "https://sobremesa.es/madrid/venue/casa-lucio");
        assert_eq!(v["address"]["addressLocality"], "Madrid");
        assert_eq!(v["priceRange"], "€€");
        assert_eq!(v["image"][0], "https://sobremesa.es/assets/lucio-1.jpg");
        assert_eq!(v["openingHoursSpecification"][0]["dayOfWeek"][1], "Tuesday");
        assert!(v.get("aggregateRating").is_none());
    }

    #[test]
    fn review_rates_out_of_ten() {
        let v = review(&review_fixture(), &SITE);
        assert_schema(&v, "Review");
        assert_eq!(v["reviewRating"]["ratingValue"], 8.1);
        assert_eq!(v["itemReviewed"]["name"], "Casa Lucio");
        assert_eq!(v["author"]["name"], "Lucía Martín");
    }

    #[test]
    fn website_search_action() {
        let v = website(&SITE);
        assert_schema(&v, "WebSite");
        assert_eq!(
            v["potentialAction"]["target"]["urlTemplate"],
            "https://sobremesa.es/buscar?q={search_term_string}"
        );
    }

    #[test]
    fn breadcrumbs_and_lists_are_positioned() {
        let crumbs = breadcrumbs(&[("Inicio", "/".to_string()), ("Madrid", "/madrid".to_string())], &SITE);
        assert_schema(&crumbs, "BreadcrumbList");
        assert_eq!(crumbs["itemListElement"][1]["position"], 2);
        assert_eq!(crumbs["itemListElement"][1]["item"], "https://sobremesa.es/madrid");

        let list = item_list("Madrid", &[("Casa Lucio".into(), "/madrid/venue/casa-lucio".into())], &SITE);
        assert_schema(&list, "ItemList");
        assert_eq!(list["numberOfItems"], 1);
    }

    #[test]
    fn faq_page_requires_questions() {
        assert!(faq_page(&[]).is_none());
        let v = faq_page(&[Faq {
            question: "¿Hay terraza?".into(),
            answer: "Sí".into(),
        }])
        .unwrap();
        assert_schema(&v, "FAQPage");
    }

    #[test]
    fn script_escapes_closing_tags() {
        let html = to_script(&json!({"@context": CONTEXT, "@type": "Thing", "name": "</script><b>"}));
        assert!(!html[..html.len() - "</script>".len()].contains("</"));
        let inner = html
            .trim_start_matches("<script type=\"application/ld+json\">")
            .trim_end_matches("</script>");
        let parsed: Value = serde_json::from_str(inner).unwrap();
        assert_eq!(parsed["name"], "</script><b>");
    }

    #[test]
    fn article_falls_back_to_organization_author() {
        let v = article(
            &ArticleData {
                headline: "Dónde comer cocido en Madrid",
                description: None,
                path: "/blog/cocido".into(),
                image: None,
                author: None,
                section: Some("Blog"),
                keywords: &[],
                published: None,
                modified: Utc::now(),
            },
            &SITE,
        );
        assert_schema(&v, "Article");
        assert_eq!(v["author"]["@type"], "Organization");
        assert!(v.get("description").is_none());
    }
}
