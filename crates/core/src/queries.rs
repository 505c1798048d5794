//! GROQ queries behind every public page, with typed fetch wrappers.
//!
//! Projections are shared through macros so `concat!` can assemble each
//! query at compile time.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::ContentClient;
use crate::content::{
    urls, City, Editorial, EditorialKind, EditorialSummary, FeaturedItem, Post, PostSummary, Review,
    ReviewSummary, Venue, VenueSummary,
};
use crate::ContentError;

macro_rules! image {
    () => {
        r#"{"url": coalesce(asset->url, url), alt, caption}"#
    };
}

macro_rules! category {
    () => {
        r#"{title, "slug": slug.current, description}"#
    };
}

macro_rules! city_ref {
    () => {
        r#"{title, "slug": slug.current}"#
    };
}

macro_rules! venue_summary {
    () => {
        concat!(
            r#"{_id, _createdAt, title, "slug": slug.current, "city": city->"#,
            city_ref!(),
            r#", description, priceRange, "categories": categories[]->[defined(_id)]"#,
            category!(),
            r#", "image": images[defined(asset) || defined(url)][0]"#,
            image!(),
            r#", address, "latestRatings": *[_type == "review" && venue._ref == ^._id] | order(coalesce(publishedAt, _createdAt) desc)[0].ratings}"#
        )
    };
}

macro_rules! review_summary {
    () => {
        concat!(
            r#"{_id, title, "slug": slug.current, "venueTitle": venue->title, "city": venue->city->"#,
            city_ref!(),
            r#", ratings, tldr, publishedAt, "image": coalesce(gallery[0], venue->images[0])"#,
            image!(),
            "}"
        )
    };
}

macro_rules! post_summary {
    () => {
        concat!(
            r#"{_id, title, "slug": slug.current, excerpt, "image": image"#,
            image!(),
            r#", tags, "author": author->{name, "slug": slug.current}, publishedAt}"#
        )
    };
}

macro_rules! editorial_summary {
    () => {
        concat!(
            r#"{_id, _type, title, "slug": slug.current, excerpt, "image": image"#,
            image!(),
            r#", publishedAt, stats}"#
        )
    };
}

macro_rules! venue_filter {
    () => {
        r#"_type == "venue" && defined(slug.current) && defined(city->slug.current)"#
    };
}

macro_rules! review_filter {
    () => {
        r#"_type == "review" && defined(slug.current) && defined(venue->city->slug.current)"#
    };
}

macro_rules! editorial_types {
    () => {
        r#"["guide", "list", "news", "offer", "dishGuide"]"#
    };
}

macro_rules! newest_first {
    () => {
        "order(coalesce(publishedAt, _createdAt) desc)"
    };
}

pub const CITIES: &str = concat!(
    r#"*[_type == "city" && defined(slug.current)] | order(title asc){_id, title, "slug": slug.current, description, "image": image"#,
    image!(),
    r#", "venueCount": count(*[_type == "venue" && city._ref == ^._id]), "reviewCount": count(*[_type == "review" && venue->city._ref == ^._id])}"#
);

pub const CITY_BY_SLUG: &str = concat!(
    r#"*[_type == "city" && slug.current == $city][0]{_id, title, "slug": slug.current, description, "image": image"#,
    image!(),
    r#", "venueCount": count(*[_type == "venue" && city._ref == ^._id]), "reviewCount": count(*[_type == "review" && venue->city._ref == ^._id])}"#
);

pub const VENUES_BY_CITY: &str = concat!(
    "*[",
    venue_filter!(),
    r#" && city->slug.current == $city] | order(title asc)"#,
    venue_summary!()
);

pub const VENUE_BY_SLUG: &str = concat!(
    "*[",
    venue_filter!(),
    r#" && city->slug.current == $city && slug.current == $slug][0]{_id, _updatedAt, title, "slug": slug.current, "city": city->"#,
    city_ref!(),
    r#", description, address, geo, phone, priceRange, "categories": categories[]->[defined(_id)]"#,
    category!(),
    r#", openingHours, "images": images[defined(asset) || defined(url)]"#,
    image!(),
    r#", social, faq, "reviews": *["#,
    review_filter!(),
    r#" && venue._ref == ^._id] | "#,
    newest_first!(),
    review_summary!(),
    "}"
);

pub const REVIEWS_BY_CITY: &str = concat!(
    "*[",
    review_filter!(),
    r#" && venue->city->slug.current == $city] | "#,
    newest_first!(),
    review_summary!()
);

pub const LATEST_REVIEWS: &str = concat!(
    "*[",
    review_filter!(),
    "] | ",
    newest_first!(),
    "[0...6]",
    review_summary!()
);

pub const REVIEW_BY_SLUG: &str = concat!(
    "*[",
    review_filter!(),
    r#" && venue->city->slug.current == $city && slug.current == $slug][0]{_id, _updatedAt, title, "slug": slug.current, "venue": venue->"#,
    venue_summary!(),
    r#", ratings, tldr, body, pros, cons, "gallery": gallery[defined(asset) || defined(url)]"#,
    image!(),
    r#", "author": author->{name, "slug": slug.current}, faq, publishedAt, visitDate}"#
);

pub const POSTS: &str = concat!(
    r#"*[_type == "post" && defined(slug.current)] | "#,
    newest_first!(),
    post_summary!()
);

pub const LATEST_POSTS: &str = concat!(
    r#"*[_type == "post" && defined(slug.current)] | "#,
    newest_first!(),
    "[0...3]",
    post_summary!()
);

pub const POST_BY_SLUG: &str = concat!(
    r#"*[_type == "post" && slug.current == $slug][0]{_id, _updatedAt, title, "slug": slug.current, excerpt, "image": image"#,
    image!(),
    r#", tags, "author": author->{name, "slug": slug.current}, body, faq, publishedAt}"#
);

pub const EDITORIAL_BY_SLUG: &str = concat!(
    r#"*[_type == $type && slug.current == $slug && published == true][0]{_id, _type, _updatedAt, title, "slug": slug.current, excerpt, "image": image"#,
    image!(),
    r#", "city": city->"#,
    city_ref!(),
    r#", "author": author->{name, "slug": slug.current}, body, "items": items[defined(venue->city->slug.current)]{"venue": venue->"#,
    venue_summary!(),
    r#", position, highlight, note}, faq, seo, featured, publishedAt, stats, discount, terms, validUntil, dish, source}"#
);

pub const LATEST_EDITORIAL: &str = concat!(
    "*[_type in ",
    editorial_types!(),
    r#" && published == true && defined(slug.current)] | "#,
    newest_first!(),
    "[0...6]",
    editorial_summary!()
);

pub const FEATURED_ITEMS: &str = concat!(
    r#"*[_type == "featuredItem"] | order(order asc){_id, order, titleOverride, descriptionOverride, "imageOverride": imageOverride"#,
    image!(),
    r#", activeFrom, activeUntil, "review": review->"#,
    review_summary!(),
    r#", "venue": venue->"#,
    venue_summary!(),
    r#", "category": category->"#,
    category!(),
    r#", "collection": *[_id == ^.collection._ref && published == true][0]"#,
    editorial_summary!(),
    r#", "guide": *[_id == ^.guide._ref && published == true][0]"#,
    editorial_summary!(),
    "}"
);

pub const SITEMAP: &str = concat!(
    r#"{"cities": *[_type == "city" && defined(slug.current)]{"slug": slug.current, _updatedAt}, "venues": *["#,
    venue_filter!(),
    r#"]{"slug": slug.current, "city": city->slug.current, _updatedAt}, "reviews": *["#,
    review_filter!(),
    r#"]{"slug": slug.current, "city": venue->city->slug.current, _updatedAt}, "posts": *[_type == "post" && defined(slug.current)]{"slug": slug.current, _updatedAt}, "editorial": *[_type in "#,
    editorial_types!(),
    r#" && published == true && defined(slug.current)]{_type, "slug": slug.current, _updatedAt}}"#
);

pub const SEARCH_VENUES: &str = concat!(
    "*[",
    venue_filter!(),
    r#" && (title match $term || description match $term || city->title match $term || categories[]->title match $term)] | order(title asc)[0...20]"#,
    venue_summary!()
);

pub const SEARCH_REVIEWS: &str = concat!(
    "*[",
    review_filter!(),
    r#" && (title match $term || tldr match $term || venue->title match $term)] | "#,
    newest_first!(),
    "[0...20]",
    review_summary!()
);

pub const SEARCH_POSTS: &str = concat!(
    r#"*[_type == "post" && defined(slug.current) && (title match $term || excerpt match $term || tags match $term)] | "#,
    newest_first!(),
    "[0...20]",
    post_summary!()
);

/// Everything the home page shows.
#[derive(Debug, Clone)]
pub struct HomeData {
    pub featured: Vec<FeaturedItem>,
    pub latest_reviews: Vec<ReviewSummary>,
    pub cities: Vec<City>,
    pub latest_posts: Vec<PostSummary>,
    pub latest_editorial: Vec<EditorialSummary>,
}

pub async fn home(client: &ContentClient) -> Result<HomeData, ContentError> {
    let (featured, latest_reviews, cities, latest_posts, latest_editorial) = tokio::try_join!(
        client.fetch_list(FEATURED_ITEMS, Value::Null, &["featuredItem"]),
        client.fetch_list(LATEST_REVIEWS, Value::Null, &["review"]),
        client.fetch_list(CITIES, Value::Null, &["city"]),
        client.fetch_list(LATEST_POSTS, Value::Null, &["post"]),
        client.fetch_list(LATEST_EDITORIAL, Value::Null, &["editorial"]),
    )?;
    Ok(HomeData {
        featured,
        latest_reviews,
        cities,
        latest_posts,
        latest_editorial,
    })
}

pub async fn cities(client: &ContentClient) -> Result<Vec<City>, ContentError> {
    client.fetch_list(CITIES, Value::Null, &["city"]).await
}

pub async fn city(client: &ContentClient, city: &str) -> Result<Option<City>, ContentError> {
    let tag = format!("city:{city}");
    client
        .fetch_optional(CITY_BY_SLUG, json!({ "city": city }), &["city", &tag])
        .await
}

pub async fn venues_by_city(client: &ContentClient, city: &str) -> Result<Vec<VenueSummary>, ContentError> {
    client
        .fetch_list(VENUES_BY_CITY, json!({ "city": city }), &["venue", "review"])
        .await
}

pub async fn venue(client: &ContentClient, city: &str, slug: &str) -> Result<Option<Venue>, ContentError> {
    let tag = format!("venue:{slug}");
    client
        .fetch_optional(VENUE_BY_SLUG, json!({ "city": city, "slug": slug }), &["venue", &tag])
        .await
}

pub async fn reviews_by_city(client: &ContentClient, city: &str) -> Result<Vec<ReviewSummary>, ContentError> {
    client
        .fetch_list(REVIEWS_BY_CITY, json!({ "city": city }), &["review"])
        .await
}

pub async fn review(client: &ContentClient, city: &str, slug: &str) -> Result<Option<Review>, ContentError> {
    let tag = format!("review:{slug}");
    client
        .fetch_optional(REVIEW_BY_SLUG, json!({ "city": city, "slug": slug }), &["review", &tag])
        .await
}

pub async fn posts(client: &ContentClient) -> Result<Vec<PostSummary>, ContentError> {
    client.fetch_list(POSTS, Value::Null, &["post"]).await
}

pub async fn post(client: &ContentClient, slug: &str) -> Result<Option<Post>, ContentError> {
    let tag = format!("post:{slug}");
    client
        .fetch_optional(POST_BY_SLUG, json!({ "slug": slug }), &["post", &tag])
        .await
}

pub async fn editorial(
    client: &ContentClient,
    kind: EditorialKind,
    slug: &str,
) -> Result<Option<Editorial>, ContentError> {
    let tag = format!("{}:{slug}", kind.doc_type());
    client
        .fetch_optional(
            EDITORIAL_BY_SLUG,
            json!({ "type": kind.doc_type(), "slug": slug }),
            &[kind.doc_type(), &tag],
        )
        .await
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub path: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub priority: f32,
}

#[derive(Debug, Deserialize)]
struct SlugRow {
    slug: String,
    #[serde(default)]
    city: Option<String>,
    #[serde(rename = "_type", default)]
    doc_type: Option<String>,
    #[serde(rename = "_updatedAt")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct SitemapRows {
    #[serde(default)]
    cities: Vec<SlugRow>,
    #[serde(default)]
    venues: Vec<SlugRow>,
    #[serde(default)]
    reviews: Vec<SlugRow>,
    #[serde(default)]
    posts: Vec<SlugRow>,
    #[serde(default)]
    editorial: Vec<SlugRow>,
}

/// Every indexable public URL path, home first.
pub async fn sitemap_entries(client: &ContentClient) -> Result<Vec<SitemapEntry>, ContentError> {
    let rows: SitemapRows = client.fetch(SITEMAP, Value::Null, &["sitemap"]).await?;
    let entry = |path: String, updated_at, priority| SitemapEntry {
        path,
        updated_at,
        priority,
    };

    let mut entries = vec![
        entry("/".to_string(), None, 1.0),
        entry(urls::blog(), None, 0.6),
    ];
    for row in rows.cities {
        entries.push(entry(urls::city(&row.slug), row.updated_at, 0.9));
        entries.push(entry(urls::reviews(&row.slug), row.updated_at, 0.7));
    }
    for row in rows.venues {
        if let Some(city) = &row.city {
            entries.push(entry(urls::venue(city, &row.slug), row.updated_at, 0.8));
        }
    }
    for row in rows.reviews {
        if let Some(city) = &row.city {
            entries.push(entry(urls::review(city, &row.slug), row.updated_at, 0.8));
        }
    }
    for row in rows.posts {
        entries.push(entry(urls::post(&row.slug), row.updated_at, 0.6));
    }
    for row in rows.editorial {
        if let Some(kind) = row.doc_type.as_deref().and_then(EditorialKind::from_doc_type) {
            entries.push(entry(urls::editorial(kind, &row.slug), row.updated_at, 0.7));
        }
    }
    Ok(entries)
}
