//! In-memory filtering and sorting of already-fetched lists.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::content::{Category, PostSummary, PriceRange, VenueSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VenueSort {
    /// Best overall rating first; unrated venues last.
    #[default]
    Rating,
    Newest,
    Name,
}

impl VenueSort {
    pub const ALL: [VenueSort; 3] = [VenueSort::Rating, VenueSort::Newest, VenueSort::Name];

    pub fn from_param(param: &str) -> Option<Self> {
        match param {
            "valoracion" => Some(VenueSort::Rating),
            "recientes" => Some(VenueSort::Newest),
            "nombre" => Some(VenueSort::Name),
            _ => None,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            VenueSort::Rating => "valoracion",
            VenueSort::Newest => "recientes",
            VenueSort::Name => "nombre",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VenueSort::Rating => "Mejor valorados",
            VenueSort::Newest => "Más recientes",
            VenueSort::Name => "Nombre",
        }
    }
}

/// Raw `?categoria=&precio=&orden=` parameters of a city page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueFilterParams {
    pub categoria: Option<String>,
    pub precio: Option<String>,
    pub orden: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueFilter {
    pub category: Option<String>,
    pub price: Option<PriceRange>,
    pub sort: VenueSort,
}

impl VenueFilter {
    /// Unknown or empty values are ignored rather than rejected.
    pub fn from_params(params: &VenueFilterParams) -> Self {
        let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string);
        Self {
            category: non_empty(&params.categoria),
            price: non_empty(&params.precio).and_then(|p| PriceRange::parse(&p)),
            sort: non_empty(&params.orden)
                .and_then(|o| VenueSort::from_param(&o))
                .unwrap_or_default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.category.is_some() || self.price.is_some()
    }

    pub fn matches(&self, venue: &VenueSummary) -> bool {
        let category_ok = self.category.as_deref().map_or(true, |slug| venue.has_category(slug));
        let price_ok = self.price.map_or(true, |price| venue.price_range == Some(price));
        category_ok && price_ok
    }

    pub fn apply(&self, venues: &[VenueSummary]) -> Vec<VenueSummary> {
        let mut kept: Vec<VenueSummary> = venues.iter().filter(|v| self.matches(v)).cloned().collect();
        match self.sort {
            VenueSort::Rating => kept.sort_by(|a, b| match (a.rating(), b.rating()) {
                (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.title.cmp(&b.title),
            }),
            VenueSort::Newest => kept.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            VenueSort::Name => kept.sort_by_key(|v| v.title.to_lowercase()),
        }
        kept
    }

    /// Query string for this filter with `sort` swapped in.
    pub fn query_with_sort(&self, sort: VenueSort) -> String {
        let mut parts = Vec::new();
        if let Some(category) = &self.category {
            parts.push(format!("categoria={}", crate::content::urls::encode_query(category)));
        }
        if let Some(price) = self.price {
            parts.push(format!("precio={}", price.level()));
        }
        parts.push(format!("orden={}", sort.as_param()));
        format!("?{}", parts.join("&"))
    }
}

/// Categories present in `venues`, each once, by title.
pub fn available_categories(venues: &[VenueSummary]) -> Vec<Category> {
    let mut by_slug: BTreeMap<&str, &Category> = BTreeMap::new();
    for category in venues.iter().flat_map(|v| &v.categories) {
        by_slug.entry(category.slug.as_str()).or_insert(category);
    }
    let mut categories: Vec<Category> = by_slug.into_values().cloned().collect();
    categories.sort_by(|a, b| a.title.cmp(&b.title));
    categories
}

/// Posts carrying `tag` (case-insensitive). No tag keeps everything.
pub fn filter_posts_by_tag(posts: &[PostSummary], tag: Option<&str>) -> Vec<PostSummary> {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => posts.iter().filter(|p| p.has_tag(tag)).cloned().collect(),
        None => posts.to_vec(),
    }
}

/// Every tag used by `posts`, deduplicated case-insensitively, sorted.
pub fn all_tags(posts: &[PostSummary]) -> Vec<String> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for tag in posts.iter().flat_map(|p| &p.tags) {
        seen.entry(tag.to_lowercase()).or_insert_with(|| tag.clone());
    }
    seen.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn venue(title: &str, price: &str, categories: &[&str], ratings: Option<f64>, created: &str) -> VenueSummary {
        let mut v = json!({
            "_id": title.to_lowercase(),
            "title": title,
            "slug": title.to_lowercase(),
            "city": {"title": "Madrid", "slug": "madrid"},
            "priceRange": price,
            "categories": categories
                .iter()
                .map(|c| json!({"title": c.to_uppercase(), "slug": c}))
                .collect::<Vec<_>>(),
            "_createdAt": created,
        });
        if let Some(r) = ratings {
            v["latestRatings"] = json!({"food": r, "service": r, "ambience": r, "value": r});
        }
        serde_json::from_value(v).unwrap()
    }

    fn venues() -> Vec<VenueSummary> {
        vec![
            venue("Botín", "€€€", &["asador"], Some(7.0), "2024-01-01T00:00:00Z"),
            venue("Alegría", "€", &["tapas"], None, "2024-03-01T00:00:00Z"),
            venue("Lucio", "€€", &["tapas", "asador"], Some(9.0), "2024-02-01T00:00:00Z"),
        ]
    }

    fn titles(vs: &[VenueSummary]) -> Vec<&str> {
        vs.iter().map(|v| v.title.as_str()).collect()
    }

    #[test]
    fn sorts_by_each_key() {
        let vs = venues();
        let by = |sort| VenueFilter { sort, ..Default::default() }.apply(&vs);
        assert_eq!(titles(&by(VenueSort::Rating)), vec!["Lucio", "Botín", "Alegría"]);
        assert_eq!(titles(&by(VenueSort::Newest)), vec!["Alegría", "Lucio", "Botín"]);
        assert_eq!(titles(&by(VenueSort::Name)), vec!["Alegría", "Botín", "Lucio"]);
    }

    #[test]
    fn filters_by_category_and_price() {
        let vs = venues();
        let filter = VenueFilter::from_params(&VenueFilterParams {
            categoria: Some("tapas".into()),
            precio: Some("2".into()),
            orden: Some("nombre".into()),
        });
        assert!(filter.is_active());
        assert_eq!(titles(&filter.apply(&vs)), vec!["Lucio"]);
        assert_eq!(filter.query_with_sort(VenueSort::Rating), "?categoria=tapas&precio=2&orden=valoracion");
    }

    #[test]
    fn bad_params_are_ignored() {
        let filter = VenueFilter::from_params(&VenueFilterParams {
            categoria: Some("  ".into()),
            precio: Some("caro".into()),
            orden: Some("random".into()),
        });
        assert_eq!(filter, VenueFilter::default());
    }

    #[test]
    fn categories_are_unique() {
        let slugs: Vec<String> = available_categories(&venues()).into_iter().map(|c| c.slug).collect();
        assert_eq!(slugs, vec!["asador", "tapas"]);
    }

    #[test]
    fn posts_filter_by_tag() {
        let posts: Vec<PostSummary> = serde_json::from_value(json!([
            {"_id": "p1", "title": "Cocido", "slug": "cocido", "tags": ["Madrid", "Cuchara"]},
            {"_id": "p2", "title": "Pintxos", "slug": "pintxos", "tags": ["Donostia", "madrid"]},
            {"_id": "p3", "title": "Sin etiquetas", "slug": "sin"}
        ]))
        .unwrap();
        assert_eq!(filter_posts_by_tag(&posts, Some("cuchara")).len(), 1);
        assert_eq!(filter_posts_by_tag(&posts, Some("MADRID")).len(), 2);
        assert_eq!(filter_posts_by_tag(&posts, None).len(), 3);
        assert_eq!(all_tags(&posts), vec!["Cuchara", "Donostia", "Madrid"]);
    }
}
