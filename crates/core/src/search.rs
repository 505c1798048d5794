//! Site search over venues, reviews and posts.

use std::fmt;

use serde::Serialize;
use serde_json::json;

use crate::client::ContentClient;
use crate::content::{PostSummary, ReviewSummary, VenueSummary};
use crate::queries;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTab {
    #[default]
    All,
    Venues,
    Reviews,
    Posts,
}

impl SearchTab {
    pub const ALL: [SearchTab; 4] = [SearchTab::All, SearchTab::Venues, SearchTab::Reviews, SearchTab::Posts];

    /// Value of the `type` query parameter. Unknown values fall back to `All`.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("venues") | Some("restaurantes") => SearchTab::Venues,
            Some("reviews") | Some("resenas") => SearchTab::Reviews,
            Some("posts") | Some("articulos") => SearchTab::Posts,
            _ => SearchTab::All,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SearchTab::All => "all",
            SearchTab::Venues => "venues",
            SearchTab::Reviews => "reviews",
            SearchTab::Posts => "posts",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchTab::All => "Todo",
            SearchTab::Venues => "Restaurantes",
            SearchTab::Reviews => "Reseñas",
            SearchTab::Posts => "Artículos",
        }
    }
}

impl fmt::Display for SearchTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub term: String,
    pub tab: SearchTab,
    pub venues: Vec<VenueSummary>,
    pub reviews: Vec<ReviewSummary>,
    pub posts: Vec<PostSummary>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.venues.len() + self.reviews.len() + self.posts.len()
    }

    pub fn count(&self, tab: SearchTab) -> usize {
        match tab {
            SearchTab::All => self.total(),
            SearchTab::Venues => self.venues.len(),
            SearchTab::Reviews => self.reviews.len(),
            SearchTab::Posts => self.posts.len(),
        }
    }

    /// Whether the section for `section` is rendered under the active tab.
    pub fn shows(&self, section: SearchTab) -> bool {
        self.tab == SearchTab::All || self.tab == section
    }

    pub fn has_term(&self) -> bool {
        !self.term.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Turn user input into a `match` pattern: every word becomes a prefix.
pub fn match_pattern(term: &str) -> String {
    term.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| format!("{}*", w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run the venue, review and post queries concurrently. A failing query is
/// logged and contributes no results.
pub async fn search(client: &ContentClient, term: &str, tab: SearchTab) -> SearchResults {
    let term = term.trim().to_string();
    let pattern = match_pattern(&term);
    if pattern.is_empty() {
        return SearchResults {
            term,
            tab,
            ..SearchResults::default()
        };
    }

    let params = json!({ "term": pattern });
    let (venues, reviews, posts) = tokio::join!(
        client.fetch_list::<VenueSummary>(queries::SEARCH_VENUES, params.clone(), &["venue"]),
        client.fetch_list::<ReviewSummary>(queries::SEARCH_REVIEWS, params.clone(), &["review"]),
        client.fetch_list::<PostSummary>(queries::SEARCH_POSTS, params, &["post"]),
    );

    let results = SearchResults {
        venues: venues.unwrap_or_else(|err| {
            tracing::warn!(error = %err, term = %term, "venue search failed");
            Vec::new()
        }),
        reviews: reviews.unwrap_or_else(|err| {
            tracing::warn!(error = %err, term = %term, "review search failed");
            Vec::new()
        }),
        posts: posts.unwrap_or_else(|err| {
            tracing::warn!(error = %err, term = %term, "post search failed");
            Vec::new()
        }),
        term,
        tab,
    };
    tracing::debug!(term = %results.term, total = results.total(), "search complete");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::tests::seeded_client;

    #[test]
    fn patterns_prefix_every_word() {
        assert_eq!(match_pattern("Casa Lucio"), "casa* lucio*");
        assert_eq!(match_pattern("  tapas, baratas! "), "tapas* baratas*");
        assert_eq!(match_pattern("  "), "");
    }

    #[test]
    fn tab_params() {
        assert_eq!(SearchTab::from_param(Some("reviews")), SearchTab::Reviews);
        assert_eq!(SearchTab::from_param(Some("nope")), SearchTab::All);
        assert_eq!(SearchTab::from_param(None), SearchTab::All);
        for tab in SearchTab::ALL {
            assert_eq!(SearchTab::from_param(Some(tab.as_param())), tab);
        }
    }

    #[tokio::test]
    async fn finds_across_types() {
        let c = seeded_client().await;
        let results = search(&c, "Casa", SearchTab::All).await;
        assert_eq!(results.venues.len(), 1);
        assert_eq!(results.reviews.len(), 1);
        assert!(results.posts.is_empty());
        assert_eq!(results.total(), 2);
        assert_eq!(results.count(SearchTab::Venues), 1);
    }

    #[tokio::test]
    async fn matches_city_and_category_names() {
        let c = seeded_client().await;
        let by_city = search(&c, "madrid", SearchTab::Venues).await;
        assert_eq!(by_city.venues.len(), 2);
        assert!(by_city.shows(SearchTab::Venues));
        assert!(!by_city.shows(SearchTab::Posts));

        let by_category = search(&c, "asador", SearchTab::All).await;
        assert_eq!(by_category.venues.len(), 1);
        assert_eq!(by_category.venues[0].title, "Sobrino de Botín");
    }

    #[tokio::test]
    async fn blank_or_unmatched_terms_are_empty() {
        let c = seeded_client().await;
        let blank = search(&c, "   ", SearchTab::All).await;
        assert!(!blank.has_term());
        assert!(blank.is_empty());

        let none = search(&c, "zarzuela", SearchTab::All).await;
        assert!(none.has_term());
        assert_eq!(none.total(), 0);
    }

    #[tokio::test]
    async fn posts_match_tags() {
        let c = seeded_client().await;
        let results = search(&c, "cuchara", SearchTab::Posts).await;
        assert_eq!(results.posts.len(), 1);
    }
}
