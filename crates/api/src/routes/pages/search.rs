use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;
use sobremesa_core::content::urls;
use sobremesa_core::search::{search, SearchResults, SearchTab};

use super::{meta, page_html};
use crate::error::PageResult;
use crate::render::components::{card_list, post_card, review_card, search_form, venue_card};
use crate::render::{escape, Page};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    #[serde(rename = "type")]
    tab: Option<String>,
}

fn tabs(results: &SearchResults) -> String {
    let links: String = SearchTab::ALL
        .iter()
        .map(|tab| {
            let current = if *tab == results.tab { r#" aria-current="page""# } else { "" };
            format!(
                r#"<a href="{href}"{current}>{label} ({count})</a>"#,
                href = escape(&urls::search(&results.term, Some(tab.as_param()))),
                label = tab.label(),
                count = results.count(*tab),
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(r#"<nav class="tabs" aria-label="Tipo de resultado">{links}</nav>"#)
}

fn sections(results: &SearchResults) -> String {
    let mut out = String::new();
    if results.shows(SearchTab::Venues) {
        out.push_str(&format!(
            "<section><h2>Restaurantes</h2>{}</section>",
            card_list(results.venues.iter().map(venue_card).collect(), "Ningún restaurante coincide.")
        ));
    }
    if results.shows(SearchTab::Reviews) {
        out.push_str(&format!(
            "<section><h2>Reseñas</h2>{}</section>",
            card_list(results.reviews.iter().map(review_card).collect(), "Ninguna reseña coincide.")
        ));
    }
    if results.shows(SearchTab::Posts) {
        out.push_str(&format!(
            "<section><h2>Artículos</h2>{}</section>",
            card_list(results.posts.iter().map(post_card).collect(), "Ningún artículo coincide.")
        ));
    }
    out
}

/// Search body: the form, then tabs and results for a term. A term with
/// no hits gets the no-results message and a second form to retry.
pub fn render_results(results: &SearchResults) -> String {
    let mut body = format!("<h1>Buscar</h1>{}", search_form(&results.term));
    if !results.has_term() {
        body.push_str(r#"<p class="hint">Busca por restaurante, ciudad, plato o tipo de cocina.</p>"#);
        return body;
    }
    if results.is_empty() {
        body.push_str(&format!(
            r#"<section class="no-results" role="status"><h2>Sin resultados</h2><p>No hemos encontrado resultados para «{}». Prueba con otras palabras o revisa la ortografía.</p>{}</section>"#,
            escape(&results.term),
            search_form(""),
        ));
        return body;
    }
    body.push_str(&format!(
        r#"<p class="count" role="status">{} resultados para «{}»</p>"#,
        results.total(),
        escape(&results.term)
    ));
    body.push_str(&tabs(results));
    body.push_str(&sections(results));
    body
}

pub async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> PageResult<Html<String>> {
    let term = params.q.unwrap_or_default();
    let tab = SearchTab::from_param(params.tab.as_deref());
    let results = search(state.client(), &term, tab).await;

    let (title, path) = if results.has_term() {
        (
            format!("Resultados para «{}»", results.term),
            urls::search(&results.term, None),
        )
    } else {
        ("Buscar restaurantes y reseñas".to_string(), "/buscar".to_string())
    };
    let description = "Busca entre todos los restaurantes, reseñas y artículos de Sobremesa por nombre, ciudad, plato o tipo de cocina y encuentra dónde comer.";

    let mut page_meta = meta(&state, &title, description, &path);
    if results.has_term() {
        page_meta = page_meta.noindex();
    }
    let page = Page::new(page_meta, render_results(&results));
    Ok(page_html(&state, &page))
}
