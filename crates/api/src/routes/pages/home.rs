use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Utc;
use serde::Deserialize;
use sobremesa_core::content::featured::active_cards;
use sobremesa_core::queries;
use sobremesa_core::seo::jsonld;
use sobremesa_core::ui::Carousel;

use super::{int_param, meta, page_html};
use crate::error::PageResult;
use crate::render::components::{
    card_list, city_card, editorial_card, featured_carousel, post_card, review_card, search_form,
};
use crate::render::Page;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HomeParams {
    slide: Option<String>,
}

const TITLE: &str = "Dónde comer bien en España";
const DESCRIPTION: &str = "Reseñas independientes de restaurantes, tabernas y bares de tapas en España: guías por ciudad, rankings, noticias y ofertas gastronómicas.";

pub async fn home(State(state): State<AppState>, Query(params): Query<HomeParams>) -> PageResult<Html<String>> {
    let data = queries::home(state.client()).await?;
    let cards = active_cards(&data.featured, Utc::now());
    let carousel = Carousel::starting_at(cards.len(), int_param(params.slide.as_deref()));

    let body = format!(
        r#"<h1>{title}</h1>
{carousel}
{search}
<section><h2>Últimas reseñas</h2>{reviews}</section>
<section><h2>Ciudades</h2>{cities}</section>
<section><h2>Guías y rankings</h2>{editorial}</section>
<section><h2>Del blog</h2>{posts}<p><a href="/blog">Ver todos los artículos</a></p></section>"#,
        title = TITLE,
        carousel = featured_carousel(&cards, &carousel),
        search = search_form(""),
        reviews = card_list(data.latest_reviews.iter().map(review_card).collect(), "Todavía no hay reseñas."),
        cities = card_list(data.cities.iter().map(city_card).collect(), "Todavía no hay ciudades."),
        editorial = card_list(data.latest_editorial.iter().map(editorial_card).collect(), "Pronto publicaremos guías."),
        posts = card_list(data.latest_posts.iter().map(post_card).collect(), "Todavía no hay artículos."),
    );

    let page = Page::new(meta(&state, TITLE, DESCRIPTION, "/"), body).with_jsonld(jsonld::website(&state.site()));
    Ok(page_html(&state, &page))
}
