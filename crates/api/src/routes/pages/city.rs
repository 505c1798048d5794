use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;
use sobremesa_core::content::{urls, Venue};
use sobremesa_core::listing::{available_categories, VenueFilter, VenueFilterParams, VenueSort};
use sobremesa_core::portable_text;
use sobremesa_core::queries;
use sobremesa_core::seo::{jsonld, voice};
use sobremesa_core::ui::{Carousel, FaqAccordion};

use super::{image_url, int_param, meta, page_html};
use crate::error::{PageError, PageResult};
use crate::render::components::{
    breadcrumbs, card_list, faq_section, gallery, rating_badge, ratings_table, review_card, venue_card,
};
use crate::render::layout::paragraph;
use crate::render::{escape, spanish_date, Page};
use crate::state::AppState;

/// `?foto=` and `?faq=` on detail pages.
#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
    pub foto: Option<String>,
    pub faq: Option<String>,
}

fn filter_link(href: String, label: &str, current: bool) -> String {
    let aria = if current { r#" aria-current="page""# } else { "" };
    format!(r#"<a href="{}"{aria}>{}</a>"#, escape(&href), escape(label))
}

fn filter_nav(city_path: &str, filter: &VenueFilter, venues: &[sobremesa_core::content::VenueSummary]) -> String {
    let categories: String = available_categories(venues)
        .iter()
        .map(|c| {
            let active = filter.category.as_deref() == Some(c.slug.as_str());
            let next = VenueFilter {
                category: (!active).then(|| c.slug.clone()),
                ..filter.clone()
            };
            filter_link(format!("{city_path}{}", next.query_with_sort(next.sort)), &c.title, active)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let prices: String = sobremesa_core::content::PriceRange::ALL
        .iter()
        .map(|p| {
            let active = filter.price == Some(*p);
            let next = VenueFilter {
                price: (!active).then_some(*p),
                ..filter.clone()
            };
            filter_link(format!("{city_path}{}", next.query_with_sort(next.sort)), p.as_str(), active)
        })
        .collect::<Vec<_>>()
        .join(" ");

    let sorts: String = VenueSort::ALL
        .iter()
        .map(|s| filter_link(format!("{city_path}{}", filter.query_with_sort(*s)), s.label(), filter.sort == *s))
        .collect::<Vec<_>>()
        .join(" ");

    let clear = if filter.is_active() {
        format!(r#" <a href="{}">Quitar filtros</a>"#, escape(city_path))
    } else {
        String::new()
    };

    format!(
        r#"<nav class="filters" aria-label="Filtros"><p>Cocina: {categories}</p><p>Precio: {prices}</p><p>Ordenar: {sorts}{clear}</p></nav>"#
    )
}

pub async fn city(
    State(state): State<AppState>,
    Path(city_slug): Path<String>,
    Query(params): Query<VenueFilterParams>,
) -> PageResult<Html<String>> {
    let client = state.client();
    let (city, venues) = tokio::try_join!(
        queries::city(client, &city_slug),
        queries::venues_by_city(client, &city_slug)
    )?;
    let city = city.ok_or(PageError::NotFound)?;

    let filter = VenueFilter::from_params(&params);
    let shown = filter.apply(&venues);
    let path = urls::city(&city.slug);
    let crumbs = [("Inicio", "/".to_string()), (city.title.as_str(), path.clone())];

    let body = format!(
        r#"{crumbs}<h1>Dónde comer en {title}</h1>{desc}
{filters}
<p class="count">{count} restaurantes</p>
{cards}
<p><a href="{reviews}">Todas las reseñas de {title}</a></p>"#,
        crumbs = breadcrumbs(&crumbs),
        title = escape(&city.title),
        desc = paragraph(city.description.as_deref(), "lead"),
        filters = filter_nav(&path, &filter, &venues),
        count = shown.len(),
        cards = card_list(shown.iter().map(venue_card).collect(), "No hay restaurantes que coincidan con estos filtros."),
        reviews = escape(&urls::reviews(&city.slug)),
    );

    let description = city.description.clone().unwrap_or_else(|| {
        format!(
            "Los mejores restaurantes de {}: reseñas independientes, precios, horarios y platos recomendados para comer bien en la ciudad.",
            city.title
        )
    });
    let entries: Vec<(String, String)> = shown.iter().map(|v| (v.title.clone(), v.url())).collect();
    let site = state.site();
    let page = Page::new(
        meta(&state, &format!("Restaurantes en {}", city.title), &description, &path)
            .with_image(image_url(&state, city.image.as_ref().map(|i| i.url.as_str()))),
        body,
    )
    .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
    .with_jsonld(jsonld::item_list(&format!("Restaurantes en {}", city.title), &entries, &site));
    Ok(page_html(&state, &page))
}

fn venue_facts(venue: &Venue) -> String {
    let mut facts = Vec::new();
    if let Some(address) = venue.address.as_ref().and_then(|a| a.one_line()) {
        facts.push(format!("<dt>Dirección</dt><dd>{}</dd>", escape(&address)));
    }
    if let Some(phone) = &venue.phone {
        facts.push(format!(r#"<dt>Teléfono</dt><dd><a href="tel:{p}">{p}</a></dd>"#, p = escape(phone)));
    }
    if let Some(price) = venue.price_range {
        facts.push(format!("<dt>Precio</dt><dd>{price} · {}</dd>", voice::price_description(price)));
    }
    if !venue.categories.is_empty() {
        facts.push(format!("<dt>Cocina</dt><dd>{}</dd>", escape(&venue.category_names().join(", "))));
    }
    if !venue.opening_hours.is_empty() {
        let hours: String = venue
            .opening_hours
            .iter()
            .map(|h| format!("<li>{}</li>", escape(&h.describe())))
            .collect();
        facts.push(format!("<dt>Horario</dt><dd><ul>{hours}</ul></dd>"));
    }
    if let Some(social) = &venue.social {
        let links: String = social
            .all()
            .iter()
            .map(|l| format!(r#"<a href="{l}" rel="noopener">{l}</a> "#, l = escape(l)))
            .collect();
        if !links.is_empty() {
            facts.push(format!("<dt>Enlaces</dt><dd>{}</dd>", links.trim_end()));
        }
    }
    format!(r#"<dl class="facts">{}</dl>"#, facts.concat())
}

fn map_placeholder(venue: &Venue) -> String {
    match venue.geo {
        Some(geo) => format!(
            r#"<div class="map-placeholder" data-lat="{lat}" data-lng="{lng}">Mapa: {lat}, {lng}</div>"#,
            lat = geo.lat,
            lng = geo.lng
        ),
        None => String::new(),
    }
}

pub async fn venue(
    State(state): State<AppState>,
    Path((city_slug, slug)): Path<(String, String)>,
    Query(params): Query<DetailParams>,
) -> PageResult<Html<String>> {
    let venue = queries::venue(state.client(), &city_slug, &slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let faqs = if venue.faq.is_empty() {
        voice::generate_voice_faqs(&venue, venue.latest_review())
    } else {
        venue.faq.clone()
    };
    let path = venue.url();
    let photos = Carousel::starting_at(venue.images.len(), int_param(params.foto.as_deref()));
    let accordion = FaqAccordion::from_param(faqs.len(), params.faq.as_deref());
    let city_path = urls::city(&venue.city.slug);
    let crumbs = [
        ("Inicio", "/".to_string()),
        (venue.city.title.as_str(), city_path),
        (venue.title.as_str(), path.clone()),
    ];
    let conversational = voice::generate_conversational_description(&venue);

    let latest = match venue.latest_review() {
        Some(review) => format!(
            r#"<section class="latest-review"><h2>Nuestra reseña</h2><ul class="cards">{}</ul></section>"#,
            review_card(review)
        ),
        None => r#"<p class="empty">Todavía no hemos reseñado este restaurante.</p>"#.to_string(),
    };

    let body = format!(
        r#"{crumbs}<article class="venue"><h1>{title}</h1><p>{rating}</p>
<p class="speakable-summary">{conversational}</p>
{desc}
{gallery}
{facts}
{map}
{latest}
{faq}
</article>"#,
        crumbs = breadcrumbs(&crumbs),
        title = escape(&venue.title),
        rating = rating_badge(venue.rating()),
        conversational = escape(&conversational),
        desc = paragraph(venue.description.as_deref(), "description"),
        gallery = gallery(&venue.images, &photos, &path, &venue.title),
        facts = venue_facts(&venue),
        map = map_placeholder(&venue),
        faq = faq_section(&faqs, &accordion, &path),
    );

    let site = state.site();
    let page = Page::new(
        meta(&state, &voice::generate_voice_title(&venue), &conversational, &path)
            .with_image(image_url(&state, venue.images.first().map(|i| i.url.as_str())))
            .with_keywords(voice::generate_local_search_keywords(&venue)),
        body,
    )
    .with_jsonld(jsonld::restaurant(&venue, &site))
    .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
    .with_optional_jsonld(jsonld::faq_page(&faqs));
    Ok(page_html(&state, &page))
}

pub async fn reviews(State(state): State<AppState>, Path(city_slug): Path<String>) -> PageResult<Html<String>> {
    let client = state.client();
    let (city, reviews) = tokio::try_join!(
        queries::city(client, &city_slug),
        queries::reviews_by_city(client, &city_slug)
    )?;
    let city = city.ok_or(PageError::NotFound)?;

    let path = urls::reviews(&city.slug);
    let crumbs = [
        ("Inicio", "/".to_string()),
        (city.title.as_str(), urls::city(&city.slug)),
        ("Reseñas", path.clone()),
    ];
    let body = format!(
        "{crumbs}<h1>Reseñas de restaurantes en {title}</h1>{cards}",
        crumbs = breadcrumbs(&crumbs),
        title = escape(&city.title),
        cards = card_list(reviews.iter().map(review_card).collect(), "Todavía no hay reseñas en esta ciudad."),
    );

    let description = format!(
        "Todas nuestras reseñas de restaurantes en {}: puntuaciones de comida, servicio, ambiente y calidad-precio, con lo mejor y lo peor de cada visita.",
        city.title
    );
    let entries: Vec<(String, String)> = reviews.iter().map(|r| (r.title.clone(), r.url())).collect();
    let site = state.site();
    let page = Page::new(meta(&state, &format!("Reseñas en {}", city.title), &description, &path), body)
        .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
        .with_jsonld(jsonld::item_list(&format!("Reseñas en {}", city.title), &entries, &site));
    Ok(page_html(&state, &page))
}

fn bullet_list(items: &[String], class: &str, heading: &str) -> String {
    if items.is_empty() {
        return String::new();
    }
    let lis: String = items.iter().map(|i| format!("<li>{}</li>", escape(i))).collect();
    format!(r#"<section class="{class}"><h2>{heading}</h2><ul>{lis}</ul></section>"#)
}

pub async fn review(
    State(state): State<AppState>,
    Path((city_slug, slug)): Path<(String, String)>,
    Query(params): Query<DetailParams>,
) -> PageResult<Html<String>> {
    let review = queries::review(state.client(), &city_slug, &slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let path = review.url();
    let venue = &review.venue;
    let crumbs = [
        ("Inicio", "/".to_string()),
        (venue.city.title.as_str(), urls::city(&venue.city.slug)),
        ("Reseñas", urls::reviews(&venue.city.slug)),
        (review.title.as_str(), path.clone()),
    ];
    let snippet = voice::generate_featured_snippet(&review);
    let speakable = voice::generate_speakable_summary(&review);
    let photos = Carousel::starting_at(review.gallery.len(), int_param(params.foto.as_deref()));
    let accordion = FaqAccordion::from_param(review.faq.len(), params.faq.as_deref());

    let byline = match (&review.author, review.published_at) {
        (Some(author), Some(date)) => format!(
            r#"<p class="byline">Por {} · <time datetime="{}">{}</time></p>"#,
            escape(&author.name),
            date.to_rfc3339(),
            spanish_date(date.date_naive())
        ),
        (Some(author), None) => format!(r#"<p class="byline">Por {}</p>"#, escape(&author.name)),
        (None, Some(date)) => format!(
            r#"<p class="byline"><time datetime="{}">{}</time></p>"#,
            date.to_rfc3339(),
            spanish_date(date.date_naive())
        ),
        (None, None) => String::new(),
    };
    let visit = review
        .visit_date
        .map(|d| format!(r#"<p class="visit">Visitado el {}</p>"#, spanish_date(d)))
        .unwrap_or_default();
    let highlights: String = snippet.highlights.iter().map(|h| format!("<li>{}</li>", escape(h))).collect();

    let body = format!(
        r#"{crumbs}<article class="review"><h1>{title}</h1>
<p><a href="{venue_href}">{venue}</a> · {city}</p>
{byline}{visit}
<p class="speakable-summary">{speakable}</p>
{tldr}
{ratings}
{gallery}
<div class="body">{text}</div>
{pros}{cons}
<aside class="snippet"><h2>{question}</h2><p>{answer}</p><ul>{highlights}</ul></aside>
{faq}
</article>"#,
        crumbs = breadcrumbs(&crumbs),
        title = escape(&review.title),
        venue_href = escape(&venue.url()),
        venue = escape(&venue.title),
        city = escape(&venue.city.title),
        speakable = escape(&speakable),
        tldr = paragraph(review.tldr.as_deref(), "review-tldr"),
        ratings = ratings_table(&review.ratings),
        gallery = gallery(&review.gallery, &photos, &path, &venue.title),
        text = portable_text::to_html(&review.body),
        pros = bullet_list(&review.pros, "pros", "Lo mejor"),
        cons = bullet_list(&review.cons, "cons", "Lo peor"),
        question = escape(&snippet.question),
        answer = escape(&snippet.answer),
        faq = faq_section(&review.faq, &accordion, &path),
    );

    let description = review.tldr.clone().unwrap_or_else(|| speakable.clone());
    let site = state.site();
    let page = Page::new(
        meta(&state, &review.title, &description, &path)
            .with_image(image_url(
                &state,
                review.gallery.first().or(venue.image.as_ref()).map(|i| i.url.as_str()),
            ))
            .article(),
        body,
    )
    .with_jsonld(jsonld::review(&review, &site))
    .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
    .with_optional_jsonld(jsonld::faq_page(&review.faq));
    Ok(page_html(&state, &page))
}
