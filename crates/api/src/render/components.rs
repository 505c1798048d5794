//! Reusable page fragments.

use sobremesa_core::content::{
    City, EditorialSummary, Faq, FeaturedCard, ImageRef, PostSummary, Ratings, ReviewSummary, VenueSummary,
};
use sobremesa_core::content::urls;
use sobremesa_core::seo::voice::format_score;
use sobremesa_core::ui::{Carousel, FaqAccordion};

use super::{escape, escape_opt};

pub fn image(img: Option<&ImageRef>, fallback_alt: &str) -> String {
    match img {
        Some(img) => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape(&img.url),
            escape(img.alt_or(fallback_alt))
        ),
        None => String::new(),
    }
}

pub fn rating_badge(score: Option<f64>) -> String {
    match score {
        Some(score) => format!(
            r#"<span class="rating" aria-label="Valoración {s} sobre 10">{s}/10</span>"#,
            s = format_score(score)
        ),
        None => r#"<span class="rating rating-none">Sin reseña</span>"#.to_string(),
    }
}

pub fn ratings_table(ratings: &Ratings) -> String {
    let rows: String = ratings
        .labelled()
        .iter()
        .map(|(label, value)| format!("<tr><th scope=\"row\">{label}</th><td>{}</td></tr>", format_score(*value)))
        .collect();
    format!(
        r#"<table class="ratings"><caption>Puntuación: {}</caption>{rows}</table>"#,
        rating_badge(Some(ratings.overall()))
    )
}

pub fn breadcrumbs(crumbs: &[(&str, String)]) -> String {
    let last = crumbs.len().saturating_sub(1);
    let items: String = crumbs
        .iter()
        .enumerate()
        .map(|(i, (name, path))| {
            if i == last {
                format!(r#"<li aria-current="page">{}</li>"#, escape(name))
            } else {
                format!(r#"<li><a href="{}">{}</a></li>"#, escape(path), escape(name))
            }
        })
        .collect();
    format!(r#"<nav class="breadcrumbs" aria-label="Migas de pan"><ol>{items}</ol></nav>"#)
}

pub fn venue_card(venue: &VenueSummary) -> String {
    let price = venue.price_range.map(|p| format!(" · {p}")).unwrap_or_default();
    let categories = venue
        .categories
        .iter()
        .map(|c| escape(&c.title))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"<li class="card venue-card"><a href="{href}">{img}<h3>{title}</h3></a><p>{rating}{price}</p><p class="categories">{categories}</p>{desc}</li>"#,
        href = escape(&venue.url()),
        img = image(venue.image.as_ref(), &venue.title),
        title = escape(&venue.title),
        rating = rating_badge(venue.rating()),
        desc = super::layout::paragraph(venue.description.as_deref(), "excerpt"),
    )
}

pub fn review_card(review: &ReviewSummary) -> String {
    format!(
        r#"<li class="card review-card"><a href="{href}">{img}<h3>{title}</h3></a><p>{venue} · {city} · {rating}</p>{tldr}</li>"#,
        href = escape(&review.url()),
        img = image(review.image.as_ref(), &review.venue_title),
        title = escape(&review.title),
        venue = escape(&review.venue_title),
        city = escape(&review.city.title),
        rating = rating_badge(Some(review.ratings.overall())),
        tldr = super::layout::paragraph(review.tldr.as_deref(), "tldr"),
    )
}

pub fn post_card(post: &PostSummary) -> String {
    let date = post
        .published_at
        .map(|d| format!(r#"<time datetime="{}">{}</time>"#, d.to_rfc3339(), super::spanish_date(d.date_naive())))
        .unwrap_or_default();
    format!(
        r#"<li class="card post-card"><a href="{href}">{img}<h3>{title}</h3></a>{date}{excerpt}{tags}</li>"#,
        href = escape(&post.url()),
        img = image(post.image.as_ref(), &post.title),
        title = escape(&post.title),
        excerpt = super::layout::paragraph(post.excerpt.as_deref(), "excerpt"),
        tags = tag_links(&post.tags),
    )
}

pub fn editorial_card(item: &EditorialSummary) -> String {
    format!(
        r#"<li class="card editorial-card"><a href="{href}">{img}<span class="label">{label}</span><h3>{title}</h3></a>{excerpt}</li>"#,
        href = escape(&item.url()),
        img = image(item.image.as_ref(), &item.title),
        label = item.kind.label(),
        title = escape(&item.title),
        excerpt = super::layout::paragraph(item.excerpt.as_deref(), "excerpt"),
    )
}

pub fn city_card(city: &City) -> String {
    format!(
        r#"<li class="card city-card"><a href="{href}">{img}<h3>{title}</h3></a><p>{venues} restaurantes · {reviews} reseñas</p></li>"#,
        href = escape(&urls::city(&city.slug)),
        img = image(city.image.as_ref(), &city.title),
        title = escape(&city.title),
        venues = city.venue_count,
        reviews = city.review_count,
    )
}

/// A `<ul class="cards">` of already-rendered cards, or `empty` when none.
pub fn card_list(cards: Vec<String>, empty: &str) -> String {
    if cards.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, escape(empty));
    }
    format!(r#"<ul class="cards">{}</ul>"#, cards.concat())
}

pub fn tag_links(tags: &[String]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let links: String = tags
        .iter()
        .map(|t| format!(r#"<a class="tag" href="{}">#{}</a> "#, escape(&urls::blog_tag(t)), escape(t)))
        .collect();
    format!(r#"<p class="tags">{}</p>"#, links.trim_end())
}

/// FAQ list whose buttons link to the page with that item toggled, so it
/// works without scripts. `aria-expanded` always matches the panel.
pub fn faq_section(faqs: &[Faq], state: &FaqAccordion, base_path: &str) -> String {
    if faqs.is_empty() {
        return String::new();
    }
    let items: String = faqs
        .iter()
        .zip(state.items())
        .map(|(faq, item)| {
            let param = state.param_after_toggle(item.index);
            let href = if param.is_empty() {
                format!("{base_path}#faq")
            } else {
                format!("{base_path}?faq={param}#faq")
            };
            format!(
                r#"<div class="faq-item"><h3><a role="button" id="faq-q-{i}" href="{href}" aria-expanded="{expanded}" aria-controls="faq-a-{i}">{q}</a></h3><div id="faq-a-{i}" role="region" aria-labelledby="faq-q-{i}"{hidden}><p>{a}</p></div></div>"#,
                i = item.index,
                href = escape(&href),
                expanded = item.aria_expanded(),
                q = escape(&faq.question),
                a = escape(&faq.answer),
                hidden = if item.hidden() { " hidden" } else { "" },
            )
        })
        .collect();
    format!(r#"<section class="faq" id="faq"><h2>Preguntas frecuentes</h2>{items}</section>"#)
}

/// Featured slides with prev/next links driven by `?slide=`.
pub fn featured_carousel(cards: &[FeaturedCard], state: &Carousel) -> String {
    let Some(card) = cards.get(state.selected()) else {
        return String::new();
    };
    let dots: String = (0..cards.len())
        .map(|i| {
            let current = if i == state.selected() { r#" aria-current="true""# } else { "" };
            format!(r#"<a href="/?slide={i}" aria-label="Destacado {n}"{current}>•</a>"#, n = i + 1)
        })
        .collect();
    format!(
        r#"<section class="carousel" aria-roledescription="carrusel" aria-label="Destacados"><article aria-roledescription="diapositiva"><span class="label">{label}</span><a href="{href}">{img}<h2>{title}</h2></a>{desc}</article><nav><a href="/?slide={prev}" aria-label="Anterior">‹</a>{dots}<a href="/?slide={next}" aria-label="Siguiente">›</a></nav></section>"#,
        label = card.label,
        href = escape(&card.href),
        img = image(card.image.as_ref(), &card.title),
        title = escape(&card.title),
        desc = super::layout::paragraph(card.description.as_deref(), "excerpt"),
        prev = state.prev_index(),
        next = state.next_index(),
    )
}

/// Photo gallery showing one image, navigated with `?foto=n`.
pub fn gallery(images: &[ImageRef], state: &Carousel, base_path: &str, title: &str) -> String {
    let Some(current) = images.get(state.selected()) else {
        return String::new();
    };
    let caption = escape_opt(current.caption.as_deref());
    let nav = if images.len() > 1 {
        format!(
            r#"<nav><a href="{base}?foto={prev}" aria-label="Foto anterior">‹</a> {n} / {total} <a href="{base}?foto={next}" aria-label="Foto siguiente">›</a></nav>"#,
            base = escape(base_path),
            prev = state.prev_index(),
            next = state.next_index(),
            n = state.selected() + 1,
            total = images.len(),
        )
    } else {
        String::new()
    };
    format!(
        r#"<figure class="gallery">{img}<figcaption>{caption}</figcaption>{nav}</figure>"#,
        img = image(Some(current), title),
    )
}

pub fn search_form(term: &str) -> String {
    format!(
        r#"<form action="/buscar" method="get" role="search"><label for="q">Buscar restaurantes, reseñas y artículos</label> <input type="search" id="q" name="q" value="{}"> <button type="submit">Buscar</button></form>"#,
        escape(term)
    )
}
