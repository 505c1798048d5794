use axum::extract::{Path, Query, State};
use axum::routing::{get, MethodRouter};
use chrono::Utc;
use sobremesa_core::content::{urls, Editorial, EditorialKind};
use sobremesa_core::portable_text;
use sobremesa_core::queries;
use sobremesa_core::seo::jsonld::{self, ArticleData};
use sobremesa_core::ui::FaqAccordion;

use super::city::DetailParams;
use super::{image_url, meta, page_html};
use crate::error::{PageError, PageResult};
use crate::render::components::{breadcrumbs, faq_section, image, venue_card};
use crate::render::layout::paragraph;
use crate::render::{escape, spanish_date, Page};
use crate::state::AppState;

/// GET handler for one editorial section, e.g. `/guias/{slug}`.
pub fn handler(kind: EditorialKind) -> MethodRouter<AppState> {
    get(
        move |state: State<AppState>, path: Path<String>, query: Query<DetailParams>| async move {
            page(kind, state, path, query).await
        },
    )
}

fn ranked_items(editorial: &Editorial) -> String {
    let items = editorial.ranked_items();
    if items.is_empty() {
        return String::new();
    }
    let lis: String = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let rank = item.position.map(|p| p as usize).unwrap_or(i + 1);
            format!(
                r#"<li class="ranked" value="{rank}"><ul class="cards">{card}</ul>{highlight}{note}</li>"#,
                card = venue_card(&item.venue),
                highlight = paragraph(item.highlight.as_deref(), "highlight"),
                note = paragraph(item.note.as_deref(), "note"),
            )
        })
        .collect();
    format!(r#"<ol class="ranking">{lis}</ol>"#)
}

fn kind_details(editorial: &Editorial) -> String {
    let mut out = String::new();
    if let Some(dish) = &editorial.dish {
        out.push_str(&format!(r#"<p class="dish">Plato: {}</p>"#, escape(dish)));
    }
    if let Some(discount) = &editorial.discount {
        out.push_str(&format!(r#"<p class="discount">{}</p>"#, escape(discount)));
    }
    if let Some(until) = editorial.valid_until {
        if editorial.offer_expired(Utc::now()) {
            out.push_str(r#"<p class="expired" role="status">Esta oferta ha caducado.</p>"#);
        } else {
            out.push_str(&format!(
                r#"<p class="valid-until">Válida hasta el {}</p>"#,
                spanish_date(until.date_naive())
            ));
        }
    }
    out.push_str(&paragraph(editorial.terms.as_deref(), "terms"));
    if let Some(source) = &editorial.source {
        out.push_str(&format!(r#"<p class="source">Fuente: {}</p>"#, escape(source)));
    }
    out
}

async fn page(
    kind: EditorialKind,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<DetailParams>,
) -> PageResult<axum::response::Html<String>> {
    let editorial = queries::editorial(state.client(), kind, &slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let path = editorial.url();
    let mut crumbs = vec![("Inicio", "/".to_string())];
    if let Some(city) = &editorial.city {
        crumbs.push((city.title.as_str(), urls::city(&city.slug)));
    }
    crumbs.push((editorial.title.as_str(), path.clone()));
    let accordion = FaqAccordion::from_param(editorial.faq.len(), params.faq.as_deref());

    let body = format!(
        r#"{crumbs}<article class="editorial {segment}"><span class="label">{label}</span><h1>{title}</h1>
<p class="byline">{minutes} min de lectura</p>
{excerpt}{img}{details}
<div class="body">{text}</div>
{items}
{faq}
</article>"#,
        crumbs = breadcrumbs(&crumbs),
        segment = kind.segment(),
        label = kind.label(),
        title = escape(&editorial.title),
        minutes = editorial.reading_time_minutes(),
        excerpt = paragraph(editorial.excerpt.as_deref(), "lead"),
        img = image(editorial.image.as_ref(), &editorial.title),
        details = kind_details(&editorial),
        text = portable_text::to_html(&editorial.body),
        items = ranked_items(&editorial),
        faq = faq_section(&editorial.faq, &accordion, &path),
    );

    let title = editorial.seo.meta_title.as_deref().unwrap_or(&editorial.title);
    let description = editorial
        .seo
        .meta_description
        .clone()
        .or_else(|| editorial.excerpt.clone())
        .unwrap_or_else(|| portable_text::to_plain_text(&editorial.body));

    let site = state.site();
    let article = jsonld::article(
        &ArticleData {
            headline: &editorial.title,
            description: editorial.excerpt.as_deref(),
            path: path.clone(),
            image: editorial.image.as_ref().map(|i| i.url.as_str()),
            author: editorial.author.as_ref().map(|a| a.name.as_str()),
            section: Some(kind.label()),
            keywords: &[],
            published: editorial.published_at,
            modified: editorial.updated_at,
        },
        &site,
    );
    let entries: Vec<(String, String)> = editorial
        .ranked_items()
        .iter()
        .map(|item| (item.venue.title.clone(), item.venue.url()))
        .collect();
    let ranking = (!entries.is_empty()).then(|| jsonld::item_list(&editorial.title, &entries, &site));

    let page = Page::new(
        meta(&state, title, &description, &path)
            .with_image(image_url(&state, editorial.image.as_ref().map(|i| i.url.as_str())))
            .article(),
        body,
    )
    .with_jsonld(article)
    .with_optional_jsonld(ranking)
    .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
    .with_optional_jsonld(jsonld::faq_page(&editorial.faq));
    Ok(page_html(&state, &page))
}
