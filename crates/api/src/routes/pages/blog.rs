use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;
use sobremesa_core::content::urls;
use sobremesa_core::listing::{all_tags, filter_posts_by_tag};
use sobremesa_core::portable_text;
use sobremesa_core::queries;
use sobremesa_core::seo::jsonld::{self, ArticleData};
use sobremesa_core::ui::FaqAccordion;

use super::city::DetailParams;
use super::{image_url, meta, page_html};
use crate::error::{PageError, PageResult};
use crate::render::components::{breadcrumbs, card_list, faq_section, image, post_card, tag_links};
use crate::render::layout::paragraph;
use crate::render::{escape, spanish_date, Page};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BlogParams {
    tag: Option<String>,
}

pub async fn index(State(state): State<AppState>, Query(params): Query<BlogParams>) -> PageResult<Html<String>> {
    let posts = queries::posts(state.client()).await?;
    let tag = params.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let shown = filter_posts_by_tag(&posts, tag);

    let heading = match tag {
        Some(tag) => format!("Artículos sobre {}", escape(tag)),
        None => "Blog".to_string(),
    };
    let clear = if tag.is_some() {
        r#"<p><a href="/blog">Ver todos los artículos</a></p>"#
    } else {
        ""
    };
    let crumbs = [("Inicio", "/".to_string()), ("Blog", urls::blog())];
    let body = format!(
        "{crumbs}<h1>{heading}</h1><nav class=\"tags\" aria-label=\"Etiquetas\">{tags}</nav>{clear}{cards}",
        crumbs = breadcrumbs(&crumbs),
        tags = tag_links(&all_tags(&posts)),
        cards = card_list(shown.iter().map(post_card).collect(), "No hay artículos con esta etiqueta."),
    );

    let (title, description) = match tag {
        Some(tag) => (
            format!("Artículos sobre {tag}"),
            format!("Artículos del blog de Sobremesa sobre {tag}: historias de cocina, productores, recetas tradicionales y rutas gastronómicas por España."),
        ),
        None => (
            "Blog de gastronomía española".to_string(),
            "Historias de cocina, productores, recetas tradicionales y rutas gastronómicas por España, contadas por el equipo de Sobremesa.".to_string(),
        ),
    };
    let path = match tag {
        Some(tag) => urls::blog_tag(tag),
        None => urls::blog(),
    };
    let entries: Vec<(String, String)> = shown.iter().map(|p| (p.title.clone(), p.url())).collect();
    let site = state.site();
    let page = Page::new(meta(&state, &title, &description, &path), body)
        .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
        .with_jsonld(jsonld::item_list(&title, &entries, &site));
    Ok(page_html(&state, &page))
}

pub async fn post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<DetailParams>,
) -> PageResult<Html<String>> {
    let post = queries::post(state.client(), &slug).await?.ok_or(PageError::NotFound)?;

    let path = post.url();
    let crumbs = [
        ("Inicio", "/".to_string()),
        ("Blog", urls::blog()),
        (post.title.as_str(), path.clone()),
    ];
    let accordion = FaqAccordion::from_param(post.faq.len(), params.faq.as_deref());
    let minutes = post.reading_time_minutes();

    let mut byline = Vec::new();
    if let Some(author) = &post.author {
        byline.push(format!("Por {}", escape(&author.name)));
    }
    if let Some(date) = post.published_at {
        byline.push(format!(
            r#"<time datetime="{}">{}</time>"#,
            date.to_rfc3339(),
            spanish_date(date.date_naive())
        ));
    }
    byline.push(format!("{minutes} min de lectura"));

    let body = format!(
        r#"{crumbs}<article class="post"><h1>{title}</h1><p class="byline">{byline}</p>{excerpt}{img}
<div class="body">{text}</div>
{tags}
{faq}
</article>"#,
        crumbs = breadcrumbs(&crumbs),
        title = escape(&post.title),
        byline = byline.join(" · "),
        excerpt = paragraph(post.excerpt.as_deref(), "lead"),
        img = image(post.image.as_ref(), &post.title),
        text = portable_text::to_html(&post.body),
        tags = tag_links(&post.tags),
        faq = faq_section(&post.faq, &accordion, &path),
    );

    let description = post
        .excerpt
        .clone()
        .unwrap_or_else(|| portable_text::to_plain_text(&post.body));
    let site = state.site();
    let article = jsonld::article(
        &ArticleData {
            headline: &post.title,
            description: post.excerpt.as_deref(),
            path: path.clone(),
            image: post.image.as_ref().map(|i| i.url.as_str()),
            author: post.author.as_ref().map(|a| a.name.as_str()),
            section: Some("Blog"),
            keywords: &post.tags,
            published: post.published_at,
            modified: post.updated_at,
        },
        &site,
    );
    let page = Page::new(
        meta(&state, &post.title, &description, &path)
            .with_image(image_url(&state, post.image.as_ref().map(|i| i.url.as_str())))
            .article(),
        body,
    )
    .with_jsonld(article)
    .with_jsonld(jsonld::breadcrumbs(&crumbs, &site))
    .with_optional_jsonld(jsonld::faq_page(&post.faq));
    Ok(page_html(&state, &page))
}
