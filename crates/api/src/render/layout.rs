use axum::http::StatusCode;
use serde_json::Value;
use sobremesa_core::seo::jsonld;
use sobremesa_core::seo::PageMeta;

use super::escape;

const STYLE: &str = r#"
body { font-family: Georgia, serif; color: #1c1917; margin: 0; background: #fafaf9; }
header, footer { background: #1c1917; color: #fafaf9; padding: 1rem 2rem; }
header a, footer a { color: #fafaf9; margin-right: 1rem; text-decoration: none; }
main { max-width: 960px; margin: 0 auto; padding: 1.5rem; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1rem; padding: 0; }
.card { list-style: none; background: #fff; border: 1px solid #e7e5e4; border-radius: 6px; padding: 1rem; }
.card img, .gallery img, .carousel img { width: 100%; height: auto; border-radius: 4px; }
.rating { font-weight: bold; color: #b45309; }
.breadcrumbs ol { display: flex; gap: .5rem; list-style: none; padding: 0; }
.faq button { background: none; border: 0; font: inherit; cursor: pointer; }
.tabs a[aria-current="page"] { font-weight: bold; text-decoration: underline; }
.map-placeholder { background: #e7e5e4; padding: 2rem; text-align: center; }
"#;

/// A rendered public page: head tags, structured data and body markup.
#[derive(Debug, Clone)]
pub struct Page {
    pub meta: PageMeta,
    pub jsonld: Vec<Value>,
    pub body: String,
}

impl Page {
    pub fn new(meta: PageMeta, body: String) -> Self {
        Self {
            meta,
            jsonld: Vec::new(),
            body,
        }
    }

    pub fn with_jsonld(mut self, value: Value) -> Self {
        self.jsonld.push(value);
        self
    }

    pub fn with_optional_jsonld(mut self, value: Option<Value>) -> Self {
        self.jsonld.extend(value);
        self
    }
}

fn head(meta: &PageMeta, site_name: &str) -> String {
    let mut tags = vec![
        format!("<title>{}</title>", escape(&meta.title)),
        format!(r#"<meta name="description" content="{}">"#, escape(&meta.description)),
        format!(r#"<link rel="canonical" href="{}">"#, escape(&meta.canonical)),
        format!(r#"<meta property="og:site_name" content="{}">"#, escape(site_name)),
        format!(r#"<meta property="og:title" content="{}">"#, escape(&meta.title)),
        format!(r#"<meta property="og:description" content="{}">"#, escape(&meta.description)),
        format!(r#"<meta property="og:url" content="{}">"#, escape(&meta.canonical)),
        format!(r#"<meta property="og:type" content="{}">"#, meta.og_type),
        r#"<meta property="og:locale" content="es_ES">"#.to_string(),
    ];
    if let Some(image) = &meta.image {
        tags.push(format!(r#"<meta property="og:image" content="{}">"#, escape(image)));
    }
    if !meta.keywords.is_empty() {
        tags.push(format!(r#"<meta name="keywords" content="{}">"#, escape(&meta.keywords.join(", "))));
    }
    if meta.noindex {
        tags.push(r#"<meta name="robots" content="noindex">"#.to_string());
    }
    tags.join("\n    ")
}

fn header() -> &'static str {
    r#"<header><nav aria-label="Principal"><a href="/"><strong>Sobremesa</strong></a><a href="/blog">Blog</a><a href="/buscar">Buscar</a></nav></header>"#
}

/// Full HTML document for a public page.
pub fn render_page(page: &Page, site_name: &str) -> String {
    let scripts: String = page.jsonld.iter().map(jsonld::to_script).collect::<Vec<_>>().join("\n");
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    {head}
    <style>{STYLE}</style>
    {scripts}
</head>
<body>
{header}
<main>
{body}
</main>
<footer><p>{site} · Reseñas independientes de restaurantes en España</p><a href="/sitemap.xml">Mapa del sitio</a></footer>
</body>
</html>"#,
        head = head(&page.meta, site_name),
        header = header(),
        body = page.body,
        site = escape(site_name),
    )
}

/// Standalone page for 404 and 500 responses.
pub fn error_page(status: StatusCode) -> String {
    let (title, message) = if status == StatusCode::NOT_FOUND {
        ("Página no encontrada", "No hemos encontrado lo que buscabas. Puede que el enlace haya cambiado.")
    } else {
        ("Algo ha salido mal", "No hemos podido cargar esta página. Inténtalo de nuevo en unos minutos.")
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <meta name="robots" content="noindex">
    <style>{STYLE}</style>
</head>
<body>
{header}
<main>
<h1>{title}</h1>
<p>{message}</p>
<form action="/buscar" method="get" role="search"><input type="search" name="q" aria-label="Buscar"><button type="submit">Buscar</button></form>
<p><a href="/">Volver al inicio</a></p>
</main>
</body>
</html>"#,
        header = header(),
    )
}

/// Shell for dashboard screens. Never indexed.
pub fn dashboard_document(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="utf-8">
    <title>{title} · Panel</title>
    <meta name="robots" content="noindex">
    <style>{STYLE}
.stats {{ display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }}
.stat {{ background: #fff; border: 1px solid #e7e5e4; padding: 1rem; text-align: center; }}
.stat strong {{ display: block; font-size: 2rem; }}
    </style>
</head>
<body>
<header><nav aria-label="Panel"><a href="/dashboard"><strong>Panel</strong></a><a href="/">Ver sitio</a></nav></header>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

/// A `<p>` for optional text; nothing when blank.
pub fn paragraph(text: Option<&str>, class: &str) -> String {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => format!(r#"<p class="{class}">{}</p>"#, escape(text)),
        None => String::new(),
    }
}
