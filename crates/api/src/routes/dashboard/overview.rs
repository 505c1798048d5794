use axum::extract::State;
use axum::response::Html;
use axum::Json;
use sobremesa_core::qr;
use sobremesa_core::stats::{dashboard_stats, DashboardStats};

use crate::error::ApiResult;
use crate::middleware::AdminSession;
use crate::render::escape;
use crate::render::layout::dashboard_document;
use crate::state::AppState;

pub fn login_page(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error" role="alert">{}</p>"#, escape(e)))
        .unwrap_or_default();
    dashboard_document(
        "Acceso",
        &format!(
            r#"<h1>Acceso al panel</h1>{error}<form method="post" action="/dashboard/login"><label for="password">Contraseña</label> <input type="password" id="password" name="password" required autocomplete="current-password"> <button type="submit">Entrar</button></form>"#
        ),
    )
}

fn stat_card(label: &str, value: u64) -> String {
    format!(r#"<div class="stat"><strong>{value}</strong>{label}</div>"#)
}

pub fn render_overview(stats: &DashboardStats, qr_codes: &[qr::QrCodeRecord]) -> String {
    let cards = [
        stat_card("Restaurantes", stats.venues),
        stat_card("Reseñas", stats.reviews),
        stat_card("Artículos", stats.posts),
        stat_card("Editorial", stats.editorial),
        stat_card("Códigos QR", stats.qr_codes),
        stat_card("Escaneos QR", stats.qr_scans),
        stat_card("Descargas QR", stats.qr_downloads),
    ]
    .concat();

    let top: String = stats
        .top_editorial
        .iter()
        .map(|e| {
            format!(
                r#"<tr><td><a href="{href}">{title}</a></td><td>{kind}</td><td>{views}</td></tr>"#,
                href = escape(&e.url()),
                title = escape(&e.title),
                kind = e.kind.label(),
                views = e.stats.views,
            )
        })
        .collect();

    let codes: String = qr_codes
        .iter()
        .map(|code| {
            format!(
                r#"<tr><td>{label}</td><td>{scans}</td><td>{downloads}</td><td><a href="/dashboard/api/qr/{id}/download?format=png">PNG</a> · <a href="/dashboard/api/qr/{id}/download?format=svg">SVG</a></td></tr>"#,
                label = escape(code.display_label()),
                scans = code.scans,
                downloads = code.downloads,
                id = escape(&code.id),
            )
        })
        .collect();

    format!(
        r#"<h1>Panel</h1>
<section class="stats">{cards}</section>
<section><h2>Contenido editorial más visto</h2><table><thead><tr><th>Título</th><th>Tipo</th><th>Visitas</th></tr></thead><tbody>{top}</tbody></table></section>
<section><h2>Códigos QR</h2><table><thead><tr><th>Etiqueta</th><th>Escaneos</th><th>Descargas</th><th>Descargar</th></tr></thead><tbody>{codes}</tbody></table></section>
<form method="post" action="/dashboard/api/logout"><button type="submit">Cerrar sesión</button></form>"#
    )
}

/// Overview screen, or the login form without a session.
pub async fn page(State(state): State<AppState>, session: Option<AdminSession>) -> Html<String> {
    if session.is_none() {
        return Html(login_page(None));
    }
    let (stats, codes) = tokio::join!(dashboard_stats(state.client()), qr::list(state.client()));
    let codes = codes.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "qr list failed on dashboard");
        Vec::new()
    });
    Html(dashboard_document("Panel", &render_overview(&stats, &codes)))
}

pub async fn stats(State(state): State<AppState>, _session: AdminSession) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(dashboard_stats(state.client()).await))
}
