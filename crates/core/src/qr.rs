//! QR codes that point diners at a venue page.

use std::io::Cursor;

use chrono::{DateTime, Utc};
use image::{ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::QrCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::client::ContentClient;
use crate::content::{urls, CityRef};
use crate::ContentError;

/// Smallest edge, in pixels, of a rendered code.
pub const MIN_SIZE: u32 = 256;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("cannot encode QR data: {0}")]
    Encode(#[from] qrcode::types::QrError),
    #[error("cannot write image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    #[default]
    Png,
    Svg,
}

impl QrFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            QrFormat::Png => "image/png",
            QrFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            QrFormat::Png => "png",
            QrFormat::Svg => "svg",
        }
    }
}

pub fn render_png(data: &str) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let img = code
        .render::<Luma<u8>>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .build();
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

pub fn render_svg(data: &str) -> Result<String, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    Ok(code
        .render::<svg::Color<'_>>()
        .min_dimensions(MIN_SIZE, MIN_SIZE)
        .dark_color(svg::Color("#1c1917"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

pub fn render(data: &str, format: QrFormat) -> Result<Vec<u8>, QrError> {
    match format {
        QrFormat::Png => render_png(data),
        QrFormat::Svg => render_svg(data).map(String::into_bytes),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrVenue {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub city: CityRef,
}

/// A stored `qrCode` document joined with its venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub venue: Option<QrVenue>,
    #[serde(default)]
    pub scans: u64,
    #[serde(default)]
    pub downloads: u64,
    #[serde(rename = "_createdAt")]
    pub created_at: DateTime<Utc>,
}

impl QrCodeRecord {
    /// Path the code encodes; scanning it is counted before redirecting.
    pub fn scan_path(&self) -> String {
        urls::qr_scan(&self.id)
    }

    pub fn venue_path(&self) -> Option<String> {
        self.venue.as_ref().map(|v| urls::venue(&v.city.slug, &v.slug))
    }

    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .or(self.venue.as_ref().map(|v| v.title.as_str()))
            .unwrap_or("QR")
    }

    pub fn file_name(&self, format: QrFormat) -> String {
        let stem = self
            .venue
            .as_ref()
            .map(|v| v.slug.clone())
            .unwrap_or_else(|| self.id.clone());
        format!("qr-{stem}.{}", format.extension())
    }
}

pub const QR_CODES: &str = r#"*[_type == "qrCode"] | order(_createdAt desc){_id, label, "venue": venue->{_id, title, "slug": slug.current, "city": city->{title, "slug": slug.current}}, scans, downloads, _createdAt}"#;

pub const QR_CODE_BY_ID: &str = r#"*[_type == "qrCode" && _id == $id][0]{_id, label, "venue": venue->{_id, title, "slug": slug.current, "city": city->{title, "slug": slug.current}}, scans, downloads, _createdAt}"#;

pub async fn list(client: &ContentClient) -> Result<Vec<QrCodeRecord>, ContentError> {
    client.fetch_list(QR_CODES, Value::Null, &["qrCode"]).await
}

pub async fn get(client: &ContentClient, id: &str) -> Result<Option<QrCodeRecord>, ContentError> {
    client
        .fetch_optional(QR_CODE_BY_ID, serde_json::json!({ "id": id }), &["qrCode"])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::queries::tests::seeded_client;
    use serde_json::json;

    #[test]
    fn png_output_has_signature() {
        let png = render_png("https://sobremesa.es/q/qr-1").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn svg_output_is_markup() {
        let svg = render_svg("https://sobremesa.es/q/qr-1").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#1c1917"));
        assert_eq!(render("x", QrFormat::Svg).unwrap(), svg_bytes("x"));
    }

    fn svg_bytes(data: &str) -> Vec<u8> {
        render_svg(data).unwrap().into_bytes()
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let huge = "x".repeat(8000);
        assert!(matches!(render_png(&huge), Err(QrError::Encode(_))));
    }

    #[tokio::test]
    async fn records_join_their_venue() {
        let c = seeded_client().await;
        c.store()
            .insert(
                Document::from_json(json!({
                    "_id": "qr-lucio", "_type": "qrCode",
                    "venue": {"_ref": "venue-casa-lucio"}, "scans": 4
                }))
                .unwrap(),
            )
            .await
            .unwrap();

        let record = get(&c, "qr-lucio").await.unwrap().unwrap();
        assert_eq!(record.scans, 4);
        assert_eq!(record.display_label(), "Casa Lucio");
        assert_eq!(record.venue_path().as_deref(), Some("/madrid/venue/casa-lucio"));
        assert_eq!(record.scan_path(), "/q/qr-lucio");
        assert_eq!(record.file_name(QrFormat::Svg), "qr-casa-lucio.svg");
        assert_eq!(list(&c).await.unwrap().len(), 1);
        assert!(get(&c, "qr-none").await.unwrap().is_none());
    }
}
