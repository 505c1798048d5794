//! Dashboard overview numbers.

use serde::Serialize;
use serde_json::Value;

use crate::client::ContentClient;
use crate::content::EditorialSummary;

const COUNT_VENUES: &str = r#"count(*[_type == "venue"])"#;
const COUNT_REVIEWS: &str = r#"count(*[_type == "review"])"#;
const COUNT_POSTS: &str = r#"count(*[_type == "post"])"#;
const COUNT_EDITORIAL: &str = r#"count(*[_type in ["guide", "list", "news", "offer", "dishGuide"]])"#;
const QR_COUNTERS: &str = r#"*[_type == "qrCode"]{"scans": coalesce(scans, 0), "downloads": coalesce(downloads, 0)}"#;
const TOP_EDITORIAL: &str = r#"*[_type in ["guide", "list", "news", "offer", "dishGuide"] && published == true && defined(slug.current)] | order(coalesce(stats.views, 0) desc, title asc)[0...5]{_id, _type, title, "slug": slug.current, excerpt, publishedAt, stats}"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub venues: u64,
    pub reviews: u64,
    pub posts: u64,
    pub editorial: u64,
    pub qr_codes: u64,
    pub qr_scans: u64,
    pub qr_downloads: u64,
    pub top_editorial: Vec<EditorialSummary>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct QrCounters {
    #[serde(default)]
    scans: u64,
    #[serde(default)]
    downloads: u64,
}

async fn count_or_zero(client: &ContentClient, name: &str, query: &str) -> u64 {
    match client.fetch::<Value>(query, Value::Null, &[name]).await {
        Ok(value) => value.as_u64().unwrap_or(0),
        Err(err) => {
            tracing::warn!(stat = name, error = %err, "dashboard count failed, showing 0");
            0
        }
    }
}

/// Collect every figure concurrently. A failed query shows as zero (or an
/// empty list) instead of failing the dashboard.
pub async fn dashboard_stats(client: &ContentClient) -> DashboardStats {
    let (venues, reviews, posts, editorial, qr, top) = tokio::join!(
        count_or_zero(client, "venue", COUNT_VENUES),
        count_or_zero(client, "review", COUNT_REVIEWS),
        count_or_zero(client, "post", COUNT_POSTS),
        count_or_zero(client, "editorial", COUNT_EDITORIAL),
        client.fetch_list::<QrCounters>(QR_COUNTERS, Value::Null, &["qrCode"]),
        client.fetch_list::<EditorialSummary>(TOP_EDITORIAL, Value::Null, &["editorial"]),
    );

    let qr = qr.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "qr stats failed, showing 0");
        Vec::new()
    });
    let top_editorial = top.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "top editorial failed");
        Vec::new()
    });

    DashboardStats {
        venues,
        reviews,
        posts,
        editorial,
        qr_codes: qr.len() as u64,
        qr_scans: qr.iter().map(|q| q.scans).sum(),
        qr_downloads: qr.iter().map(|q| q.downloads).sum(),
        top_editorial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::queries::tests::seeded_client;
    use serde_json::json;

    #[tokio::test]
    async fn counts_published_content() {
        let c = seeded_client().await;
        for qr in [
            json!({"_id": "qr-1", "_type": "qrCode", "venue": {"_ref": "venue-casa-lucio"}, "scans": 12, "downloads": 3}),
            json!({"_id": "qr-2", "_type": "qrCode", "venue": {"_ref": "venue-botin"}}),
        ] {
            c.store().insert(Document::from_json(qr).unwrap()).await.unwrap();
        }

        let stats = dashboard_stats(&c).await;
        assert_eq!(stats.venues, 3);
        assert_eq!(stats.reviews, 1);
        assert_eq!(stats.posts, 1);
        assert_eq!(stats.editorial, 2);
        assert_eq!(stats.qr_codes, 2);
        assert_eq!(stats.qr_scans, 12);
        assert_eq!(stats.qr_downloads, 3);
        assert_eq!(stats.top_editorial.len(), 1);
        assert_eq!(stats.top_editorial[0].stats.views, 40);
    }

    #[tokio::test]
    async fn empty_store_is_all_zero() {
        let c = ContentClient::new(crate::store::Store::memory());
        assert_eq!(dashboard_stats(&c).await, DashboardStats::default());
    }
}
