mod common;

use common::spawn_app;
use serde_json::Value;

#[tokio::test]
async fn health_reports_the_store() {
    let app = spawn_app().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    assert_eq!(app.get("/v1/ping").await.status(), 200);
}

#[tokio::test]
async fn query_binds_parameters() {
    let app = spawn_app().await;
    let body: Value = app
        .http
        .get(app.url("/v1/data/query"))
        .query(&[
            ("query", r#"*[_type == "venue" && city._ref == $city] | order(title asc){title}"#),
            ("$city", r#""city-barcelona""#),
        ])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let titles = body["result"].as_array().unwrap();
    assert_eq!(titles.len(), 2);
    assert!(body["ms"].is_u64());
}

#[tokio::test]
async fn drafts_only_show_in_the_raw_perspective() {
    let app = spawn_app().await;
    let token = app.token().await;
    let count = |perspective: Option<&'static str>| {
        let mut params = vec![("query", r#"count(*[_type == "review"])"#)];
        let mut request = app.http.get(app.url("/v1/data/query"));
        if let Some(p) = perspective {
            params.push(("perspective", p));
            request = request.bearer_auth(&token);
        }
        let request = request.query(&params);
        async move {
            let body: Value = request.send().await.unwrap().json().await.unwrap();
            body["result"].as_u64().unwrap()
        }
    };
    assert_eq!(count(None).await, 5);
    assert_eq!(count(Some("raw")).await, 6);
}

#[tokio::test]
async fn malformed_queries_are_bad_requests() {
    let app = spawn_app().await;
    let missing = app.get("/v1/data/query").await;
    assert_eq!(missing.status(), 400);

    let broken = app
        .http
        .get(app.url("/v1/data/query"))
        .query(&[("query", "*[_type == ")])
        .send()
        .await
        .unwrap();
    assert_eq!(broken.status(), 400);
    let body: Value = broken.json().await.unwrap();
    assert_eq!(body["error"]["type"], "badRequest");

    let perspective = app
        .http
        .get(app.url("/v1/data/query"))
        .query(&[("query", "count(*)"), ("perspective", "future")])
        .send()
        .await
        .unwrap();
    assert_eq!(perspective.status(), 400);
}

#[tokio::test]
async fn raw_perspective_requires_a_session() {
    let app = spawn_app().await;
    for perspective in ["raw", "drafts"] {
        let response = app
            .http
            .get(app.url("/v1/data/query"))
            .query(&[("query", "count(*)"), ("perspective", perspective)])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401, "{perspective}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["type"], "unauthorized");
    }

    let forged = app
        .http
        .get(app.url("/v1/data/query"))
        .bearer_auth("not-a-jwt")
        .query(&[("query", "count(*)"), ("perspective", "raw")])
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status(), 401);
}

#[tokio::test]
async fn anonymous_queries_skip_unpublished_and_internal_documents() {
    let app = spawn_app().await;
    let ids = |token: Option<String>| {
        let mut request = app
            .http
            .get(app.url("/v1/data/query"))
            .query(&[("query", r#"*[_type in ["guide", "qrCode"]]{_id}"#)]);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        async move {
            let body: Value = request.send().await.unwrap().json().await.unwrap();
            body["result"]
                .as_array()
                .unwrap()
                .iter()
                .filter_map(|doc| doc["_id"].as_str().map(str::to_string))
                .collect::<Vec<_>>()
        }
    };

    let anonymous = ids(None).await;
    assert_eq!(anonymous, vec!["guide-madrid-castizo".to_string()]);

    let signed_in = ids(Some(app.token().await)).await;
    assert!(signed_in.contains(&"guide-draft".to_string()));
    assert!(signed_in.contains(&"qr-casa-lucio".to_string()));
}

#[tokio::test]
async fn deeply_nested_queries_are_bad_requests() {
    let app = spawn_app().await;
    let nested = format!("{}true{}", "(".repeat(3000), ")".repeat(3000));
    let response = app
        .http
        .get(app.url("/v1/data/query"))
        .query(&[("query", nested.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["type"], "badRequest");

    assert_eq!(app.get("/health").await.status(), 200);
}
