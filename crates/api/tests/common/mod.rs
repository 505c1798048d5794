#![allow(dead_code)]

use std::path::{Path, PathBuf};

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use serde_json::{json, Value};
use sobremesa_api::config::AppConfig;
use sobremesa_api::state::AppState;
use sobremesa_core::events::EventBus;
use sobremesa_core::Store;
use tokio::net::TcpListener;

pub const PASSWORD: &str = "croquetas-de-jamon";
pub const BASE_URL: &str = "https://sobremesa.test";

const SEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../seed/sample.ndjson");

pub struct TestApp {
    pub addr: String,
    pub http: reqwest::Client,
    pub state: AppState,
    pub assets_dir: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.http.get(self.url(path)).send().await.unwrap()
    }

    pub async fn html(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {path}");
        response.text().await.unwrap()
    }

    pub async fn token(&self) -> String {
        let body: Value = self
            .http
            .post(self.url("/dashboard/api/login"))
            .json(&json!({ "password": PASSWORD }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["token"].as_str().unwrap().to_string()
    }
}

/// Serve the full app on an ephemeral port over the seeded memory store.
pub async fn spawn_app() -> TestApp {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(PASSWORD.as_bytes(), &salt)
        .unwrap()
        .to_string();
    let assets_dir = std::env::temp_dir().join(format!("sobremesa-assets-{}", uuid::Uuid::new_v4().simple()));

    let config = AppConfig {
        public_base_url: BASE_URL.to_string(),
        admin_password_hash: Some(hash),
        assets_dir: assets_dir.clone(),
        max_upload_bytes: 64 * 1024,
        ..AppConfig::default()
    };

    let store = Store::memory();
    sobremesa_api::seed(&store, Path::new(SEED)).await.unwrap();
    let state = AppState::new(store, config, EventBus::new(64));
    let app = sobremesa_api::build_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let http = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        http,
        state,
        assets_dir,
    }
}

/// Text between the first `open` and the following `close`.
pub fn between<'a>(html: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = html.find(open)? + open.len();
    let end = html[start..].find(close)? + start;
    Some(&html[start..end])
}

pub fn title(html: &str) -> String {
    decode(between(html, "<title>", "</title>").unwrap())
}

pub fn description(html: &str) -> String {
    decode(between(html, r#"<meta name="description" content=""#, r#"">"#).unwrap())
}

/// Every JSON-LD block on the page, parsed.
pub fn jsonld(html: &str) -> Vec<Value> {
    let open = r#"<script type="application/ld+json">"#;
    html.split(open)
        .skip(1)
        .map(|rest| {
            let raw = &rest[..rest.find("</script>").unwrap()];
            serde_json::from_str(&raw.replace("<\\/", "</")).unwrap()
        })
        .collect()
}

fn decode(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
