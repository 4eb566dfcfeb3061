//! HTTP client for end-to-end tests
//!
//! Wraps reqwest and provides one method per API endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client sending Basic credentials with every request
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    credentials: Option<(String, String)>,
}

impl TestClient {
    /// Creates a client that sends no credentials
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            credentials: None,
        }
    }

    pub fn with_credentials(base_url: String, username: &str, password: &str) -> Self {
        Self {
            credentials: Some((username.to_string(), password.to_string())),
            ..Self::new(base_url)
        }
    }

    /// Client for the user with a pre-populated ledger.
    pub fn authenticated(base_url: String) -> Self {
        Self::with_credentials(base_url, TEST_USER, TEST_PASS)
    }

    /// Client for the user without ratings.
    pub fn authenticated_other(base_url: String) -> Self {
        Self::with_credentials(base_url, OTHER_USER, OTHER_PASS)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.credentials {
            Some((username, password)) => builder.basic_auth(username, Some(password)),
            None => builder,
        }
    }

    async fn send(builder: reqwest::RequestBuilder) -> Response {
        builder.send().await.expect("Request failed")
    }

    /// GET /
    pub async fn get_home(&self) -> Response {
        Self::send(self.request(reqwest::Method::GET, "/")).await
    }

    /// GET /api/songs/random/
    pub async fn get_random_song(&self, query: &[(&str, &str)]) -> Response {
        Self::send(self.request(reqwest::Method::GET, "/api/songs/random/").query(query)).await
    }

    /// GET /api/songs/{id}/file/
    pub async fn get_song_file(&self, id: &str) -> Response {
        Self::send(self.request(reqwest::Method::GET, &format!("/api/songs/{}/file/", id))).await
    }

    /// POST /api/songs/{id}/play/
    pub async fn post_play(&self, id: &str, timestamp: i64, rating: i64) -> Response {
        self.post_play_body(id, json!({"timestamp": timestamp, "rating": rating}))
            .await
    }

    /// POST /api/songs/{id}/play/ with an arbitrary body
    pub async fn post_play_body(&self, id: &str, body: Value) -> Response {
        Self::send(
            self.request(reqwest::Method::POST, &format!("/api/songs/{}/play/", id))
                .json(&body),
        )
        .await
    }

    /// GET /api/ratings/export/
    pub async fn export_ratings(&self) -> Response {
        Self::send(self.request(reqwest::Method::GET, "/api/ratings/export/")).await
    }

    /// POST /api/ratings/import/
    pub async fn import_ratings(&self, songs: Value) -> Response {
        Self::send(
            self.request(reqwest::Method::POST, "/api/ratings/import/")
                .json(&json!({ "songs": songs })),
        )
        .await
    }
}
