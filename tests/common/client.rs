//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. When routes or
//! request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the regular test user
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    pub async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    async fn post_json(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("POST request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    /// POST /v1/auth/register
    pub async fn register(&self, handle: &str, password: &str) -> Response {
        self.post_json(
            "/v1/auth/register",
            json!({ "user_handle": handle, "password": password }),
        )
        .await
    }

    /// POST /v1/auth/login
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.post_json(
            "/v1/auth/login",
            json!({ "user_handle": handle, "password": password }),
        )
        .await
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    // ========================================================================
    // Content Endpoints
    // ========================================================================

    /// GET /v1/content/songs
    pub async fn list_songs(&self) -> Response {
        self.get("/v1/content/songs").await
    }

    /// GET /v1/content/song/{id}
    pub async fn get_song(&self, id: i64) -> Response {
        self.get(&format!("/v1/content/song/{}", id)).await
    }

    /// GET /v1/content/artist/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.get(&format!("/v1/content/artist/{}", id)).await
    }

    /// GET /v1/content/album/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.get(&format!("/v1/content/album/{}", id)).await
    }

    /// GET /v1/content/charts
    pub async fn get_charts(&self) -> Response {
        self.get("/v1/content/charts").await
    }

    /// GET /v1/content/hashtag/{name}
    pub async fn get_hashtag(&self, name: &str) -> Response {
        self.get(&format!("/v1/content/hashtag/{}", name)).await
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// POST /v1/user/rate
    pub async fn rate_song(&self, song_id: i64, score: i64, review: &str) -> Response {
        self.post_json(
            "/v1/user/rate",
            json!({ "song_id": song_id, "score": score, "review": review }),
        )
        .await
    }

    /// POST /v1/user/artist
    pub async fn add_artist(&self, artist_name: &str, info: &str) -> Response {
        self.post_json(
            "/v1/user/artist",
            json!({ "artist_name": artist_name, "info": info }),
        )
        .await
    }

    /// POST /v1/user/album
    pub async fn add_album(&self, body: Value) -> Response {
        self.post_json("/v1/user/album", body).await
    }

    /// POST /v1/user/song
    pub async fn add_song(&self, body: Value) -> Response {
        self.post_json("/v1/user/song", body).await
    }

    /// POST /v1/user/note/{entity_type}/{entity_id}
    pub async fn add_note(
        &self,
        entity_type: &str,
        entity_id: i64,
        note: &str,
        hashtags: Option<&str>,
    ) -> Response {
        self.post_json(
            &format!("/v1/user/note/{}/{}", entity_type, entity_id),
            json!({ "note": note, "hashtags": hashtags }),
        )
        .await
    }

    /// GET /v1/user/profile
    pub async fn get_profile(&self) -> Response {
        self.get("/v1/user/profile").await
    }

    // ========================================================================
    // Search Endpoints
    // ========================================================================

    /// GET /v1/search/{kind}?q=...
    pub async fn search(&self, kind: &str, query: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/search/{}", kind)))
            .query(&[("q", query)])
            .send()
            .await
            .expect("Search request failed")
    }

    /// GET /v1/search/albums?q=...&artist_id=...
    pub async fn search_albums(&self, query: &str, artist_id: Option<i64>) -> Response {
        let artist_id = artist_id.map(|id| id.to_string()).unwrap_or_default();
        self.client
            .get(self.url("/v1/search/albums"))
            .query(&[("q", query), ("artist_id", artist_id.as_str())])
            .send()
            .await
            .expect("Search request failed")
    }
}
