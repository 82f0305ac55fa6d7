//! Black-box tests against a running Vitrinex API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start a server (memory storage is enough)
//! VITRINEX_STORAGE=memory VITRINEX_RATE_LIMIT=false cargo run -p vitrinex-api
//!
//! # Run the ignored tests against it
//! VITRINEX_TEST_BASE_URL=http://127.0.0.1:3000 \
//!     cargo test -p vitrinex-integration-tests -- --ignored
//! ```
//!
//! Every test registers fresh accounts with unique emails, so runs do not
//! interfere with each other or with existing data.

use reqwest::{Client, Response};
use serde_json::{Value, json};
use uuid::Uuid;

/// Environment variable naming the server under test.
pub const BASE_URL_ENV: &str = "VITRINEX_TEST_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "integration-secret";

/// One browser-like client: it keeps its own cookie jar, so each
/// `TestClient` is a separate session.
pub struct TestClient {
    pub client: Client,
    pub base_url: String,
}

impl TestClient {
    /// Client for the server named by [`BASE_URL_ENV`].
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let base_url = std::env::var(BASE_URL_ENV)
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();

        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self { client, base_url })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register a fresh account; the session cookie lands in this client's jar.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the request fails to send.
    pub async fn register(&self, username: &str) -> Result<(String, Response), reqwest::Error> {
        let email = unique_email(username);
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": email,
                "password": TEST_PASSWORD,
            }))
            .send()
            .await?;
        Ok((email, response))
    }

    /// # Errors
    ///
    /// Returns `reqwest::Error` if the request fails to send.
    pub async fn get(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client.get(self.url(path)).send().await
    }

    /// # Errors
    ///
    /// Returns `reqwest::Error` if the request fails to send.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Response, reqwest::Error> {
        self.client.post(self.url(path)).json(body).send().await
    }

    /// # Errors
    ///
    /// Returns `reqwest::Error` if the request fails to send.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Response, reqwest::Error> {
        self.client.put(self.url(path)).json(body).send().await
    }

    /// # Errors
    ///
    /// Returns `reqwest::Error` if the request fails to send.
    pub async fn delete(&self, path: &str) -> Result<Response, reqwest::Error> {
        self.client.delete(self.url(path)).send().await
    }
}

/// An email no other test run has used.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.test", Uuid::new_v4().simple())
}
