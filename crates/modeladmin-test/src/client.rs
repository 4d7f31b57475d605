//! In-process HTTP test client.
//!
//! [`TestClient`] sends requests straight into a [`Router`] through
//! [`tower::ServiceExt::oneshot`]. Every request carries `Host: testserver`
//! unless another host is configured, so absolute URLs built from the
//! request origin come out as `http://testserver/...`.
//!
//! ```rust,no_run
//! use axum::routing::get;
//! use axum::Router;
//! use modeladmin_test::TestClient;
//!
//! async fn example() {
//!     let app = Router::new().route("/hello", get(|| async { "Hello" }));
//!     let client = TestClient::new(app);
//!
//!     let response = client.get("/hello").await;
//!     assert_eq!(response.status_code(), 200);
//!     assert_eq!(response.text(), "Hello");
//! }
//! ```

use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use modeladmin_core::{AdminError, AdminResult};

/// The host sent with every request by default.
pub const DEFAULT_HOST: &str = "testserver";

/// A client for making simulated HTTP requests against a router.
#[derive(Debug, Clone)]
pub struct TestClient {
    app: Router,
    host: String,
    headers: HeaderMap,
}

impl TestClient {
    /// Creates a client for `app`.
    pub fn new(app: Router) -> Self {
        Self {
            app,
            host: DEFAULT_HOST.to_string(),
            headers: HeaderMap::new(),
        }
    }

    /// Sets the `Host` header sent with requests.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sends a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    /// Sends a POST request with an urlencoded form body.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        self.send(
            Method::POST,
            path,
            Some(("application/x-www-form-urlencoded", body.into_bytes())),
        )
        .await
    }

    /// Sends a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<(&str, Vec<u8>)>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(HOST, &self.host);
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let body = match body {
            Some((content_type, bytes)) => {
                builder = builder.header(CONTENT_TYPE, content_type);
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let request = builder
            .body(body)
            .expect("request builder should not fail");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router should not error");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }
}

/// The response to a test request.
#[derive(Debug)]
pub struct TestResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The response headers.
    pub headers: HeaderMap,
    /// The raw response body.
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Returns the numeric status code.
    pub const fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the body as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> AdminResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| AdminError::Serialization(e.to_string()))
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `true` if the response has the header.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// Returns the `Location` header of a redirect.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Returns `true` if the body contains `text`.
    pub fn contains(&self, text: &str) -> bool {
        self.text().contains(text)
    }
}
