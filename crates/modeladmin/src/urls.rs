//! Absolute URL construction for admin pages.
//!
//! Redirects after a save point at absolute URLs, so [`AdminUrls`] pairs the
//! request origin (scheme and host) with the admin base path.

use http::header::HOST;
use http::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use modeladmin_core::{AdminError, AdminResult};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Builds URLs for the pages of one admin site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUrls {
    origin: Url,
    base_url: String,
}

impl AdminUrls {
    /// Creates a builder from an origin such as `http://testserver`.
    ///
    /// `base_url` must already be normalized (leading `/`, no trailing `/`).
    pub fn new(origin: &str, base_url: impl Into<String>) -> AdminResult<Self> {
        let origin = Url::parse(origin)
            .map_err(|e| AdminError::BadRequest(format!("Invalid origin '{origin}': {e}")))?;
        Ok(Self {
            origin,
            base_url: base_url.into(),
        })
    }

    /// Derives the origin from request headers.
    ///
    /// The host comes from `Host` (falling back to `localhost`) and the
    /// scheme from `X-Forwarded-Proto` (falling back to `http`).
    pub fn from_headers(headers: &HeaderMap, base_url: impl Into<String>) -> AdminResult<Self> {
        let host = headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|h| !h.is_empty())
            .unwrap_or("localhost");
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .filter(|s| matches!(*s, "http" | "https"))
            .unwrap_or("http");
        Self::new(&format!("{scheme}://{host}"), base_url)
    }

    /// Returns the admin base path.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(&self, segments: &[&str]) -> Url {
        let mut path = self.base_url.clone();
        for segment in segments {
            path.push('/');
            path.extend(utf8_percent_encode(segment, SEGMENT));
        }
        if path.is_empty() {
            path.push('/');
        }
        let mut url = self.origin.clone();
        url.set_path(&path);
        url
    }

    /// The index page.
    pub fn index(&self) -> Url {
        self.build(&[])
    }

    /// The list page of a view.
    pub fn list(&self, identity: &str) -> Url {
        self.build(&[identity, "list"])
    }

    /// The details page of a record.
    pub fn details(&self, identity: &str, pk: &str) -> Url {
        self.build(&[identity, "details", pk])
    }

    /// The create form of a view.
    pub fn create(&self, identity: &str) -> Url {
        self.build(&[identity, "create"])
    }

    /// The edit form of a record.
    pub fn edit(&self, identity: &str, pk: &str) -> Url {
        self.build(&[identity, "edit", pk])
    }

    /// The delete endpoint of a view.
    pub fn delete(&self, identity: &str) -> Url {
        self.build(&[identity, "delete"])
    }
}

/// Returns the path and query of a URL, for links inside rendered pages.
pub fn relative(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}
