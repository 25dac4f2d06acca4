//! Cookie header parsing.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;

/// Request cookies by name. Values are kept exactly as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies(HashMap<String, String>);

impl Cookies {
    /// Collect every `Cookie` header. The first occurrence of a name wins and
    /// malformed pairs are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut map = HashMap::new();
        let pairs = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value).filter_map(Result::ok));

        for cookie in pairs {
            if cookie.name().is_empty() {
                continue;
            }
            map.entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value().to_string());
        }

        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Middleware that attaches [`Cookies`] to every request.
pub async fn parse_cookies(mut request: Request, next: Next) -> Response {
    let cookies = Cookies::from_headers(request.headers());
    request.extensions_mut().insert(cookies);
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for Cookies {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Cookies>()
            .cloned()
            .unwrap_or_else(|| Cookies::from_headers(&parts.headers)))
    }
}
