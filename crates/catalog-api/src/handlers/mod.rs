//! Request handlers and the per-request page context.

pub mod products;

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Query};
use axum::http::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;

use crate::flash::{self, Flash};
use crate::messages::Locale;
use crate::state::AppState;
use crate::views::PageContext;

#[derive(Debug, Deserialize)]
struct LocaleParam {
    locale: Option<String>,
}

/// Locale and pending flash messages of the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub locale: Locale,
    /// Flashes left by the previous response; consumed by this one.
    pub flashes: Vec<Flash>,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let query_locale = Query::<LocaleParam>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(p)| p.locale);
        let accept_language = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok());

        Ok(Self {
            locale: Locale::negotiate(
                query_locale.as_deref(),
                accept_language,
                state.config.default_locale,
            ),
            flashes: flash::read(&parts.headers),
        })
    }
}

impl RequestContext {
    /// Render an HTML page with the pending flashes plus `extra`.
    ///
    /// The flash cookie is expired whenever it was read.
    pub fn render(
        &self,
        status: StatusCode,
        extra: &[Flash],
        page: impl FnOnce(&PageContext<'_>) -> String,
    ) -> Response {
        let flashes: Vec<Flash> = self.flashes.iter().chain(extra).cloned().collect();
        let html = page(&PageContext {
            locale: self.locale,
            flashes: &flashes,
        });

        let mut response = (
            status,
            [(CONTENT_TYPE, "text/html; charset=utf-8")],
            html,
        )
            .into_response();
        if !self.flashes.is_empty() {
            response
                .headers_mut()
                .append(SET_COOKIE, flash::clear_cookie());
        }
        response
    }
}

pub async fn root() -> Redirect {
    Redirect::to("/product")
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
