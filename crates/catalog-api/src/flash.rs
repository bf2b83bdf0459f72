//! One-shot flash messages carried across a redirect in a cookie.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};

use catalog_core::defaults::FLASH_COOKIE_MAX_AGE_SECS;

pub const FLASH_COOKIE: &str = "catalog_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
            FlashKind::Info => "info",
        }
    }
}

/// A message id to show once, translated at render time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }
}

/// `Set-Cookie` value storing `flashes` for the next request.
pub fn set_cookie(flashes: &[Flash]) -> String {
    let json = serde_json::to_string(flashes).unwrap_or_else(|_| "[]".to_string());
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        FLASH_COOKIE,
        urlencoding::encode(&json),
        FLASH_COOKIE_MAX_AGE_SECS
    )
}

/// `Set-Cookie` value expiring the flash cookie.
pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("catalog_flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Read pending flashes from the request cookies. Malformed cookies yield none.
pub fn read(headers: &HeaderMap) -> Vec<Flash> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == FLASH_COOKIE)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default()
}

/// 303 redirect to `location` leaving `flashes` for the next page.
pub fn redirect_with(location: &str, flashes: &[Flash]) -> Response {
    if flashes.is_empty() {
        return Redirect::to(location).into_response();
    }
    (
        AppendHeaders([(SET_COOKIE, set_cookie(flashes))]),
        Redirect::to(location),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn cookie_header(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}", pair)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_cookie_carries_flashes() {
        let flashes = vec![
            Flash::success("record.added"),
            Flash::error("one_of_the_files_is_not_an_image"),
        ];
        let headers = cookie_header(&set_cookie(&flashes));
        assert_eq!(read(&headers), flashes);
    }

    #[test]
    fn test_missing_or_malformed_cookie_reads_empty() {
        assert!(read(&HeaderMap::new()).is_empty());

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("catalog_flash=%7Bnope"));
        assert!(read(&headers).is_empty());
    }

    #[test]
    fn test_clear_cookie_expires() {
        let cookie = clear_cookie();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}=;", FLASH_COOKIE)));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_redirect_with_flash_is_see_other() {
        let resp = redirect_with("/product", &[Flash::success("record.deleted")]);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()["location"], "/product");
        assert!(resp.headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .starts_with("catalog_flash="));
    }

    #[test]
    fn test_redirect_without_flash_sets_no_cookie() {
        let resp = redirect_with("/product", &[]);
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert!(resp.headers().get(SET_COOKIE).is_none());
    }
}
