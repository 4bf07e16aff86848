//! One-shot notices carried to the next page render in a short-lived cookie.

use axum::{
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};

pub const FLASH_COOKIE: &str = "imgdrop_flash";

/// Redirects to `location` and leaves `message` for the next render.
pub fn redirect_with(location: &str, message: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    let cookie = format!(
        "{FLASH_COOKIE}={}; Path=/; Max-Age=60; HttpOnly; SameSite=Lax",
        urlencoding::encode(message)
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}

/// Reads the pending flash message, if any, from the request cookies.
pub fn peek(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookie_hdr| cookie_hdr.split(';'))
        .find_map(|part| {
            let (k, v) = part.trim().split_once('=')?;
            if k.trim() != FLASH_COOKIE || v.trim().is_empty() {
                return None;
            }
            urlencoding::decode(v.trim()).ok().map(|s| s.into_owned())
        })
}

pub fn clear_cookie() -> HeaderValue {
    HeaderValue::from_static("imgdrop_flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
