//! Security headers added to every response.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;

/// Header names set by [`security_headers_middleware`].
pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
    pub const X_FRAME_OPTIONS: &str = "x-frame-options";
    pub const X_XSS_PROTECTION: &str = "x-xss-protection";
}

const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Adds `nosniff`, `DENY` framing and the legacy XSS filter header.
/// `Strict-Transport-Security` is added only when `security.hsts_enabled`
/// is set, since it is only correct behind TLS termination.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut(), state.config.security.hsts_enabled);
    response
}

fn apply_security_headers(map: &mut axum::http::HeaderMap, hsts: bool) {
    map.insert(
        header::HeaderName::from_static(headers::X_CONTENT_TYPE_OPTIONS),
        HeaderValue::from_static("nosniff"),
    );
    map.insert(
        header::HeaderName::from_static(headers::X_FRAME_OPTIONS),
        HeaderValue::from_static("DENY"),
    );
    map.insert(
        header::HeaderName::from_static(headers::X_XSS_PROTECTION),
        HeaderValue::from_static("1; mode=block"),
    );

    if hsts {
        map.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn test_headers_without_hsts() {
        let mut map = HeaderMap::new();
        apply_security_headers(&mut map, false);

        assert_eq!(map[headers::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(map[headers::X_FRAME_OPTIONS], "DENY");
        assert_eq!(map[headers::X_XSS_PROTECTION], "1; mode=block");
        assert!(!map.contains_key(header::STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn test_headers_with_hsts() {
        let mut map = HeaderMap::new();
        apply_security_headers(&mut map, true);
        assert_eq!(map[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    }
}
