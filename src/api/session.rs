use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

/// Reads the session id from the request cookies, ignoring malformed values.
pub fn read_session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
}

pub fn session_cookie(id: Uuid) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; session_id={id}")).unwrap(),
        );

        assert_eq!(read_session_id(&CookieJar::from_headers(&headers)), Some(id));
    }

    #[test]
    fn test_malformed_session_id_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_id=nope"));
        assert_eq!(read_session_id(&CookieJar::from_headers(&headers)), None);
        assert_eq!(read_session_id(&CookieJar::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let id = Uuid::new_v4();
        let cookie = session_cookie(id);

        assert_eq!(cookie.value(), id.to_string());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(read_session_id(&CookieJar::new().add(cookie)), Some(id));
    }
}
