use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
};
use tracing::debug;
use uuid::Uuid;

pub const USER_COOKIE: &str = "user_id";
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// The browser's user identifier, read from the `user_id` cookie.
/// A missing or malformed cookie gets a freshly minted id.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
}

impl CurrentUser {
    /// `Set-Cookie` header that (re)issues the id for another year.
    pub fn cookie_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let cookie = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            USER_COOKIE, self.id, COOKIE_MAX_AGE_SECS
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.insert(header::SET_COOKIE, value);
        }
        headers
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let existing = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(user_id_from_cookie_header);

        let id = existing.unwrap_or_else(|| {
            let id = Uuid::new_v4();
            debug!(user_id = %id, "issuing new user id");
            id
        });
        Ok(CurrentUser { id })
    }
}

fn user_id_from_cookie_header(raw: &str) -> Option<Uuid> {
    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == USER_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim_matches('"')).ok())
}
