use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Session token from an `Authorization: Bearer` header.
///
/// Returns:
/// - None: no bearer token present
/// - Some(Ok(user)): token verified
/// - Some(Err(error)): token present but invalid
fn try_bearer_auth(headers: &HeaderMap, config: &Config) -> Option<Result<CurrentUser>> {
    let value = headers.get(header::AUTHORIZATION)?;
    let value = match value.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };
    let token = value.strip_prefix("Bearer ")?.trim();

    Some(session::verify_session_token(token, config))
}

/// Session token from the session cookie. Same contract as [`try_bearer_auth`].
fn try_cookie_auth(headers: &HeaderMap, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_name = &config.auth.native.session.cookie_name;
    let mut last_error = None;

    for value in headers.get_all(header::COOKIE) {
        let Ok(cookies) = value.to_str() else {
            continue;
        };
        let tokens = cookies
            .split(';')
            .filter_map(|cookie| cookie.trim().split_once('='))
            .filter(|(name, _)| *name == cookie_name.as_str())
            .map(|(_, token)| token);

        for token in tokens {
            match session::verify_session_token(token, config) {
                Ok(user) => return Some(Ok(user)),
                // Stale cookies are expected; keep looking
                Err(e) => last_error = Some(e),
            }
        }
    }

    last_error.map(Err)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let mut auth_error = None;

        match try_bearer_auth(&parts.headers, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Bearer authentication failed: {:?}", e);
                auth_error = Some(e);
            }
            None => trace!("No bearer token presented"),
        }

        match try_cookie_auth(&parts.headers, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session cookie user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Session cookie authentication failed: {:?}", e);
                auth_error = auth_error.or(Some(e));
            }
            None => trace!("No session cookie presented"),
        }

        match auth_error {
            // Server-side failures surface as such; everything else is a plain 401
            Some(e @ Error::Internal { .. }) => Err(e),
            Some(_) => Err(Error::Unauthenticated {
                message: Some("Invalid or expired session".to_string()),
            }),
            None => Err(Error::Unauthenticated { message: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::create_session_token;
    use crate::test_utils::test_config;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "ada@example.org".to_string(),
        }
    }

    #[test]
    fn test_bearer_token() {
        let config = test_config();
        let user = user();
        let token = create_session_token(&user, &config).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
        assert_eq!(try_bearer_auth(&headers, &config).unwrap().unwrap().id, user.id);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(try_bearer_auth(&headers, &config).is_none());
    }

    #[test]
    fn test_cookie_among_others() {
        let config = test_config();
        let user = user();
        let token = create_session_token(&user, &config).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; formflow_session={token}; other=1")).unwrap(),
        );
        assert_eq!(try_cookie_auth(&headers, &config).unwrap().unwrap().id, user.id);
    }

    #[test]
    fn test_invalid_cookie_reports_error() {
        let config = test_config();
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("formflow_session=garbage"));
        assert!(matches!(
            try_cookie_auth(&headers, &config),
            Some(Err(Error::Unauthenticated { .. }))
        ));

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(try_cookie_auth(&headers, &config).is_none());
    }
}
