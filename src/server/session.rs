use super::metrics::record_auth_attempt;
use super::state::ServerState;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;
use tracing::{debug, error};

/// The user a request is authenticated as, resolved from HTTP Basic credentials.
#[derive(Debug)]
pub struct Session {
    pub username: String,
}

pub const BASIC_AUTH_REALM: &str = "Basic";

const NOT_AUTHENTICATED: &str = "Not authenticated";
const BAD_CREDENTIALS: &str = "Incorrect username or password";

#[derive(Debug)]
pub enum SessionExtractionError {
    Unauthorized(&'static str),
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> Response {
        match self {
            SessionExtractionError::Unauthorized(detail) => (
                StatusCode::UNAUTHORIZED,
                [(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_AUTH_REALM),
                )],
                Json(json!({ "detail": detail })),
            )
                .into_response(),
            SessionExtractionError::InternalError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct BasicCredentials {
    username: String,
    password: String,
}

fn parse_basic_credentials(value: &[u8]) -> Option<BasicCredentials> {
    let value = std::str::from_utf8(value).ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_owned(),
        password: password.to_owned(),
    })
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Session, SessionExtractionError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        debug!("No Authorization header.");
        return Err(SessionExtractionError::Unauthorized(NOT_AUTHENTICATED));
    };
    let Some(credentials) = parse_basic_credentials(value.as_bytes()) else {
        debug!("Authorization header is not valid Basic credentials.");
        return Err(SessionExtractionError::Unauthorized(NOT_AUTHENTICATED));
    };

    // Password hashing is CPU bound.
    let user_store = ctx.user_store.clone();
    let resolved = tokio::task::spawn_blocking(move || {
        user_store.resolve_user(&credentials.username, &credentials.password)
    })
    .await
    .map_err(|err| {
        error!("Credentials check panicked: {}", err);
        SessionExtractionError::InternalError
    })?;

    match resolved {
        Ok(Some(user)) => {
            record_auth_attempt(true);
            Ok(Session {
                username: user.username,
            })
        }
        Ok(None) => {
            record_auth_attempt(false);
            Err(SessionExtractionError::Unauthorized(BAD_CREDENTIALS))
        }
        Err(err) => {
            error!("Failed to check credentials: {:#}", err);
            Err(SessionExtractionError::InternalError)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}
