use crate::catchers::ErrorMessage;
use crate::config::CONFIG;
use jsonwebtoken::{decode, Validation};
use rocket::{
    http::Status,
    outcome::Outcome::{Error as Failure, Success},
    request::{FromRequest, Outcome, Request},
};
use serde::{Deserialize, Serialize};
use threads_common::errors::ThreadsServerError;

/// Cookie the auth provider keeps the session token in
pub const SESSION_COOKIE: &str = "__session";

/// Claims read from a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: usize,
}

/// Identity id of the signed in user (the `sub` of a verified session token)
pub struct AuthenticatedUser(pub String);

/**
 * Pick the session token out of the request credentials
 * @dev an Authorization header wins over the session cookie
 *
 * @param authorization - value of the Authorization header, if any
 * @param cookie - value of the session cookie, if any
 */
pub fn session_token<'a>(
    authorization: Option<&'a str>,
    cookie: Option<&'a str>,
) -> Result<&'a str, ThreadsServerError> {
    match authorization {
        Some(header) => match header.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim()),
            _ => Err(ThreadsServerError::HeaderError(String::from("Authorization"))),
        },
        None => match cookie {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ThreadsServerError::MissingSession),
        },
    }
}

/// Verify a session token and return the identity it was issued to
pub fn verify_session(token: &str) -> Result<String, ThreadsServerError> {
    let key = CONFIG.session_decoding_key()?;
    let validation = Validation::new(CONFIG.session_algorithm);
    match decode::<SessionClaims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims.sub),
        Err(e) => Err(ThreadsServerError::InvalidSession(e.to_string())),
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ErrorMessage;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let authorization = request.headers().get_one("Authorization");
        let cookie = request.cookies().get(SESSION_COOKIE).map(|cookie| cookie.value());

        let result = session_token(authorization, cookie).and_then(verify_session);
        match result {
            Ok(user_id) => Success(AuthenticatedUser(user_id)),
            Err(e) => {
                let status = match e {
                    ThreadsServerError::ConfigError(_) => Status::InternalServerError,
                    _ => Status::Unauthorized,
                };
                tracing::debug!("Rejected session: {}", e);
                let message = request.local_cache(|| ErrorMessage(Some(e)));
                Failure((status, message.clone()))
            }
        }
    }
}

/// The svix signature headers sent with auth provider webhooks
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WebhookHeaders {
    type Error = ErrorMessage;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let headers = request.headers();
        let (id, timestamp, signature) = match (
            headers.get_one("svix-id"),
            headers.get_one("svix-timestamp"),
            headers.get_one("svix-signature"),
        ) {
            (Some(id), Some(timestamp), Some(signature)) => (id, timestamp, signature),
            _ => {
                let message = request.local_cache(|| {
                    ErrorMessage(Some(ThreadsServerError::WebhookSignature(String::from(
                        "Missing svix headers",
                    ))))
                });
                return Failure((Status::BadRequest, message.clone()));
            }
        };
        Success(WebhookHeaders {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            signature: signature.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_preferred_over_cookie() {
        assert_eq!(
            session_token(Some("Bearer header.jwt"), Some("cookie.jwt")),
            Ok("header.jwt")
        );
        assert_eq!(session_token(None, Some("cookie.jwt")), Ok("cookie.jwt"));
    }

    #[test]
    fn malformed_or_missing_credentials_are_rejected() {
        assert_eq!(
            session_token(Some("Basic abc"), None),
            Err(ThreadsServerError::HeaderError(String::from("Authorization")))
        );
        assert_eq!(
            session_token(Some("Bearer "), None),
            Err(ThreadsServerError::HeaderError(String::from("Authorization")))
        );
        assert_eq!(session_token(None, None), Err(ThreadsServerError::MissingSession));
        assert_eq!(session_token(None, Some("")), Err(ThreadsServerError::MissingSession));
    }
}
