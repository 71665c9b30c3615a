//! Auth introspection boundary: the match engine never parses
//! bearer tokens itself. An [`AuthIntrospector`] turns a token into an
//! [`Identity`] or fails with `Unauthenticated`/`ServiceUnavailable`; the
//! [`protected`] guard additionally enforces a required `user_role`.
//!
//! The introspection contract expects a bearer header or `jwt` cookie and an
//! identity carried back as `X-User-*` headers, turned into a JSON `Identity`
//! here rather than left as raw headers.

use std::time::Duration;

use actix_web::HttpRequest;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::MatchError;

const INTROSPECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub user_name: String,
    pub user_role: String,
    pub user_affiliation: String,
}

#[async_trait]
pub trait AuthIntrospector: std::fmt::Debug + Send + Sync {
    async fn introspect(&self, token: &str) -> Result<Identity, MatchError>;
}

/// Calls out to `AUTH_SERVICE_URL` with the bearer token; a 3s timeout
/// surfaces as `ServiceUnavailable`.
#[derive(Debug)]
pub struct RemoteIntrospector {
    client: reqwest::Client,
    auth_service_url: String,
}

impl RemoteIntrospector {
    pub fn new(auth_service_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(INTROSPECT_TIMEOUT)
            .build()
            .expect("reqwest client builder cannot fail with these options");
        Self {
            client,
            auth_service_url,
        }
    }
}

#[async_trait]
impl AuthIntrospector for RemoteIntrospector {
    /// Sends an `OPTIONS` request carrying the bearer token; a `204` response
    /// signals success, with the identity carried back as `X-User-*` headers
    /// rather than a JSON body.
    async fn introspect(&self, token: &str) -> Result<Identity, MatchError> {
        let response = self
            .client
            .request(reqwest::Method::OPTIONS, &self.auth_service_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                log::error!("auth service unreachable: {e}");
                MatchError::ServiceUnavailable
            })?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            log::warn!("auth service rejected a token: {}", response.status());
            return Err(MatchError::Unauthenticated);
        }

        let header = |name: &str| -> Result<String, MatchError> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    log::error!("auth service response missing header {name}");
                    MatchError::ServiceUnavailable
                })
        };

        let user_name = header("X-User-Name")?;
        Ok(Identity {
            user_id: header("X-User-Id")?,
            user_role: header("X-User-Role")?,
            user_affiliation: header("X-User-Affiliation").unwrap_or_else(|_| user_name.clone()),
            user_name,
        })
    }
}

/// Extracts the bearer token from `Authorization: Bearer …` or a `jwt`
/// cookie.
pub fn extract_token(req: &HttpRequest) -> Result<String, MatchError> {
    if let Some(header) = req.headers().get("Authorization") {
        if let Ok(value) = header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                return Ok(token.to_string());
            }
        }
    }
    if let Some(cookie) = req.cookie("jwt") {
        return Ok(cookie.value().to_string());
    }
    Err(MatchError::Unauthenticated)
}

/// Introspects the request's bearer token and requires `user_role == role`
/// (the `protected(role)` guard).
pub async fn protected(
    req: &HttpRequest,
    introspector: &dyn AuthIntrospector,
    role: &str,
) -> Result<Identity, MatchError> {
    let token = extract_token(req)?;
    let identity = introspector.introspect(&token).await?;
    if identity.user_role != role {
        return Err(MatchError::Unauthorized);
    }
    Ok(identity)
}

/// Introspects the request's bearer token without a role requirement, for
/// endpoints any authenticated user may call (e.g. `POST /matches/{id}`).
pub async fn authenticate(
    req: &HttpRequest,
    introspector: &dyn AuthIntrospector,
) -> Result<Identity, MatchError> {
    let token = extract_token(req)?;
    introspector.introspect(&token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[derive(Debug)]
    struct StubIntrospector(Result<Identity, MatchError>);

    #[async_trait]
    impl AuthIntrospector for StubIntrospector {
        async fn introspect(&self, _token: &str) -> Result<Identity, MatchError> {
            self.0.clone()
        }
    }

    #[actix_web::test]
    async fn missing_token_is_unauthenticated() {
        let req = TestRequest::default().to_http_request();
        let stub = StubIntrospector(Err(MatchError::Unauthenticated));
        let err = protected(&req, &stub, "admin").await.unwrap_err();
        assert!(matches!(err, MatchError::Unauthenticated));
    }

    #[actix_web::test]
    async fn wrong_role_is_unauthorized() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer token123"))
            .to_http_request();
        let stub = StubIntrospector(Ok(Identity {
            user_id: "u1".into(),
            user_name: "alice".into(),
            user_role: "player".into(),
            user_affiliation: "Home".into(),
        }));
        let err = protected(&req, &stub, "admin").await.unwrap_err();
        assert!(matches!(err, MatchError::Unauthorized));
    }
}
