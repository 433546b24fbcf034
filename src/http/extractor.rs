use crate::http::error::Error;
use crate::http::ApiContext;
use async_trait::async_trait;
use axum::body::HttpBody;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRef, FromRequest, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request};
use axum::{BoxError, Json};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use serde::de::DeserializeOwned;
use sha2::Sha384;
use time::{Duration, OffsetDateTime};
use validator::Validate;

const SCHEME_PREFIX: &str = "Token ";

/// Add this as a parameter to a handler function to require the user to be logged in.
///
/// Parses a JWT from the `Authorization: Token <token>` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub username: String,
}

#[derive(serde::Serialize, serde::Deserialize)]
pub(crate) struct AuthUserClaims {
    pub id: i64,
    pub email: String,
    pub username: String,
    /// Standard JWT `exp` claim.
    pub exp: i64,
}

impl AuthUser {
    /// Sign a token for this user that expires `session_length_days` from now.
    pub(in crate::http) fn to_jwt(&self, hmac_key: &str, session_length_days: i64) -> String {
        let hmac = Hmac::<Sha384>::new_from_slice(hmac_key.as_bytes())
            .expect("HMAC-SHA-384 can accept any key length");

        AuthUserClaims {
            id: self.user_id,
            email: self.email.clone(),
            username: self.username.clone(),
            exp: (OffsetDateTime::now_utc() + Duration::days(session_length_days))
                .unix_timestamp(),
        }
        .sign_with_key(&hmac)
        .expect("HMAC signing should be infallible")
    }

    /// Attempt to parse `Self` from an `Authorization` header.
    fn from_authorization(hmac_key: &str, auth_header: &HeaderValue) -> Result<Self, Error> {
        let auth_header = auth_header.to_str().map_err(|_| {
            log::debug!("Authorization header is not UTF-8");
            Error::Unauthorized
        })?;

        let token = auth_header.strip_prefix(SCHEME_PREFIX).ok_or_else(|| {
            log::debug!(
                "Authorization header is using the wrong scheme: {:?}",
                auth_header
            );
            Error::Unauthorized
        })?;

        Self::from_token(hmac_key, token)
    }

    pub(crate) fn from_token(hmac_key: &str, token: &str) -> Result<Self, Error> {
        let jwt =
            jwt::Token::<jwt::Header, AuthUserClaims, _>::parse_unverified(token).map_err(|e| {
                log::debug!("failed to parse Authorization header {:?}: {}", token, e);
                Error::Unauthorized
            })?;

        let hmac = Hmac::<Sha384>::new_from_slice(hmac_key.as_bytes())
            .expect("HMAC-SHA-384 can accept any key length");

        // When choosing a JWT implementation, be sure to check that it validates that the signing
        // algorithm declared in the token matches the signing algorithm you're verifying with.
        // The `jwt` crate does.
        let jwt = jwt.verify_with_key(&hmac).map_err(|e| {
            log::debug!("JWT failed to verify: {}", e);
            Error::Unauthorized
        })?;

        let (_header, claims) = jwt.into();

        // Because JWTs are stateless, we don't really have any mechanism here to invalidate them
        // besides expiration. You probably want to add more checks, like ensuring the user ID
        // exists and has not been deleted/banned/deactivated.
        if claims.exp < OffsetDateTime::now_utc().unix_timestamp() {
            log::debug!("token expired");
            return Err(Error::Unauthorized);
        }

        Ok(Self {
            user_id: claims.id,
            email: claims.email,
            username: claims.username,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    ApiContext: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = ApiContext::from_ref(state);

        // Get the value of the `Authorization` header, if it was sent at all.
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(Error::Unauthorized)?;

        Self::from_authorization(&ctx.config.hmac_key, auth_header)
    }
}

/// A `Json` body that has also passed its `validator::Validate` rules.
///
/// Malformed JSON and missing fields are reported as `400 Bad Request` under the `body` key,
/// failed validation rules under the name of the offending field.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = Error;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S, B>>::from_request(req, state)
            .await
            .map_err(|rejection| Error::bad_request([("body", rejection.to_string())]))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// `axum::extract::Path`, but a segment that doesn't parse is a `404 Not Found`.
///
/// `/articles/abc` simply names no article.
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let extracted = axum::extract::Path::<T>::from_request_parts(parts, state).await;

        match extracted {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                log::debug!("unmatched path {}: {}", parts.uri.path(), e);
                Err(Error::NotFound)
            }
            Err(e) => Err(anyhow::anyhow!("failed to extract path parameters: {}", e).into()),
        }
    }
}

/// `axum::extract::Query` with its rejection reported as `400 Bad Request` under `query`.
pub struct Query<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let axum::extract::Query(value) =
            axum::extract::Query::<T>::from_request_parts(parts, state)
                .await
                .map_err(|rejection| Error::bad_request([("query", rejection.to_string())]))?;

        Ok(Query(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    const HMAC_KEY: &str = "Yabba Dabba Doo!";

    fn fred() -> AuthUser {
        AuthUser {
            user_id: 42,
            email: "fred@bedrock.com".to_string(),
            username: "fred".to_string(),
        }
    }

    #[test]
    fn token_round_trips_the_identity_claims() {
        let token = fred().to_jwt(HMAC_KEY, 14);
        assert_eq!(AuthUser::from_token(HMAC_KEY, &token).unwrap(), fred());
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let token = fred().to_jwt("some other key", 14);
        assert!(matches!(
            AuthUser::from_token(HMAC_KEY, &token),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = fred().to_jwt(HMAC_KEY, -1);
        assert!(matches!(
            AuthUser::from_token(HMAC_KEY, &token),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn header_must_use_the_token_scheme() {
        let token = fred().to_jwt(HMAC_KEY, 14);
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).unwrap();
        let scheme = HeaderValue::from_str(&format!("Token {}", token)).unwrap();

        assert!(AuthUser::from_authorization(HMAC_KEY, &bearer).is_err());
        assert_eq!(
            AuthUser::from_authorization(HMAC_KEY, &scheme).unwrap(),
            fred()
        );
    }

    #[derive(serde::Deserialize)]
    struct Page {
        limit: Option<i64>,
    }

    fn app() -> Router {
        Router::new()
            .route("/things/:id", get(|Path(id): Path<i64>| async move { id.to_string() }))
            .route(
                "/things/",
                get(|Query(page): Query<Page>| async move { format!("{:?}", page.limit) }),
            )
    }

    async fn call(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_json_not_found() {
        let (status, body) = call("/things/abc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(body["errors"]["detail"].is_array());

        assert_eq!(call("/things/12").await, (StatusCode::OK, "12".to_string()));
    }

    #[tokio::test]
    async fn malformed_query_is_a_json_bad_request() {
        let (status, body) = call("/things/?limit=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(body["errors"]["query"][0].is_string());

        assert_eq!(
            call("/things/?limit=5").await,
            (StatusCode::OK, "Some(5)".to_string())
        );
    }
}
