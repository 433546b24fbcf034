use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sqlx::error::DatabaseError;
use std::borrow::Cow;
use std::collections::HashMap;

/// A common error type that can be used throughout the API.
///
/// Can be returned in a `Result` from an API handler function.
///
/// For convenience, this represents both API errors as well as internal recoverable errors,
/// and maps them to appropriate status codes along with at least a minimally useful error
/// message in a plain JSON body.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Return `400 Bad Request` with a map of field names to the problems found with them.
    ///
    /// This is the outcome of every validation failure: missing fields, malformed values,
    /// and unique constraints that the request would violate.
    #[error("error in the request body")]
    BadRequest {
        errors: HashMap<Cow<'static, str>, Vec<Cow<'static, str>>>,
    },

    /// Return `401 Unauthorized`
    #[error("authentication required")]
    Unauthorized,

    /// Return `403 Forbidden`
    #[error("user may not perform that action")]
    Forbidden,

    /// Return `404 Not Found`
    #[error("request path not found")]
    NotFound,

    /// Automatically return `500 Internal Server Error` on a `sqlx::Error`.
    ///
    /// The error is logged but never returned to the client, as it may contain
    /// details about the schema.
    #[error("an error occurred with the database")]
    Sqlx(#[from] sqlx::Error),

    /// Return `500 Internal Server Error` on a `anyhow::Error`.
    #[error("an internal server error occurred")]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Convenient constructor for `Error::BadRequest`.
    ///
    /// Multiple messages for the same field are grouped together.
    pub fn bad_request<K, V>(errors: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: Into<Cow<'static, str>>,
    {
        let mut error_map = HashMap::new();

        for (key, val) in errors {
            error_map
                .entry(key.into())
                .or_insert_with(Vec::new)
                .push(val.into());
        }

        Self::BadRequest { errors: error_map }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Sqlx(_) | Self::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorsBody {
    errors: HashMap<Cow<'static, str>, Vec<Cow<'static, str>>>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut headers = HeaderMap::new();

        match &self {
            Self::BadRequest { errors } => {
                return (
                    status,
                    Json(ErrorsBody {
                        errors: errors.clone(),
                    }),
                )
                    .into_response();
            }
            Self::Unauthorized => {
                // Tells the client which scheme to put in the `Authorization` header.
                headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
            }
            Self::Sqlx(e) => {
                log::error!("SQLx error: {:?}", e);
            }
            Self::Anyhow(e) => {
                log::error!("Generic error: {:?}", e);
            }
            Self::Forbidden | Self::NotFound => (),
        }

        let body = ErrorsBody {
            errors: HashMap::from([("detail".into(), vec![self.to_string().into()])]),
        };

        (status, headers, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::bad_request(errors.field_errors().into_iter().flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("invalid value ({})", error.code).into());
                (field, message)
            })
        }))
    }
}

/// A little helper trait for more easily converting database constraint errors into API errors.
///
/// ```rust,ignore
/// let user_id = sqlx::query_scalar::<_, i64>(
///     r#"insert into "user" (username, email, password_hash) values ($1, $2, $3) returning user_id"#,
/// )
/// .bind(username)
/// .bind(email)
/// .bind(password_hash)
/// .fetch_one(&pool)
/// .await
/// .on_constraint("user_username_key", |_| Error::bad_request([("username", "already taken")]))?;
/// ```
pub trait ResultExt<T> {
    /// If `self` contains a SQLx database constraint error with the given name,
    /// transform the error.
    ///
    /// Otherwise, the result is passed through unchanged.
    fn on_constraint(
        self,
        name: &str,
        f: impl FnOnce(Box<dyn DatabaseError>) -> Error,
    ) -> Result<T, Error>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<Error>,
{
    fn on_constraint(
        self,
        name: &str,
        map_err: impl FnOnce(Box<dyn DatabaseError>) -> Error,
    ) -> Result<T, Error> {
        self.map_err(|e| match e.into() {
            Error::Sqlx(sqlx::Error::Database(dbe)) if dbe.constraint() == Some(name) => {
                map_err(dbe)
            }
            e => e,
        })
    }
}
