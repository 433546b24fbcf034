use crate::http::extractor::{AuthUser, ValidatedJson};
use crate::http::{ApiContext, Error, Result};
use crate::models::user::{LoginUser, NewUser};
use crate::notify;
use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use validator::{Validate, ValidationErrors};

pub(crate) fn router() -> Router<ApiContext> {
    Router::new()
        .route("/users/registration/", post(create_user))
        .route("/users/login/", post(login_user))
}

/// A wrapper type for all requests to these routes.
#[derive(serde::Deserialize)]
struct UserBody<T> {
    user: T,
}

// Field errors are reported by their own name rather than nested under `user`.
impl<T: Validate> Validate for UserBody<T> {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.user.validate()
    }
}

#[derive(serde::Serialize)]
struct TokenBody {
    token: String,
}

const INVALID_CREDENTIALS: &str = "A user with this email and password was not found.";

async fn create_user(
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<UserBody<NewUser>>,
) -> Result<(StatusCode, Json<TokenBody>)> {
    let password_hash = hash_password(req.user.password.clone()).await?;

    let user = ctx.store.user().create_user(req.user, password_hash).await?;

    log::info!("registered user {} ({})", user.user_id, user.username);

    notify::spawn_welcome(
        ctx.notifier.clone(),
        user.email.clone(),
        user.username.clone(),
    );

    let token = AuthUser {
        user_id: user.user_id,
        email: user.email,
        username: user.username,
    }
    .to_jwt(&ctx.config.hmac_key, ctx.config.session_length_days);

    Ok((StatusCode::CREATED, Json(TokenBody { token })))
}

async fn login_user(
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<UserBody<LoginUser>>,
) -> Result<Json<TokenBody>> {
    // Unknown email and wrong password get the same answer.
    let user = ctx
        .store
        .user()
        .user_by_email(&req.user.email)
        .await?
        .ok_or_else(|| Error::bad_request([("credentials", INVALID_CREDENTIALS)]))?;

    verify_password(req.user.password, user.password_hash).await?;

    let token = AuthUser {
        user_id: user.user_id,
        email: user.email,
        username: user.username,
    }
    .to_jwt(&ctx.config.hmac_key, ctx.config.session_length_days);

    Ok(Json(TokenBody { token }))
}

pub(in crate::http) async fn hash_password(password: String) -> Result<String> {
    // Argon2 hashing is designed to be computationally intensive,
    // so we need to do this on a blocking thread.
    tokio::task::spawn_blocking(move || -> Result<String> {
        let salt = SaltString::generate(rand::thread_rng());
        Ok(PasswordHash::generate(Argon2::default(), password, &salt)
            .map_err(|e| anyhow::anyhow!("failed to generate password hash: {}", e))?
            .to_string())
    })
    .await
    .context("panic in generating password hash")?
}

async fn verify_password(password: String, password_hash: String) -> Result<()> {
    tokio::task::spawn_blocking(move || -> Result<()> {
        let hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("invalid password hash: {}", e))?;

        hash.verify_password(&[&Argon2::default()], password)
            .map_err(|e| match e {
                argon2::password_hash::Error::Password => {
                    Error::bad_request([("credentials", INVALID_CREDENTIALS)])
                }
                _ => anyhow::anyhow!("failed to verify password hash: {}", e).into(),
            })
    })
    .await
    .context("panic in verifying password hash")?
}
