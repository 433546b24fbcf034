use crate::http::extractor::{AuthUser, Path, ValidatedJson};
use crate::http::users::hash_password;
use crate::http::{ApiContext, Error, Result};
use crate::models::profile::{Profile, UpdateProfile};
use crate::models::user::{UpdateUser, User};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use validator::{Validate, ValidationErrors};

pub(crate) fn router() -> Router<ApiContext> {
    Router::new().route("/user/:id", get(get_current_user).put(update_current_user))
}

#[derive(serde::Serialize, serde::Deserialize)]
struct UserBody<T> {
    user: T,
}

impl<T: Validate> Validate for UserBody<T> {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.user.validate()
    }
}

#[derive(serde::Serialize)]
struct CurrentUser {
    id: i64,
    email: String,
    username: String,
    token: String,
    profile: Profile,
}

#[derive(serde::Deserialize, Validate, Default, PartialEq, Eq)]
#[serde(default)] // fill in any missing fields with `..UpdateCurrentUser::default()`
struct UpdateCurrentUser {
    #[validate(email(message = "Enter a valid email address."))]
    email: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    username: Option<String>,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
}

impl UpdateCurrentUser {
    fn split(self) -> (Option<String>, UpdateUser, UpdateProfile) {
        (
            self.password,
            UpdateUser {
                email: self.email,
                username: self.username,
            },
            UpdateProfile {
                first_name: self.first_name,
                last_name: self.last_name,
                bio: self.bio,
            },
        )
    }
}

/// Only the owner of an account may see or change it through `/user/:id`.
fn check_owner(auth_user: &AuthUser, id: i64) -> Result<()> {
    if auth_user.user_id != id {
        log::debug!(
            "user {} tried to access the account of user {}",
            auth_user.user_id,
            id
        );
        return Err(Error::Forbidden);
    }
    Ok(())
}

fn current_user(ctx: &ApiContext, user: User, profile: Profile) -> CurrentUser {
    let auth_user = AuthUser {
        user_id: user.user_id,
        email: user.email,
        username: user.username,
    };

    CurrentUser {
        // A fresh token, since the email or username it carries may just have changed.
        token: auth_user.to_jwt(&ctx.config.hmac_key, ctx.config.session_length_days),
        id: auth_user.user_id,
        email: auth_user.email,
        username: auth_user.username,
        profile,
    }
}

async fn get_current_user(
    auth_user: AuthUser,
    ctx: State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<UserBody<CurrentUser>>> {
    check_owner(&auth_user, id)?;

    let user = ctx.store.user().user_by_id(auth_user.user_id).await?;
    let profile = ctx.store.profile().get_profile(auth_user.user_id).await?;

    Ok(Json(UserBody {
        user: current_user(&ctx, user, profile),
    }))
}

// Semantically, because this route allows a partial update it should be `PATCH`, not `PUT`.
async fn update_current_user(
    auth_user: AuthUser,
    ctx: State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<UserBody<UpdateCurrentUser>>,
) -> Result<Json<UserBody<CurrentUser>>> {
    check_owner(&auth_user, id)?;

    if req.user == UpdateCurrentUser::default() {
        // If there's no fields to update, these two routes are effectively identical.
        return get_current_user(auth_user, ctx, Path(id)).await;
    }

    let (password, update_user, update_profile) = req.user.split();

    // WTB `Option::map_async()`
    let password_hash = if let Some(password) = password {
        Some(hash_password(password).await?)
    } else {
        None
    };

    let (user, profile) = ctx
        .store
        .user()
        .update_account(auth_user.user_id, password_hash, update_user, update_profile)
        .await?;

    Ok(Json(UserBody {
        user: current_user(&ctx, user, profile),
    }))
}
