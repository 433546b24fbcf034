use crate::http::{Error, Result, ResultExt};
use crate::models::profile::{Profile, UpdateProfile};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use validator::Validate;

#[cfg(test)]
use mockall::automock;

#[derive(serde::Deserialize, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 8, message = "Ensure this field has at least 8 characters."))]
    pub password: String,
}

#[derive(serde::Deserialize, Validate)]
pub struct LoginUser {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

/// The account half of a partial user update; `None` leaves a column alone.
#[derive(Default, PartialEq, Eq, Debug, Clone)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub username: Option<String>,
}

#[cfg_attr(test, derive(PartialEq, Eq, Default))]
#[derive(FromRow, Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

pub type DynUserCtrl = Arc<dyn UserCtrlTrait + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserCtrlTrait {
    /// Insert the user together with their empty profile.
    async fn create_user(&self, new_user: NewUser, password_hash: String) -> Result<User>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn user_by_id(&self, user_id: i64) -> Result<User>;
    /// Apply both halves of an account update, or neither.
    async fn update_account(
        &self,
        user_id: i64,
        password_hash: Option<String>,
        update_user: UpdateUser,
        update_profile: UpdateProfile,
    ) -> Result<(User, Profile)>;
}

#[derive(Clone)]
pub struct UserController {
    pool: PgPool,
}

impl UserController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn username_taken(_: Box<dyn sqlx::error::DatabaseError>) -> Error {
    Error::bad_request([("username", "A user with that username already exists.")])
}

fn email_taken(_: Box<dyn sqlx::error::DatabaseError>) -> Error {
    Error::bad_request([("email", "A user with that email already exists.")])
}

#[async_trait]
impl UserCtrlTrait for UserController {
    async fn create_user(&self, new_user: NewUser, password_hash: String) -> Result<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
                insert into "user" (username, email, password_hash)
                values ($1, $2, $3)
                returning user_id, email, username, password_hash
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .fetch_one(&mut tx)
        .await
        .on_constraint("user_username_key", username_taken)
        .on_constraint("user_email_key", email_taken)?;

        sqlx::query("insert into profile (user_id) values ($1)")
            .bind(user.user_id)
            .execute(&mut tx)
            .await?;

        tx.commit().await?;

        Ok(user)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
                select user_id, email, username, password_hash
                from "user" where email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn user_by_id(&self, user_id: i64) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
                select user_id, email, username, password_hash
                from "user" where user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFound)?;

        Ok(user)
    }

    async fn update_account(
        &self,
        user_id: i64,
        password_hash: Option<String>,
        update_user: UpdateUser,
        update_profile: UpdateProfile,
    ) -> Result<(User, Profile)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
                update "user"
                set email = coalesce($1, "user".email),
                    username = coalesce($2, "user".username),
                    password_hash = coalesce($3, "user".password_hash)
                where user_id = $4
                returning user_id, email, username, password_hash
            "#,
        )
        .bind(update_user.email)
        .bind(update_user.username)
        .bind(password_hash)
        .bind(user_id)
        .fetch_optional(&mut tx)
        .await
        .on_constraint("user_username_key", username_taken)
        .on_constraint("user_email_key", email_taken)?
        .ok_or(Error::NotFound)?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
                update profile
                set first_name = coalesce($1, profile.first_name),
                    last_name = coalesce($2, profile.last_name),
                    bio = coalesce($3, profile.bio)
                where user_id = $4
                returning first_name, last_name, bio
            "#,
        )
        .bind(update_profile.first_name)
        .bind(update_profile.last_name)
        .bind(update_profile.bio)
        .bind(user_id)
        .fetch_optional(&mut tx)
        .await?
        .ok_or(Error::NotFound)?;

        // Returning early above drops `tx`, which rolls back the user update.
        tx.commit().await?;

        Ok((user, profile))
    }
}
