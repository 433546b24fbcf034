use crate::http::{Error, Result};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, derive(Eq, PartialEq, Default))]
#[derive(serde::Serialize, FromRow, Debug, Clone)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}

/// The profile half of a partial account update; `None` leaves a column alone.
#[derive(Default, PartialEq, Eq, Debug, Clone)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Clone)]
pub struct ProfileController {
    pool: PgPool,
}

impl ProfileController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub type DynProfileCtrl = Arc<dyn ProfileCtrlTrait + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileCtrlTrait {
    async fn get_profile(&self, user_id: i64) -> Result<Profile>;
}

#[async_trait]
impl ProfileCtrlTrait for ProfileController {
    async fn get_profile(&self, user_id: i64) -> Result<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            "select first_name, last_name, bio from profile where user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFound)?;

        Ok(profile)
    }
}
