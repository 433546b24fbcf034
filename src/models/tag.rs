use crate::http::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

#[derive(Clone)]
pub struct TagController {
    pool: PgPool,
}

impl TagController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub type DynTagCtrl = Arc<dyn TagCtrlTrait + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TagCtrlTrait {
    async fn get_tags(&self) -> Result<Vec<String>>;
}

#[async_trait]
impl TagCtrlTrait for TagController {
    async fn get_tags(&self) -> Result<Vec<String>> {
        // `tag` is unique, so this is already distinct.
        let tags = sqlx::query_scalar::<_, String>("select tag from tag order by tag")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }
}
