use crate::http::Result;
use crate::models::article::{Article, ArticleFromQuery, ARTICLE_QUERY};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

#[cfg(test)]
use mockall::automock;

#[derive(serde::Deserialize, Validate, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ListArticlesQuery {
    pub tag: Option<String>,
    /// Username of the author.
    pub author: Option<String>,

    // Without a `limit` every matching article is returned.
    // Postgres refuses negative values for either.
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub limit: Option<i64>,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub offset: Option<i64>,
}

#[derive(Clone)]
pub struct ListingController {
    pool: PgPool,
}

impl ListingController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub type DynListingCtrl = Arc<dyn ListingCtrlTrait + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ListingCtrlTrait {
    /// Articles matching `query`, newest first.
    async fn article_list(&self, query: ListArticlesQuery) -> Result<Vec<Article>>;
}

#[async_trait]
impl ListingCtrlTrait for ListingController {
    async fn article_list(&self, query: ListArticlesQuery) -> Result<Vec<Article>> {
        let sql = format!(
            r#"
                {}
                -- the current way to do conditional filtering in SQLx
                where (
                    $1::text is null or exists(
                        select 1
                        from article_tag
                        inner join tag using (tag_id)
                        where article_tag.article_id = article.article_id and tag.tag = $1
                    )
                )
                  and
                (
                    $2::text is null or author.username = $2
                )
                order by article.created_at desc, article.article_id desc
                limit $3
                offset $4
            "#,
            ARTICLE_QUERY
        );

        // `limit null` is the same as no limit at all in Postgres.
        let articles: Vec<_> = sqlx::query_as::<_, ArticleFromQuery>(&sql)
            .bind(query.tag)
            .bind(query.author)
            .bind(query.limit)
            .bind(query.offset.unwrap_or(0))
            .fetch(&self.pool)
            .map_ok(ArticleFromQuery::into_article)
            .try_collect()
            .await?;

        Ok(articles)
    }
}
