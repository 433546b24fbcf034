use crate::http::types::Timestamptz;
use crate::http::{Error, Result};
use crate::models::article::Author;
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use validator::Validate;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, derive(PartialEq, Eq))]
#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub article_id: i64,
    pub created_at: Timestamptz,
    pub updated_at: Timestamptz,
    pub body: String,
    pub author: Author,
}

#[derive(serde::Deserialize, Validate)]
pub struct AddComment {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub body: String,
}

// Same thing as `ArticleFromQuery`
#[derive(FromRow)]
pub struct CommentFromQuery {
    pub comment_id: i64,
    pub article_id: i64,
    pub created_at: Timestamptz,
    pub updated_at: Timestamptz,
    pub body: String,
    pub author_id: i64,
    pub author_username: String,
    pub author_bio: String,
}

impl CommentFromQuery {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.comment_id,
            article_id: self.article_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            body: self.body,
            author: Author {
                id: self.author_id,
                username: self.author_username,
                bio: self.author_bio,
            },
        }
    }
}

#[derive(Clone)]
pub struct CommentController {
    pool: PgPool,
}

impl CommentController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub type DynCommentCtrl = Arc<dyn CommentCtrlTrait + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CommentCtrlTrait {
    /// Comments on the article in creation order; `NotFound` if the article doesn't exist.
    async fn get_article_comments(&self, article_id: i64) -> Result<Vec<Comment>>;
    async fn create_comment(&self, user_id: i64, article_id: i64, body: &str) -> Result<Comment>;
}

#[async_trait]
impl CommentCtrlTrait for CommentController {
    async fn get_article_comments(&self, article_id: i64) -> Result<Vec<Comment>> {
        let article_exists = sqlx::query_scalar::<_, bool>(
            "select exists(select 1 from article where article_id = $1)",
        )
        .bind(article_id)
        .fetch_one(&self.pool)
        .await?;

        if !article_exists {
            return Err(Error::NotFound);
        }

        let comments = sqlx::query_as::<_, CommentFromQuery>(
            r#"
                select
                    comment.comment_id,
                    comment.article_id,
                    comment.created_at,
                    comment.updated_at,
                    comment.body,
                    author.user_id author_id,
                    author.username author_username,
                    profile.bio author_bio
                from article_comment comment
                inner join "user" author on author.user_id = comment.user_id
                inner join profile on profile.user_id = comment.user_id
                where comment.article_id = $1
                order by comment.created_at, comment.comment_id
            "#,
        )
        .bind(article_id)
        .fetch(&self.pool)
        .map_ok(CommentFromQuery::into_comment)
        .try_collect()
        .await?;

        Ok(comments)
    }

    async fn create_comment(&self, user_id: i64, article_id: i64, body: &str) -> Result<Comment> {
        let comment = sqlx::query_as::<_, CommentFromQuery>(
            r#"
                with inserted_comment as (
                    insert into article_comment (article_id, user_id, body)
                    select article_id, $1, $2
                    from article
                    where article_id = $3
                    returning comment_id, article_id, created_at, updated_at, body, user_id
                )
                select
                    comment.comment_id,
                    comment.article_id,
                    comment.created_at,
                    comment.updated_at,
                    comment.body,
                    author.user_id author_id,
                    author.username author_username,
                    profile.bio author_bio
                from inserted_comment comment
                inner join "user" author on author.user_id = comment.user_id
                inner join profile on profile.user_id = comment.user_id
            "#,
        )
        .bind(user_id)
        .bind(body)
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?
        // Nothing is inserted when the article doesn't exist.
        .ok_or(Error::NotFound)?
        .into_comment();

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn comments_come_back_in_creation_order(pool: PgPool) {
        let fred = fixtures::user(&pool, "fred").await;
        let barney = fixtures::user(&pool, "barney").await;
        let article = fixtures::article(&pool, fred.user_id, "post", &[]).await;
        let ctrl = CommentController::new(pool.clone());

        for n in 1..=3 {
            let author = if n % 2 == 0 { &barney } else { &fred };
            ctrl.create_comment(author.user_id, article.id, &format!("This is comment {}", n))
                .await
                .unwrap();
        }

        // One statement, so all three share `created_at`; ties go by id.
        sqlx::query(
            r#"
                insert into article_comment (article_id, user_id, body)
                select $1, $2, 'This is comment ' || n
                from generate_series(4, 6) n
            "#,
        )
        .bind(article.id)
        .bind(fred.user_id)
        .execute(&pool)
        .await
        .unwrap();

        let comments = ctrl.get_article_comments(article.id).await.unwrap();

        let bodies: Vec<_> = comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(
            bodies,
            [
                "This is comment 1",
                "This is comment 2",
                "This is comment 3",
                "This is comment 4",
                "This is comment 5",
                "This is comment 6",
            ]
        );
        assert_eq!(comments[1].author.username, "barney");
        assert!(comments.iter().all(|c| c.article_id == article.id));
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn create_comment_returns_its_author(pool: PgPool) {
        let fred = fixtures::user(&pool, "fred").await;
        let article = fixtures::article(&pool, fred.user_id, "post", &[]).await;

        let comment = CommentController::new(pool)
            .create_comment(fred.user_id, article.id, "First!")
            .await
            .unwrap();

        assert_eq!(comment.body, "First!");
        assert_eq!(comment.article_id, article.id);
        assert_eq!(comment.author.id, fred.user_id);
        assert_eq!(comment.author.username, "fred");
    }

    #[sqlx::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn article_without_comments_is_empty_but_missing_article_is_not_found(pool: PgPool) {
        let fred = fixtures::user(&pool, "fred").await;
        let article = fixtures::article(&pool, fred.user_id, "quiet", &[]).await;
        let ctrl = CommentController::new(pool);

        assert!(ctrl.get_article_comments(article.id).await.unwrap().is_empty());
        assert!(matches!(
            ctrl.get_article_comments(article.id + 1).await,
            Err(Error::NotFound)
        ));
        assert!(matches!(
            ctrl.create_comment(fred.user_id, article.id + 1, "Hello?").await,
            Err(Error::NotFound)
        ));
    }
}
