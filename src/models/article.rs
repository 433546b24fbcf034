use crate::http::types::Timestamptz;
use crate::http::{Error, Result};
use async_trait::async_trait;
use itertools::Itertools;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use validator::Validate;

#[cfg(test)]
use mockall::automock;

#[derive(Clone)]
pub struct ArticleController {
    pool: PgPool,
}

impl ArticleController {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[cfg_attr(test, derive(PartialEq, Eq))]
#[derive(serde::Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: Timestamptz,
    pub updated_at: Timestamptz,
    pub author: Author,
}

/// The public face of a user as shown next to their articles and comments.
#[cfg_attr(test, derive(PartialEq, Eq))]
#[derive(serde::Serialize, Debug, Clone)]
pub struct Author {
    pub id: i64,
    pub username: String,
    pub bio: String,
}

#[derive(serde::Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticle {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub slug: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub title: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub body: String,
    #[serde(default)]
    pub tag_list: Vec<String>,
}

#[derive(serde::Deserialize, Validate, Default)]
#[serde(default)]
pub struct UpdateArticle {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub slug: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub body: Option<String>,
}

// SQLx can't return the nested `author` object directly, so its columns come back
// flattened into the row and `into_article()` puts the structure back together.
#[derive(FromRow)]
pub struct ArticleFromQuery {
    pub article_id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tag_list: Vec<String>,
    pub created_at: Timestamptz,
    pub updated_at: Timestamptz,
    pub author_id: i64,
    pub author_username: String,
    pub author_bio: String,
}

impl ArticleFromQuery {
    pub fn into_article(self) -> Article {
        Article {
            id: self.article_id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            body: self.body,
            tag_list: self.tag_list,
            created_at: self.created_at,
            updated_at: self.updated_at,
            author: Author {
                id: self.author_id,
                username: self.author_username,
                bio: self.author_bio,
            },
        }
    }
}

/// The select list and joins every `ArticleFromQuery` is read with.
/// Callers append their own `where`/`order by`.
pub(crate) const ARTICLE_QUERY: &str = r#"
    select
        article.article_id,
        article.slug,
        article.title,
        article.description,
        article.body,
        array(
            select tag.tag
            from article_tag
            inner join tag using (tag_id)
            where article_tag.article_id = article.article_id
            order by tag.tag
        ) tag_list,
        article.created_at,
        article.updated_at,
        author.user_id author_id,
        author.username author_username,
        profile.bio author_bio
    from article
    inner join "user" author on author.user_id = article.user_id
    inner join profile on profile.user_id = article.user_id
"#;

pub type DynArticleCtrl = Arc<dyn ArticleCtrlTrait + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ArticleCtrlTrait {
    async fn create_article(&self, author_id: i64, article: CreateArticle) -> Result<Article>;
    async fn get_article(&self, article_id: i64) -> Result<Article>;
    async fn update_article(&self, article_id: i64, article: UpdateArticle) -> Result<Article>;
    async fn delete_article(&self, article_id: i64) -> Result<()>;
}

#[async_trait]
impl ArticleCtrlTrait for ArticleController {
    async fn create_article(&self, author_id: i64, article: CreateArticle) -> Result<Article> {
        let slug = checked_slug(&article.slug)?;
        let tag_list: Vec<String> = article
            .tag_list
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .sorted()
            .dedup()
            .collect();

        let mut tx = self.pool.begin().await?;

        let article_id = sqlx::query_scalar::<_, i64>(
            r#"
                insert into article (user_id, slug, title, description, body)
                values ($1, $2, $3, $4, $5)
                returning article_id
            "#,
        )
        .bind(author_id)
        .bind(&slug)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.body)
        .fetch_one(&mut tx)
        .await?;

        if !tag_list.is_empty() {
            // The outer select can't see rows inserted by the CTE, hence the `union`
            // with the tags that already existed.
            sqlx::query(
                r#"
                    with inserted_tag as (
                        insert into tag (tag)
                        select unnest($2::text[])
                        on conflict (tag) do nothing
                        returning tag_id
                    )
                    insert into article_tag (article_id, tag_id)
                    select $1, tag_id from inserted_tag
                    union
                    select $1, tag_id from tag where tag = any($2)
                "#,
            )
            .bind(article_id)
            .bind(&tag_list)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;

        self.get_article(article_id).await
    }

    async fn get_article(&self, article_id: i64) -> Result<Article> {
        let article = sqlx::query_as::<_, ArticleFromQuery>(&format!(
            "{} where article.article_id = $1",
            ARTICLE_QUERY
        ))
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFound)?
        .into_article();

        Ok(article)
    }

    async fn update_article(&self, article_id: i64, article: UpdateArticle) -> Result<Article> {
        let slug = article.slug.as_deref().map(checked_slug).transpose()?;

        sqlx::query_scalar::<_, i64>(
            r#"
                update article
                set slug = coalesce($1, slug),
                    title = coalesce($2, title),
                    description = coalesce($3, description),
                    body = coalesce($4, body)
                where article_id = $5
                returning article_id
            "#,
        )
        .bind(slug)
        .bind(article.title)
        .bind(article.description)
        .bind(article.body)
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::NotFound)?;

        self.get_article(article_id).await
    }

    async fn delete_article(&self, article_id: i64) -> Result<()> {
        // Comments and tag links go with it through `on delete cascade`.
        let result = sqlx::query("delete from article where article_id = $1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

fn checked_slug(slug: &str) -> Result<String> {
    let slug = slugify(slug);

    if slug.is_empty() {
        return Err(Error::bad_request([(
            "slug",
            "Enter a valid slug consisting of letters or numbers.",
        )]));
    }

    Ok(slug)
}

fn slugify(string: &str) -> String {
    const QUOTE_CHARS: &[char] = &['\'', '"'];

    string
        // Split on anything that isn't a word character or quotation mark.
        // This has the effect of keeping contractions and possessives together.
        .split(|c: char| !(QUOTE_CHARS.contains(&c) || c.is_alphanumeric()))
        // Runs of separators leave empty substrings behind.
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut s = s.replace(QUOTE_CHARS, "");
            s.make_ascii_lowercase();
            s
        })
        .filter(|s| !s.is_empty())
        .join("-")
}
