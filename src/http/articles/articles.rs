use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use validator::{Validate, ValidationErrors};

use crate::http::extractor::{AuthUser, Path, ValidatedJson};
use crate::http::{ApiContext, Result};
use crate::models::article::{Article, CreateArticle, UpdateArticle};

use crate::http::articles::comments::router as comments_router;
use crate::http::articles::listing;

pub(crate) fn router() -> Router<ApiContext> {
    Router::new()
        .route(
            "/articles/",
            post(create_article).get(listing::list_articles),
        )
        .route("/articles/create/", post(create_article))
        .route(
            "/articles/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
        // Tags live in their own table but only ever get there through an article.
        .route("/tags/", get(get_tags))
        .merge(comments_router())
}

#[derive(serde::Deserialize, serde::Serialize)]
// Just trying this out to avoid the tautology of `ArticleBody<Article>`
struct ArticleBody<T = Article> {
    article: T,
}

impl<T: Validate> Validate for ArticleBody<T> {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.article.validate()
    }
}

#[derive(serde::Serialize)]
struct TagsBody {
    tags: Vec<String>,
}

async fn create_article(
    auth_user: AuthUser,
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<ArticleBody<CreateArticle>>,
) -> Result<(StatusCode, Json<ArticleBody>)> {
    let article = ctx
        .store
        .article()
        .create_article(auth_user.user_id, req.article)
        .await?;

    log::info!("user {} created article {}", auth_user.user_id, article.id);

    Ok((StatusCode::CREATED, Json(ArticleBody { article })))
}

// Any authenticated user may edit or delete any article; there is no author check here.
async fn update_article(
    _auth_user: AuthUser,
    ctx: State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ArticleBody<UpdateArticle>>,
) -> Result<Json<ArticleBody>> {
    let article = ctx
        .store
        .article()
        .update_article(id, req.article)
        .await?;
    Ok(Json(ArticleBody { article }))
}

async fn delete_article(
    auth_user: AuthUser,
    ctx: State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    ctx.store.article().delete_article(id).await?;

    log::info!("user {} deleted article {}", auth_user.user_id, id);

    Ok(StatusCode::NO_CONTENT)
}

async fn get_article(ctx: State<ApiContext>, Path(id): Path<i64>) -> Result<Json<ArticleBody>> {
    let article = ctx.store.article().get_article(id).await?;
    Ok(Json(ArticleBody { article }))
}

async fn get_tags(ctx: State<ApiContext>) -> Result<Json<TagsBody>> {
    let tags = ctx.store.tag().get_tags().await?;
    Ok(Json(TagsBody { tags }))
}
