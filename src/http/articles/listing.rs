use axum::extract::State;
use axum::Json;
use validator::Validate;

use crate::http;
use crate::http::extractor::Query;
use crate::http::ApiContext;
use crate::models::article::Article;
use crate::models::listing::ListArticlesQuery;

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleArticlesBody {
    articles: Vec<Article>,

    // The number of articles in this response, not the total across all pages.
    // Counting every match would mean running the query a second time.
    articles_count: usize,
}

// Public: no authentication needed to browse.
pub(in crate::http) async fn list_articles(
    ctx: State<ApiContext>,
    Query(query): Query<ListArticlesQuery>,
) -> http::Result<Json<MultipleArticlesBody>> {
    query.validate()?;

    let articles = ctx.store.listing().article_list(query).await?;

    Ok(Json(MultipleArticlesBody {
        articles_count: articles.len(),
        articles,
    }))
}
