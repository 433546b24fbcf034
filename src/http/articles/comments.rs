use crate::http::extractor::{AuthUser, Path, ValidatedJson};
use crate::http::{ApiContext, Error, Result};
use crate::models::comment::{AddComment, Comment};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use validator::{Validate, ValidationErrors};

pub(crate) fn router() -> Router<ApiContext> {
    Router::new()
        .route("/articles/:id/comments/", get(get_article_comments))
        .route("/articles/:id/comments/add", post(add_comment))
}

#[derive(serde::Deserialize, serde::Serialize)]
struct CommentBody<T = Comment> {
    comment: T,
}

impl<T: Validate> Validate for CommentBody<T> {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        self.comment.validate()
    }
}

#[derive(serde::Serialize)]
struct MultipleCommentsBody {
    comments: Vec<Comment>,
}

async fn get_article_comments(
    ctx: State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<MultipleCommentsBody>> {
    // The controller answers 404 itself when the article does not exist.
    let comments = ctx.store.comment().get_article_comments(id).await?;

    // An article nobody has commented on yet is also answered with 404.
    if comments.is_empty() {
        return Err(Error::NotFound);
    }

    Ok(Json(MultipleCommentsBody { comments }))
}

async fn add_comment(
    auth_user: AuthUser,
    ctx: State<ApiContext>,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CommentBody<AddComment>>,
) -> Result<(StatusCode, Json<CommentBody>)> {
    let comment = ctx
        .store
        .comment()
        .create_comment(auth_user.user_id, id, &req.comment.body)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentBody { comment })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_util::*;
    use crate::models::comment::MockCommentCtrlTrait;
    use crate::models::MockStoreTrait;
    use axum::http::Method;
    use mockall::predicate::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn store_with_comment_ctrl(
        make: impl Fn() -> MockCommentCtrlTrait + Send + Sync + 'static,
    ) -> MockStoreTrait {
        let mut store = MockStoreTrait::new();
        store.expect_comment().returning(move || Arc::new(make()));
        store
    }

    #[tokio::test]
    async fn add_comment_sets_requester_as_author() {
        let store = store_with_comment_ctrl(|| {
            let mut ctrl = MockCommentCtrlTrait::new();
            ctrl.expect_create_comment()
                .with(eq(2i64), eq(1i64), eq("This is a comment"))
                .return_once(|user_id, article_id, body| {
                    Ok(Comment {
                        body: body.to_string(),
                        ..sample_comment(1, article_id, user_id)
                    })
                });
            ctrl
        });
        let app = router().with_state(api_context(store));

        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/articles/1/comments/add",
                Some(&token_for(2)),
                Some(json!({ "comment": { "article_id": 1, "body": "This is a comment" } })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["comment"]["body"], "This is a comment");
        assert_eq!(body["comment"]["author"]["id"], 2);
        assert_eq!(body["comment"]["articleId"], 1);
    }

    #[tokio::test]
    async fn add_comment_to_missing_article_is_not_found() {
        let store = store_with_comment_ctrl(|| {
            let mut ctrl = MockCommentCtrlTrait::new();
            ctrl.expect_create_comment()
                .return_once(|_, _, _| Err(Error::NotFound));
            ctrl
        });
        let app = router().with_state(api_context(store));

        let (status, _) = send(
            app,
            request(
                Method::POST,
                "/articles/404/comments/add",
                Some(&token_for(2)),
                Some(json!({ "comment": { "body": "Hello?" } })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_comment_requires_authentication() {
        let app = router().with_state(api_context(MockStoreTrait::new()));

        let (status, _) = send(
            app,
            request(
                Method::POST,
                "/articles/1/comments/add",
                None,
                Some(json!({ "comment": { "body": "This is a comment" } })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn blank_comment_is_bad_request() {
        let app = router().with_state(api_context(MockStoreTrait::new()));

        let (status, body) = send(
            app,
            request(
                Method::POST,
                "/articles/1/comments/add",
                Some(&token_for(2)),
                Some(json!({ "comment": { "body": "" } })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["body"].is_array());
    }

    #[tokio::test]
    async fn listing_passes_the_stored_comments_through_in_order() {
        // The ordering itself comes from the query; see the database tests in `models::comment`.
        let stored: Arc<Mutex<Vec<Comment>>> = Arc::default();

        let writes = stored.clone();
        let reads = stored.clone();
        let store = store_with_comment_ctrl(move || {
            let writes = writes.clone();
            let reads = reads.clone();
            let mut ctrl = MockCommentCtrlTrait::new();
            ctrl.expect_create_comment()
                .returning(move |user_id, article_id, body| {
                    let mut comments = writes.lock().unwrap();
                    let comment = Comment {
                        body: body.to_string(),
                        ..sample_comment(comments.len() as i64 + 1, article_id, user_id)
                    };
                    comments.push(comment.clone());
                    Ok(comment)
                });
            ctrl.expect_get_article_comments()
                .with(eq(1i64))
                .returning(move |_| Ok(reads.lock().unwrap().clone()));
            ctrl
        });
        let app = router().with_state(api_context(store));

        for n in 1..10 {
            let (status, _) = send(
                app.clone(),
                request(
                    Method::POST,
                    "/articles/1/comments/add",
                    Some(&token_for(1)),
                    Some(json!({ "comment": { "body": format!("This is comment {}", n) } })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(
            app,
            request(Method::GET, "/articles/1/comments/", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let comments = body["comments"].as_array().unwrap();
        assert_eq!(comments.len(), 9);
        for (n, comment) in comments.iter().enumerate() {
            assert_eq!(comment["body"], format!("This is comment {}", n + 1));
        }
    }

    #[tokio::test]
    async fn article_without_comments_is_not_found() {
        let store = store_with_comment_ctrl(|| {
            let mut ctrl = MockCommentCtrlTrait::new();
            ctrl.expect_get_article_comments()
                .return_once(|_| Ok(vec![]));
            ctrl
        });
        let app = router().with_state(api_context(store));

        let (status, _) = send(
            app,
            request(Method::GET, "/articles/1/comments/", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn comments_of_missing_article_are_not_found() {
        let store = store_with_comment_ctrl(|| {
            let mut ctrl = MockCommentCtrlTrait::new();
            ctrl.expect_get_article_comments()
                .return_once(|_| Err(Error::NotFound));
            ctrl
        });
        let app = router().with_state(api_context(store));

        let (status, _) = send(
            app,
            request(Method::GET, "/articles/404/comments/", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn comments_of_non_numeric_article_are_not_found() {
        let app = router().with_state(api_context(MockStoreTrait::new()));

        let (status, body) = send(
            app,
            request(Method::GET, "/articles/first/comments/", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["errors"]["detail"].is_array());
    }
}
