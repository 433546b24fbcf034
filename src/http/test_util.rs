use crate::config::Config;
use crate::http::extractor::AuthUser;
use crate::http::types::Timestamptz;
use crate::http::ApiContext;
use crate::models::article::{Article, Author};
use crate::models::comment::Comment;
use crate::models::MockStoreTrait;
use crate::notify::{DynNotifier, LogNotifier};
use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const HMAC_KEY: &str = "Yabba Dabba Doo!";

pub fn api_context(store: MockStoreTrait) -> ApiContext {
    api_context_with_notifier(
        store,
        Arc::new(LogNotifier::new("noreply@authors-haven.com".to_string())),
    )
}

pub fn api_context_with_notifier(store: MockStoreTrait, notifier: DynNotifier) -> ApiContext {
    ApiContext {
        store: Arc::new(store),
        notifier,
        config: Arc::new(Config {
            hmac_key: HMAC_KEY.to_string(),
            ..Default::default()
        }),
    }
}

pub fn auth_user(user_id: i64) -> AuthUser {
    AuthUser {
        user_id,
        email: format!("user{}@haven.com", user_id),
        username: format!("user{}", user_id),
    }
}

pub fn token_for(user_id: i64) -> String {
    auth_user(user_id).to_jwt(HMAC_KEY, 14)
}

pub fn request(method: http::Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Token {}", token));
    }

    let body = match body {
        Some(body) => Body::from(body.to_string()),
        None => Body::empty(),
    };

    builder.body(body).unwrap()
}

/// Run one request through `app`; an empty response body comes back as `Value::Null`.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();

    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json)
}

pub fn author(id: i64) -> Author {
    Author {
        id,
        username: format!("user{}", id),
        bio: String::new(),
    }
}

pub fn sample_article(id: i64, author_id: i64) -> Article {
    Article {
        id,
        slug: format!("post-article-{}", id),
        title: format!("This is a new post {}", id),
        description: "This is a new post about django".to_string(),
        body: "Blah blah blah etc".to_string(),
        tag_list: vec![],
        created_at: Timestamptz::now(),
        updated_at: Timestamptz::now(),
        author: author(author_id),
    }
}

pub fn sample_comment(id: i64, article_id: i64, author_id: i64) -> Comment {
    Comment {
        id,
        article_id,
        created_at: Timestamptz::now(),
        updated_at: Timestamptz::now(),
        body: format!("This is comment {}", id),
        author: author(author_id),
    }
}
