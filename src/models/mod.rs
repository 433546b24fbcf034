use sqlx::PgPool;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

pub mod article;
pub mod comment;
pub mod listing;
pub mod profile;
pub mod tag;
pub mod user;

use article::{ArticleController, DynArticleCtrl};
use comment::{CommentController, DynCommentCtrl};
use listing::{DynListingCtrl, ListingController};
use profile::{DynProfileCtrl, ProfileController};
use tag::{DynTagCtrl, TagController};
use user::{DynUserCtrl, UserController};

pub type DynStore = Arc<dyn StoreTrait + Send + Sync>;

/// Hands out one controller per entity.
///
/// Handlers only ever see this trait, so tests can swap the whole database for mocks.
#[cfg_attr(test, automock)]
pub trait StoreTrait {
    fn user(&self) -> DynUserCtrl;
    fn profile(&self) -> DynProfileCtrl;
    fn article(&self) -> DynArticleCtrl;
    fn listing(&self) -> DynListingCtrl;
    fn comment(&self) -> DynCommentCtrl;
    fn tag(&self) -> DynTagCtrl;
}

#[derive(Clone)]
pub struct Store {
    user: Arc<UserController>,
    profile: Arc<ProfileController>,
    article: Arc<ArticleController>,
    listing: Arc<ListingController>,
    comment: Arc<CommentController>,
    tag: Arc<TagController>,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user: Arc::new(UserController::new(pool.clone())),
            profile: Arc::new(ProfileController::new(pool.clone())),
            article: Arc::new(ArticleController::new(pool.clone())),
            listing: Arc::new(ListingController::new(pool.clone())),
            comment: Arc::new(CommentController::new(pool.clone())),
            tag: Arc::new(TagController::new(pool)),
        }
    }
}

impl StoreTrait for Store {
    fn user(&self) -> DynUserCtrl {
        self.user.clone()
    }

    fn profile(&self) -> DynProfileCtrl {
        self.profile.clone()
    }

    fn article(&self) -> DynArticleCtrl {
        self.article.clone()
    }

    fn listing(&self) -> DynListingCtrl {
        self.listing.clone()
    }

    fn comment(&self) -> DynCommentCtrl {
        self.comment.clone()
    }

    fn tag(&self) -> DynTagCtrl {
        self.tag.clone()
    }
}
