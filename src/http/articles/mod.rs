// `comments` and `listing` hang their handlers off the routes defined in `articles`.
#[allow(clippy::module_inception)]
mod articles;
mod comments;
mod listing;

pub(crate) use articles::router;
