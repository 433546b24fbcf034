/// Defines a common error type to use for all request handlers.
mod error;

/// Contains definitions for application-specific parameters to handler functions,
/// such as `AuthUser` which checks for the `Authorization: Token <token>` header in the request,
/// verifies `<token>` as a JWT and checks the signature,
/// then deserializes the information it contains.
pub mod extractor;

/// A catch-all module for other common types in the API.
pub mod types;

// Modules introducing API routes. `articles` also carries the comment and tag routes
// because they all hang off the `article` table.
mod articles;
mod profiles;
mod users;

pub mod server;
pub use server::serve;

pub mod api_context;
pub use api_context::ApiContext;

pub use error::{Error, ResultExt};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod test_util;
