/// The configuration parameters for the application.
///
/// These can either be passed on the command line, or pulled from environment variables.
/// The latter is preferred as environment variables are one of the recommended ways to
/// get configuration from Kubernetes Secrets in deployment.
///
/// For development convenience, these can also be read from a `.env` file in the working
/// directory where the application is started.
///
/// See `.env.sample` in the repository root for details.
pub mod config;

/// The HTTP surface: routing, handlers, extractors and the shared error type.
pub mod http;

/// Database access, one controller per entity, each behind a mockable trait.
pub mod models;

/// Best-effort messages sent to users outside the request/response cycle.
pub mod notify;
